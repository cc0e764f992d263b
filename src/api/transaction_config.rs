use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;

use super::serde_helpers::option_field_as_string;

#[derive(Serialize, Deserialize, Debug, PartialEq, Copy, Clone)]
#[serde(rename_all = "camelCase")]
pub enum PriorityLevel {
    Medium,
    High,
    VeryHigh,
}

#[derive(Deserialize, Debug, PartialEq, Copy, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub enum PrioritizationFeeLamports {
    #[serde(rename_all = "camelCase")]
    PriorityLevelWithMaxLamports {
        priority_level: PriorityLevel,
        max_lamports: u64,
        #[serde(default)]
        global: bool,
    },
    JitoTipLamports(u64),
    #[default]
    #[serde(untagged, deserialize_with = "auto")]
    Auto,
    #[serde(untagged)]
    Lamports(u64),
}

impl Serialize for PrioritizationFeeLamports {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct PriorityLevelWrapper<'a> {
            priority_level_with_max_lamports: PriorityLevelWithMaxLamports<'a>,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct PriorityLevelWithMaxLamports<'a> {
            priority_level: &'a PriorityLevel,
            max_lamports: &'a u64,
            global: &'a bool,
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct JitoTipLamports {
            jito_tip_lamports: u64,
        }

        match self {
            Self::PriorityLevelWithMaxLamports {
                priority_level,
                max_lamports,
                global,
            } => PriorityLevelWrapper {
                priority_level_with_max_lamports: PriorityLevelWithMaxLamports {
                    priority_level,
                    max_lamports,
                    global,
                },
            }
            .serialize(serializer),
            Self::JitoTipLamports(lamports) => JitoTipLamports {
                jito_tip_lamports: *lamports,
            }
            .serialize(serializer),
            Self::Auto => serializer.serialize_str("auto"),
            Self::Lamports(lamports) => serializer.serialize_u64(*lamports),
        }
    }
}

fn auto<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    enum Helper {
        #[serde(rename = "auto")]
        Variant,
    }

    Helper::deserialize(deserializer)?;
    Ok(())
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSlippageSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bps: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bps: Option<u16>,
}

/// `/swap` 请求体里除报价外的全部开关。
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct TransactionConfig {
    /// Wrap and unwrap SOL. Ignored if `destination_token_account` is set.
    pub wrap_and_unwrap_sol: bool,
    /// Allow the cheaper seeded-account path for the wrapped SOL account.
    pub allow_optimized_wrapped_sol_token_account: bool,
    /// Fee token account for the output token.
    #[serde(with = "option_field_as_string", skip_serializing_if = "Option::is_none")]
    pub fee_account: Option<Pubkey>,
    /// Prioritization fee paid in addition to the signature fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<PrioritizationFeeLamports>,
    /// Simulate first and size the compute unit limit from the result.
    pub dynamic_compute_unit_limit: bool,
    /// Request a legacy transaction rather than the default versioned one.
    pub as_legacy_transaction: bool,
    /// Let the API pick the slippage within the given bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_slippage: Option<DynamicSlippageSettings>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            wrap_and_unwrap_sol: true,
            allow_optimized_wrapped_sol_token_account: false,
            fee_account: None,
            prioritization_fee_lamports: None,
            dynamic_compute_unit_limit: false,
            as_legacy_transaction: false,
            dynamic_slippage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_level_with_max_lamports_wire_shape() {
        let fee = PrioritizationFeeLamports::PriorityLevelWithMaxLamports {
            priority_level: PriorityLevel::High,
            max_lamports: 4_000_000,
            global: false,
        };
        let value = serde_json::to_value(&fee).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "priorityLevelWithMaxLamports": {
                    "priorityLevel": "high",
                    "maxLamports": 4_000_000,
                    "global": false,
                }
            })
        );
    }

    #[test]
    fn auto_fee_serializes_as_string() {
        let value = serde_json::to_value(PrioritizationFeeLamports::Auto).expect("serialize");
        assert_eq!(value, serde_json::json!("auto"));
    }
}
