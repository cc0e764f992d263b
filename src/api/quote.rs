use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use super::serde_helpers::{decimal_from_string, field_as_string};

/// Jupiter 支持的 swap 模式。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SwapMode {
    #[default]
    #[serde(rename = "ExactIn", alias = "exactIn")]
    ExactIn,
    #[serde(rename = "ExactOut", alias = "exactOut")]
    ExactOut,
}

impl SwapMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SwapMode::ExactIn => "ExactIn",
            SwapMode::ExactOut => "ExactOut",
        }
    }
}

/// `/quote` 请求，按查询字符串传参。
#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    pub swap_mode: SwapMode,
    pub slippage_bps: u16,
    pub only_direct_routes: Option<bool>,
    pub as_legacy_transaction: Option<bool>,
    pub max_accounts: Option<u16>,
    pub minimize_slippage: Option<bool>,
}

impl QuoteRequest {
    pub fn new(input_mint: Pubkey, output_mint: Pubkey, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            swap_mode: SwapMode::ExactIn,
            slippage_bps,
            only_direct_routes: None,
            as_legacy_transaction: None,
            max_accounts: None,
            minimize_slippage: None,
        }
    }

    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(10);
        params.push(("inputMint".to_string(), self.input_mint.to_string()));
        params.push(("outputMint".to_string(), self.output_mint.to_string()));
        params.push(("amount".to_string(), self.amount.to_string()));
        params.push(("slippageBps".to_string(), self.slippage_bps.to_string()));
        params.push(("swapMode".to_string(), self.swap_mode.as_str().to_string()));
        if let Some(value) = self.only_direct_routes {
            params.push(("onlyDirectRoutes".to_string(), value.to_string()));
        }
        if let Some(value) = self.as_legacy_transaction {
            params.push(("asLegacyTransaction".to_string(), value.to_string()));
        }
        if let Some(value) = self.max_accounts {
            params.push(("maxAccounts".to_string(), value.to_string()));
        }
        if let Some(value) = self.minimize_slippage {
            params.push(("minimizeSlippage".to_string(), value.to_string()));
        }
        params
    }
}

/// `/quote` 响应中关心的摘要字段，其余内容原样保留在 `raw` 中回传给 `/swap`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    #[serde(with = "field_as_string")]
    pub input_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub output_mint: Pubkey,
    #[serde(with = "field_as_string")]
    pub in_amount: u64,
    #[serde(with = "field_as_string")]
    pub out_amount: u64,
    #[serde(with = "field_as_string")]
    pub other_amount_threshold: u64,
    pub swap_mode: SwapMode,
    pub slippage_bps: u16,
    #[serde(with = "decimal_from_string")]
    pub price_impact_pct: Decimal,
    #[serde(default)]
    pub context_slot: Option<u64>,
    #[serde(default)]
    pub time_taken: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct QuoteResponse {
    raw: Value,
    summary: QuoteSummary,
}

impl QuoteResponse {
    pub fn try_from_value(value: Value) -> Result<Self, serde_json::Error> {
        let summary: QuoteSummary = serde_json::from_value(value.clone())?;
        Ok(Self {
            raw: value,
            summary,
        })
    }

    /// 原始报价 JSON，`/swap` 请求需要整体回传。
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    pub fn summary(&self) -> &QuoteSummary {
        &self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_params_include_flags_only_when_set() {
        let mut request = QuoteRequest::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            100_000,
            300,
        );
        let params = request.to_query_params();
        assert!(params.iter().all(|(key, _)| key != "onlyDirectRoutes"));
        assert!(params.iter().any(|(key, value)| key == "slippageBps" && value == "300"));

        request.only_direct_routes = Some(true);
        request.as_legacy_transaction = Some(true);
        request.max_accounts = Some(64);
        let params = request.to_query_params();
        assert!(
            params
                .iter()
                .any(|(key, value)| key == "onlyDirectRoutes" && value == "true")
        );
        assert!(
            params
                .iter()
                .any(|(key, value)| key == "asLegacyTransaction" && value == "true")
        );
        assert!(params.iter().any(|(key, value)| key == "maxAccounts" && value == "64"));
    }

    #[test]
    fn quote_response_keeps_raw_value() {
        let input = Pubkey::new_unique();
        let output = Pubkey::new_unique();
        let value = serde_json::json!({
            "inputMint": input.to_string(),
            "outputMint": output.to_string(),
            "inAmount": "100000",
            "outAmount": "523187",
            "otherAmountThreshold": "507492",
            "swapMode": "ExactIn",
            "slippageBps": 300,
            "priceImpactPct": "0.0012",
            "routePlan": [{"swapInfo": {"label": "Whirlpool"}}],
        });

        let quote = QuoteResponse::try_from_value(value.clone()).expect("parse quote");
        assert_eq!(quote.summary().in_amount, 100_000);
        assert_eq!(quote.summary().out_amount, 523_187);
        assert_eq!(quote.summary().swap_mode, SwapMode::ExactIn);
        // routePlan 之类未建模的字段必须原样保留。
        assert_eq!(quote.raw(), &value);
    }
}
