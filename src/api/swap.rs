use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use super::serde_helpers::field_as_string;
use super::transaction_config::TransactionConfig;

/// `/swap` 请求体。报价 JSON 整体回传，其余开关展开到顶层。
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    #[serde(with = "field_as_string")]
    pub user_public_key: Pubkey,
    pub quote_response: Value,
    #[serde(flatten)]
    pub config: TransactionConfig,
}

impl SwapRequest {
    pub fn new(quote_response: Value, user_public_key: Pubkey) -> Self {
        Self {
            user_public_key,
            quote_response,
            config: TransactionConfig::default(),
        }
    }
}

/// `/swap` 响应体。除 base64 交易外的字段原样保留。
#[derive(Debug, Clone)]
pub struct SwapResponse {
    #[allow(dead_code)]
    pub raw: Value,
    pub swap_transaction: String,
    pub last_valid_block_height: Option<u64>,
    pub prioritization_fee_lamports: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponseInternal {
    swap_transaction: String,
    #[serde(default)]
    last_valid_block_height: Option<u64>,
    #[serde(default)]
    prioritization_fee_lamports: Option<u64>,
}

impl SwapResponse {
    pub fn try_from_value(value: Value) -> Result<Self, serde_json::Error> {
        let internal: SwapResponseInternal = serde_json::from_value(value.clone())?;
        Ok(Self {
            raw: value,
            swap_transaction: internal.swap_transaction,
            last_valid_block_height: internal.last_valid_block_height,
            prioritization_fee_lamports: internal.prioritization_fee_lamports,
        })
    }
}
