use std::fmt;

use solana_client::client_error::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LanderError {
    #[error("RPC 提交失败: {0}")]
    Rpc(#[from] ClientError),
    #[error("blockhash 已过期（区块高度 {block_height} > {last_valid_block_height}），签名 {signature} 未确认")]
    BlockhashExpired {
        signature: String,
        block_height: u64,
        last_valid_block_height: u64,
    },
    #[error("{0}")]
    Fatal(String),
}

impl LanderError {
    pub fn fatal(reason: impl fmt::Display) -> Self {
        Self::Fatal(reason.to_string())
    }
}
