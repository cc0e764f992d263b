//! 签名后交易的落地与确认。

pub mod error;
pub mod rpc;

use async_trait::async_trait;

use crate::transaction::DecodedSwapTransaction;

pub use error::LanderError;
pub use rpc::RpcLander;

/// 落地回执，确认完成后返回。
#[derive(Debug, Clone)]
pub struct LanderReceipt {
    pub lander: &'static str,
    pub endpoint: String,
    pub signature: String,
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

/// 广播一笔已签名交易并等待确认。swap 流程经由该 trait 落地，
/// 测试里可以替换为桩实现。
#[async_trait]
pub trait TransactionLander: Send + Sync {
    async fn land(&self, tx: &DecodedSwapTransaction) -> Result<LanderReceipt, LanderError>;
}
