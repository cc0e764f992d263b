use std::sync::Arc;
use std::time::Duration;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_commitment_config::CommitmentConfig;
use tracing::{debug, info};

use crate::transaction::DecodedSwapTransaction;

use super::error::LanderError;
use super::{LanderReceipt, TransactionLander};

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(400);

/// 经由标准 RPC 节点广播并轮询确认。
pub struct RpcLander {
    client: Arc<RpcClient>,
    config: RpcSendTransactionConfig,
    commitment: CommitmentConfig,
}

impl RpcLander {
    pub fn new(client: Arc<RpcClient>, skip_preflight: bool, max_retries: usize) -> Self {
        let config = RpcSendTransactionConfig {
            skip_preflight,
            max_retries: Some(max_retries),
            ..RpcSendTransactionConfig::default()
        };
        Self {
            client,
            config,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

#[async_trait::async_trait]
impl TransactionLander for RpcLander {
    async fn land(&self, tx: &DecodedSwapTransaction) -> Result<LanderReceipt, LanderError> {
        // 发送前抓取 blockhash 高度上限，确认窗口以它为界。
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;

        let signature = match tx {
            DecodedSwapTransaction::Legacy(tx) => {
                self.client
                    .send_transaction_with_config(tx, self.config.clone())
                    .await?
            }
            DecodedSwapTransaction::Versioned(tx) => {
                self.client
                    .send_transaction_with_config(tx, self.config.clone())
                    .await?
            }
        };

        info!(
            target: "lander::rpc",
            signature = %signature,
            blockhash = %blockhash,
            last_valid_block_height,
            skip_preflight = self.config.skip_preflight,
            max_retries = ?self.config.max_retries,
            variant = tx.variant_name(),
            "transaction submitted via rpc client"
        );

        loop {
            let confirmed = self
                .client
                .confirm_transaction_with_commitment(&signature, self.commitment)
                .await?;
            if confirmed.value {
                break;
            }

            let block_height = self.client.get_block_height().await?;
            if block_height > last_valid_block_height {
                return Err(LanderError::BlockhashExpired {
                    signature: signature.to_string(),
                    block_height,
                    last_valid_block_height,
                });
            }

            debug!(
                target: "lander::rpc",
                signature = %signature,
                block_height,
                last_valid_block_height,
                "等待确认中"
            );
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }

        Ok(LanderReceipt {
            lander: "rpc",
            endpoint: self.client.url(),
            signature: signature.to_string(),
            blockhash: blockhash.to_string(),
            last_valid_block_height,
        })
    }
}
