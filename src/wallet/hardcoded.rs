use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

use crate::config::HardcodedWalletEntry;
use crate::transaction::DecodedSwapTransaction;

use super::adapter::{WalletAdapter, WalletError, WalletMetadata};

/// 静态配置的钱包条目：只出现在钱包列表里，连接会走"未安装"分支。
pub struct HardcodedWalletAdapter {
    metadata: WalletMetadata,
}

impl HardcodedWalletAdapter {
    pub fn new(entry: &HardcodedWalletEntry) -> Self {
        Self {
            metadata: WalletMetadata {
                name: entry.name.clone(),
                url: entry.url.clone(),
                icon: entry.icon.clone(),
                supported_transaction_versions: None,
            },
        }
    }
}

#[async_trait]
impl WalletAdapter for HardcodedWalletAdapter {
    fn metadata(&self) -> &WalletMetadata {
        &self.metadata
    }

    fn installed(&self) -> bool {
        false
    }

    fn pubkey(&self) -> Option<Pubkey> {
        None
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        Err(WalletError::NotInstalled(self.metadata.name.clone()))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        Ok(())
    }

    async fn sign_transaction(
        &self,
        _tx: &mut DecodedSwapTransaction,
    ) -> Result<(), WalletError> {
        Err(WalletError::NotInstalled(self.metadata.name.clone()))
    }
}
