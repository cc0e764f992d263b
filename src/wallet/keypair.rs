use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use tracing::debug;

use crate::config::WalletConfig;
use crate::transaction::DecodedSwapTransaction;

use super::adapter::{TransactionVersion, WalletAdapter, WalletError, WalletMetadata};

pub const KEYPAIR_WALLET_NAME: &str = "Local Keypair";

/// 内置签名适配器：用配置里的私钥在本进程内签名。
///
/// 在适配器列表里恒排第一位，是 CLI 环境下"一定在场"的那只钱包。
pub struct KeypairWalletAdapter {
    metadata: WalletMetadata,
    signer: Arc<Keypair>,
    connected: AtomicBool,
}

impl KeypairWalletAdapter {
    pub fn new(signer: Arc<Keypair>) -> Self {
        Self {
            metadata: WalletMetadata {
                name: KEYPAIR_WALLET_NAME.to_string(),
                url: String::new(),
                icon: String::new(),
                supported_transaction_versions: Some(vec![
                    TransactionVersion::Legacy,
                    TransactionVersion::V0,
                ]),
            },
            signer,
            connected: AtomicBool::new(false),
        }
    }

    /// 环境变量 `JUNO_PRIVATE_KEY` 优先，其次是配置文件。
    pub fn from_wallet_config(wallet: &WalletConfig) -> Result<Self, WalletError> {
        let signer = load_keypair(wallet)?;
        Ok(Self::new(signer))
    }
}

#[async_trait]
impl WalletAdapter for KeypairWalletAdapter {
    fn metadata(&self) -> &WalletMetadata {
        &self.metadata
    }

    fn installed(&self) -> bool {
        true
    }

    fn pubkey(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::Acquire)
            .then(|| self.signer.pubkey())
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::Release);
        debug!(
            target: "wallet::keypair",
            pubkey = %self.signer.pubkey(),
            "本地签名适配器已连接"
        );
        Ok(self.signer.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    async fn sign_transaction(
        &self,
        tx: &mut DecodedSwapTransaction,
    ) -> Result<(), WalletError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(WalletError::Disconnected);
        }
        let version = TransactionVersion::of(tx);
        if !self.metadata.supports(version) {
            return Err(WalletError::UnsupportedVersion {
                name: self.metadata.name.clone(),
                version: version.as_str(),
            });
        }
        tx.sign_in_place(&self.signer)?;
        Ok(())
    }
}

fn load_keypair(wallet: &WalletConfig) -> Result<Arc<Keypair>, WalletError> {
    if let Ok(value) = env::var("JUNO_PRIVATE_KEY") {
        if !value.trim().is_empty() {
            let keypair = parse_keypair_string(value.trim()).map_err(|err| {
                WalletError::ConnectFailed {
                    name: KEYPAIR_WALLET_NAME.to_string(),
                    reason: format!("环境变量 JUNO_PRIVATE_KEY 非法: {err}"),
                }
            })?;
            return Ok(Arc::new(keypair));
        }
    }

    if !wallet.private_key.trim().is_empty() {
        let keypair = parse_keypair_string(wallet.private_key.trim()).map_err(|err| {
            WalletError::ConnectFailed {
                name: KEYPAIR_WALLET_NAME.to_string(),
                reason: format!("配置 global.wallet.private_key 非法: {err}"),
            }
        })?;
        return Ok(Arc::new(keypair));
    }

    Err(WalletError::ConnectFailed {
        name: KEYPAIR_WALLET_NAME.to_string(),
        reason: "缺少私钥配置，请提供 global.wallet.private_key 或环境变量 JUNO_PRIVATE_KEY"
            .to_string(),
    })
}

/// 支持 bs58、JSON 数组、逗号分隔字节三种私钥写法。
pub fn parse_keypair_string(raw: &str) -> Result<Keypair, anyhow::Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("keypair string empty");
    }

    if trimmed.starts_with('[') {
        let bytes: Vec<u8> = serde_json::from_str(trimmed)?;
        Ok(Keypair::try_from(bytes.as_slice())?)
    } else if trimmed.contains(',') {
        let bytes = trimmed
            .split(',')
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<u8>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Keypair::try_from(bytes.as_slice())?)
    } else {
        let data = bs58::decode(trimmed).into_vec()?;
        Ok(Keypair::try_from(data.as_slice())?)
    }
}
