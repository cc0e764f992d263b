use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::transaction::{DecodedSwapTransaction, SignTxError};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("钱包 {0} 未注册")]
    UnknownWallet(String),
    #[error("钱包 {0} 未安装，仅提供展示信息")]
    NotInstalled(String),
    #[error("当前没有已连接的钱包")]
    Disconnected,
    #[error("钱包 {name} 连接失败: {reason}")]
    ConnectFailed { name: String, reason: String },
    #[error("签名失败: {0}")]
    Sign(#[from] SignTxError),
    #[error("钱包 {name} 不支持 {version} 交易")]
    UnsupportedVersion { name: String, version: &'static str },
}

/// 钱包声明支持的交易编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionVersion {
    Legacy,
    V0,
}

impl TransactionVersion {
    pub fn of(tx: &DecodedSwapTransaction) -> Self {
        match tx {
            DecodedSwapTransaction::Legacy(_) => TransactionVersion::Legacy,
            DecodedSwapTransaction::Versioned(_) => TransactionVersion::V0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionVersion::Legacy => "legacy",
            TransactionVersion::V0 => "v0",
        }
    }
}

/// 钱包的展示信息，连接事件的通知载荷会带上它。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMetadata {
    pub name: String,
    pub url: String,
    pub icon: String,
    /// `None` 表示未声明，视为全部支持。
    pub supported_transaction_versions: Option<Vec<TransactionVersion>>,
}

impl WalletMetadata {
    pub fn supports(&self, version: TransactionVersion) -> bool {
        match &self.supported_transaction_versions {
            Some(versions) => versions.contains(&version),
            None => true,
        }
    }
}

/// 钱包适配器的能力面：连接、断开、签名，以及当前公钥。
///
/// 外部钱包的通信协议不在本仓库范围内，这里只消费这套能力。
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn metadata(&self) -> &WalletMetadata;

    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// 本进程内是否真的可用。硬编码条目恒为 false。
    fn installed(&self) -> bool;

    /// 已连接时的公钥。
    fn pubkey(&self) -> Option<Pubkey>;

    async fn connect(&self) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// 为预构建交易补上本钱包的签名。
    async fn sign_transaction(
        &self,
        tx: &mut DecodedSwapTransaction,
    ) -> Result<(), WalletError>;
}
