use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use super::{
    default_amount, default_base_url, default_input_mint, default_listen, default_logging_level,
    default_max_accounts, default_max_lamports, default_max_retries, default_output_mint,
    default_request_timeout_ms, default_slippage_bps, default_storage_path, default_true,
};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct JunoConfig {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub prometheus: PrometheusConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub swap: SwapFlowConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GlobalConfig {
    /// Solana RPC 入口，缺省时回落到主网公共节点。
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WalletConfig {
    /// 内置签名适配器的私钥，支持 bs58 / JSON 数组 / 逗号分隔字节三种写法。
    /// 环境变量 `JUNO_PRIVATE_KEY` 优先。
    #[serde(default)]
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            enable: false,
            listen: default_listen(),
        }
    }
}

/// 网络环境，对应 wallet-adapter 的 cluster 概念。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Cluster {
    #[default]
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
    #[serde(rename = "testnet")]
    Testnet,
    #[serde(rename = "devnet")]
    Devnet,
}

impl Cluster {
    pub fn as_str(self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Testnet => "testnet",
            Cluster::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Jupiter,
}

/// 界面语言，提供方构造时消费一次。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Zh,
    Vi,
    Fr,
    Ja,
    Id,
    Ru,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_urls: Vec<String>,
}

/// 静态配置的"硬编码"钱包条目，只有展示信息，没有本地实现。
#[derive(Debug, Clone, Deserialize)]
pub struct HardcodedWalletEntry {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    #[serde(default)]
    pub env: Cluster,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub lang: Lang,
    #[serde(default)]
    pub metadata: AppMetadata,
    /// 钱包展示顺序，列出的名字排前，其余保持原相对顺序。
    #[serde(default)]
    pub wallet_precedence: Vec<String>,
    #[serde(default)]
    pub hardcoded_wallets: Vec<HardcodedWalletEntry>,
    /// 记录上次连接钱包的状态文件。
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            auto_connect: true,
            env: Cluster::default(),
            theme: Theme::default(),
            lang: Lang::default(),
            metadata: AppMetadata::default(),
            wallet_precedence: Vec::new(),
            hardcoded_wallets: Vec::new(),
            storage_path: default_storage_path(),
        }
    }
}

/// 演示 swap 流程的全部参数，缺省值复刻 0.1 USDC 换 wSOL 的示例。
#[derive(Debug, Clone, Deserialize)]
pub struct SwapFlowConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_input_mint")]
    pub input_mint: String,
    #[serde(default = "default_output_mint")]
    pub output_mint: String,
    #[serde(default = "default_amount")]
    pub amount: u64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u16,
    #[serde(default = "default_max_accounts")]
    pub max_accounts: u16,
    #[serde(default = "default_max_lamports")]
    pub priority_max_lamports: u64,
    #[serde(default = "default_true")]
    pub skip_preflight: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for SwapFlowConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            input_mint: default_input_mint(),
            output_mint: default_output_mint(),
            amount: default_amount(),
            slippage_bps: default_slippage_bps(),
            max_accounts: default_max_accounts(),
            priority_max_lamports: default_max_lamports(),
            skip_preflight: true,
            max_retries: default_max_retries(),
        }
    }
}
