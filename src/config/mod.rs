use std::path::PathBuf;

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

pub(crate) fn default_listen() -> String {
    "0.0.0.0:9184".to_string()
}

pub(crate) fn default_storage_path() -> PathBuf {
    PathBuf::from(".juno/wallet.json")
}

pub(crate) fn default_base_url() -> String {
    "https://quote-api.jup.ag/v6".to_string()
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    10_000
}

/// USDC mint。
pub(crate) fn default_input_mint() -> String {
    "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string()
}

/// wSOL mint。
pub(crate) fn default_output_mint() -> String {
    "So11111111111111111111111111111111111111112".to_string()
}

/// 0.1 USDC（6 位小数）。
pub(crate) fn default_amount() -> u64 {
    100_000
}

pub(crate) fn default_slippage_bps() -> u16 {
    300
}

pub(crate) fn default_max_accounts() -> u16 {
    64
}

pub(crate) fn default_max_lamports() -> u64 {
    4_000_000
}

pub(crate) fn default_max_retries() -> usize {
    2
}
