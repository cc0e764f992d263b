pub mod adapter;
pub mod hardcoded;
pub mod keypair;
pub mod provider;
pub mod storage;

pub use adapter::{TransactionVersion, WalletAdapter, WalletError, WalletMetadata};
pub use hardcoded::HardcodedWalletAdapter;
pub use keypair::{KEYPAIR_WALLET_NAME, KeypairWalletAdapter, parse_keypair_string};
pub use provider::WalletConnectionProvider;
pub use storage::{PersistedWalletState, StorageError, WalletStorage};
