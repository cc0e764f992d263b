//! 钱包连接提供方：组装适配器列表、维护当前连接、触发生命周期通知，
//! 并在启动时按持久化记录做一次自动连接。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, warn};

use crate::config::{Cluster, Lang, ProviderConfig, Theme};
use crate::notify::{NotificationCallbacks, WalletNotification};

use super::adapter::{WalletAdapter, WalletError};
use super::hardcoded::HardcodedWalletAdapter;
use super::storage::{PersistedWalletState, WalletStorage};

pub struct WalletConnectionProvider {
    adapters: Vec<Arc<dyn WalletAdapter>>,
    callbacks: NotificationCallbacks,
    storage: WalletStorage,
    auto_connect: bool,
    env: Cluster,
    theme: Theme,
    lang: Lang,
    connected: Mutex<Option<Arc<dyn WalletAdapter>>>,
    auto_connect_attempted: AtomicBool,
}

impl WalletConnectionProvider {
    /// 适配器列表的组装顺序固定：内置签名适配器最前，随后是调用方传入的，
    /// 最后是配置里的硬编码条目；再按 `wallet_precedence` 重排展示顺序。
    pub fn new(
        built_in: Arc<dyn WalletAdapter>,
        passed: Vec<Arc<dyn WalletAdapter>>,
        config: &ProviderConfig,
        callbacks: NotificationCallbacks,
    ) -> Self {
        let mut adapters: Vec<Arc<dyn WalletAdapter>> = Vec::with_capacity(
            1 + passed.len() + config.hardcoded_wallets.len(),
        );
        adapters.push(built_in);
        adapters.extend(passed);
        for entry in &config.hardcoded_wallets {
            adapters.push(Arc::new(HardcodedWalletAdapter::new(entry)));
        }
        let adapters = order_by_precedence(adapters, &config.wallet_precedence);

        Self {
            adapters,
            callbacks,
            storage: WalletStorage::new(config.storage_path.clone()),
            auto_connect: config.auto_connect,
            env: config.env,
            theme: config.theme,
            lang: config.lang,
            connected: Mutex::new(None),
            auto_connect_attempted: AtomicBool::new(false),
        }
    }

    pub fn adapters(&self) -> &[Arc<dyn WalletAdapter>] {
        &self.adapters
    }

    pub fn env(&self) -> Cluster {
        self.env
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn storage(&self) -> &WalletStorage {
        &self.storage
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn WalletAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| adapter.name() == name)
            .cloned()
    }

    /// 当前已连接的适配器。
    pub fn current(&self) -> Option<Arc<dyn WalletAdapter>> {
        self.connected.lock().clone()
    }

    pub async fn connect(&self, name: &str) -> Result<Pubkey, WalletError> {
        let adapter = self
            .find(name)
            .ok_or_else(|| WalletError::UnknownWallet(name.to_string()))?;

        if !adapter.installed() {
            let notification =
                WalletNotification::new(String::new(), adapter.name(), adapter.metadata().clone());
            self.callbacks.not_installed(&notification);
            return Err(WalletError::NotInstalled(adapter.name().to_string()));
        }

        let connecting =
            WalletNotification::new(String::new(), adapter.name(), adapter.metadata().clone());
        self.callbacks.connecting(&connecting);

        let pubkey = adapter.connect().await?;
        *self.connected.lock() = Some(adapter.clone());

        self.persist(|state| state.record_connected(adapter.name()));

        let connected =
            WalletNotification::new(pubkey.to_string(), adapter.name(), adapter.metadata().clone());
        self.callbacks.connect(&connected);

        Ok(pubkey)
    }

    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let adapter = self
            .connected
            .lock()
            .take()
            .ok_or(WalletError::Disconnected)?;

        let pubkey = adapter.pubkey().map(|key| key.to_string()).unwrap_or_default();
        adapter.disconnect().await?;

        self.persist(PersistedWalletState::record_disconnected);

        let notification =
            WalletNotification::new(pubkey, adapter.name(), adapter.metadata().clone());
        self.callbacks.disconnect(&notification);

        Ok(())
    }

    /// 启动时的自动连接，至多执行一次。
    ///
    /// 仅当配置开启 auto_connect，且持久化的钱包名恰好等于先前连接列表
    /// 的头部时才触发；连接失败只记日志，不重试也不回退。
    pub async fn auto_connect_once(&self) -> Option<Pubkey> {
        if !self.auto_connect {
            return None;
        }
        if self.auto_connect_attempted.swap(true, Ordering::AcqRel) {
            return None;
        }

        let state = match self.storage.load() {
            Ok(state) => state,
            Err(err) => {
                warn!(target: "wallet::provider", error = %err, "读取钱包状态失败，跳过自动连接");
                return None;
            }
        };

        let wallet_name = state.wallet_name.as_deref()?;
        let last_connected = state.previously_connected.first()?;
        if wallet_name != last_connected {
            debug!(
                target: "wallet::provider",
                wallet_name,
                last_connected,
                "持久化钱包名与连接历史不一致，跳过自动连接"
            );
            return None;
        }

        let name = wallet_name.to_string();
        match self.connect(&name).await {
            Ok(pubkey) => Some(pubkey),
            Err(err) => {
                self.on_adapter_error(&name, &err);
                None
            }
        }
    }

    /// 对应原型里的 no-op 错误回调：记录后吞掉。
    fn on_adapter_error(&self, adapter: &str, error: &WalletError) {
        debug!(target: "wallet::provider", adapter, error = %error, "钱包适配器错误（已忽略）");
    }

    fn persist(&self, mutate: impl FnOnce(&mut PersistedWalletState)) {
        let mut state = match self.storage.load() {
            Ok(state) => state,
            Err(err) => {
                warn!(target: "wallet::provider", error = %err, "读取钱包状态失败，重置为初始状态");
                PersistedWalletState::default()
            }
        };
        mutate(&mut state);
        if let Err(err) = self.storage.store(&state) {
            warn!(target: "wallet::provider", error = %err, "写入钱包状态失败");
        }
    }
}

/// `precedence` 里列出的名字按给定次序排前，未列出的保持原有相对顺序。
fn order_by_precedence(
    adapters: Vec<Arc<dyn WalletAdapter>>,
    precedence: &[String],
) -> Vec<Arc<dyn WalletAdapter>> {
    if precedence.is_empty() {
        return adapters;
    }

    let mut ordered: Vec<Arc<dyn WalletAdapter>> = Vec::with_capacity(adapters.len());
    let mut rest: Vec<Arc<dyn WalletAdapter>> = Vec::new();

    for adapter in adapters {
        if !precedence.iter().any(|name| name == adapter.name()) {
            rest.push(adapter);
        } else {
            ordered.push(adapter);
        }
    }

    ordered.sort_by_key(|adapter| {
        precedence
            .iter()
            .position(|name| name == adapter.name())
            .unwrap_or(usize::MAX)
    });
    ordered.extend(rest);
    ordered
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use solana_sdk::signature::{Keypair, Signer};

    use super::*;
    use crate::transaction::DecodedSwapTransaction;
    use crate::wallet::adapter::WalletMetadata;

    struct StubAdapter {
        metadata: WalletMetadata,
        pubkey: Pubkey,
        connect_calls: AtomicUsize,
    }

    impl StubAdapter {
        fn new(name: &str) -> Self {
            Self {
                metadata: WalletMetadata {
                    name: name.to_string(),
                    url: String::new(),
                    icon: String::new(),
                    supported_transaction_versions: None,
                },
                pubkey: Keypair::new().pubkey(),
                connect_calls: AtomicUsize::new(0),
            }
        }

        fn connect_calls(&self) -> usize {
            self.connect_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WalletAdapter for StubAdapter {
        fn metadata(&self) -> &WalletMetadata {
            &self.metadata
        }

        fn installed(&self) -> bool {
            true
        }

        fn pubkey(&self) -> Option<Pubkey> {
            Some(self.pubkey)
        }

        async fn connect(&self) -> Result<Pubkey, WalletError> {
            self.connect_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pubkey)
        }

        async fn disconnect(&self) -> Result<(), WalletError> {
            Ok(())
        }

        async fn sign_transaction(
            &self,
            _tx: &mut DecodedSwapTransaction,
        ) -> Result<(), WalletError> {
            Ok(())
        }
    }

    fn provider_config(dir: &tempfile::TempDir, auto_connect: bool) -> ProviderConfig {
        ProviderConfig {
            auto_connect,
            storage_path: dir.path().join("wallet.json"),
            ..ProviderConfig::default()
        }
    }

    fn seeded_storage(config: &ProviderConfig, wallet_name: Option<&str>, history: &[&str]) {
        let storage = WalletStorage::new(config.storage_path.clone());
        let state = PersistedWalletState {
            wallet_name: wallet_name.map(str::to_string),
            previously_connected: history.iter().map(|s| s.to_string()).collect(),
        };
        storage.store(&state).expect("seed storage");
    }

    #[tokio::test]
    async fn auto_connect_fires_on_matching_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = provider_config(&dir, true);
        seeded_storage(&config, Some("Stub"), &["Stub", "Other"]);

        let stub = Arc::new(StubAdapter::new("Stub"));
        let provider = WalletConnectionProvider::new(
            stub.clone(),
            Vec::new(),
            &config,
            NotificationCallbacks::default(),
        );

        let pubkey = provider.auto_connect_once().await;
        assert_eq!(pubkey, Some(stub.pubkey));
        assert_eq!(stub.connect_calls(), 1);
        assert!(provider.current().is_some());

        // 第二次调用不得重复触发连接。
        assert!(provider.auto_connect_once().await.is_none());
        assert_eq!(stub.connect_calls(), 1);
    }

    #[tokio::test]
    async fn auto_connect_skips_on_mismatch_or_disabled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = provider_config(&dir, true);
        seeded_storage(&config, Some("Stub"), &["Other", "Stub"]);

        let stub = Arc::new(StubAdapter::new("Stub"));
        let provider = WalletConnectionProvider::new(
            stub.clone(),
            Vec::new(),
            &config,
            NotificationCallbacks::default(),
        );
        assert!(provider.auto_connect_once().await.is_none());
        assert_eq!(stub.connect_calls(), 0);

        let config = provider_config(&dir, false);
        seeded_storage(&config, Some("Stub"), &["Stub"]);
        let stub = Arc::new(StubAdapter::new("Stub"));
        let provider = WalletConnectionProvider::new(
            stub.clone(),
            Vec::new(),
            &config,
            NotificationCallbacks::default(),
        );
        assert!(provider.auto_connect_once().await.is_none());
        assert_eq!(stub.connect_calls(), 0);
    }

    #[tokio::test]
    async fn connect_persists_name_and_fires_callbacks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = provider_config(&dir, false);

        let connects = Arc::new(AtomicUsize::new(0));
        let connectings = Arc::new(AtomicUsize::new(0));
        let callbacks = NotificationCallbacks {
            on_connect: Some({
                let connects = connects.clone();
                Arc::new(move |_| {
                    connects.fetch_add(1, Ordering::SeqCst);
                })
            }),
            on_connecting: Some({
                let connectings = connectings.clone();
                Arc::new(move |_| {
                    connectings.fetch_add(1, Ordering::SeqCst);
                })
            }),
            ..NotificationCallbacks::default()
        };

        let stub = Arc::new(StubAdapter::new("Stub"));
        let provider =
            WalletConnectionProvider::new(stub.clone(), Vec::new(), &config, callbacks);

        provider.connect("Stub").await.expect("connect");
        assert_eq!(connectings.load(Ordering::SeqCst), 1);
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        let state = provider.storage().load().expect("load");
        assert_eq!(state.wallet_name.as_deref(), Some("Stub"));
        assert_eq!(state.previously_connected, vec!["Stub"]);

        provider.disconnect().await.expect("disconnect");
        let state = provider.storage().load().expect("load");
        assert_eq!(state.wallet_name, None);
        assert_eq!(state.previously_connected, vec!["Stub"]);
    }

    #[tokio::test]
    async fn hardcoded_wallet_routes_to_not_installed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = provider_config(&dir, false);
        config.hardcoded_wallets = vec![crate::config::HardcodedWalletEntry {
            name: "Backpack".to_string(),
            url: "https://backpack.app".to_string(),
            icon: String::new(),
        }];

        let not_installed = Arc::new(AtomicUsize::new(0));
        let callbacks = NotificationCallbacks {
            on_not_installed: Some({
                let not_installed = not_installed.clone();
                Arc::new(move |_| {
                    not_installed.fetch_add(1, Ordering::SeqCst);
                })
            }),
            ..NotificationCallbacks::default()
        };

        let provider = WalletConnectionProvider::new(
            Arc::new(StubAdapter::new("Stub")),
            Vec::new(),
            &config,
            callbacks,
        );

        assert!(matches!(
            provider.connect("Backpack").await,
            Err(WalletError::NotInstalled(_))
        ));
        assert_eq!(not_installed.load(Ordering::SeqCst), 1);
        assert!(provider.current().is_none());
    }

    #[test]
    fn precedence_reorders_listed_wallets_first() {
        let adapters: Vec<Arc<dyn WalletAdapter>> = vec![
            Arc::new(StubAdapter::new("Alpha")),
            Arc::new(StubAdapter::new("Beta")),
            Arc::new(StubAdapter::new("Gamma")),
            Arc::new(StubAdapter::new("Delta")),
        ];
        let precedence = vec!["Gamma".to_string(), "Beta".to_string()];
        let ordered = order_by_precedence(adapters, &precedence);
        let names: Vec<&str> = ordered.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["Gamma", "Beta", "Alpha", "Delta"]);
    }
}
