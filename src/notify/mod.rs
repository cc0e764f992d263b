//! 用户可见的通知：swap 结果的 toast 替身，以及钱包连接生命周期回调。

use std::fmt;
use std::sync::Arc;

use tracing::{error, info};

use crate::wallet::WalletMetadata;

/// 钱包生命周期事件携带的描述信息。
#[derive(Debug, Clone)]
pub struct WalletNotification {
    pub public_key: String,
    pub short_address: String,
    pub wallet_name: String,
    pub metadata: WalletMetadata,
}

impl WalletNotification {
    pub fn new(public_key: impl Into<String>, wallet_name: impl Into<String>, metadata: WalletMetadata) -> Self {
        let public_key = public_key.into();
        let short_address = short_address(&public_key);
        Self {
            public_key,
            short_address,
            wallet_name: wallet_name.into(),
            metadata,
        }
    }
}

/// `abcd..wxyz` 形式的地址缩写。
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}..{tail}")
}

pub type WalletNotificationFn = Arc<dyn Fn(&WalletNotification) + Send + Sync>;

/// 连接生命周期回调，未设置的事件只打日志。
#[derive(Clone, Default)]
pub struct NotificationCallbacks {
    pub on_connect: Option<WalletNotificationFn>,
    pub on_connecting: Option<WalletNotificationFn>,
    pub on_disconnect: Option<WalletNotificationFn>,
    pub on_not_installed: Option<WalletNotificationFn>,
}

impl fmt::Debug for NotificationCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCallbacks")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_connecting", &self.on_connecting.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_not_installed", &self.on_not_installed.is_some())
            .finish()
    }
}

impl NotificationCallbacks {
    pub fn connect(&self, notification: &WalletNotification) {
        info!(
            target: "notify::wallet",
            wallet = %notification.wallet_name,
            address = %notification.short_address,
            "钱包已连接"
        );
        if let Some(callback) = &self.on_connect {
            callback(notification);
        }
    }

    pub fn connecting(&self, notification: &WalletNotification) {
        info!(
            target: "notify::wallet",
            wallet = %notification.wallet_name,
            "正在连接钱包"
        );
        if let Some(callback) = &self.on_connecting {
            callback(notification);
        }
    }

    pub fn disconnect(&self, notification: &WalletNotification) {
        info!(
            target: "notify::wallet",
            wallet = %notification.wallet_name,
            address = %notification.short_address,
            "钱包已断开"
        );
        if let Some(callback) = &self.on_disconnect {
            callback(notification);
        }
    }

    pub fn not_installed(&self, notification: &WalletNotification) {
        info!(
            target: "notify::wallet",
            wallet = %notification.wallet_name,
            "钱包未安装"
        );
        if let Some(callback) = &self.on_not_installed {
            callback(notification);
        }
    }
}

/// swap 流程的结果出口，一次运行至多触发一次。
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// 默认实现：结果写进结构化日志，对应原型里的 toast。
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "notify", outcome = "success", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "notify", outcome = "error", "{message}");
    }
}
