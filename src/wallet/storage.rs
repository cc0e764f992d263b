use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("读取钱包状态 {path} 失败: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("写入钱包状态 {path} 失败: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("钱包状态 {path} 解析失败: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("钱包状态序列化失败: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// 落盘的连接记录，对应浏览器 localStorage 里的 `walletName` 键
/// 与先前连接列表。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedWalletState {
    /// 上次使用的钱包名。
    #[serde(default)]
    pub wallet_name: Option<String>,
    /// 连接过的钱包，最近的排最前。
    #[serde(default)]
    pub previously_connected: Vec<String>,
}

impl PersistedWalletState {
    /// 连接成功后的状态变更：记下钱包名并把它提到历史列表最前。
    pub fn record_connected(&mut self, name: &str) {
        self.wallet_name = Some(name.to_string());
        self.previously_connected.retain(|entry| entry != name);
        self.previously_connected.insert(0, name.to_string());
    }

    /// 断开只清除当前钱包名，历史保留。
    pub fn record_disconnected(&mut self) {
        self.wallet_name = None;
    }
}

#[derive(Debug, Clone)]
pub struct WalletStorage {
    path: PathBuf,
}

impl WalletStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件缺失等价于冷启动的 localStorage：返回空状态。
    pub fn load(&self) -> Result<PersistedWalletState, StorageError> {
        if !self.path.exists() {
            return Ok(PersistedWalletState::default());
        }
        let contents = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    pub fn store(&self, state: &PersistedWalletState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }
        let contents = serde_json::to_string_pretty(state).map_err(StorageError::Serialize)?;
        fs::write(&self.path, contents).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
