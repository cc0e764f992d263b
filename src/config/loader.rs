use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use super::JunoConfig;

pub const DEFAULT_CONFIG_PATHS: &[&str] = &["juno.toml", "config/juno.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// 依次尝试候选路径，命中即用；全部缺失时落回内置默认值。
pub fn load_config(path: Option<PathBuf>) -> Result<JunoConfig, ConfigError> {
    let candidate_paths = match path {
        Some(p) => vec![p],
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .collect::<Vec<PathBuf>>(),
    };

    for candidate in candidate_paths {
        if let Some(config) = try_load_file(&candidate)? {
            validate(&config)?;
            return Ok(config);
        }
    }

    let config = JunoConfig::default();
    validate(&config)?;
    Ok(config)
}

fn try_load_file(path: &Path) -> Result<Option<JunoConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: JunoConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(config))
}

fn validate(config: &JunoConfig) -> Result<(), ConfigError> {
    Url::parse(&config.swap.base_url)
        .map_err(|err| ConfigError::Invalid(format!("swap.base_url 非法: {err}")))?;

    if let Some(rpc_url) = &config.global.rpc_url {
        if !rpc_url.trim().is_empty() {
            Url::parse(rpc_url)
                .map_err(|err| ConfigError::Invalid(format!("global.rpc_url 非法: {err}")))?;
        }
    }

    if config.swap.amount == 0 {
        return Err(ConfigError::Invalid("swap.amount 不能为 0".to_string()));
    }

    Ok(())
}
