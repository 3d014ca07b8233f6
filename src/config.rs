//! 运行配置
//!
//! 凭据可以来自环境变量（`APPER_PROJECT_ID`、`APPER_PUBLIC_KEY`、`APPER_ENDPOINT`），
//! 也可以来自 TOML 文件。缺少凭据时无法构造客户端。

use std::fs;
use std::path::Path;
use std::time::Duration;
use serde::Deserialize;
use crate::core::{GatewayError, Result};

pub const PROJECT_ID_VAR: &str = "APPER_PROJECT_ID";
pub const PUBLIC_KEY_VAR: &str = "APPER_PUBLIC_KEY";
pub const ENDPOINT_VAR: &str = "APPER_ENDPOINT";
pub const TICK_INTERVAL_VAR: &str = "UPLOAD_TICK_INTERVAL_MS";
pub const TIMEOUT_VAR: &str = "APPER_TIMEOUT_SECS";

const DEFAULT_TICK_INTERVAL_MS: u64 = 150;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 记录服务地址，HTTP 客户端必填
    #[serde(default)]
    pub endpoint: Option<String>,
    pub project_id: String,
    pub public_key: String,
    /// 模拟上传每一步的间隔
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Config {
    /// 从 TOML 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .map_err(|err| GatewayError::config(format!("Can't read {}: {}", path.display(), err)))?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(config_str)
            .map_err(|err| GatewayError::config(format!("Can't load config: {}", err)))?;
        config.validate()
    }

    /// 从环境变量加载
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| GatewayError::config(format!("{} must be set", key)))
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map_err(|err| GatewayError::config(format!("{} is not a number: {}", key, err))),
                None => Ok(default),
            }
        };

        let config = Config {
            endpoint: lookup(ENDPOINT_VAR),
            project_id: required(PROJECT_ID_VAR)?,
            public_key: required(PUBLIC_KEY_VAR)?,
            tick_interval_ms: number(TICK_INTERVAL_VAR, DEFAULT_TICK_INTERVAL_MS)?,
            timeout_secs: number(TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS)?,
        };
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.project_id.trim().is_empty() {
            return Err(GatewayError::config(format!("{} must not be empty", PROJECT_ID_VAR)));
        }
        if self.public_key.trim().is_empty() {
            return Err(GatewayError::config(format!("{} must not be empty", PUBLIC_KEY_VAR)));
        }
        Ok(self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
