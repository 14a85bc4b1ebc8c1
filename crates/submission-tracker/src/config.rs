use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::TrackerError;

type Result<T> = anyhow::Result<T>;

/// 最长轮询时长上限（一天）。
pub const MAX_POLL_DURATION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

impl TrackerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::read_file(path)?;
        config
            .validate()
            .with_context(|| format!("invalid config file: {}", path.display()))?;
        Ok(config)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config = Self::parse_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 读取并解析配置文件，但不做校验，便于调用方先应用覆盖项。
    pub fn read_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// 仅做 TOML 反序列化，不做校验。
    pub fn parse_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to deserialize tracker config")
    }

    /// 用命令行或环境变量提供的值覆盖后端地址与访问令牌。
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        access_token: Option<String>,
    ) -> Self {
        if let Some(base_url) = base_url {
            self.api.base_url = base_url;
        }
        if let Some(access_token) = access_token {
            self.api.access_token = Some(access_token);
        }
        self
    }

    /// 默认配置，仅需指定后端地址。
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                request_timeout_ms: default_request_timeout_ms(),
                access_token: None,
            },
            polling: PollingConfig::default(),
            event_buffer_size: default_event_buffer_size(),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), TrackerError> {
        if self.api.base_url.trim().is_empty() {
            return Err(TrackerError::Config("api.base_url must not be empty".to_string()));
        }
        if self.polling.interval_ms == 0 {
            return Err(TrackerError::Config(
                "polling.interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.polling.max_duration_secs == 0 {
            return Err(TrackerError::Config(
                "polling.max_duration_secs must be greater than 0".to_string(),
            ));
        }
        if self.polling.max_duration_secs > MAX_POLL_DURATION_SECS {
            return Err(TrackerError::Config(format!(
                "polling.max_duration_secs must not exceed {MAX_POLL_DURATION_SECS}"
            )));
        }
        if self.polling.interval() > self.polling.max_duration() {
            return Err(TrackerError::Config(
                "polling.interval_ms must not exceed polling.max_duration_secs".to_string(),
            ));
        }
        if self.polling.request_timeout_ms == 0 {
            return Err(TrackerError::Config(
                "polling.request_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(TrackerError::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    /// 单次轮询请求的超时，超时按丢失一次轮询处理。
    #[serde(default = "default_poll_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_duration_secs: default_max_duration_secs(),
            request_timeout_ms: default_poll_timeout_ms(),
        }
    }
}

fn default_event_buffer_size() -> usize {
    256
}

fn default_request_timeout_ms() -> u64 {
    50_000
}

fn default_interval_ms() -> u64 {
    1_000
}

fn default_max_duration_secs() -> u64 {
    300
}

fn default_poll_timeout_ms() -> u64 {
    10_000
}
