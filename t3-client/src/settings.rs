//! 客户端设置
//!
//! 设置保存在 `<配置目录>/t-cubed/settings.json`，文件缺失或格式无效时使用默认值。
//! 环境变量 `T3_SERVER_URL` 覆盖服务器地址。

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use protocol::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_SERVER_URL, DRAIN_INTERVAL_MS,
    MINIMAX_STEP_DELAY_MS, NEURAL_STEP_DELAY_MS,
};
use serde::{Deserialize, Serialize};

use crate::network::{BackoffCurve, RetryPolicy};

/// 服务器地址环境变量
pub const SERVER_URL_ENV: &str = "T3_SERVER_URL";

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 用于 EnvFilter 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    // === 网络 ===
    /// 游戏服务地址
    pub server_url: String,
    /// 失败后最多重试次数
    pub max_retries: u32,
    /// 首次重试延迟（毫秒）
    pub initial_retry_delay_ms: u64,
    /// 退避曲线
    pub backoff: BackoffCurve,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,

    // === 动画 ===
    pub minimax_step_delay_ms: u64,
    pub neural_step_delay_ms: u64,
    /// 事件队列兜底轮询间隔（毫秒）
    pub drain_interval_ms: u64,

    // === 高级 ===
    pub log_level: LogLevel,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            initial_retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            backoff: BackoffCurve::default(),
            request_timeout_secs: 10,

            minimax_step_delay_ms: MINIMAX_STEP_DELAY_MS,
            neural_step_delay_ms: NEURAL_STEP_DELAY_MS,
            drain_interval_ms: DRAIN_INTERVAL_MS,

            log_level: LogLevel::default(),
        }
    }
}

impl ClientSettings {
    /// 获取设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("t-cubed");
            path.push("settings.json");
            path
        })
    }

    /// 从默认位置加载，并应用环境变量覆盖
    pub fn load() -> Self {
        let settings = match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Config directory unavailable, using default settings");
                Self::default()
            }
        };
        settings.with_server_override(std::env::var(SERVER_URL_ENV).ok())
    }

    /// 从指定文件加载
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("Settings file {:?} not found, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    tracing::info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Invalid settings file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path().context("Config directory unavailable")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// 保存到指定文件
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {:?}", path))?;

        tracing::info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// 非空时覆盖服务器地址
    pub fn with_server_override(mut self, server_url: Option<String>) -> Self {
        if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
            self.server_url = url;
        }
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.initial_retry_delay_ms))
            .with_curve(self.backoff)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn minimax_step_delay(&self) -> Duration {
        Duration::from_millis(self.minimax_step_delay_ms)
    }

    pub fn neural_step_delay(&self) -> Duration {
        Duration::from_millis(self.neural_step_delay_ms)
    }

    pub fn drain_interval(&self) -> Duration {
        // interval 不接受零周期
        Duration::from_millis(self.drain_interval_ms.max(1))
    }
}
