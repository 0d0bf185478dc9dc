use std::env;
use std::path::PathBuf;

use crate::models::ConfigError;
use crate::services::relay::DEFAULT_USER_AGENT;

pub const ENV_RELAY_URL: &str = "COOKIE_BUTLER_RELAY_URL";
pub const ENV_RELAY_TIMEOUT: &str = "COOKIE_BUTLER_RELAY_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "COOKIE_BUTLER_USER_AGENT";
pub const ENV_LOG_DIR: &str = "COOKIE_BUTLER_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "COOKIE_BUTLER_LOG_LEVEL";

/// 中继服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// 中继端点 (接收 `{url, method, headers, params, data}` 信封)
    pub relay_url: String,

    /// 单次中继调用超时(秒)
    pub timeout_secs: u64,

    /// 转发请求使用的 User-Agent
    pub user_agent: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:5757/http".to_string(),
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// 日志目录,文件按天轮转
    pub dir: PathBuf,

    /// 默认过滤级别, `RUST_LOG` 优先
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButlerConfig {
    pub relay: RelayConfig,
    pub log: LogConfig,
}

impl ButlerConfig {
    /// 从环境变量加载配置
    ///
    /// 先尝试加载当前目录的 `.env` (不存在不报错),再读取进程环境。
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "No .env file loaded, using process environment");
        }
        Self::from_vars(|key| env::var(key).ok())
    }

    /// 从任意键值来源解析配置
    ///
    /// 缺失的键取默认值;存在但无法解析的键返回 `ConfigError::InvalidValue`。
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ButlerConfig::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let relay_url = read(ENV_RELAY_URL).unwrap_or(defaults.relay.relay_url);
        if !(relay_url.starts_with("http://") || relay_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: ENV_RELAY_URL.to_string(),
                value: relay_url,
            });
        }

        let timeout_secs = match read(ENV_RELAY_TIMEOUT) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_RELAY_TIMEOUT.to_string(),
                        value: raw,
                    })
                }
            },
            None => defaults.relay.timeout_secs,
        };

        let user_agent = read(ENV_USER_AGENT).unwrap_or(defaults.relay.user_agent);
        let dir = read(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.log.dir);
        let level = read(ENV_LOG_LEVEL).unwrap_or(defaults.log.level);

        Ok(Self {
            relay: RelayConfig {
                relay_url,
                timeout_secs,
                user_agent,
            },
            log: LogConfig { dir, level },
        })
    }
}
