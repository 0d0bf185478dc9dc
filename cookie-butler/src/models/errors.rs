use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Platform;

/// 扫码登录相关错误
///
/// 覆盖 `start_scan` / `check_status` 的全部失败场景。
/// 会话缺失不属于错误,而是 `EXPIRED` 状态。
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum LoginError {
    /// 不支持的平台
    ///
    /// 调用方传入了未知的平台标识,属于调用方缺陷,不应重试
    #[error("不支持的平台: {0}")]
    UnsupportedPlatform(String),

    /// 中继调用失败
    ///
    /// 可能原因:
    /// - 网络连接中断或超时
    /// - 中继服务返回非2xx且无法解析
    /// - 中继响应信封格式错误
    #[error("中继请求失败: {0}")]
    Transport(String),

    /// 平台接口返回了应用层错误
    ///
    /// 中继调用本身成功,但平台API报告失败 (如哔哩哔哩内层 code 非零),
    /// 或响应中缺少预期字段
    #[error("{platform} 接口错误: {message}")]
    UpstreamApplication { platform: Platform, message: String },

    /// 二维码渲染失败
    #[error("二维码渲染失败: {0}")]
    Render(#[from] RenderError),
}

impl LoginError {
    /// 构造平台应用层错误
    pub fn upstream(platform: Platform, message: impl Into<String>) -> Self {
        LoginError::UpstreamApplication {
            platform,
            message: message.into(),
        }
    }

    /// 构造缺失字段错误
    pub fn missing_field(platform: Platform, path: &str) -> Self {
        LoginError::UpstreamApplication {
            platform,
            message: format!("响应缺少字段 `{}`", path),
        }
    }
}

/// 二维码渲染错误
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum RenderError {
    /// 二维码内容为空
    #[error("二维码内容为空")]
    EmptyContent,

    /// 编码失败
    #[error("二维码编码失败: {0}")]
    EncodingFailed(String),
}

/// 配置加载错误
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ConfigError {
    /// 配置值无法解析或超出范围
    #[error("配置项 {key} 的值无效: {value}")]
    InvalidValue { key: String, value: String },

    /// 日志目录不可用
    #[error("I/O错误: {0}")]
    IoError(String),

    /// 日志系统初始化失败 (如全局订阅器已被设置)
    #[error("日志系统初始化失败: {0}")]
    LoggerInit(String),
}

/// 实现从reqwest::Error到LoginError的转换
impl From<reqwest::Error> for LoginError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LoginError::Transport("请求超时".to_string())
        } else if err.is_connect() {
            LoginError::Transport("无法连接到中继服务".to_string())
        } else {
            LoginError::Transport(err.to_string())
        }
    }
}

/// 中继响应信封无法解析视为传输层失败
impl From<serde_json::Error> for LoginError {
    fn from(err: serde_json::Error) -> Self {
        LoginError::Transport(format!("响应数据解析失败: {}", err))
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}
