use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;
use crate::models::ConfigError;

/// 初始化日志系统
///
/// - JSON格式文件日志: 便于机器解析,按天轮转 (`cookie-butler.YYYY-MM-DD.log`)
/// - 控制台日志: 人类可读格式,便于开发调试
/// - 环境变量控制: `RUST_LOG` 优先于配置中的默认级别
///
/// 凭证值不进入日志,只记录 Cookie 名与数量。
///
/// # 重要提示
/// 返回的guard必须被调用者保存,直到应用退出。
/// 如果guard被drop,文件写入器将被关闭。
///
/// # 示例日志
/// ```json
/// {
///   "timestamp": "2025-10-05T10:30:45.123Z",
///   "level": "INFO",
///   "target": "cookie_butler::services::quark_login",
///   "fields": {
///     "event_type": "LoginConfirmed",
///     "platform": "quark",
///     "cookie_names": "__pus, __kp, __puus"
///   }
/// }
/// ```
pub fn init(config: &LogConfig) -> Result<WorkerGuard, ConfigError> {
    std::fs::create_dir_all(&config.dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cookie-butler")
        .filename_suffix("log")
        .build(&config.dir)
        .map_err(|e| ConfigError::IoError(format!("无法创建日志文件: {}", e)))?;

    // guard必须被保存,否则写入器会立即关闭
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false);

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ConfigError::LoggerInit(e.to_string()))?;

    Ok(guard)
}

/// 日志宏辅助模块
///
/// 提供结构化日志的便捷宏
pub mod macros {
    /// 记录登录流程事件
    ///
    /// 使用示例:
    /// ```no_run
    /// use cookie_butler::log_event;
    /// log_event!(
    ///     "QrCodeScanned",
    ///     platform = "ali",
    /// );
    /// ```
    #[macro_export]
    macro_rules! log_event {
        ($event_type:expr, $($field:tt = $value:expr),* $(,)?) => {
            tracing::info!(
                event_type = $event_type,
                $($field = $value),*
            );
        };
    }

    /// 记录错误事件
    ///
    /// 使用示例:
    /// ```no_run
    /// use cookie_butler::log_error;
    /// log_error!(
    ///     "PollFailed",
    ///     platform = "quark",
    ///     error = "connection timeout"
    /// );
    /// ```
    #[macro_export]
    macro_rules! log_error {
        ($event_type:expr, $($field:tt = $value:expr),* $(,)?) => {
            tracing::error!(
                event_type = $event_type,
                $($field = $value),*
            );
        };
    }
}
