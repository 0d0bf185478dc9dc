//! 数据模型模块
//!
//! 包含所有核心数据结构:
//! - errors: 错误类型定义 (登录、渲染、配置)
//! - platform: 平台标识
//! - login_session: 登录状态与单平台会话槽位
//! - login_result: 对外返回的扫码/轮询结果
//!
//! # 约定
//!
//! - 没有会话时轮询返回 `EXPIRED` 状态而不是错误
//! - 会话字段由各平台适配器自行定义,编排器不接触
//! - 凭证与令牌的值不进入日志,只记录 Cookie 名或长度

pub mod errors;
pub mod login_result;
pub mod login_session;
pub mod platform;

// 重导出常用类型,简化外部引用
pub use errors::{ConfigError, LoginError, RenderError};
pub use login_result::{PollResult, QrImage, ScanResult};
pub use login_session::{ActiveSession, LoginStatus, SessionSlot};
pub use platform::Platform;
