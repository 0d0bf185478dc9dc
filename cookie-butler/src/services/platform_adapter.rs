use async_trait::async_trait;
use serde_json::Value;

use crate::models::{LoginError, Platform, PollResult, ScanResult, SessionSlot};

/// 平台扫码登录适配器
///
/// 每个平台一个实现,封装该平台的两步协议并独占自己的会话槽位:
/// - `start`: 申请二维码,写入会话;失败时清空槽位
/// - `poll`: 查询一次状态;无会话时返回 `EXPIRED` 而非错误,
///   传输/解析/应用层失败时清空槽位后返回错误
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    async fn start(&self) -> Result<ScanResult, LoginError>;

    async fn poll(&self) -> Result<PollResult, LoginError>;

    /// 是否存在进行中的会话
    async fn has_session(&self) -> bool;
}

/// 失败时清空会话槽位并记录错误
pub(crate) async fn clear_on_error<S: Clone, T>(
    platform: Platform,
    slot: &SessionSlot<S>,
    stage: &'static str,
    result: Result<T, LoginError>,
) -> Result<T, LoginError> {
    if let Err(e) = &result {
        let had_session = slot.clear().await;
        crate::log_error!(
            stage,
            platform = platform.key(),
            had_session = had_session,
            error = tracing::field::display(e),
        );
    }
    result
}

/// 读取必需的字符串字段 (JSON Pointer 路径)
///
/// 数字也接受并转为字符串,部分平台会把时间戳等关联字段返回为数字。
pub(crate) fn required_str(
    platform: Platform,
    body: &Value,
    pointer: &str,
) -> Result<String, LoginError> {
    match body.pointer(pointer) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(LoginError::missing_field(platform, pointer)),
    }
}

/// 读取可选的非空字符串字段
pub(crate) fn optional_str<'a>(body: &'a Value, pointer: &str) -> Option<&'a str> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// 读取必需的整数字段
pub(crate) fn required_i64(
    platform: Platform,
    body: &Value,
    pointer: &str,
) -> Result<i64, LoginError> {
    body.pointer(pointer)
        .and_then(Value::as_i64)
        .ok_or_else(|| LoginError::missing_field(platform, pointer))
}
