//! 夸克/UC 共用的 CAS 扫码协议
//!
//! 两个平台都是 "申请 token -> 用 token 换 service ticket" 的两步流程,
//! 只有端点、client_id 与附加参数不同。

use serde_json::Value;

use crate::models::{LoginError, Platform};
use crate::services::platform_adapter::{required_i64, required_str};

/// 扫码成功,可换取 service ticket
pub const STATUS_CONFIRMED: i64 = 2_000_000;

/// 二维码 token 已过期
pub const STATUS_TOKEN_EXPIRED: i64 = 50_004_002;

pub const TOKEN_POINTER: &str = "/data/members/token";
pub const SERVICE_TICKET_POINTER: &str = "/data/members/service_ticket";

/// 一次 ticket 查询的结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketStatus {
    /// 已确认,携带 service ticket
    Confirmed(String),

    /// token 过期
    Expired,

    /// 尚未扫码 (其他任何状态码)
    Pending(i64),
}

/// CAS 会话字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasSession {
    pub token: String,
    pub request_id: String,
}

/// 从 token 申请响应中取出登录 token
pub fn extract_token(platform: Platform, body: &Value) -> Result<String, LoginError> {
    required_str(platform, body, TOKEN_POINTER)
}

/// 解析 ticket 查询响应
///
/// 缺少 `status` 字段视为应用层错误,而不是默认为未扫码。
pub fn parse_ticket_status(platform: Platform, body: &Value) -> Result<TicketStatus, LoginError> {
    match required_i64(platform, body, "/status")? {
        STATUS_CONFIRMED => {
            let ticket = required_str(platform, body, SERVICE_TICKET_POINTER)?;
            Ok(TicketStatus::Confirmed(ticket))
        }
        STATUS_TOKEN_EXPIRED => Ok(TicketStatus::Expired),
        other => Ok(TicketStatus::Pending(other)),
    }
}
