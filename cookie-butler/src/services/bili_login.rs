use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{
    ActiveSession, LoginError, LoginStatus, Platform, PollResult, ScanResult, SessionSlot,
};
use crate::services::platform_adapter::{
    clear_on_error, optional_str, required_i64, required_str, PlatformAdapter,
};
use crate::services::qr_renderer::QrRenderer;
use crate::services::relay::{RelayClient, RelayRequest};

const GENERATE_URL: &str = "https://passport.bilibili.com/x/passport-login/web/qrcode/generate";
const POLL_URL: &str = "https://passport.bilibili.com/x/passport-login/web/qrcode/poll";
const SOURCE: &str = "main-mini";

/// 未扫码
pub const CODE_NOT_SCANNED: i64 = 86101;
/// 已扫码未确认
pub const CODE_SCANNED: i64 = 86090;
/// 已确认
pub const CODE_CONFIRMED: i64 = 0;

/// 哔哩哔哩会话字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiliSession {
    pub qrcode_key: String,
}

/// 哔哩哔哩扫码登录
///
/// 响应外层 `code` 非零即视为应用层失败,即便传输成功。
/// 确认后的会话标识放在跳转 URL 的查询串里,解码后直接作为凭证。
pub struct BiliLogin {
    relay: Arc<dyn RelayClient>,
    renderer: Arc<dyn QrRenderer>,
    session: SessionSlot<BiliSession>,
}

impl BiliLogin {
    pub fn new(relay: Arc<dyn RelayClient>, renderer: Arc<dyn QrRenderer>) -> Self {
        Self {
            relay,
            renderer,
            session: SessionSlot::new(),
        }
    }

    async fn request_qrcode(&self) -> Result<ScanResult, LoginError> {
        let request = RelayRequest::get(GENERATE_URL).query("source", SOURCE);
        let response = self.relay.send(request).await?;
        let body = &response.body;

        ensure_outer_success(body)?;
        let qrcode_key = required_str(Platform::Bili, body, "/data/qrcode_key")?;
        let url = required_str(Platform::Bili, body, "/data/url")?;

        let replaced = self.session.store(BiliSession { qrcode_key }).await;
        let qr_image = self.renderer.render(&url)?;

        crate::log_event!(
            "QrCodeGenerated",
            platform = Platform::Bili.key(),
            replaced_session = replaced,
        );

        Ok(ScanResult::new(qr_image))
    }

    async fn query_status(
        &self,
        session: &ActiveSession<BiliSession>,
    ) -> Result<PollResult, LoginError> {
        let request = RelayRequest::get(POLL_URL)
            .query("qrcode_key", session.fields.qrcode_key.as_str())
            .query("source", SOURCE);
        let response = self.relay.send(request).await?;
        let body = &response.body;

        ensure_outer_success(body)?;

        match required_i64(Platform::Bili, body, "/data/code")? {
            CODE_NOT_SCANNED => Ok(PollResult::new_qr()),
            CODE_SCANNED => {
                crate::log_event!("QrCodeScanned", platform = Platform::Bili.key());
                Ok(PollResult::scanned())
            }
            CODE_CONFIRMED => {
                let Some(url) = optional_str(body, "/data/url") else {
                    tracing::warn!(platform = %Platform::Bili, "Confirmed without redirect url");
                    return Ok(PollResult::status(LoginStatus::Confirmed));
                };

                let credential = credential_from_redirect(url)?;
                // 查询串格式与 Cookie 不同,只记录长度
                crate::log_event!(
                    "LoginConfirmed",
                    platform = Platform::Bili.key(),
                    credential_len = credential.len(),
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::confirmed_with_credential(credential))
            }
            other => {
                self.session.clear().await;
                crate::log_event!(
                    "QrCodeExpired",
                    platform = Platform::Bili.key(),
                    code = other,
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::expired())
            }
        }
    }
}

/// 外层 `code` 必须为 0,否则带上 `message` 报应用层错误
fn ensure_outer_success(body: &Value) -> Result<(), LoginError> {
    match body.get("code").and_then(Value::as_i64) {
        Some(0) => Ok(()),
        Some(code) => {
            let message = optional_str(body, "/message").unwrap_or("未知错误");
            Err(LoginError::upstream(
                Platform::Bili,
                format!("{} (code {})", message, code),
            ))
        }
        None => Err(LoginError::missing_field(Platform::Bili, "/code")),
    }
}

/// 取跳转 URL 的查询串并做百分号解码
fn credential_from_redirect(redirect: &str) -> Result<String, LoginError> {
    let parsed = url::Url::parse(redirect)
        .map_err(|e| LoginError::upstream(Platform::Bili, format!("跳转地址无效: {}", e)))?;

    let query = parsed
        .query()
        .filter(|q| !q.is_empty())
        .ok_or_else(|| LoginError::upstream(Platform::Bili, "跳转地址缺少查询参数"))?;

    urlencoding::decode(query)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| LoginError::upstream(Platform::Bili, format!("查询参数解码失败: {}", e)))
}

#[async_trait]
impl PlatformAdapter for BiliLogin {
    fn platform(&self) -> Platform {
        Platform::Bili
    }

    async fn start(&self) -> Result<ScanResult, LoginError> {
        let result = self.request_qrcode().await;
        clear_on_error(Platform::Bili, &self.session, "QrCodeFailed", result).await
    }

    async fn poll(&self) -> Result<PollResult, LoginError> {
        let Some(session) = self.session.snapshot().await else {
            return Ok(PollResult::expired());
        };
        let result = self.query_status(&session).await;
        clear_on_error(Platform::Bili, &self.session, "PollFailed", result).await
    }

    async fn has_session(&self) -> bool {
        self.session.is_active().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credential_from_redirect_decodes_query() {
        let credential = credential_from_redirect("https://x/?SESSDATA=abc%3Bdef").unwrap();
        assert_eq!(credential, "SESSDATA=abc;def");
    }

    #[test]
    fn test_credential_keeps_all_params() {
        let credential = credential_from_redirect(
            "https://passport.biligame.com/crossDomain?DedeUserID=42&bili_jct=xyz&gourl=https%3A%2F%2Fwww.bilibili.com",
        )
        .unwrap();
        assert_eq!(
            credential,
            "DedeUserID=42&bili_jct=xyz&gourl=https://www.bilibili.com"
        );
    }

    #[test]
    fn test_credential_rejects_bad_redirects() {
        assert!(credential_from_redirect("not a url").is_err());
        assert!(credential_from_redirect("https://x/").is_err());
    }

    #[test]
    fn test_outer_code() {
        assert!(ensure_outer_success(&json!({ "code": 0 })).is_ok());

        match ensure_outer_success(&json!({ "code": -412, "message": "请求被拦截" })) {
            Err(LoginError::UpstreamApplication { platform, message }) => {
                assert_eq!(platform, Platform::Bili);
                assert!(message.contains("请求被拦截"));
            }
            other => panic!("Expected UpstreamApplication, got {:?}", other),
        }

        assert!(ensure_outer_success(&json!({ "data": {} })).is_err());
    }
}
