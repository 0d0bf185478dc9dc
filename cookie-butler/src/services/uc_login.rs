use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::models::{ActiveSession, LoginError, Platform, PollResult, ScanResult, SessionSlot};
use crate::services::cas_ticket::{self, CasSession, TicketStatus};
use crate::services::correlation::generate_correlation_id;
use crate::services::credential::{cookie_names, reduce_cookies};
use crate::services::platform_adapter::{clear_on_error, PlatformAdapter};
use crate::services::qr_renderer::QrRenderer;
use crate::services::relay::{RelayClient, RelayRequest};

const CLIENT_ID: &str = "381";
const API_VERSION: &str = "1.2";
const TOKEN_URL: &str = "https://api.open.uc.cn/cas/ajax/getTokenForQrcodeLogin";
const TICKET_URL: &str = "https://api.open.uc.cn/cas/ajax/getServiceTicketByQrcodeToken";
const ACCOUNT_INFO_URL: &str = "https://drive.uc.cn/account/info";

fn qr_url(token: &str) -> String {
    format!(
        "https://su.uc.cn/1_n0ZCv?token={}&client_id={}&uc_param_str=&uc_biz_str=S%3Acustom%7CC%3Atitlebar_fix",
        token, CLIENT_ID
    )
}

/// 防缓存时间戳 (毫秒)
fn cache_buster() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// UC网盘扫码登录
///
/// 与夸克同为 CAS 流程,参数走 POST 表单,并附带 `__t` 时间戳。
/// 确认后只需一次换取 Cookie 的调用,会话随即作废。
pub struct UcLogin {
    relay: Arc<dyn RelayClient>,
    renderer: Arc<dyn QrRenderer>,
    session: SessionSlot<CasSession>,
}

impl UcLogin {
    pub fn new(relay: Arc<dyn RelayClient>, renderer: Arc<dyn QrRenderer>) -> Self {
        Self {
            relay,
            renderer,
            session: SessionSlot::new(),
        }
    }

    async fn request_qrcode(&self) -> Result<ScanResult, LoginError> {
        let request_id = generate_correlation_id();
        let request = RelayRequest::post(TOKEN_URL)
            .query("__t", cache_buster())
            .form("v", API_VERSION)
            .form("request_id", request_id.as_str())
            .form("client_id", CLIENT_ID);

        let response = self.relay.send(request).await?;
        let token = cas_ticket::extract_token(Platform::Uc, &response.body)?;
        let content = qr_url(&token);

        let replaced = self.session.store(CasSession { token, request_id }).await;
        let qr_image = self.renderer.render(&content)?;

        crate::log_event!(
            "QrCodeGenerated",
            platform = Platform::Uc.key(),
            replaced_session = replaced,
        );

        Ok(ScanResult::new(qr_image))
    }

    async fn query_ticket(
        &self,
        session: &ActiveSession<CasSession>,
    ) -> Result<PollResult, LoginError> {
        let request = RelayRequest::post(TICKET_URL)
            .query("__t", cache_buster())
            .form("v", API_VERSION)
            .form("request_id", session.fields.request_id.as_str())
            .form("client_id", CLIENT_ID)
            .form("token", session.fields.token.as_str());

        let response = self.relay.send(request).await?;

        match cas_ticket::parse_ticket_status(Platform::Uc, &response.body)? {
            TicketStatus::Confirmed(service_ticket) => {
                let account = self
                    .relay
                    .send(RelayRequest::get(ACCOUNT_INFO_URL).query("st", service_ticket))
                    .await?;

                let credential = reduce_cookies(&account.set_cookie_entries());
                if credential.is_empty() {
                    return Err(LoginError::upstream(Platform::Uc, "账户接口未返回 Cookie"));
                }

                // ticket 只能兑换一次
                self.session.clear().await;

                let names = cookie_names(&credential);
                crate::log_event!(
                    "LoginConfirmed",
                    platform = Platform::Uc.key(),
                    cookie_names = names.as_str(),
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::confirmed_with_credential(credential))
            }
            TicketStatus::Expired => {
                self.session.clear().await;
                crate::log_event!(
                    "QrCodeExpired",
                    platform = Platform::Uc.key(),
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::expired())
            }
            TicketStatus::Pending(code) => {
                tracing::trace!(platform = %Platform::Uc, code, "Waiting for scan");
                Ok(PollResult::new_qr())
            }
        }
    }
}

#[async_trait]
impl PlatformAdapter for UcLogin {
    fn platform(&self) -> Platform {
        Platform::Uc
    }

    async fn start(&self) -> Result<ScanResult, LoginError> {
        let result = self.request_qrcode().await;
        clear_on_error(Platform::Uc, &self.session, "QrCodeFailed", result).await
    }

    async fn poll(&self) -> Result<PollResult, LoginError> {
        let Some(session) = self.session.snapshot().await else {
            return Ok(PollResult::expired());
        };
        let result = self.query_ticket(&session).await;
        clear_on_error(Platform::Uc, &self.session, "PollFailed", result).await
    }

    async fn has_session(&self) -> bool {
        self.session.is_active().await
    }
}
