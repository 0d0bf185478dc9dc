use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{ActiveSession, LoginError, Platform, PollResult, ScanResult, SessionSlot};
use crate::services::cas_ticket::{self, CasSession, TicketStatus};
use crate::services::correlation::generate_correlation_id;
use crate::services::credential::{cookie_names, merge_credentials, reduce_cookies};
use crate::services::platform_adapter::{clear_on_error, PlatformAdapter};
use crate::services::qr_renderer::QrRenderer;
use crate::services::relay::{RelayClient, RelayRequest};

const CLIENT_ID: &str = "532";
const API_VERSION: &str = "1.2";
const TOKEN_URL: &str = "https://uop.quark.cn/cas/ajax/getTokenForQrcodeLogin";
const TICKET_URL: &str = "https://uop.quark.cn/cas/ajax/getServiceTicketByQrcodeToken";
const ACCOUNT_INFO_URL: &str = "https://pan.quark.cn/account/info";
const FILE_SORT_URL: &str = "https://drive-pc.quark.cn/1/clouddrive/file/sort?pr=ucpro&fr=pc&uc_param_str=&pdir_fid=0&_page=1&_size=50&_fetch_total=1&_fetch_sub_dirs=0&_sort=file_type:asc,updated_at:desc";
const PAN_ORIGIN: &str = "https://pan.quark.cn";

/// 夸克扫码页模板, token 拼接在 `token=` 之后
fn qr_url(token: &str) -> String {
    format!(
        "https://su.quark.cn/4_eMHBJ?token={}&client_id={}&ssb=weblogin&uc_param_str=&uc_biz_str=S%3Acustom%7COPT%3ASAREA%400%7COPT%3AIMMERSIVE%401%7COPT%3ABACK_BTN_STYLE%400",
        token, CLIENT_ID
    )
}

/// 夸克网盘扫码登录
///
/// 确认后需要两次后续调用:
/// 1. 用 service ticket 换取账户 Cookie
/// 2. 带着该 Cookie 访问文件列表,既验证凭证,也拿到该端点追加的会话 Cookie
///
/// 两段 Cookie 合并为最终凭证。
pub struct QuarkLogin {
    relay: Arc<dyn RelayClient>,
    renderer: Arc<dyn QrRenderer>,
    session: SessionSlot<CasSession>,
}

impl QuarkLogin {
    pub fn new(relay: Arc<dyn RelayClient>, renderer: Arc<dyn QrRenderer>) -> Self {
        Self {
            relay,
            renderer,
            session: SessionSlot::new(),
        }
    }

    async fn request_qrcode(&self) -> Result<ScanResult, LoginError> {
        let request_id = generate_correlation_id();
        let request = RelayRequest::get(TOKEN_URL)
            .query("request_id", request_id.as_str())
            .query("client_id", CLIENT_ID)
            .query("v", API_VERSION);

        let response = self.relay.send(request).await?;
        let token = cas_ticket::extract_token(Platform::Quark, &response.body)?;
        let content = qr_url(&token);

        let replaced = self.session.store(CasSession { token, request_id }).await;
        let qr_image = self.renderer.render(&content)?;

        crate::log_event!(
            "QrCodeGenerated",
            platform = Platform::Quark.key(),
            replaced_session = replaced,
        );

        Ok(ScanResult::new(qr_image))
    }

    async fn query_ticket(
        &self,
        session: &ActiveSession<CasSession>,
    ) -> Result<PollResult, LoginError> {
        let request = RelayRequest::get(TICKET_URL)
            .query("request_id", session.fields.request_id.as_str())
            .query("client_id", CLIENT_ID)
            .query("v", API_VERSION)
            .query("token", session.fields.token.as_str());

        let response = self.relay.send(request).await?;

        match cas_ticket::parse_ticket_status(Platform::Quark, &response.body)? {
            TicketStatus::Confirmed(service_ticket) => {
                let credential = self.exchange_ticket(&service_ticket).await?;
                let names = cookie_names(&credential);
                crate::log_event!(
                    "LoginConfirmed",
                    platform = Platform::Quark.key(),
                    cookie_names = names.as_str(),
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::confirmed_with_credential(credential))
            }
            TicketStatus::Expired => {
                self.session.clear().await;
                crate::log_event!(
                    "QrCodeExpired",
                    platform = Platform::Quark.key(),
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::expired())
            }
            TicketStatus::Pending(code) => {
                tracing::trace!(platform = %Platform::Quark, code, "Waiting for scan");
                Ok(PollResult::new_qr())
            }
        }
    }

    /// service ticket -> 账户 Cookie -> 文件列表追加 Cookie
    async fn exchange_ticket(&self, service_ticket: &str) -> Result<String, LoginError> {
        let account = self
            .relay
            .send(
                RelayRequest::get(ACCOUNT_INFO_URL)
                    .query("st", service_ticket)
                    .query("lw", "scan"),
            )
            .await?;

        let account_credential = reduce_cookies(&account.set_cookie_entries());
        if account_credential.is_empty() {
            return Err(LoginError::upstream(
                Platform::Quark,
                "账户接口未返回 Cookie",
            ));
        }

        let listing = self
            .relay
            .send(
                RelayRequest::get(FILE_SORT_URL)
                    .header("Origin", PAN_ORIGIN)
                    .header("Referer", format!("{}/", PAN_ORIGIN))
                    .header("Cookie", account_credential.as_str()),
            )
            .await?;

        let listing_credential = reduce_cookies(&listing.set_cookie_entries());
        tracing::debug!(
            platform = %Platform::Quark,
            account_cookies = %cookie_names(&account_credential),
            listing_cookies = %cookie_names(&listing_credential),
            "Quark cookies collected"
        );

        Ok(merge_credentials(&account_credential, &listing_credential))
    }
}

#[async_trait]
impl PlatformAdapter for QuarkLogin {
    fn platform(&self) -> Platform {
        Platform::Quark
    }

    async fn start(&self) -> Result<ScanResult, LoginError> {
        let result = self.request_qrcode().await;
        clear_on_error(Platform::Quark, &self.session, "QrCodeFailed", result).await
    }

    async fn poll(&self) -> Result<PollResult, LoginError> {
        let Some(session) = self.session.snapshot().await else {
            return Ok(PollResult::expired());
        };
        let result = self.query_ticket(&session).await;
        clear_on_error(Platform::Quark, &self.session, "PollFailed", result).await
    }

    async fn has_session(&self) -> bool {
        self.session.is_active().await
    }
}
