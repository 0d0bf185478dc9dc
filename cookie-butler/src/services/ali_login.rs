use async_trait::async_trait;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{ActiveSession, LoginError, Platform, PollResult, ScanResult, SessionSlot};
use crate::services::platform_adapter::{
    clear_on_error, optional_str, required_str, PlatformAdapter,
};
use crate::services::qr_renderer::QrRenderer;
use crate::services::relay::{RelayClient, RelayRequest};

const GENERATE_URL: &str = "https://passport.aliyundrive.com/newlogin/qrcode/generate.do";
const QUERY_URL: &str = "https://passport.aliyundrive.com/newlogin/qrcode/query.do";

const APP_NAME: &str = "aliyun_drive";
const FROM_SITE: &str = "52";
const BX_VERSION: &str = "2.2.3";

const CONTENT_DATA: &str = "/content/data";

/// `bizExt` 可能省略 `=` 填充
const BIZ_EXT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 阿里云盘会话字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliSession {
    pub ck: String,
    pub t: String,
}

/// 阿里云盘扫码登录
///
/// 二维码内容由平台直接给出。确认后不产出 Cookie,
/// 而是从 base64 编码的 `bizExt` JSON 中取 refresh token。
pub struct AliLogin {
    relay: Arc<dyn RelayClient>,
    renderer: Arc<dyn QrRenderer>,
    session: SessionSlot<AliSession>,
}

impl AliLogin {
    pub fn new(relay: Arc<dyn RelayClient>, renderer: Arc<dyn QrRenderer>) -> Self {
        Self {
            relay,
            renderer,
            session: SessionSlot::new(),
        }
    }

    async fn request_qrcode(&self) -> Result<ScanResult, LoginError> {
        let request = RelayRequest::get(GENERATE_URL).queries([
            ("appName", APP_NAME),
            ("fromSite", FROM_SITE),
            ("appEntrance", "web"),
            ("isMobile", "false"),
            ("lang", "zh_CN"),
            ("returnUrl", ""),
            ("bizParams", ""),
            ("_bx_v", BX_VERSION),
        ]);

        let response = self.relay.send(request).await?;
        let body = &response.body;
        let ck = required_str(Platform::Ali, body, "/content/data/ck")?;
        let t = required_str(Platform::Ali, body, "/content/data/t")?;
        let code_content = required_str(Platform::Ali, body, "/content/data/codeContent")?;

        let replaced = self.session.store(AliSession { ck, t }).await;
        let qr_image = self.renderer.render(&code_content)?;

        crate::log_event!(
            "QrCodeGenerated",
            platform = Platform::Ali.key(),
            replaced_session = replaced,
        );

        Ok(ScanResult::new(qr_image))
    }

    async fn query_status(
        &self,
        session: &ActiveSession<AliSession>,
    ) -> Result<PollResult, LoginError> {
        let AliSession { ck, t } = &session.fields;
        let request = RelayRequest::post(QUERY_URL)
            .queries([
                ("appName", APP_NAME),
                ("fromSite", FROM_SITE),
                ("_bx_v", BX_VERSION),
            ])
            .forms([
                ("ck", ck.as_str()),
                ("t", t.as_str()),
                ("appName", APP_NAME),
                ("appEntrance", "web"),
                ("isMobile", "false"),
                ("lang", "zh_CN"),
                ("returnUrl", ""),
                ("navlanguage", "zh-CN"),
                ("bizParams", ""),
            ]);

        let response = self.relay.send(request).await?;

        let Some(data) = response.body.pointer(CONTENT_DATA).filter(|d| d.is_object()) else {
            tracing::warn!(platform = %Platform::Ali, "Query response without content data");
            return Ok(self.expire(session).await);
        };

        match data.get("qrCodeStatus").and_then(Value::as_str) {
            Some("CONFIRMED") => match optional_str(data, "/bizExt") {
                Some(biz_ext) => {
                    let refresh_token = decode_refresh_token(biz_ext)?;
                    crate::log_event!(
                        "LoginConfirmed",
                        platform = Platform::Ali.key(),
                        token_len = refresh_token.len(),
                        duration_seconds = session.duration_seconds(),
                    );
                    Ok(PollResult::confirmed_with_token(refresh_token))
                }
                None => {
                    tracing::warn!(platform = %Platform::Ali, "Confirmed without bizExt");
                    Ok(self.expire(session).await)
                }
            },
            Some("SCANED") => {
                crate::log_event!("QrCodeScanned", platform = Platform::Ali.key());
                Ok(PollResult::scanned())
            }
            Some("CANCELED") => {
                self.session.clear().await;
                crate::log_event!(
                    "LoginCanceled",
                    platform = Platform::Ali.key(),
                    duration_seconds = session.duration_seconds(),
                );
                Ok(PollResult::canceled())
            }
            Some("NEW") => Ok(PollResult::new_qr()),
            other => {
                tracing::debug!(platform = %Platform::Ali, status = ?other, "Treating status as expired");
                Ok(self.expire(session).await)
            }
        }
    }

    async fn expire(&self, session: &ActiveSession<AliSession>) -> PollResult {
        self.session.clear().await;
        crate::log_event!(
            "QrCodeExpired",
            platform = Platform::Ali.key(),
            duration_seconds = session.duration_seconds(),
        );
        PollResult::expired()
    }
}

/// 解码 `bizExt` 并取出 `pds_login_result.refreshToken`
fn decode_refresh_token(biz_ext: &str) -> Result<String, LoginError> {
    let bytes = BIZ_EXT_ENGINE
        .decode(biz_ext.trim())
        .map_err(|e| LoginError::upstream(Platform::Ali, format!("bizExt 解码失败: {}", e)))?;

    let text = String::from_utf8_lossy(&bytes);
    let biz: Value = serde_json::from_str(&text)
        .map_err(|e| LoginError::upstream(Platform::Ali, format!("bizExt 不是合法JSON: {}", e)))?;

    required_str(Platform::Ali, &biz, "/pds_login_result/refreshToken")
}

#[async_trait]
impl PlatformAdapter for AliLogin {
    fn platform(&self) -> Platform {
        Platform::Ali
    }

    async fn start(&self) -> Result<ScanResult, LoginError> {
        let result = self.request_qrcode().await;
        clear_on_error(Platform::Ali, &self.session, "QrCodeFailed", result).await
    }

    async fn poll(&self) -> Result<PollResult, LoginError> {
        let Some(session) = self.session.snapshot().await else {
            return Ok(PollResult::expired());
        };
        let result = self.query_status(&session).await;
        clear_on_error(Platform::Ali, &self.session, "PollFailed", result).await
    }

    async fn has_session(&self) -> bool {
        self.session.is_active().await
    }
}
