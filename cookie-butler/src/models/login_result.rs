use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::LoginStatus;

/// 可展示的二维码载荷
///
/// 内容由渲染器决定 (如 data URL 或原始文本),本库不解析。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QrImage(String);

impl QrImage {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QrImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 发起扫码的结果
///
/// 状态恒为 `NEW`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// 二维码图片
    #[serde(rename = "qrcode")]
    pub qr_image: QrImage,

    pub status: LoginStatus,
}

impl ScanResult {
    pub fn new(qr_image: QrImage) -> Self {
        Self {
            qr_image,
            status: LoginStatus::New,
        }
    }
}

/// 单次轮询结果
///
/// - `credential`: 仅在 `CONFIRMED` 且平台产出 Cookie 时存在
/// - `auth_token`: 仅阿里云盘确认后存在 (refresh token)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResult {
    pub status: LoginStatus,

    #[serde(rename = "cookie", default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,

    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl PollResult {
    /// 仅携带状态的结果
    pub fn status(status: LoginStatus) -> Self {
        Self {
            status,
            credential: None,
            auth_token: None,
        }
    }

    pub fn new_qr() -> Self {
        Self::status(LoginStatus::New)
    }

    pub fn scanned() -> Self {
        Self::status(LoginStatus::Scaned)
    }

    pub fn canceled() -> Self {
        Self::status(LoginStatus::Canceled)
    }

    pub fn expired() -> Self {
        Self::status(LoginStatus::Expired)
    }

    /// 确认成功并携带 Cookie 凭证
    pub fn confirmed_with_credential(credential: String) -> Self {
        Self {
            status: LoginStatus::Confirmed,
            credential: Some(credential),
            auth_token: None,
        }
    }

    /// 确认成功并携带刷新令牌
    pub fn confirmed_with_token(auth_token: String) -> Self {
        Self {
            status: LoginStatus::Confirmed,
            credential: None,
            auth_token: Some(auth_token),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
