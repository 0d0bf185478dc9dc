use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{LoginError, Platform, PollResult, ScanResult};
use crate::services::ali_login::AliLogin;
use crate::services::bili_login::BiliLogin;
use crate::services::platform_adapter::PlatformAdapter;
use crate::services::qr_renderer::QrRenderer;
use crate::services::quark_login::QuarkLogin;
use crate::services::relay::RelayClient;
use crate::services::uc_login::UcLogin;

/// 扫码登录门面
///
/// 按平台把 `start_scan` / `check_status` 分派给对应适配器。
/// 每个适配器持有自己的会话槽位,互不干扰;本层不做重试与超时,
/// 轮询节奏由调用方决定。
pub struct LoginOrchestrator {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl LoginOrchestrator {
    /// 注册全部四个平台
    pub fn new(relay: Arc<dyn RelayClient>, renderer: Arc<dyn QrRenderer>) -> Self {
        let adapters: [Arc<dyn PlatformAdapter>; 4] = [
            Arc::new(QuarkLogin::new(relay.clone(), renderer.clone())),
            Arc::new(AliLogin::new(relay.clone(), renderer.clone())),
            Arc::new(UcLogin::new(relay.clone(), renderer.clone())),
            Arc::new(BiliLogin::new(relay, renderer)),
        ];
        Self::with_adapters(adapters)
    }

    /// 使用自定义适配器集合,同一平台后注册者覆盖先注册者
    pub fn with_adapters(adapters: impl IntoIterator<Item = Arc<dyn PlatformAdapter>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.platform(), adapter))
            .collect();
        Self { adapters }
    }

    fn adapter(&self, platform: Platform) -> Result<&Arc<dyn PlatformAdapter>, LoginError> {
        self.adapters
            .get(&platform)
            .ok_or_else(|| LoginError::UnsupportedPlatform(platform.key().to_string()))
    }

    /// 发起扫码,返回二维码与 `NEW` 状态
    ///
    /// 同一平台再次发起会丢弃上一轮会话。
    pub async fn start_scan(&self, platform: Platform) -> Result<ScanResult, LoginError> {
        tracing::debug!(platform = %platform, "Starting QR scan");
        self.adapter(platform)?.start().await
    }

    /// 查询一次登录状态
    ///
    /// 尚未发起扫码时返回 `EXPIRED`。
    pub async fn check_status(&self, platform: Platform) -> Result<PollResult, LoginError> {
        let result = self.adapter(platform)?.poll().await?;
        tracing::debug!(platform = %platform, status = ?result.status, "Polled login status");
        Ok(result)
    }

    /// 以平台键 (`quark`/`ali`/`uc`/`bili`) 发起扫码
    pub async fn start_scan_by_key(&self, key: &str) -> Result<ScanResult, LoginError> {
        self.start_scan(key.parse()?).await
    }

    /// 以平台键查询状态
    pub async fn check_status_by_key(&self, key: &str) -> Result<PollResult, LoginError> {
        self.check_status(key.parse()?).await
    }

    /// 已注册的平台,按固定顺序
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    /// 指定平台是否有进行中的会话
    pub async fn has_session(&self, platform: Platform) -> bool {
        match self.adapters.get(&platform) {
            Some(adapter) => adapter.has_session().await,
            None => false,
        }
    }
}
