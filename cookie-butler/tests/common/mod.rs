//! 测试公共模块
//!
//! 提供Mock中继与渲染器,所有平台响应都在内存中按脚本返回,
//! 避免真实网络依赖。

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use cookie_butler::models::{LoginError, QrImage, RenderError};
use cookie_butler::services::{QrRenderer, RelayClient, RelayRequest, RelayResponse};

/// 脚本化的Mock中继
///
/// 按目标URL (不含查询串) 排队响应,每次调用弹出一个;
/// 未排队的URL返回传输错误。所有请求都会被记录,便于断言参数。
#[derive(Clone, Default)]
pub struct MockRelay {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<RelayResponse, LoginError>>>>>,
    requests: Arc<Mutex<Vec<RelayRequest>>>,
}

impl MockRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排队一个JSON响应体
    pub async fn respond(&self, url: &str, body: Value) {
        self.respond_with(url, RelayResponse::new(body)).await;
    }

    /// 排队一个完整响应 (可带响应头)
    pub async fn respond_with(&self, url: &str, response: RelayResponse) {
        self.push(url, Ok(response)).await;
    }

    /// 排队一次传输失败
    pub async fn fail(&self, url: &str, message: &str) {
        self.push(url, Err(LoginError::Transport(message.to_string())))
            .await;
    }

    async fn push(&self, url: &str, entry: Result<RelayResponse, LoginError>) {
        self.scripts
            .lock()
            .await
            .entry(strip_query(url).to_string())
            .or_default()
            .push_back(entry);
    }

    /// 已发出的全部请求
    pub async fn requests(&self) -> Vec<RelayRequest> {
        self.requests.lock().await.clone()
    }

    /// 发往指定URL的请求
    pub async fn requests_to(&self, url: &str) -> Vec<RelayRequest> {
        let key = strip_query(url);
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| strip_query(&r.target_url) == key)
            .cloned()
            .collect()
    }

    /// 尚未被消费的脚本条目数
    pub async fn pending(&self) -> usize {
        self.scripts.lock().await.values().map(VecDeque::len).sum()
    }
}

fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[async_trait]
impl RelayClient for MockRelay {
    async fn send(&self, request: RelayRequest) -> Result<RelayResponse, LoginError> {
        let key = strip_query(&request.target_url).to_string();
        self.requests.lock().await.push(request);

        self.scripts
            .lock()
            .await
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(LoginError::Transport(format!("未预设响应: {}", key))))
    }
}

/// 记录渲染内容的Mock渲染器
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    rendered: Arc<std::sync::Mutex<Vec<String>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

impl QrRenderer for RecordingRenderer {
    fn render(&self, content: &str) -> Result<QrImage, RenderError> {
        self.rendered.lock().unwrap().push(content.to_string());
        Ok(QrImage::new(format!("qr:{}", content)))
    }
}

/// 总是失败的渲染器
pub struct FailingRenderer;

impl QrRenderer for FailingRenderer {
    fn render(&self, _content: &str) -> Result<QrImage, RenderError> {
        Err(RenderError::EncodingFailed("模拟渲染失败".to_string()))
    }
}

/// 构建测试夹具: Mock中继 + 记录渲染器 + 完整注册的编排器
pub fn setup() -> (
    MockRelay,
    RecordingRenderer,
    cookie_butler::services::LoginOrchestrator,
) {
    let relay = MockRelay::new();
    let renderer = RecordingRenderer::new();
    let orchestrator = cookie_butler::services::LoginOrchestrator::new(
        Arc::new(relay.clone()),
        Arc::new(renderer.clone()),
    );
    (relay, renderer, orchestrator)
}
