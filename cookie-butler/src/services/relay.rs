use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::config::RelayConfig;
use crate::models::LoginError;
use crate::services::credential::split_cookie_header;

/// 固定的浏览器标识 (Android WebView)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; M2012K10C Build/RP1A.200720.011; wv) AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 Chrome/87.0.4280.141 Mobile Safari/537.36";
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const DEFAULT_ACCEPT: &str = "application/json, text/plain, */*";

/// 中继转发的HTTP方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

/// 交给中继转发的请求
///
/// 序列化后即中继服务约定的信封: `{url, method, headers, params, data}`。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayRequest {
    #[serde(rename = "url")]
    pub target_url: String,

    pub method: HttpMethod,

    pub headers: BTreeMap<String, String>,

    #[serde(rename = "params")]
    pub query: BTreeMap<String, String>,

    #[serde(rename = "data", skip_serializing_if = "Option::is_none")]
    pub form: Option<BTreeMap<String, String>>,
}

impl RelayRequest {
    /// 创建请求,预置 User-Agent / Content-Type / Accept
    pub fn new(method: HttpMethod, target_url: impl Into<String>) -> Self {
        let headers = [
            ("User-Agent", DEFAULT_USER_AGENT),
            ("Content-Type", DEFAULT_CONTENT_TYPE),
            ("Accept", DEFAULT_ACCEPT),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            target_url: target_url.into(),
            method,
            headers,
            query: BTreeMap::new(),
            form: None,
        }
    }

    pub fn get(target_url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, target_url)
    }

    pub fn post(target_url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, target_url)
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    pub fn query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.insert(name.to_string(), value.into());
        self
    }

    pub fn queries<'a>(mut self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (name, value) in pairs {
            self.query.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// 追加表单字段 (首次调用时创建表单体)
    pub fn form(mut self, name: &str, value: impl Into<String>) -> Self {
        self.form
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn forms<'a>(self, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .fold(self, |req, (name, value)| req.form(name, value))
    }
}

/// 响应头取值
///
/// 中继对多值头 (如 `set-cookie`) 返回数组,单值头返回字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
    Other(Value),
}

impl HeaderValue {
    /// 展开为字符串列表,非字符串取值忽略
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(v) => vec![v.as_str()],
            HeaderValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
            HeaderValue::Other(_) => Vec::new(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multi(values.into_iter().map(String::from).collect())
    }
}

/// 中继返回的响应
///
/// 信封格式: `{status, data, headers}`, `data` 为平台接口的JSON响应体。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    #[serde(default)]
    pub status: u16,

    #[serde(rename = "data", default)]
    pub body: Value,

    #[serde(default)]
    pub headers: HashMap<String, HeaderValue>,
}

impl RelayResponse {
    /// 以200状态构造响应
    pub fn new(body: Value) -> Self {
        Self {
            status: 200,
            body,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    /// 按名称查找响应头 (不区分大小写)
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// 取出全部 `Set-Cookie` 条目
    ///
    /// 数组中的每个元素都可能是逗号拼接的多个条目,逐个拆分后展平。
    pub fn set_cookie_entries(&self) -> Vec<String> {
        self.header("set-cookie")
            .map(|value| {
                value
                    .values()
                    .into_iter()
                    .flat_map(split_cookie_header)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 中继客户端
///
/// 所有平台请求都经由中继转发,适配器只依赖此接口。
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn send(&self, request: RelayRequest) -> Result<RelayResponse, LoginError>;
}

/// 基于 reqwest 的中继客户端
///
/// 把 [`RelayRequest`] 以JSON POST 到中继端点,解析返回的响应信封。
pub struct HttpRelayClient {
    client: reqwest::Client,
    relay_url: String,
    user_agent: String,
}

impl HttpRelayClient {
    /// 创建新的客户端
    ///
    /// # 错误
    /// - `LoginError::Transport`: HTTP客户端构建失败 (如TLS后端初始化失败)
    pub fn new(config: &RelayConfig) -> Result<Self, LoginError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        tracing::info!(
            relay_url = %config.relay_url,
            timeout_secs = config.timeout_secs,
            "Relay client initialized"
        );

        Ok(Self {
            client,
            relay_url: config.relay_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn send(&self, mut request: RelayRequest) -> Result<RelayResponse, LoginError> {
        request
            .headers
            .insert("User-Agent".to_string(), self.user_agent.clone());

        tracing::debug!(
            target_url = %request.target_url,
            method = ?request.method,
            "Forwarding request through relay"
        );

        let response = self
            .client
            .post(&self.relay_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, target_url = %request.target_url, "Relay request failed");
                LoginError::from(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });

            tracing::error!(
                status = status.as_u16(),
                message = %message,
                target_url = %request.target_url,
                "Relay returned error status"
            );
            return Err(LoginError::Transport(message));
        }

        let envelope: RelayResponse = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(error = %e, target_url = %request.target_url, "Failed to parse relay envelope");
            LoginError::from(e)
        })?;

        tracing::trace!(
            target_url = %request.target_url,
            upstream_status = envelope.status,
            "Relay response received"
        );

        Ok(envelope)
    }
}
