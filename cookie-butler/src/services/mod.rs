//! 服务层模块
//!
//! 包含扫码登录的全部业务逻辑:
//! - `credential`: Cookie 头拆分与凭证归一化
//! - `correlation`: 扫码请求的关联标识
//! - `relay`: 中继客户端,所有平台请求经由它转发
//! - `qr_renderer`: 二维码渲染边界
//! - `platform_adapter`: 平台适配器接口与公共辅助
//! - `cas_ticket`: 夸克/UC 共用的 CAS 协议解析
//! - `quark_login` / `ali_login` / `uc_login` / `bili_login`: 四个平台适配器
//! - `orchestrator`: 统一门面,按平台分派
//!
//! # 服务架构
//!
//! ```text
//! ┌──────────────────────────┐
//! │    LoginOrchestrator     │
//! └────────────┬─────────────┘
//!              │ Platform -> PlatformAdapter
//!              ▼
//! ┌──────────────────────────────────────────┐
//! │  QuarkLogin  AliLogin  UcLogin  BiliLogin │
//! │      (各自持有 SessionSlot)               │
//! └──────┬──────────────────────────┬────────┘
//!        │                          │
//!        ▼                          ▼
//!   RelayClient                QrRenderer
//! ```
//!
//! # 使用示例
//!
//! ```no_run
//! use std::sync::Arc;
//! use cookie_butler::config::RelayConfig;
//! use cookie_butler::models::{LoginStatus, Platform};
//! use cookie_butler::services::{HttpRelayClient, LoginOrchestrator, TextQrRenderer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let relay = Arc::new(HttpRelayClient::new(&RelayConfig::default())?);
//! let orchestrator = LoginOrchestrator::new(relay, Arc::new(TextQrRenderer));
//!
//! let scan = orchestrator.start_scan(Platform::Quark).await?;
//! println!("{}", scan.qr_image);
//!
//! // 单次查询,轮询节奏由调用方控制
//! let result = orchestrator.check_status(Platform::Quark).await?;
//! if result.status == LoginStatus::Confirmed {
//!     println!("{:?}", result.credential);
//! }
//! # Ok(())
//! # }
//! ```

pub mod ali_login;
pub mod bili_login;
pub mod cas_ticket;
pub mod correlation;
pub mod credential;
pub mod orchestrator;
pub mod platform_adapter;
pub mod qr_renderer;
pub mod quark_login;
pub mod relay;
pub mod uc_login;

pub use ali_login::AliLogin;
pub use bili_login::BiliLogin;
pub use correlation::generate_correlation_id;
pub use credential::{reduce_cookies, split_cookie_header};
pub use orchestrator::LoginOrchestrator;
pub use platform_adapter::PlatformAdapter;
pub use qr_renderer::{QrRenderer, TextQrRenderer};
pub use quark_login::QuarkLogin;
pub use relay::{HttpRelayClient, RelayClient, RelayRequest, RelayResponse};
pub use uc_login::UcLogin;
