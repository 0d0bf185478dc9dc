//! 多平台扫码登录核心
//!
//! 驱动夸克、阿里云盘、UC、哔哩哔哩四个平台的扫码协议,
//! 把各平台不一致的响应归一为可直接使用的凭证字符串。

pub mod config;
pub mod models;
pub mod services;
pub mod utils;
