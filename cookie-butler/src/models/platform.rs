use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::LoginError;

/// 支持扫码登录的平台
///
/// 封闭集合,每个平台对应一个适配器和一个会话槽位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// 夸克网盘
    Quark,

    /// 阿里云盘
    Ali,

    /// UC网盘
    Uc,

    /// 哔哩哔哩
    Bili,
}

impl Platform {
    /// 全部平台,按注册顺序
    pub const ALL: [Platform; 4] = [Platform::Quark, Platform::Ali, Platform::Uc, Platform::Bili];

    /// 平台标识 (与前端约定的小写键)
    pub fn key(self) -> &'static str {
        match self {
            Platform::Quark => "quark",
            Platform::Ali => "ali",
            Platform::Uc => "uc",
            Platform::Bili => "bili",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Platform {
    type Err = LoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| LoginError::UnsupportedPlatform(s.to_string()))
    }
}
