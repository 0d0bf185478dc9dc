use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// 扫码登录状态
///
/// 状态转换流程:
/// NEW -> SCANED -> CONFIRMED
///  |        |
///  +--------+---> CANCELED (用户取消, 仅部分平台)
///  |        |
///  +--------+---> EXPIRED (二维码过期或会话不存在)
///
/// `SCANED` 拼写沿用平台接口的原始取值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoginStatus {
    /// 等待扫码
    New,

    /// 已扫码,等待确认
    Scaned,

    /// 确认成功
    Confirmed,

    /// 用户取消
    Canceled,

    /// 已过期
    Expired,
}

impl LoginStatus {
    /// 检查是否为终态
    ///
    /// 一旦进入终态,调用方不应再轮询。
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoginStatus::Confirmed | LoginStatus::Canceled | LoginStatus::Expired
        )
    }
}

/// 进行中的会话
///
/// `fields` 为平台私有的关联字段, `started_at` 用于日志中的时长统计。
#[derive(Debug, Clone)]
pub struct ActiveSession<S> {
    pub fields: S,
    pub started_at: DateTime<Utc>,
}

impl<S> ActiveSession<S> {
    /// 获取会话持续时长(秒)
    pub fn duration_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// 单平台会话槽位
///
/// 每个平台最多一个活跃会话: 新的 `store` 直接覆盖旧会话 (后启动者生效)。
/// 只由所属平台的适配器读写。
pub struct SessionSlot<S> {
    current: Mutex<Option<ActiveSession<S>>>,
}

impl<S: Clone> SessionSlot<S> {
    /// 创建空槽位
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// 写入新会话,返回是否覆盖了旧会话
    pub async fn store(&self, fields: S) -> bool {
        let mut guard = self.current.lock().await;
        let replaced = guard.is_some();
        *guard = Some(ActiveSession {
            fields,
            started_at: Utc::now(),
        });
        replaced
    }

    /// 读取当前会话的副本
    ///
    /// 不持有锁跨越网络调用,轮询期间槽位仍可被清理或覆盖。
    pub async fn snapshot(&self) -> Option<ActiveSession<S>> {
        self.current.lock().await.clone()
    }

    /// 清空槽位,返回是否确有会话被清除
    pub async fn clear(&self) -> bool {
        self.current.lock().await.take().is_some()
    }

    pub async fn is_active(&self) -> bool {
        self.current.lock().await.is_some()
    }
}

impl<S: Clone> Default for SessionSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}
