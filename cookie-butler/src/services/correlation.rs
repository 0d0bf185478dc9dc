//! 请求关联标识生成

use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Builder;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 生成 UUID v4 形式的关联标识
///
/// 优先使用操作系统随机源。随机源不可用时退回到基于时间与计数器的构造,
/// 该路径仍满足 `xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx` 形状,但**不具备不可预测性**,
/// 只保证同一进程内不重复。
pub fn generate_correlation_id() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "OS random source unavailable, using weak correlation id");
            fallback_correlation_id()
        }
    }
}

/// 弱随机构造
///
/// 版本位与变体位由 `Builder::from_random_bytes` 统一设置。
fn fallback_correlation_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

    let hi = splitmix64(nanos ^ count.rotate_left(32));
    let lo = splitmix64(hi ^ count ^ u64::from(std::process::id()));

    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&hi.to_be_bytes());
    bytes[8..].copy_from_slice(&lo.to_be_bytes());
    Builder::from_random_bytes(bytes).into_uuid().to_string()
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
