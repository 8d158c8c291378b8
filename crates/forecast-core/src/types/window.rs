//! 분석 윈도우 정의.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 하루의 초 단위 길이.
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// 분석 윈도우 프리셋.
///
/// 한 번의 실행에서 보관/분석하는 거래일 수와 표시용 이름을 가집니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPreset {
    /// 거래일 수
    pub trading_days: u32,
    /// 표시용 이름 (예: "50-Day")
    pub label: String,
}

impl WindowPreset {
    /// 새 프리셋을 생성합니다. 이름은 `"<N>-Day"` 형식입니다.
    pub fn new(trading_days: u32) -> Self {
        Self {
            trading_days,
            label: format!("{}-Day", trading_days),
        }
    }

    /// 배치 레코드에 적용할 TTL (거래일 수 × 1일).
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs())
    }

    /// TTL (초 단위).
    pub fn ttl_secs(&self) -> u64 {
        u64::from(self.trading_days) * SECS_PER_DAY
    }

    /// 윈도우당 최대 포인트 수.
    pub fn max_points(&self) -> usize {
        self.trading_days as usize
    }
}

impl fmt::Display for WindowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// 기본 윈도우 프리셋 (14 / 50 / 100 / 240 거래일).
pub fn default_windows() -> Vec<WindowPreset> {
    [14, 50, 100, 240].into_iter().map(WindowPreset::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ttl() {
        let window = WindowPreset::new(50);
        assert_eq!(window.ttl_secs(), 50 * 86_400);
        assert_eq!(window.ttl(), Duration::from_secs(4_320_000));
        assert_eq!(window.label, "50-Day");
        assert_eq!(window.max_points(), 50);
    }

    #[test]
    fn test_default_windows() {
        let days: Vec<u32> = default_windows().iter().map(|w| w.trading_days).collect();
        assert_eq!(days, vec![14, 50, 100, 240]);
    }
}
