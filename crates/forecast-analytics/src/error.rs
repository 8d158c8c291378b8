//! 분석 모듈 오류 타입.

use thiserror::Error;

/// 상관관계 계산 오류.
///
/// 쌍 단위 오류이며 해당 쌍만 결과에서 제외됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// 공통 타임스탬프 부족
    #[error("insufficient data: {overlap} aligned points, {required} required")]
    InsufficientData { overlap: usize, required: usize },

    /// 분산이 0인 수익률 시계열
    #[error("undefined: zero variance")]
    ZeroVariance,
}
