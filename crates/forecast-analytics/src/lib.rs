//! 상관관계 분석 및 보고서 생성.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 정렬된 수익률 기반 상관관계 엔진
//! - 분석 엔진 출력 파서
//! - 보고서 생성
//!
//! # Re-exports
//!
//! - [`correlation`]: 상관계수 계산 (CorrelationEngine, CorrelationRanking 등)
//! - [`engine_output`]: 엔진 출력 파싱 (AnalysisOutput)
//! - [`report`]: 보고서 생성 (ReportInput, synthesize)

pub mod correlation;
pub mod engine_output;
pub mod error;
pub mod report;

// Correlation 모듈 re-exports
pub use correlation::{
    align, pearson, rank_coefficients, returns, AlignedSeries, CorrelationEngine,
    CorrelationRanking, CorrelationResult, SkippedPair,
};

// Engine output 모듈 re-exports
pub use engine_output::{parse_engine_output, AnalysisOutput};

// Report 모듈 re-exports
pub use report::{synthesize, PerformanceStatus, ReportInput, SECTION_TITLES};

pub use error::CorrelationError;
