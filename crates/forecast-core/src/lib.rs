//! # Forecast Core
//!
//! 예측 파이프라인의 핵심 도메인 모델과 공통 인프라를 제공합니다:
//! - 가격 레코드 및 윈도우 메타데이터
//! - 심볼 유니버스 및 분석 윈도우 프리셋
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
