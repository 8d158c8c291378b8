//! 예측 파이프라인 오케스트레이터.
//!
//! 이 crate는 분석 실행 전체를 스테이지 단위로 구성합니다:
//! - 인프라 준비 상태 확인 (저장소 PING 폴링)
//! - 저장소 정리 및 가격 데이터 수집
//! - 분석 엔진 빌드/실행 (타임아웃 적용)
//! - 보고서 생성
//!
//! `forecast` 바이너리가 CLI를 제공합니다.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod process;
pub mod stage;
pub mod stats;

pub use config::RunOptions;
pub use error::{PipelineError, Result};
pub use orchestrator::{Pipeline, PipelineDeps, PipelineReport};
pub use process::{run_with_timeout, ProcessOutput, ProcessSpec};
pub use stage::{Stage, StageContext, StageRecord, StageStatus};
pub use stats::IngestionStats;
