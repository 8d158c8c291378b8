//! 에러 타입 정의.

use forecast_core::ForecastError;
use forecast_data::DataError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 파이프라인 에러 타입.
///
/// 스테이지에서 발생하면 해당 스테이지가 실패하고 이후 스테이지는 실행되지 않습니다.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(#[from] ForecastError),

    /// 저장소 에러 (연결 불가 등)
    #[error("Store error: {0}")]
    Store(DataError),

    /// 수집 에러 (수집된 심볼 없음)
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// 준비 상태 확인 시도 횟수 초과
    #[error("{target} not ready after {attempts} attempt(s)")]
    ReadinessExhausted { target: String, attempts: u32 },

    /// 프로세스 타임아웃
    #[error("`{command}` timed out after {}s", .timeout.as_secs_f64())]
    ProcessTimeout { command: String, timeout: Duration },

    /// 프로세스 비정상 종료
    #[error("`{command}` failed ({status}): {detail}")]
    ProcessFailure {
        command: String,
        status: String,
        detail: String,
    },

    /// 빌드 후에도 실행 파일이 없음
    #[error("Artifact missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// I/O 에러
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// 타임아웃으로 인한 실패인지 확인합니다.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ProcessTimeout { .. })
    }
}

impl From<DataError> for PipelineError {
    fn from(err: DataError) -> Self {
        Self::Store(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, PipelineError>;
