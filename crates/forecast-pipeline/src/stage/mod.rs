//! 파이프라인 스테이지.
//!
//! 각 스테이지는 `run()` 하나로 결과를 내는 독립 단위입니다:
//! - `ReadinessWait`: 외부 상태 확인 폴링
//! - `FlushStage`: 저장소 네임스페이스 삭제
//! - `IngestStage`: 가격 데이터 수집 및 저장
//! - `BuildIfAbsent`: 실행 파일이 없을 때만 빌드
//! - `OneShotInvocation`: 분석 엔진 1회 실행
//! - `ReportStage`: 보고서 생성
//!
//! 스테이지 간에는 저장소와 캡처된 엔진 출력 파일로만 데이터가 전달됩니다.

pub mod build;
pub mod clean;
pub mod ingest;
pub mod readiness;
pub mod report;
pub mod run;

pub use build::BuildIfAbsent;
pub use clean::FlushStage;
pub use ingest::IngestStage;
pub use readiness::{HealthCheck, ReadinessWait, StoreHealthCheck};
pub use report::ReportStage;
pub use run::OneShotInvocation;

use crate::config::RunOptions;
use crate::Result;
use async_trait::async_trait;
use forecast_core::{AppConfig, WindowPreset};
use forecast_data::TimeSeriesStore;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// 스테이지 상태.
///
/// `Pending → Running → {Succeeded, Failed, TimedOut}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl StageStatus {
    /// 종료 상태인지 확인
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::TimedOut)
    }

    /// 파이프라인을 중단시키는 상태인지 확인
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::TimedOut)
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        };
        write!(f, "{}", s)
    }
}

/// 스테이지 실행 기록.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    /// 성공 시 요약 (예: "14/15 symbols, 3360 records")
    pub detail: Option<String>,
    /// 실패 시 에러 메시지
    pub error: Option<String>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl StageRecord {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Pending,
            detail: None,
            error: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// 모든 스테이지가 공유하는 불변 실행 컨텍스트.
#[derive(Clone)]
pub struct StageContext {
    pub config: Arc<AppConfig>,
    pub window: WindowPreset,
    pub options: RunOptions,
    pub store: Arc<dyn TimeSeriesStore>,
}

impl StageContext {
    pub fn new(
        config: Arc<AppConfig>,
        window: WindowPreset,
        options: RunOptions,
        store: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            config,
            window,
            options,
            store,
        }
    }

    /// 유니버스 심볼 목록
    pub fn symbols(&self) -> Vec<String> {
        self.config
            .symbols
            .universe
            .iter()
            .map(|s| s.symbol.clone())
            .collect()
    }
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("window", &self.window)
            .field("options", &self.options)
            .field("store", &self.store.backend())
            .finish()
    }
}

/// 파이프라인 스테이지 trait.
#[async_trait]
pub trait Stage: Send + Sync {
    /// 스테이지 이름 (로그 및 결과 표시용).
    fn name(&self) -> &str;

    /// 스테이지를 실행하고 성공 시 요약 문자열을 반환합니다.
    async fn run(&self, ctx: &StageContext) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use forecast_core::PricePoint;
    use forecast_data::MemoryStore;

    const DAY_MS: i64 = 86_400_000;
    const BASE_TS: i64 = 1_704_153_600_000;

    /// 메모리 저장소를 사용하는 컨텍스트
    pub fn context_with(config: AppConfig, window_days: u32) -> StageContext {
        let window = config
            .window(window_days)
            .cloned()
            .unwrap_or_else(|_| WindowPreset::new(window_days));
        StageContext::new(
            Arc::new(config),
            window,
            RunOptions::new(window_days),
            Arc::new(MemoryStore::default()),
        )
    }

    pub fn context(window_days: u32) -> StageContext {
        context_with(AppConfig::default(), window_days)
    }

    /// 일별 가격 시계열 (`offset`일부터 `days`일)
    pub fn series(symbol: &str, days: usize, offset: i64) -> Vec<PricePoint> {
        (0..days)
            .map(|i| {
                let day = offset + i as i64;
                let close = 100.0 + ((day * 7) % 13) as f64;
                PricePoint::new(symbol, BASE_TS + day * DAY_MS, close, close + 1.0, close - 1.0, close, 1_000 + day as u64)
            })
            .collect()
    }
}
