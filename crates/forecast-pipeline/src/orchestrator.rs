//! 파이프라인 오케스트레이터.
//!
//! 스테이지를 정해진 순서로 하나씩 실행하고, 실패하거나 타임아웃된
//! 스테이지가 있으면 나머지 스테이지를 실행하지 않습니다.
//!
//! 순서: readiness → (clean) → ingest → (build) → run → report

use crate::config::RunOptions;
use crate::stage::{
    BuildIfAbsent, FlushStage, IngestStage, OneShotInvocation, ReadinessWait, ReportStage, Stage,
    StageContext, StageRecord, StageStatus, StoreHealthCheck,
};
use crate::Result;
use forecast_core::{stage_span, AppConfig};
use forecast_data::{PriceSource, TimeSeriesStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, Instrument};

/// 외부 의존성.
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn TimeSeriesStore>,
    pub source: Arc<dyn PriceSource>,
}

/// 실행 결과.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub window: String,
    pub stages: Vec<StageRecord>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl PipelineReport {
    /// 모든 스테이지가 성공했는지 확인
    pub fn is_success(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Succeeded)
    }

    /// 프로세스 종료 코드 (모두 성공 시 0)
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// 파이프라인을 중단시킨 스테이지
    pub fn failed_stage(&self) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.status.is_failure())
    }

    /// 스테이지별 결과 로그 출력
    pub fn log_summary(&self) {
        for stage in &self.stages {
            info!(
                stage = %stage.name,
                status = %stage.status,
                elapsed_ms = stage.elapsed.as_millis() as u64,
                detail = stage.detail.as_deref().unwrap_or(""),
                "스테이지 결과"
            );
        }
        match self.failed_stage() {
            Some(failed) => error!(
                stage = %failed.name,
                status = %failed.status,
                error = failed.error.as_deref().unwrap_or(""),
                "파이프라인 실패"
            ),
            None => info!(
                window = %self.window,
                elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
                "파이프라인 완료"
            ),
        }
    }
}

/// 순차 실행 파이프라인.
pub struct Pipeline {
    ctx: StageContext,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// 임의의 스테이지 목록으로 파이프라인을 생성합니다.
    pub fn new(ctx: StageContext, stages: Vec<Box<dyn Stage>>) -> Self {
        Self { ctx, stages }
    }

    /// 설정과 옵션으로 표준 스테이지 순서를 구성합니다.
    ///
    /// 설정에 없는 윈도우를 요청하면 실행 전에 실패합니다.
    pub fn plan(config: Arc<AppConfig>, options: RunOptions, deps: PipelineDeps) -> Result<Self> {
        let window = options.resolve_window(&config)?;

        let mut stages: Vec<Box<dyn Stage>> = Vec::new();
        if !options.skip_infra {
            stages.push(Box::new(ReadinessWait::from_config(
                StoreHealthCheck::new(deps.store.clone()),
                &config.readiness,
            )));
        }
        if options.clean {
            stages.push(Box::new(FlushStage::new()));
        }
        stages.push(Box::new(IngestStage::new(deps.source)));
        if !config.engine.build_command.is_empty() {
            stages.push(Box::new(BuildIfAbsent::new()));
        }
        stages.push(Box::new(OneShotInvocation::new()));
        stages.push(Box::new(ReportStage::new()));

        let ctx = StageContext::new(config, window, options, deps.store);
        Ok(Self::new(ctx, stages))
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    /// 구성된 스테이지 이름 목록
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 스테이지를 순서대로 실행합니다.
    pub async fn run(&self) -> PipelineReport {
        let started = Instant::now();
        let mut records: Vec<StageRecord> =
            self.stages.iter().map(|s| StageRecord::pending(s.name())).collect();

        info!(
            window = %self.ctx.window,
            store = self.ctx.store.backend(),
            stages = ?self.stage_names(),
            "파이프라인 시작"
        );

        for (stage, record) in self.stages.iter().zip(records.iter_mut()) {
            let span = stage_span!(stage.name(), self.ctx.window);
            record.status = StageStatus::Running;
            info!(parent: &span, stage = stage.name(), status = %record.status, "스테이지 시작");

            let stage_started = Instant::now();
            let result = stage.run(&self.ctx).instrument(span.clone()).await;
            record.elapsed = stage_started.elapsed();

            match result {
                Ok(detail) => {
                    record.status = StageStatus::Succeeded;
                    info!(
                        parent: &span,
                        stage = stage.name(),
                        status = %record.status,
                        elapsed_ms = record.elapsed.as_millis() as u64,
                        detail = %detail,
                        "스테이지 완료"
                    );
                    record.detail = Some(detail);
                }
                Err(e) => {
                    record.status = if e.is_timeout() {
                        StageStatus::TimedOut
                    } else {
                        StageStatus::Failed
                    };
                    error!(
                        parent: &span,
                        stage = stage.name(),
                        status = %record.status,
                        elapsed_ms = record.elapsed.as_millis() as u64,
                        error = %e,
                        "스테이지 실패"
                    );
                    record.error = Some(e.to_string());
                    break;
                }
            }
        }

        PipelineReport {
            window: self.ctx.window.label.clone(),
            stages: records,
            elapsed: started.elapsed(),
        }
    }
}
