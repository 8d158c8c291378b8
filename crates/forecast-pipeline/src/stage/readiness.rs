//! 인프라 준비 상태 대기.

use super::{Stage, StageContext};
use crate::{PipelineError, Result};
use async_trait::async_trait;
use forecast_core::ReadinessConfig;
use forecast_data::TimeSeriesStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 외부 상태 확인.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// 확인 대상 이름.
    fn name(&self) -> &str;

    /// 준비되었으면 `true`.
    async fn check(&self) -> bool;
}

/// 저장소 PING 기반 상태 확인.
pub struct StoreHealthCheck {
    store: Arc<dyn TimeSeriesStore>,
}

impl StoreHealthCheck {
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthCheck for StoreHealthCheck {
    fn name(&self) -> &str {
        self.store.backend()
    }

    async fn check(&self) -> bool {
        match self.store.ping().await {
            Ok(ready) => ready,
            Err(e) => {
                debug!(target_store = self.store.backend(), error = %e, "PING 실패");
                false
            }
        }
    }
}

/// 고정 간격으로 상태 확인을 반복하는 스테이지.
///
/// 첫 확인은 즉시 수행하고, 이후 `interval`마다 최대 `max_attempts`회까지 확인합니다.
pub struct ReadinessWait<H> {
    check: H,
    interval: Duration,
    max_attempts: u32,
}

impl<H: HealthCheck> ReadinessWait<H> {
    pub fn new(check: H, interval: Duration, max_attempts: u32) -> Self {
        Self {
            check,
            interval,
            max_attempts,
        }
    }

    pub fn from_config(check: H, config: &ReadinessConfig) -> Self {
        Self::new(check, config.interval(), config.max_attempts)
    }

    /// 성공할 때까지 폴링하고 사용한 시도 횟수를 반환합니다.
    pub async fn wait(&self) -> Result<u32> {
        for attempt in 1..=self.max_attempts {
            if self.check.check().await {
                return Ok(attempt);
            }
            debug!(
                target_name = self.check.name(),
                attempt,
                max_attempts = self.max_attempts,
                "아직 준비되지 않음"
            );
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(PipelineError::ReadinessExhausted {
            target: self.check.name().to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[async_trait]
impl<H: HealthCheck> Stage for ReadinessWait<H> {
    fn name(&self) -> &str {
        "readiness"
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String> {
        let attempts = self.wait().await?;
        info!(target_name = self.check.name(), attempts, "준비 완료");
        Ok(format!("{} ready after {} attempt(s)", self.check.name(), attempts))
    }
}
