//! 가격 데이터 수집 스테이지.

use super::{Stage, StageContext};
use crate::stats::IngestionStats;
use crate::{PipelineError, Result};
use async_trait::async_trait;
use forecast_data::{PriceSource, StoreSummary};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 유니버스의 각 심볼을 소스에서 가져와 윈도우 TTL로 저장합니다.
///
/// 심볼 단위 실패는 경고 후 건너뜁니다. 저장소 장애는 즉시 실패하며,
/// 하나의 심볼도 저장하지 못하면 스테이지가 실패합니다.
pub struct IngestStage {
    source: Arc<dyn PriceSource>,
}

impl IngestStage {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// 수집을 실행하고 통계를 반환합니다.
    pub async fn ingest(&self, ctx: &StageContext) -> Result<IngestionStats> {
        let started = Instant::now();
        let window = &ctx.window;
        let ttl = window.ttl();
        let mut stats = IngestionStats::new();

        info!(
            source = self.source.name(),
            window = %window,
            symbols = ctx.config.symbols.universe.len(),
            "수집 시작"
        );

        for spec in &ctx.config.symbols.universe {
            stats.total += 1;

            let points = match self.source.fetch_window(spec, window.trading_days).await {
                Ok(points) => points,
                Err(e) => {
                    warn!(symbol = %spec.symbol, ticker = spec.source_ticker(), error = %e, "가격 조회 실패");
                    stats.errors += 1;
                    stats.failed_symbols.push(spec.symbol.clone());
                    continue;
                }
            };

            if points.is_empty() {
                warn!(symbol = %spec.symbol, ticker = spec.source_ticker(), "데이터 없음");
                stats.empty += 1;
                stats.failed_symbols.push(spec.symbol.clone());
                continue;
            }

            match ctx.store.put_batch(&spec.symbol, &points, ttl).await {
                Ok(receipt) => {
                    debug!(
                        symbol = %spec.symbol,
                        records = receipt.stored,
                        start = ?receipt.start,
                        end = ?receipt.end,
                        "저장 완료"
                    );
                    stats.success += 1;
                    stats.total_records += receipt.stored;
                }
                Err(e) if e.is_store_failure() => return Err(PipelineError::Store(e)),
                Err(e) => {
                    warn!(symbol = %spec.symbol, error = %e, "잘못된 배치");
                    stats.errors += 1;
                    stats.failed_symbols.push(spec.symbol.clone());
                }
            }
        }

        stats.elapsed = started.elapsed();
        stats.log_summary("ingest");

        if stats.success == 0 {
            return Err(PipelineError::Ingestion(format!(
                "no symbol ingested ({} attempted)",
                stats.total
            )));
        }
        Ok(stats)
    }

    /// 저장소에 실제로 남은 데이터를 요약합니다.
    pub async fn verify(&self, ctx: &StageContext) -> Result<StoreSummary> {
        let summary =
            StoreSummary::collect(ctx.store.as_ref(), &ctx.symbols(), ctx.window.max_points()).await?;
        info!(
            total_records = summary.total_records,
            symbols_with_data = summary.symbols_with_data,
            date_range = ?summary.date_range,
            "저장소 확인"
        );
        Ok(summary)
    }
}

#[async_trait]
impl Stage for IngestStage {
    fn name(&self) -> &str {
        "ingest"
    }

    async fn run(&self, ctx: &StageContext) -> Result<String> {
        let stats = self.ingest(ctx).await?;
        self.verify(ctx).await?;
        Ok(stats.summary())
    }
}
