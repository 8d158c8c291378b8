//! 보고서 생성 스테이지.

use super::{Stage, StageContext};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use forecast_analytics::{parse_engine_output, synthesize, CorrelationEngine, ReportInput};
use forecast_data::{load_windows, StoreSummary};
use std::io::ErrorKind;
use tracing::{info, warn};

/// 저장소 데이터와 캡처된 엔진 출력을 결합해 보고서를 작성합니다.
///
/// 엔진 출력이 없거나 인식할 수 있는 지표가 없어도 보고서는 생성됩니다.
#[derive(Debug, Default)]
pub struct ReportStage;

impl ReportStage {
    pub fn new() -> Self {
        Self
    }

    /// 보고서 본문을 생성합니다.
    pub async fn render(&self, ctx: &StageContext) -> Result<String> {
        let config = &ctx.config;

        let output_path = &config.engine.output_path;
        let raw = match tokio::fs::read_to_string(output_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %output_path.display(), "엔진 출력 파일 없음");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        let analysis = parse_engine_output(&raw);
        if analysis.is_empty() {
            warn!("엔진 출력에서 인식된 지표 없음, 부분 보고서 생성");
        } else {
            info!(metrics = analysis.metric_count(), movers = analysis.movers.len(), "엔진 출력 파싱");
        }

        let symbols = ctx.symbols();
        let windows = load_windows(ctx.store.as_ref(), &symbols, ctx.window.max_points()).await?;

        let threshold = config.correlation.threshold;
        let ranking = CorrelationEngine::new(config.correlation.clone()).rank_pairs(&windows, threshold);
        info!(
            evaluated = ranking.evaluated,
            pairs = ranking.pairs.len(),
            skipped = ranking.skipped_pairs.len(),
            "상관관계 계산"
        );

        let store = StoreSummary::from_windows(&windows);
        let input = ReportInput {
            window: &ctx.window,
            generated_at: Utc::now(),
            universe: &config.symbols.universe,
            correlations: &ranking,
            correlation_threshold: threshold,
            analysis: &analysis,
            store: &store,
            engine_built: config.engine.artifact_path().exists(),
            settings: &config.report,
        };
        Ok(synthesize(&input))
    }
}

#[async_trait]
impl Stage for ReportStage {
    fn name(&self) -> &str {
        "report"
    }

    async fn run(&self, ctx: &StageContext) -> Result<String> {
        let document = self.render(ctx).await?;

        let path = &ctx.config.report.path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &document).await?;

        info!(path = %path.display(), bytes = document.len(), "보고서 저장");
        Ok(format!("wrote {}", path.display()))
    }
}
