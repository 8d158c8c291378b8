//! 예측 파이프라인 CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{
    init_logging, AppConfig, LogConfig, LogFormat, StoreBackend, DEFAULT_CONFIG_PATH,
};
use forecast_data::{MemoryStore, PriceSource, RedisStore, StoreKeys, TimeSeriesStore, YahooPriceSource};
use forecast_pipeline::{Pipeline, PipelineDeps, RunOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "forecast")]
#[command(about = "Financial forecasting pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// 로그 형식 (pretty, json, compact). 지정하지 않으면 설정 파일 값 사용
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 전체 파이프라인 실행 (수집 → 엔진 → 보고서)
    Run {
        /// 분석 윈도우 (거래일 수)
        #[arg(long, default_value_t = 50)]
        window: u32,

        /// 실행 파일이 있어도 엔진을 다시 빌드
        #[arg(long)]
        build: bool,

        /// 수집 전에 저장소 데이터 삭제
        #[arg(long)]
        clean: bool,

        /// 인프라 준비 상태 확인 생략
        #[arg(long)]
        skip_infra: bool,

        /// 상세 출력 (debug 로그, 엔진 출력)
        #[arg(short, long)]
        verbose: bool,
    },

    /// 사용 가능한 분석 윈도우 목록
    Windows,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // .env는 없어도 됨
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("설정 로드 실패: {}", cli.config.display()))?;

    let (command_verbose, options) = match &cli.command {
        Commands::Run {
            window,
            build,
            clean,
            skip_infra,
            verbose,
        } => (
            *verbose,
            Some(
                RunOptions::new(*window)
                    .with_build(*build)
                    .with_clean(*clean)
                    .with_skip_infra(*skip_infra),
            ),
        ),
        Commands::Windows => (false, None),
    };

    let mut log_config =
        LogConfig::from_settings(&config.logging).map_err(|e| anyhow::anyhow!(e))?;
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(log_config.verbose(command_verbose))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let Some(options) = options else {
        for preset in &config.windows.presets {
            println!(
                "{:>4}  {:<8}  ttl={}s",
                preset.trading_days,
                preset.label,
                preset.ttl_secs()
            );
        }
        return Ok(ExitCode::SUCCESS);
    };

    let store = open_store(&config)?;
    let source: Arc<dyn PriceSource> =
        Arc::new(YahooPriceSource::new().context("Yahoo Finance 클라이언트 생성 실패")?);

    let pipeline = Pipeline::plan(Arc::new(config), options, PipelineDeps { store, source })?;
    let report = pipeline.run().await;
    report.log_summary();

    if let Some(failed) = report.failed_stage() {
        eprintln!(
            "stage `{}` {}: {}",
            failed.name,
            failed.status,
            failed.error.as_deref().unwrap_or("")
        );
    }
    Ok(ExitCode::from(report.exit_code() as u8))
}

/// 설정된 백엔드로 저장소를 생성합니다. Redis 연결은 첫 사용 시점에 맺어집니다.
fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn TimeSeriesStore>> {
    let store: Arc<dyn TimeSeriesStore> = match config.store.backend {
        StoreBackend::Redis => Arc::new(
            RedisStore::from_config(&config.store)
                .with_context(|| format!("잘못된 저장소 URL: {}", config.store.url))?,
        ),
        StoreBackend::Memory => Arc::new(MemoryStore::new(StoreKeys::new(
            config.store.entity.clone(),
        ))),
    };
    tracing::info!(backend = store.backend(), "저장소 준비");
    Ok(store)
}
