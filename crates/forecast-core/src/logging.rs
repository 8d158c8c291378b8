//! tracing 기반 로깅 초기화.
//!
//! 출력 형식은 `pretty`, `json`, `compact` 세 가지이며, 설정 파일의
//! `[logging]` 섹션 또는 CLI 옵션에서 선택합니다. `RUST_LOG`가 있으면
//! 설정된 레벨보다 우선합니다.

use crate::config::LoggingConfig;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::Registry,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// verbose 모드에서 debug로 올리는 crate 목록
const PIPELINE_TARGETS: [&str; 4] = [
    "forecast_core",
    "forecast_data",
    "forecast_analytics",
    "forecast_pipeline",
];

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 터미널용 여러 줄 형식
    #[default]
    Pretty,
    /// 수집기용 JSON 한 줄
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!(
                "알 수 없는 로그 형식: {} (pretty, json, compact)",
                other
            )),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info", "info,forecast_pipeline=debug")
    pub level: String,
    pub format: LogFormat,
    /// 스테이지 span 진입/종료 이벤트 출력
    pub with_span_events: bool,
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_span_events: false,
            with_target: true,
        }
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// 설정 파일의 `[logging]` 섹션에서 생성합니다.
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, String> {
        Ok(Self::new(settings.level.clone()).with_format(settings.format.parse()?))
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// 파이프라인 crate들의 레벨을 debug로 올리고 스테이지 span을 출력합니다.
    ///
    /// 외부 crate(redis, hyper 등)는 기존 레벨을 유지합니다.
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            let mut directives = vec![self.level.clone()];
            directives.extend(PIPELINE_TARGETS.iter().map(|t| format!("{}=debug", t)));
            self.level = directives.join(",");
            self.with_span_events = true;
        }
        self
    }

    fn span_events(&self) -> FmtSpan {
        if self.with_span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// 전역 subscriber를 설치합니다. 프로세스당 한 번만 호출할 수 있습니다.
///
/// ```no_run
/// use forecast_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("info").with_format(LogFormat::Compact)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let base = fmt::layer()
        .with_target(config.with_target)
        .with_span_events(config.span_events());
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().with_current_span(true).boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %config.level, "로깅 초기화");
    Ok(())
}

/// 파이프라인 스테이지 span.
///
/// ```ignore
/// let span = stage_span!("ingest", window);
/// ```
#[macro_export]
macro_rules! stage_span {
    ($stage:expr) => {
        tracing::info_span!("stage", stage = %$stage)
    };
    ($stage:expr, $window:expr) => {
        tracing::info_span!("stage", stage = %$stage, window = %$window)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" Json ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_verbose_raises_pipeline_targets_only() {
        let config = LogConfig::new("warn").verbose(true);
        assert!(config.level.starts_with("warn,"));
        assert!(config.level.contains("forecast_pipeline=debug"));
        assert!(config.level.contains("forecast_data=debug"));
        assert!(config.with_span_events);

        let quiet = LogConfig::new("warn").verbose(false);
        assert_eq!(quiet.level, "warn");
        assert!(!quiet.with_span_events);
    }

    #[test]
    fn test_from_settings() {
        let settings = LoggingConfig {
            level: "debug".into(),
            format: "json".into(),
        };
        let config = LogConfig::from_settings(&settings).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);

        let bad = LoggingConfig {
            level: "info".into(),
            format: "yaml".into(),
        };
        assert!(LogConfig::from_settings(&bad).is_err());
    }

    #[test]
    fn test_directives_parse() {
        let config = LogConfig::new("info").verbose(true);
        assert!(EnvFilter::try_new(&config.level).is_ok());
    }
}
