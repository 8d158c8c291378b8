//! Yahoo Finance 일봉 Provider.

use super::PriceSource;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use forecast_core::{PricePoint, SymbolSpec};
use time::OffsetDateTime;
use tracing::debug;

/// 거래일 수에 대한 달력 조회 기간 (주말/휴일 여유 포함).
pub fn calendar_lookback_days(trading_days: u32) -> i64 {
    trading_days as i64 * 8 / 5 + 10
}

/// 소수점 4자리 반올림.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Yahoo Finance Provider.
pub struct YahooPriceSource {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooPriceSource {
    pub fn new() -> Result<Self> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| DataError::ConnectionError(format!("Yahoo Finance 연결 실패: {}", e)))?;
        Ok(Self { connector })
    }
}

/// 원시 일봉을 표시 심볼 레코드로 변환합니다.
fn to_point(spec: &SymbolSpec, q: &yahoo_finance_api::Quote) -> PricePoint {
    PricePoint::new(
        &spec.symbol,
        q.timestamp as i64 * 1000,
        round4(q.open),
        round4(q.high),
        round4(q.low),
        round4(q.close),
        q.volume,
    )
}

/// 시간순 정렬 후 최근 `trading_days`개만 남깁니다.
fn trim_window(mut points: Vec<PricePoint>, trading_days: u32) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.timestamp);
    points.dedup_by_key(|p| p.timestamp);

    let keep = trading_days as usize;
    if points.len() > keep {
        points.drain(..points.len() - keep);
    }
    points
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_window(&self, spec: &SymbolSpec, trading_days: u32) -> Result<Vec<PricePoint>> {
        let ticker = spec.source_ticker();
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(calendar_lookback_days(trading_days));

        debug!(
            symbol = %spec.symbol,
            ticker = ticker,
            trading_days = trading_days,
            "Yahoo Finance API 날짜 범위 호출"
        );

        let response = self
            .connector
            .get_quote_history_interval(ticker, start, end, "1d")
            .await
            .map_err(|e| DataError::FetchError(format!("Yahoo Finance API 오류 ({}): {}", ticker, e)))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::ParseError(format!("Quote 파싱 오류: {}", e)))?;

        let points = quotes.iter().map(|q| to_point(spec, q)).collect();
        Ok(trim_window(points, trading_days))
    }
}
