//! 시장 데이터 타입.
//!
//! - `PricePoint` - 일봉 OHLCV 레코드 (저장소 와이어 형식과 동일)
//! - `WindowMeta` - 심볼별 윈도우 메타데이터 (개수, 시작일, 종료일)

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// 일봉 OHLCV 레코드.
///
/// 저장 후에는 변경되지 않으며 `(symbol, timestamp)` 조합이 유일합니다.
/// 직렬화 형식은 평면 필드 집합
/// `{symbol, timestamp, date, open, high, low, close, volume}` 입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// 표시용 심볼
    pub symbol: String,
    /// 타임스탬프 (UTC, 밀리초 epoch)
    pub timestamp: i64,
    /// 거래일
    pub date: NaiveDate,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량
    pub volume: u64,
}

impl PricePoint {
    /// 밀리초 타임스탬프로 레코드를 생성합니다. `date`는 타임스탬프의 UTC 날짜입니다.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        let date = timestamp_to_date(timestamp);
        Self {
            symbol: symbol.into(),
            timestamp,
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 타임스탬프를 `DateTime<Utc>`로 반환합니다.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// 밀리초 epoch를 UTC 날짜로 변환합니다. 범위를 벗어나면 epoch 날짜를 반환합니다.
pub fn timestamp_to_date(timestamp_ms: i64) -> NaiveDate {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.date_naive())
        .unwrap_or_default()
}

/// 심볼별 윈도우 메타데이터.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMeta {
    /// 배치 레코드 수
    pub count: usize,
    /// 첫 거래일
    pub start: NaiveDate,
    /// 마지막 거래일
    pub end: NaiveDate,
}

impl WindowMeta {
    /// 시간순으로 정렬된 레코드에서 메타데이터를 계산합니다.
    pub fn from_records(records: &[PricePoint]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        Some(Self {
            count: records.len(),
            start: first.date,
            end: last.date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_point_wire_format() {
        // 2024-01-02T00:00:00Z
        let point = PricePoint::new("UBS", 1_704_153_600_000, 30.0, 31.5, 29.8, 31.2, 1_200_000);
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

        let json = serde_json::to_value(&point).unwrap();
        let obj = json.as_object().unwrap();
        let mut fields: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        fields.sort();
        assert_eq!(
            fields,
            vec!["close", "date", "high", "low", "open", "symbol", "timestamp", "volume"]
        );
        assert_eq!(obj["date"], "2024-01-02");
        assert_eq!(obj["timestamp"], 1_704_153_600_000_i64);
    }

    #[test]
    fn test_window_meta_from_records() {
        let records = vec![
            PricePoint::new("GS", 1_704_153_600_000, 1.0, 1.0, 1.0, 1.0, 10),
            PricePoint::new("GS", 1_704_240_000_000, 1.0, 1.0, 1.0, 1.0, 10),
        ];
        let meta = WindowMeta::from_records(&records).unwrap();
        assert_eq!(meta.count, 2);
        assert_eq!(meta.start.to_string(), "2024-01-02");
        assert_eq!(meta.end.to_string(), "2024-01-03");

        assert!(WindowMeta::from_records(&[]).is_none());
    }
}
