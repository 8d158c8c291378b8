//! TTL 기반 시계열 저장소.
//!
//! - `RedisStore`: Redis 백엔드
//! - `MemoryStore`: 프로세스 내 백엔드 (동일한 키 레이아웃과 와이어 형식)
//!
//! 레코드는 배치 단위로 같은 TTL을 공유하며 명시적 삭제 없이 만료됩니다.
//! 윈도우 크기 제한은 조회 시점(`get_window`)에 적용됩니다.

pub mod keys;
pub mod memory;
pub mod redis;

use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use forecast_core::{PricePoint, WindowMeta};
use std::collections::BTreeMap;
use std::time::Duration;

pub use keys::{MetaField, StoreKeys};
pub use memory::MemoryStore;
pub use self::redis::RedisStore;

/// `put_batch` 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReceipt {
    /// 심볼
    pub symbol: String,
    /// 저장된 레코드 수 (중복 타임스탬프 제외)
    pub stored: usize,
    /// 첫 거래일
    pub start: Option<NaiveDate>,
    /// 마지막 거래일
    pub end: Option<NaiveDate>,
    /// 적용된 TTL (초)
    pub ttl_secs: u64,
}

/// 시계열 저장소 trait.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// 백엔드 이름.
    fn backend(&self) -> &str;

    /// 키 레이아웃.
    fn keys(&self) -> &StoreKeys;

    /// 저장소 상태를 확인합니다.
    async fn ping(&self) -> Result<bool>;

    /// 한 심볼의 배치를 저장합니다.
    ///
    /// 레코드와 정렬 인덱스를 먼저 기록한 뒤 메타데이터를 같은 TTL로 기록합니다.
    /// 같은 타임스탬프는 덮어씁니다.
    async fn put_batch(
        &self,
        symbol: &str,
        records: &[PricePoint],
        ttl: Duration,
    ) -> Result<BatchReceipt>;

    /// 최근 `max_points`개 레코드를 시간 오름차순으로 반환합니다.
    ///
    /// 데이터가 없는 심볼은 빈 벡터를 반환합니다.
    async fn get_window(&self, symbol: &str, max_points: usize) -> Result<Vec<PricePoint>>;

    /// 심볼의 윈도우 메타데이터. 만료되었거나 없으면 `None`.
    async fn window_meta(&self, symbol: &str) -> Result<Option<WindowMeta>>;

    /// 접두사로 시작하는 모든 키를 삭제하고 삭제된 키 수를 반환합니다.
    async fn flush(&self, namespace_prefix: &str) -> Result<usize>;
}

/// 검증을 거친 배치.
///
/// 타임스탬프 오름차순이며 중복 타임스탬프는 마지막 레코드만 남습니다.
pub(crate) struct PreparedBatch {
    pub records: Vec<PricePoint>,
    pub ttl_secs: u64,
}

impl PreparedBatch {
    pub fn new(symbol: &str, records: &[PricePoint], ttl: Duration) -> Result<Self> {
        keys::validate_symbol(symbol)?;

        let ttl_secs = ttl.as_secs();
        if ttl_secs == 0 {
            return Err(DataError::InvalidData(format!(
                "TTL은 1초 이상이어야 합니다 ({})",
                symbol
            )));
        }

        let mut by_ts: BTreeMap<i64, PricePoint> = BTreeMap::new();
        for record in records {
            if record.symbol != symbol {
                return Err(DataError::InvalidData(format!(
                    "배치 심볼 불일치: {} != {}",
                    record.symbol, symbol
                )));
            }
            by_ts.insert(record.timestamp, record.clone());
        }

        Ok(Self {
            records: by_ts.into_values().collect(),
            ttl_secs,
        })
    }

    pub fn receipt(&self, symbol: &str) -> BatchReceipt {
        let meta = WindowMeta::from_records(&self.records);
        BatchReceipt {
            symbol: symbol.to_string(),
            stored: self.records.len(),
            start: meta.as_ref().map(|m| m.start),
            end: meta.as_ref().map(|m| m.end),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// 메타데이터 문자열 값에서 `WindowMeta`를 복원합니다.
pub(crate) fn parse_meta(
    count: Option<String>,
    start: Option<String>,
    end: Option<String>,
) -> Result<Option<WindowMeta>> {
    let (Some(count), Some(start), Some(end)) = (count, start, end) else {
        return Ok(None);
    };

    let count = count
        .parse()
        .map_err(|_| DataError::ParseError(format!("meta count: {:?}", count)))?;
    let start = NaiveDate::parse_from_str(&start, "%Y-%m-%d")
        .map_err(|e| DataError::ParseError(format!("meta start: {}", e)))?;
    let end = NaiveDate::parse_from_str(&end, "%Y-%m-%d")
        .map_err(|e| DataError::ParseError(format!("meta end: {}", e)))?;

    Ok(Some(WindowMeta { count, start, end }))
}
