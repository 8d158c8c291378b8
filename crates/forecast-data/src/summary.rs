//! 저장소 요약 통계.

use crate::error::Result;
use crate::storage::TimeSeriesStore;
use chrono::NaiveDate;
use forecast_core::PricePoint;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// 심볼별 평균 거래량.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeRank {
    pub symbol: String,
    pub average_volume: f64,
}

/// 저장소에 적재된 윈도우의 요약.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSummary {
    /// 전체 레코드 수
    pub total_records: usize,
    /// 데이터가 있는 심볼 수
    pub symbols_with_data: usize,
    /// 전체 기간 (최초 거래일, 최종 거래일)
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// 심볼별 레코드 수 (요청 순서)
    pub record_counts: Vec<(String, usize)>,
    /// 평균 거래량 내림차순 (동률은 심볼 순)
    pub volume_ranking: Vec<VolumeRank>,
}

impl StoreSummary {
    /// 저장소에서 각 심볼의 윈도우를 읽어 요약합니다.
    pub async fn collect<S>(store: &S, symbols: &[String], max_points: usize) -> Result<Self>
    where
        S: TimeSeriesStore + ?Sized,
    {
        let windows = load_windows(store, symbols, max_points).await?;
        Ok(Self::from_windows(&windows))
    }

    /// 이미 읽어 둔 윈도우로부터 요약을 만듭니다.
    pub fn from_windows(windows: &[(String, Vec<PricePoint>)]) -> Self {
        let mut summary = Self::default();

        for (symbol, points) in windows {
            summary.record_counts.push((symbol.clone(), points.len()));
            if points.is_empty() {
                continue;
            }

            summary.total_records += points.len();
            summary.symbols_with_data += 1;

            let first = points.iter().map(|p| p.date).min();
            let last = points.iter().map(|p| p.date).max();
            if let (Some(first), Some(last)) = (first, last) {
                summary.date_range = Some(match summary.date_range {
                    Some((start, end)) => (start.min(first), end.max(last)),
                    None => (first, last),
                });
            }

            let total: f64 = points.iter().map(|p| p.volume as f64).sum();
            summary.volume_ranking.push(VolumeRank {
                symbol: symbol.clone(),
                average_volume: total / points.len() as f64,
            });
        }

        summary.volume_ranking.sort_by(|a, b| {
            b.average_volume
                .partial_cmp(&a.average_volume)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        summary
    }

    /// 상위 `n`개 거래량 항목.
    pub fn top_volumes(&self, n: usize) -> &[VolumeRank] {
        &self.volume_ranking[..n.min(self.volume_ranking.len())]
    }
}

/// 심볼별 윈도우를 순서대로 읽습니다.
pub async fn load_windows<S>(
    store: &S,
    symbols: &[String],
    max_points: usize,
) -> Result<Vec<(String, Vec<PricePoint>)>>
where
    S: TimeSeriesStore + ?Sized,
{
    let mut windows = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let points = store.get_window(symbol, max_points).await?;
        debug!(symbol = %symbol, count = points.len(), "윈도우 조회");
        windows.push((symbol.clone(), points));
    }
    Ok(windows)
}
