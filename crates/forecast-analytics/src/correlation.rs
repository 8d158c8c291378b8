//! 상관계수 계산 모듈.
//!
//! 종목 간 가격 움직임의 상관관계를 계산합니다.
//!
//! # 주요 기능
//!
//! - **정렬**: 두 시계열을 타임스탬프 기준으로 inner join
//! - **수익률**: 종가 시계열을 단계별 변화율로 변환
//! - **Pearson 상관계수**: 두 수익률 시계열 간 선형 상관관계 측정
//! - **순위**: 제한된 심볼 부분집합의 모든 쌍을 |계수| 기준으로 정렬
//!
//! # 예시
//!
//! ```rust,ignore
//! use forecast_analytics::correlation::{pearson, returns};
//!
//! let returns_a = returns(&[100.0, 101.0, 99.0, 102.0]);
//! let returns_b = returns(&[50.0, 50.6, 49.4, 51.1]);
//!
//! let corr = pearson(&returns_a, &returns_b);
//! println!("상관계수: {:.4}", corr.unwrap_or(0.0));
//! ```

use crate::error::CorrelationError;
use forecast_core::{CorrelationConfig, PricePoint};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// 타임스탬프로 정렬된 두 종가 시계열.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    /// 공통 타임스탬프 (오름차순)
    pub timestamps: Vec<i64>,
    /// 첫 번째 시계열 종가
    pub a: Vec<f64>,
    /// 두 번째 시계열 종가
    pub b: Vec<f64>,
}

impl AlignedSeries {
    /// 정렬 포인트 수.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// 최근 `n`개 포인트만 남깁니다.
    pub fn keep_last(mut self, n: usize) -> Self {
        let drop = self.len().saturating_sub(n);
        if drop > 0 {
            self.timestamps.drain(..drop);
            self.a.drain(..drop);
            self.b.drain(..drop);
        }
        self
    }
}

/// 두 시계열을 타임스탬프로 inner join 합니다.
///
/// 공통 타임스탬프가 `min_overlap`보다 적으면 `InsufficientData`를 반환합니다.
pub fn align(
    a: &[PricePoint],
    b: &[PricePoint],
    min_overlap: usize,
) -> Result<AlignedSeries, CorrelationError> {
    let closes_b: HashMap<i64, f64> = b.iter().map(|p| (p.timestamp, p.close)).collect();

    let mut joined: Vec<(i64, f64, f64)> = a
        .iter()
        .filter_map(|p| closes_b.get(&p.timestamp).map(|cb| (p.timestamp, p.close, *cb)))
        .collect();
    joined.sort_by_key(|(ts, _, _)| *ts);
    joined.dedup_by_key(|(ts, _, _)| *ts);

    if joined.len() < min_overlap {
        return Err(CorrelationError::InsufficientData {
            overlap: joined.len(),
            required: min_overlap,
        });
    }

    let mut aligned = AlignedSeries {
        timestamps: Vec::with_capacity(joined.len()),
        a: Vec::with_capacity(joined.len()),
        b: Vec::with_capacity(joined.len()),
    };
    for (ts, ca, cb) in joined {
        aligned.timestamps.push(ts);
        aligned.a.push(ca);
        aligned.b.push(cb);
    }
    Ok(aligned)
}

/// 가격 시계열을 수익률로 변환.
///
/// 이전 종가가 0이면 해당 단계의 수익률은 0입니다.
///
/// # 반환
///
/// 단계별 수익률 벡터 (길이: prices.len() - 1)
pub fn returns(prices: &[f64]) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    prices
        .windows(2)
        .map(|w| {
            if w[0] == 0.0 {
                0.0
            } else {
                (w[1] - w[0]) / w[0]
            }
        })
        .collect()
}

/// 모집단 Pearson 상관계수.
///
/// 길이가 다르거나 2 미만이면, 또는 어느 한쪽의 분산이 0이면 `None`.
/// 결과는 인자 순서와 무관하며 [-1, 1]로 제한됩니다.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    // 상수 시계열은 평균 반올림 오차와 무관하게 정의되지 않음
    if is_constant(x) || is_constant(y) {
        return None;
    }

    let n = x.len() as f64;

    // 평균 계산
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    // 공분산 및 분산
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    // 변동 없음
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let corr = cov / (var_x * var_y).sqrt();
    if corr.is_finite() {
        Some(corr.clamp(-1.0, 1.0))
    } else {
        None
    }
}

fn is_constant(xs: &[f64]) -> bool {
    xs.iter().all(|v| *v == xs[0])
}

/// 심볼 쌍의 상관계수.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    /// 첫 번째 심볼 (열거 순서상 앞)
    pub first: String,
    /// 두 번째 심볼
    pub second: String,
    /// 상관계수, 정의되지 않으면 `None`
    pub coefficient: Option<f64>,
    /// 계산에 사용된 정렬 포인트 수
    pub overlap: usize,
}

impl CorrelationResult {
    pub fn new(first: impl Into<String>, second: impl Into<String>, coefficient: Option<f64>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            coefficient,
            overlap: 0,
        }
    }

    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.overlap = overlap;
        self
    }
}

/// |계수| > `threshold`인 결과만 남기고 |계수| 내림차순으로 정렬합니다.
///
/// 동률은 입력 순서를 유지합니다.
pub fn rank_coefficients(results: &[CorrelationResult], threshold: f64) -> Vec<CorrelationResult> {
    let mut ranked: Vec<CorrelationResult> = results
        .iter()
        .filter(|r| r.coefficient.is_some_and(|c| c.abs() > threshold))
        .cloned()
        .collect();

    ranked.sort_by(|a, b| {
        let abs_a = a.coefficient.map_or(0.0, f64::abs);
        let abs_b = b.coefficient.map_or(0.0, f64::abs);
        abs_b.total_cmp(&abs_a)
    });
    ranked
}

/// 계산에서 제외된 쌍.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPair {
    pub first: String,
    pub second: String,
    pub reason: CorrelationError,
}

/// 쌍 순위 결과.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationRanking {
    /// 임계값을 넘는 쌍 (|계수| 내림차순)
    pub pairs: Vec<CorrelationResult>,
    /// 부분집합 크기 제한으로 제외된 심볼
    pub omitted_symbols: Vec<String>,
    /// 데이터 부족 또는 정의되지 않은 계수로 제외된 쌍
    pub skipped_pairs: Vec<SkippedPair>,
    /// 계수가 계산된 쌍 수
    pub evaluated: usize,
}

/// 상관관계 엔진.
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine {
    config: CorrelationConfig,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// 두 시계열의 상관계수.
    ///
    /// 정렬 후 최근 `lookback`개 공통 포인트의 수익률로 계산합니다.
    pub fn correlate(&self, a: &[PricePoint], b: &[PricePoint]) -> Result<(f64, usize), CorrelationError> {
        let aligned = align(a, b, self.config.min_overlap)?.keep_last(self.config.lookback);
        let overlap = aligned.len();
        if overlap < self.config.min_overlap {
            return Err(CorrelationError::InsufficientData {
                overlap,
                required: self.config.min_overlap,
            });
        }

        let coef = pearson(&returns(&aligned.a), &returns(&aligned.b))
            .ok_or(CorrelationError::ZeroVariance)?;
        Ok((coef, overlap))
    }

    /// 부분집합 내 모든 비순서 쌍의 상관계수를 계산하고 순위를 매깁니다.
    ///
    /// 입력 순서상 앞의 `subset_size`개 심볼만 사용하며 나머지는
    /// `omitted_symbols`로 보고합니다.
    pub fn rank_pairs(
        &self,
        series: &[(String, Vec<PricePoint>)],
        threshold: f64,
    ) -> CorrelationRanking {
        let cut = series.len().min(self.config.subset_size);
        let (subset, rest) = series.split_at(cut);

        let mut ranking = CorrelationRanking {
            omitted_symbols: rest.iter().map(|(s, _)| s.clone()).collect(),
            ..Default::default()
        };

        let mut computed = Vec::new();
        for (i, (sym_a, points_a)) in subset.iter().enumerate() {
            for (sym_b, points_b) in &subset[i + 1..] {
                match self.correlate(points_a, points_b) {
                    Ok((coef, overlap)) => {
                        computed.push(
                            CorrelationResult::new(sym_a.clone(), sym_b.clone(), Some(coef))
                                .with_overlap(overlap),
                        );
                    }
                    Err(reason) => {
                        debug!(first = %sym_a, second = %sym_b, reason = %reason, "상관관계 쌍 제외");
                        ranking.skipped_pairs.push(SkippedPair {
                            first: sym_a.clone(),
                            second: sym_b.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        ranking.evaluated = computed.len();
        ranking.pairs = rank_coefficients(&computed, threshold);

        debug!(
            subset = subset.len(),
            evaluated = ranking.evaluated,
            ranked = ranking.pairs.len(),
            skipped = ranking.skipped_pairs.len(),
            "상관관계 순위 계산"
        );

        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;

    fn series(symbol: &str, start_day: i64, closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::new(symbol, (start_day + i as i64) * DAY_MS, *c, *c, *c, *c, 1))
            .collect()
    }

    fn wave(n: usize, phase: f64, scale: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + scale * ((i as f64) * 0.7 + phase).sin() + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn test_correlation_perfect_positive() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let corr = pearson(&x, &y).unwrap();
        assert!((corr - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![10.0, 8.0, 6.0, 4.0, 2.0];
        let corr = pearson(&x, &y).unwrap();
        assert!((corr + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_self_is_one() {
        let x = vec![0.01, -0.02, 0.015, 0.005, -0.003];
        assert_eq!(pearson(&x, &x), Some(1.0));
    }

    #[test]
    fn test_pearson_undefined() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_pearson_constant_with_inexact_mean() {
        // 0.1 × 11의 평균은 정확히 0.1이 아님
        let flat = vec![0.1; 11];
        let moving: Vec<f64> = (0..11).map(|i| i as f64 * 0.5).collect();

        assert_eq!(pearson(&flat, &flat), None);
        assert_eq!(pearson(&flat, &moving), None);
        assert_eq!(pearson(&moving, &flat), None);
    }

    #[test]
    fn test_returns() {
        let r = returns(&[100.0, 101.0, 99.0, 102.0]);
        assert_eq!(r.len(), 3);
        assert!((r[0] - 0.01).abs() < 1e-12);
        assert!(returns(&[5.0]).is_empty());
    }

    #[test]
    fn test_returns_zero_denominator() {
        let r = returns(&[0.0, 10.0, 20.0]);
        assert_eq!(r, vec![0.0, 1.0]);
    }

    #[test]
    fn test_align_inner_join() {
        let a = series("A", 0, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = series("B", 2, &[30.0, 40.0, 50.0, 60.0]);
        let aligned = align(&a, &b, 3).unwrap();
        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned.a, vec![3.0, 4.0, 5.0]);
        assert_eq!(aligned.b, vec![30.0, 40.0, 50.0]);
    }

    #[test]
    fn test_align_insufficient_data() {
        let a = series("A", 0, &[1.0; 12]);
        let b = series("B", 5, &[1.0; 12]);
        let err = align(&a, &b, 10).unwrap_err();
        assert_eq!(
            err,
            CorrelationError::InsufficientData {
                overlap: 7,
                required: 10
            }
        );
    }

    #[test]
    fn test_keep_last() {
        let a = series("A", 0, &wave(60, 0.0, 3.0));
        let aligned = align(&a, &a, 10).unwrap().keep_last(50);
        assert_eq!(aligned.len(), 50);
        assert_eq!(aligned.timestamps[0], 10 * DAY_MS);
    }

    #[test]
    fn test_rank_coefficients_filters_and_orders() {
        let results = vec![
            CorrelationResult::new("A", "B", Some(0.8)),
            CorrelationResult::new("A", "C", Some(-0.6)),
            CorrelationResult::new("B", "C", Some(0.2)),
        ];
        let ranked = rank_coefficients(&results, 0.5);
        let coefs: Vec<f64> = ranked.iter().filter_map(|r| r.coefficient).collect();
        assert_eq!(coefs, vec![0.8, -0.6]);
    }

    #[test]
    fn test_rank_coefficients_stable_ties() {
        let results = vec![
            CorrelationResult::new("A", "B", Some(-0.7)),
            CorrelationResult::new("A", "C", None),
            CorrelationResult::new("B", "C", Some(0.7)),
            CorrelationResult::new("B", "D", Some(0.9)),
        ];
        let ranked = rank_coefficients(&results, 0.3);
        let pairs: Vec<(&str, &str)> = ranked
            .iter()
            .map(|r| (r.first.as_str(), r.second.as_str()))
            .collect();
        assert_eq!(pairs, vec![("B", "D"), ("A", "B"), ("B", "C")]);
    }

    #[test]
    fn test_rank_pairs_subset_and_skips() {
        let engine = CorrelationEngine::new(CorrelationConfig {
            subset_size: 3,
            ..Default::default()
        });
        let base = wave(40, 0.0, 5.0);
        let inverse: Vec<f64> = base.iter().map(|c| 300.0 - c).collect();

        let input = vec![
            ("NVDA".to_string(), series("NVDA", 0, &base)),
            ("AMD".to_string(), series("AMD", 0, &inverse)),
            ("SHORT".to_string(), series("SHORT", 0, &base[..5])),
            ("EXTRA".to_string(), series("EXTRA", 0, &base)),
        ];

        let ranking = engine.rank_pairs(&input, 0.3);
        assert_eq!(ranking.omitted_symbols, vec!["EXTRA".to_string()]);
        assert_eq!(ranking.evaluated, 1);
        assert_eq!(ranking.skipped_pairs.len(), 2);
        assert!(ranking
            .skipped_pairs
            .iter()
            .all(|s| matches!(s.reason, CorrelationError::InsufficientData { .. })));

        assert_eq!(ranking.pairs.len(), 1);
        let pair = &ranking.pairs[0];
        assert_eq!((pair.first.as_str(), pair.second.as_str()), ("NVDA", "AMD"));
        assert!(pair.coefficient.unwrap() < -0.9);
        assert_eq!(pair.overlap, 40);
    }

    #[test]
    fn test_rank_pairs_lookback_cap() {
        let engine = CorrelationEngine::default();
        let a = series("A", 0, &wave(120, 0.0, 4.0));
        let b = series("B", 0, &wave(120, 0.3, 4.0));
        let (_, overlap) = engine.correlate(&a, &b).unwrap();
        assert_eq!(overlap, 50);
    }

    #[test]
    fn test_zero_variance_pair_is_skipped() {
        let engine = CorrelationEngine::default();
        let flat = series("FLAT", 0, &[10.0; 20]);
        let moving = series("MOVE", 0, &wave(20, 0.0, 2.0));
        assert_eq!(
            engine.correlate(&flat, &moving).unwrap_err(),
            CorrelationError::ZeroVariance
        );
    }
}
