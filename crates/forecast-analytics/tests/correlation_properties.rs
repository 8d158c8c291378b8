//! 상관관계 엔진 속성 테스트.
//!
//! 1. 대칭성: pearson(A, B) == pearson(B, A)
//! 2. 자기 상관: 변동이 있는 X에 대해 pearson(X, X) == 1.0
//! 3. 범위: 계수는 항상 [-1, 1]
//! 4. 정렬 부족은 오류 값으로 반환되며 패닉하지 않습니다

use forecast_analytics::{
    align, pearson, rank_coefficients, returns, CorrelationError, CorrelationResult,
};
use forecast_core::PricePoint;
use proptest::prelude::*;

const DAY_MS: i64 = 86_400_000;

// ── Strategies ───────────────────────────────────────────────────────

fn arb_prices(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1_000.0_f64, len)
}

fn arb_pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (3usize..80).prop_flat_map(|n| (arb_prices(n), arb_prices(n)))
}

fn is_constant(xs: &[f64]) -> bool {
    xs.windows(2).all(|w| w[0] == w[1])
}

fn to_points(symbol: &str, days: &[i64]) -> Vec<PricePoint> {
    days.iter()
        .map(|d| PricePoint::new(symbol, d * DAY_MS, 1.0, 1.0, 1.0, 1.0, 1))
        .collect()
}

// ── 1-3. Pearson ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn pearson_is_symmetric((a, b) in arb_pair()) {
        let ra = returns(&a);
        let rb = returns(&b);
        prop_assert_eq!(pearson(&ra, &rb), pearson(&rb, &ra));
    }

    #[test]
    fn pearson_self_is_one(prices in (3usize..80).prop_flat_map(arb_prices)) {
        let r = returns(&prices);
        prop_assume!(!is_constant(&r));
        prop_assert_eq!(pearson(&r, &r), Some(1.0));
    }

    #[test]
    fn pearson_is_bounded((a, b) in arb_pair()) {
        if let Some(c) = pearson(&returns(&a), &returns(&b)) {
            prop_assert!((-1.0..=1.0).contains(&c));
        }
    }
}

// ── 4. Alignment ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn align_reports_insufficient_overlap(
        days_a in prop::collection::btree_set(0i64..60, 0..40),
        days_b in prop::collection::btree_set(0i64..60, 0..40),
        min_overlap in 1usize..30,
    ) {
        let a: Vec<i64> = days_a.iter().copied().collect();
        let b: Vec<i64> = days_b.iter().copied().collect();
        let common = days_a.intersection(&days_b).count();

        match align(&to_points("A", &a), &to_points("B", &b), min_overlap) {
            Ok(aligned) => {
                prop_assert!(common >= min_overlap);
                prop_assert_eq!(aligned.len(), common);
                prop_assert!(aligned.timestamps.windows(2).all(|w| w[0] < w[1]));
            }
            Err(CorrelationError::InsufficientData { overlap, required }) => {
                prop_assert!(common < min_overlap);
                prop_assert_eq!(overlap, common);
                prop_assert_eq!(required, min_overlap);
            }
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }
}

// ── Ranking ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn ranking_is_filtered_and_sorted(
        coefs in prop::collection::vec(prop::option::of(-1.0..=1.0_f64), 0..30),
        threshold in 0.0..1.0_f64,
    ) {
        let results: Vec<CorrelationResult> = coefs
            .iter()
            .enumerate()
            .map(|(i, c)| CorrelationResult::new(format!("S{}", i), "X", *c))
            .collect();

        let ranked = rank_coefficients(&results, threshold);
        let abs: Vec<f64> = ranked.iter().map(|r| r.coefficient.unwrap().abs()).collect();

        prop_assert!(abs.iter().all(|a| *a > threshold));
        prop_assert!(abs.windows(2).all(|w| w[0] >= w[1]));
        prop_assert_eq!(
            ranked.len(),
            coefs.iter().flatten().filter(|c| c.abs() > threshold).count()
        );
    }
}
