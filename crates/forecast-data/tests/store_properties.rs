//! 메모리 저장소 윈도우 불변식.
//!
//! 1. 윈도우는 타임스탬프 엄격 오름차순이며 중복이 없습니다
//! 2. 윈도우 길이는 요청한 상한을 넘지 않습니다
//! 3. flush 이후 모든 심볼의 윈도우는 비어 있습니다

use forecast_core::{PricePoint, WindowPreset};
use forecast_data::{MemoryStore, StoreKeys, TimeSeriesStore};
use proptest::prelude::*;
use std::time::Duration;

const DAY_MS: i64 = 86_400_000;
const BASE_TS: i64 = 1_704_153_600_000;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn point(symbol: &str, day: i64, close: f64) -> PricePoint {
    PricePoint::new(symbol, BASE_TS + day * DAY_MS, close, close, close, close, 100)
}

// ── Strategies ───────────────────────────────────────────────────────

fn arb_days() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0..400i64, 0..120)
}

// ── 1 + 2. Ordering and cap ──────────────────────────────────────────

proptest! {
    #[test]
    fn window_is_ascending_unique_and_capped(
        first in arb_days(),
        second in arb_days(),
        cap in 0usize..150,
    ) {
        let rt = runtime();
        let window = rt.block_on(async {
            let store = MemoryStore::default();
            let a: Vec<_> = first.iter().map(|d| point("NVDA", *d, *d as f64)).collect();
            let b: Vec<_> = second.iter().map(|d| point("NVDA", *d, -(*d as f64))).collect();
            store.put_batch("NVDA", &a, Duration::from_secs(3_600)).await.unwrap();
            store.put_batch("NVDA", &b, Duration::from_secs(3_600)).await.unwrap();
            store.get_window("NVDA", cap).await.unwrap()
        });

        prop_assert!(window.len() <= cap);
        prop_assert!(window.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

        let mut distinct: Vec<i64> = first.iter().chain(second.iter()).copied().collect();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(window.len(), distinct.len().min(cap));

        // 최근 타임스탬프가 남습니다
        if let Some(last) = window.last() {
            prop_assert_eq!(last.timestamp, BASE_TS + distinct[distinct.len() - 1] * DAY_MS);
        }
    }
}

// ── 3. Flush ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn flush_empties_every_symbol(
        symbols in prop::collection::hash_set("[A-Z]{2,5}", 1..6),
        days in 1i64..40,
    ) {
        let rt = runtime();
        let leftovers = rt.block_on(async {
            let store = MemoryStore::default();
            let keys = StoreKeys::default();
            for symbol in &symbols {
                let batch: Vec<_> = (0..days).map(|d| point(symbol, d, 1.0)).collect();
                store.put_batch(symbol, &batch, Duration::from_secs(600)).await.unwrap();
            }
            for ns in keys.namespaces() {
                store.flush(&ns).await.unwrap();
            }
            let mut leftovers = 0;
            for symbol in &symbols {
                leftovers += store.get_window(symbol, 1_000).await.unwrap().len();
                if store.window_meta(symbol).await.unwrap().is_some() {
                    leftovers += 1;
                }
            }
            leftovers + store.live_key_count().await
        });

        prop_assert_eq!(leftovers, 0);
    }
}

#[tokio::test(start_paused = true)]
async fn batch_expires_together_after_window_ttl() {
    let store = MemoryStore::default();
    let preset = WindowPreset::new(14);
    let batch: Vec<_> = (0..14).map(|d| point("GS", d, 400.0)).collect();
    store.put_batch("GS", &batch, preset.ttl()).await.unwrap();

    tokio::time::advance(preset.ttl() - Duration::from_secs(1)).await;
    assert_eq!(store.get_window("GS", preset.max_points()).await.unwrap().len(), 14);
    assert!(store.window_meta("GS").await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(2)).await;
    assert!(store.get_window("GS", preset.max_points()).await.unwrap().is_empty());
    assert!(store.window_meta("GS").await.unwrap().is_none());
}

#[tokio::test]
async fn reload_after_flush_does_not_mix_windows() {
    let store = MemoryStore::default();
    let old: Vec<_> = (0..100).map(|d| point("AMD", d, 1.0)).collect();
    store.put_batch("AMD", &old, Duration::from_secs(600)).await.unwrap();

    for ns in store.keys().namespaces() {
        store.flush(&ns).await.unwrap();
    }

    let fresh: Vec<_> = (200..214).map(|d| point("AMD", d, 2.0)).collect();
    store.put_batch("AMD", &fresh, Duration::from_secs(600)).await.unwrap();

    let window = store.get_window("AMD", 50).await.unwrap();
    assert_eq!(window.len(), 14);
    assert!(window.iter().all(|p| p.close == 2.0));
    assert_eq!(store.window_meta("AMD").await.unwrap().unwrap().count, 14);
}
