//! 프로세스 내 시계열 저장소.
//!
//! Redis 백엔드와 같은 키 레이아웃과 JSON 와이어 형식을 사용합니다.
//! 만료는 조회 시점에 판단하며 `tokio::time::Instant` 기준이라
//! 일시정지된 테스트 시계에서도 동작합니다. 만료된 항목은 다음 배치 저장 시
//! 제거됩니다.

use super::{parse_meta, BatchReceipt, MetaField, PreparedBatch, StoreKeys, TimeSeriesStore};
use crate::error::Result;
use async_trait::async_trait;
use forecast_core::{PricePoint, WindowMeta};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
enum Slot {
    Value(String),
    /// score(timestamp) → 레코드 키
    Index(BTreeMap<i64, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    slot: Slot,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// 메모리 저장소.
pub struct MemoryStore {
    keys: StoreKeys,
    entries: RwLock<HashMap<String, Entry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreKeys::default())
    }
}

impl MemoryStore {
    pub fn new(keys: StoreKeys) -> Self {
        Self {
            keys,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// 만료되지 않은 키의 수.
    pub async fn live_key_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    /// 키의 남은 TTL. 없거나 만료되었으면 `None`.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let entry = entries.get(key).filter(|e| e.is_live(now))?;
        Some(entry.expires_at - now)
    }

    fn live_value<'a>(entries: &'a HashMap<String, Entry>, key: &str, now: Instant) -> Option<&'a str> {
        match entries.get(key) {
            Some(Entry {
                slot: Slot::Value(v),
                expires_at,
            }) if *expires_at > now => Some(v.as_str()),
            _ => None,
        }
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    fn backend(&self) -> &str {
        "memory"
    }

    fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    async fn put_batch(
        &self,
        symbol: &str,
        records: &[PricePoint],
        ttl: Duration,
    ) -> Result<BatchReceipt> {
        let batch = PreparedBatch::new(symbol, records, ttl)?;
        let receipt = batch.receipt(symbol);
        if batch.records.is_empty() {
            return Ok(receipt);
        }

        let now = Instant::now();
        let expires_at = now + ttl;
        let index_key = self.keys.index(symbol);

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.is_live(now));

        // 레코드 + 인덱스
        let mut members = match entries.remove(&index_key) {
            Some(Entry {
                slot: Slot::Index(members),
                expires_at,
            }) if expires_at > now => members,
            _ => BTreeMap::new(),
        };
        for record in &batch.records {
            let key = self.keys.record(symbol, record.timestamp);
            let json = serde_json::to_string(record)?;
            entries.insert(
                key.clone(),
                Entry {
                    slot: Slot::Value(json),
                    expires_at,
                },
            );
            members.insert(record.timestamp, key);
        }
        entries.insert(
            index_key,
            Entry {
                slot: Slot::Index(members),
                expires_at,
            },
        );

        // 메타데이터는 레코드 기록 이후
        if let Some(meta) = WindowMeta::from_records(&batch.records) {
            let fields = [
                (MetaField::Count, meta.count.to_string()),
                (MetaField::Start, meta.start.to_string()),
                (MetaField::End, meta.end.to_string()),
            ];
            for (field, value) in fields {
                entries.insert(
                    self.keys.meta(symbol, field),
                    Entry {
                        slot: Slot::Value(value),
                        expires_at,
                    },
                );
            }
        }

        debug!(
            symbol = symbol,
            count = receipt.stored,
            ttl_secs = receipt.ttl_secs,
            "메모리 저장소 배치 저장"
        );

        Ok(receipt)
    }

    async fn get_window(&self, symbol: &str, max_points: usize) -> Result<Vec<PricePoint>> {
        if max_points == 0 {
            return Ok(Vec::new());
        }

        let now = Instant::now();
        let entries = self.entries.read().await;

        let members = match entries.get(&self.keys.index(symbol)) {
            Some(Entry {
                slot: Slot::Index(members),
                expires_at,
            }) if *expires_at > now => members,
            _ => return Ok(Vec::new()),
        };

        let skip = members.len().saturating_sub(max_points);
        let mut window = Vec::with_capacity(members.len() - skip);
        for key in members.values().skip(skip) {
            let Some(json) = Self::live_value(&entries, key, now) else {
                continue;
            };
            match serde_json::from_str::<PricePoint>(json) {
                Ok(point) => window.push(point),
                Err(e) => warn!(key = %key, error = %e, "레코드 파싱 실패, 건너뜀"),
            }
        }

        Ok(window)
    }

    async fn window_meta(&self, symbol: &str) -> Result<Option<WindowMeta>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let field = |f| Self::live_value(&entries, &self.keys.meta(symbol, f), now).map(String::from);
        parse_meta(
            field(MetaField::Count),
            field(MetaField::Start),
            field(MetaField::End),
        )
    }

    async fn flush(&self, namespace_prefix: &str) -> Result<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let matching: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(namespace_prefix))
            .cloned()
            .collect();

        let mut deleted = 0;
        for key in matching {
            if let Some(entry) = entries.remove(&key) {
                if entry.is_live(now) {
                    deleted += 1;
                }
            }
        }

        debug!(prefix = namespace_prefix, deleted = deleted, "메모리 저장소 flush");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 86_400_000;
    const BASE_TS: i64 = 1_704_153_600_000;

    fn series(symbol: &str, days: usize) -> Vec<PricePoint> {
        (0..days)
            .map(|i| {
                let close = 100.0 + i as f64;
                PricePoint::new(symbol, BASE_TS + i as i64 * DAY_MS, close, close, close, close, 1_000)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_put_then_get_window() {
        let store = MemoryStore::default();
        let receipt = store
            .put_batch("NVDA", &series("NVDA", 30), Duration::from_secs(3_600))
            .await
            .unwrap();
        assert_eq!(receipt.stored, 30);
        assert_eq!(receipt.ttl_secs, 3_600);

        let window = store.get_window("NVDA", 10).await.unwrap();
        assert_eq!(window.len(), 10);
        assert_eq!(window.first().unwrap().close, 120.0);
        assert_eq!(window.last().unwrap().close, 129.0);
        assert!(window.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_empty() {
        let store = MemoryStore::default();
        assert!(store.get_window("NOPE", 50).await.unwrap().is_empty());
        assert!(store.window_meta("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_meta_and_shared_ttl() {
        let store = MemoryStore::default();
        store
            .put_batch("GS", &series("GS", 5), Duration::from_secs(50 * 86_400))
            .await
            .unwrap();

        let meta = store.window_meta("GS").await.unwrap().unwrap();
        assert_eq!(meta.count, 5);
        assert_eq!(meta.start.to_string(), "2024-01-02");
        assert_eq!(meta.end.to_string(), "2024-01-06");

        let keys = store.keys().clone();
        let record_ttl = store.ttl(&keys.record("GS", BASE_TS)).await.unwrap();
        let index_ttl = store.ttl(&keys.index("GS")).await.unwrap();
        let meta_ttl = store.ttl(&keys.meta("GS", MetaField::Count)).await.unwrap();
        assert_eq!(record_ttl, index_ttl);
        assert_eq!(index_ttl, meta_ttl);
    }

    #[tokio::test]
    async fn test_overlapping_batch_overwrites_in_place() {
        let store = MemoryStore::default();
        store
            .put_batch("AMD", &series("AMD", 5), Duration::from_secs(60))
            .await
            .unwrap();

        let mut updated = series("AMD", 5);
        for p in &mut updated {
            p.close += 1_000.0;
        }
        store
            .put_batch("AMD", &updated[2..], Duration::from_secs(60))
            .await
            .unwrap();

        let window = store.get_window("AMD", 50).await.unwrap();
        assert_eq!(window.len(), 5);
        assert_eq!(window[1].close, 101.0);
        assert_eq!(window[2].close, 1_102.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_expire_passively() {
        let store = MemoryStore::default();
        store
            .put_batch("UBS", &series("UBS", 3), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(store.get_window("UBS", 10).await.unwrap().len(), 3);

        tokio::time::advance(Duration::from_secs(11)).await;

        assert!(store.get_window("UBS", 10).await.unwrap().is_empty());
        assert!(store.window_meta("UBS").await.unwrap().is_none());
        assert_eq!(store.live_key_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_pruned_on_write() {
        let store = MemoryStore::default();
        store
            .put_batch("UBS", &series("UBS", 3), Duration::from_secs(10))
            .await
            .unwrap();
        // 레코드 3 + 인덱스 1 + 메타 3
        assert_eq!(store.entries.read().await.len(), 7);

        tokio::time::advance(Duration::from_secs(11)).await;
        store
            .put_batch("GS", &series("GS", 2), Duration::from_secs(60))
            .await
            .unwrap();

        let entries = store.entries.read().await;
        assert_eq!(entries.len(), 6);
        assert!(entries.keys().all(|k| !k.contains("UBS")));
    }

    #[tokio::test]
    async fn test_flush_namespace() {
        let store = MemoryStore::default();
        store
            .put_batch("NET", &series("NET", 4), Duration::from_secs(60))
            .await
            .unwrap();

        let removed = store.flush("equity:").await.unwrap();
        assert_eq!(removed, 4);
        // 인덱스는 남아 있지만 레코드가 없으므로 빈 윈도우
        assert!(store.get_window("NET", 10).await.unwrap().is_empty());

        store.flush("index:").await.unwrap();
        store.flush("meta:").await.unwrap();
        assert_eq!(store.live_key_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_points_requested() {
        let store = MemoryStore::default();
        store
            .put_batch("EWJ", &series("EWJ", 3), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.get_window("EWJ", 0).await.unwrap().is_empty());
    }
}
