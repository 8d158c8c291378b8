//! Redis 시계열 저장소.
//!
//! 레코드는 `SETEX`로, 정렬 인덱스는 `ZADD` + `EXPIRE`로 기록합니다.
//! 같은 배치의 모든 키는 동일한 TTL을 공유합니다.

use super::keys::escape_glob;
use super::{parse_meta, BatchReceipt, MetaField, PreparedBatch, StoreKeys, TimeSeriesStore};
use crate::error::{DataError, Result};
use async_trait::async_trait;
use forecast_core::{PricePoint, StoreConfig, WindowMeta};
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// `DEL` 한 번에 보내는 최대 키 수.
const DELETE_CHUNK: usize = 500;

/// Redis 연결 래퍼.
///
/// 연결은 첫 명령 시점에 맺습니다. 연결 실패는 `ConnectionError`로 반환되며
/// 다음 명령에서 다시 시도합니다.
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    keys: StoreKeys,
}

impl RedisStore {
    /// 연결 없이 저장소를 생성합니다. URL 형식만 검증합니다.
    pub fn open(url: &str, keys: StoreKeys) -> Result<Self> {
        let client = Client::open(url).map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            keys,
        })
    }

    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(url: &str, keys: StoreKeys) -> Result<Self> {
        let store = Self::open(url, keys)?;
        store.connection().await?;
        Ok(store)
    }

    /// 설정에서 저장소를 생성합니다 (지연 연결).
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(&config.url, StoreKeys::new(config.entity.clone()))
    }

    /// 공유 연결을 가져오거나 새로 맺습니다.
    async fn connection(&self) -> Result<MultiplexedConnection> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }

        let mut slot = self.connection.write().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        info!("Connecting to Redis...");
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        info!("Redis connection established");

        *slot = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl TimeSeriesStore for RedisStore {
    fn backend(&self) -> &str {
        "redis"
    }

    fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    async fn ping(&self) -> Result<bool> {
        let mut conn = self.connection().await?;
        let result: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(result == "PONG")
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
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

        let index_key = self.keys.index(symbol);

        // 레코드 + 인덱스
        let mut pipe = redis::pipe();
        pipe.atomic();
        for record in &batch.records {
            let key = self.keys.record(symbol, record.timestamp);
            let json = serde_json::to_string(record)?;
            pipe.set_ex(&key, json, batch.ttl_secs).ignore();
            pipe.zadd(&index_key, &key, record.timestamp).ignore();
        }
        pipe.expire(&index_key, batch.ttl_secs as i64).ignore();

        let mut conn = self.connection().await?;
        let _: () = pipe.query_async(&mut conn).await?;

        // 메타데이터는 레코드 기록 이후
        if let Some(meta) = WindowMeta::from_records(&batch.records) {
            let mut meta_pipe = redis::pipe();
            meta_pipe
                .set_ex(self.keys.meta(symbol, MetaField::Count), meta.count, batch.ttl_secs)
                .ignore()
                .set_ex(
                    self.keys.meta(symbol, MetaField::Start),
                    meta.start.to_string(),
                    batch.ttl_secs,
                )
                .ignore()
                .set_ex(
                    self.keys.meta(symbol, MetaField::End),
                    meta.end.to_string(),
                    batch.ttl_secs,
                )
                .ignore();
            let _: () = meta_pipe.query_async(&mut conn).await?;
        }

        debug!(
            symbol = symbol,
            count = receipt.stored,
            ttl_secs = receipt.ttl_secs,
            "Redis 배치 저장"
        );

        Ok(receipt)
    }

    async fn get_window(&self, symbol: &str, max_points: usize) -> Result<Vec<PricePoint>> {
        if max_points == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connection().await?;
        let start = -(max_points.min(isize::MAX as usize) as isize);
        let members: Vec<String> = conn.zrange(self.keys.index(symbol), start, -1).await?;

        if members.is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&members)
            .query_async(&mut conn)
            .await?;

        let mut window = Vec::with_capacity(values.len());
        for (key, value) in members.iter().zip(values) {
            // 인덱스보다 먼저 만료된 레코드
            let Some(json) = value else {
                continue;
            };
            match serde_json::from_str::<PricePoint>(&json) {
                Ok(point) => window.push(point),
                Err(e) => warn!(key = %key, error = %e, "레코드 파싱 실패, 건너뜀"),
            }
        }
        window.sort_by_key(|p| p.timestamp);

        Ok(window)
    }

    async fn window_meta(&self, symbol: &str) -> Result<Option<WindowMeta>> {
        let fields: Vec<String> = [MetaField::Count, MetaField::Start, MetaField::End]
            .into_iter()
            .map(|f| self.keys.meta(symbol, f))
            .collect();

        let mut conn = self.connection().await?;
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&fields)
            .query_async(&mut conn)
            .await?;

        let mut values = values.into_iter();
        parse_meta(
            values.next().flatten(),
            values.next().flatten(),
            values.next().flatten(),
        )
    }

    #[instrument(skip(self))]
    async fn flush(&self, namespace_prefix: &str) -> Result<usize> {
        let pattern = format!("{}*", escape_glob(namespace_prefix));

        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(&pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0usize;
        for chunk in keys.chunks(DELETE_CHUNK) {
            let removed: i64 = conn.del(chunk.to_vec()).await?;
            deleted += removed.max(0) as usize;
        }

        debug!(pattern = %pattern, deleted = deleted, "Redis flush");
        Ok(deleted)
    }
}
