//! 시계열 저장소 및 가격 데이터 수집.
//!
//! 이 crate는 다음을 제공합니다:
//! - TTL 기반 시계열 저장소 (Redis / 메모리)
//! - 저장소 요약 통계
//! - 가격 데이터 Provider (Yahoo Finance)

pub mod error;
pub mod provider;
pub mod storage;
pub mod summary;

pub use error::{DataError, Result};

// 저장소 타입 재내보내기
pub use storage::{
    BatchReceipt, MemoryStore, MetaField, RedisStore, StoreKeys, TimeSeriesStore,
};
pub use summary::{load_windows, StoreSummary, VolumeRank};

// Provider 재내보내기
pub use provider::{PriceSource, YahooPriceSource};
