//! 저장소와 가격 소스 오류.

use thiserror::Error;

/// 저장소/수집 오류.
///
/// `ConnectionError`와 `StoreError`는 파이프라인 전체를 중단시키고,
/// 나머지는 심볼 단위로 처리됩니다.
#[derive(Debug, Error)]
pub enum DataError {
    /// 저장소에 연결할 수 없음
    #[error("store unreachable: {0}")]
    ConnectionError(String),

    /// 저장소 명령 실패
    #[error("store command failed: {0}")]
    StoreError(String),

    /// 레코드 JSON 변환 실패
    #[error("record encoding failed: {0}")]
    SerializationError(String),

    /// 잘못된 배치 (심볼 불일치, 허용되지 않는 문자 등)
    #[error("invalid batch: {0}")]
    InvalidData(String),

    /// 가격 소스 조회 실패
    #[error("price fetch failed: {0}")]
    FetchError(String),

    /// 저장된 값 해석 실패 (메타데이터 등)
    #[error("unreadable stored value: {0}")]
    ParseError(String),
}

impl DataError {
    /// 저장소 자체를 사용할 수 없는 오류인지 확인합니다.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, DataError::ConnectionError(_) | DataError::StoreError(_))
    }
}

impl From<redis::RedisError> for DataError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            DataError::ConnectionError(err.to_string())
        } else {
            DataError::StoreError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
