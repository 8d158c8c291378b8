//! 저장소 키 레이아웃.
//!
//! | 키 | 값 |
//! |----|----|
//! | `<entity>:<symbol>:<timestamp>` | 레코드 JSON |
//! | `index:<symbol>` | 레코드 키의 정렬 집합 (score = timestamp) |
//! | `meta:<symbol>:count` / `start` / `end` | 윈도우 메타데이터 |

use crate::error::{DataError, Result};

const INDEX_NAMESPACE: &str = "index";
const META_NAMESPACE: &str = "meta";

/// 메타데이터 필드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Count,
    Start,
    End,
}

impl MetaField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaField::Count => "count",
            MetaField::Start => "start",
            MetaField::End => "end",
        }
    }
}

/// 키 생성기.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    entity: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self::new("equity")
    }
}

impl StoreKeys {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// 레코드 키 접두사 (엔티티 이름).
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// 레코드 키.
    pub fn record(&self, symbol: &str, timestamp: i64) -> String {
        format!("{}:{}:{}", self.entity, symbol, timestamp)
    }

    /// 심볼별 정렬 인덱스 키.
    pub fn index(&self, symbol: &str) -> String {
        format!("{}:{}", INDEX_NAMESPACE, symbol)
    }

    /// 메타데이터 키.
    pub fn meta(&self, symbol: &str, field: MetaField) -> String {
        format!("{}:{}:{}", META_NAMESPACE, symbol, field.as_str())
    }

    /// 관리하는 모든 네임스페이스 접두사.
    pub fn namespaces(&self) -> Vec<String> {
        vec![
            format!("{}:", self.entity),
            format!("{}:", INDEX_NAMESPACE),
            format!("{}:", META_NAMESPACE),
        ]
    }

    /// 레코드 키에서 (심볼, 타임스탬프)를 추출합니다.
    pub fn parse_record(&self, key: &str) -> Option<(String, i64)> {
        let rest = key.strip_prefix(&self.entity)?.strip_prefix(':')?;
        let (symbol, ts) = rest.rsplit_once(':')?;
        Some((symbol.to_string(), ts.parse().ok()?))
    }
}

/// 키 구분자가 들어간 심볼은 저장할 수 없습니다.
pub fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.is_empty() || symbol.contains(':') || symbol.chars().any(char::is_whitespace) {
        return Err(DataError::InvalidData(format!("잘못된 심볼: {:?}", symbol)));
    }
    Ok(())
}

/// Redis glob 패턴 특수문자를 이스케이프합니다.
pub fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = StoreKeys::default();
        assert_eq!(keys.record("UBS", 1_704_153_600_000), "equity:UBS:1704153600000");
        assert_eq!(keys.index("UBS"), "index:UBS");
        assert_eq!(keys.meta("UBS", MetaField::Count), "meta:UBS:count");
        assert_eq!(keys.meta("UBS", MetaField::Start), "meta:UBS:start");
        assert_eq!(keys.meta("UBS", MetaField::End), "meta:UBS:end");
        assert_eq!(keys.namespaces(), vec!["equity:", "index:", "meta:"]);
    }

    #[test]
    fn test_parse_record() {
        let keys = StoreKeys::new("fx");
        assert_eq!(
            keys.parse_record("fx:EURUSD:1700000000000"),
            Some(("EURUSD".to_string(), 1_700_000_000_000))
        );
        assert_eq!(keys.parse_record("equity:EURUSD:1"), None);
        assert_eq!(keys.parse_record("fx:EURUSD:abc"), None);
    }

    #[test]
    fn test_validate_symbol() {
        assert!(validate_symbol("ETHUSD").is_ok());
        assert!(validate_symbol("EURUSD=X").is_ok());
        assert!(validate_symbol("").is_err());
        assert!(validate_symbol("A:B").is_err());
        assert!(validate_symbol("A B").is_err());
    }

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("equity:"), "equity:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }
}
