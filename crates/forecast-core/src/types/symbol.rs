//! 심볼 및 자산 분류 정의.
//!
//! 이 모듈은 분석 대상 심볼 관련 타입을 정의합니다:
//! - `AssetCategory` - 자산 분류 (주식, 외환, 지수, 암호화폐)
//! - `SymbolSpec` - 표시용 심볼과 데이터 소스 티커의 매핑

use serde::{Deserialize, Serialize};
use std::fmt;

/// 자산 분류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    /// 주식 / ETF
    Stock,
    /// 외환
    Forex,
    /// 지수
    Index,
    /// 암호화폐
    Crypto,
}

impl AssetCategory {
    /// 보고서에 사용하는 분류 이름.
    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::Stock => "Stocks",
            AssetCategory::Forex => "Forex",
            AssetCategory::Index => "Indices",
            AssetCategory::Crypto => "Crypto",
        }
    }

    /// 보고서 출력 순서.
    pub fn all() -> [AssetCategory; 4] {
        [
            AssetCategory::Stock,
            AssetCategory::Forex,
            AssetCategory::Index,
            AssetCategory::Crypto,
        ]
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetCategory::Stock => write!(f, "stock"),
            AssetCategory::Forex => write!(f, "forex"),
            AssetCategory::Index => write!(f, "index"),
            AssetCategory::Crypto => write!(f, "crypto"),
        }
    }
}

/// 분석 대상 심볼.
///
/// `symbol`은 저장소 키와 보고서에 쓰이는 표시용 이름이고,
/// `source`는 데이터 소스(Yahoo Finance 등)에서 사용하는 티커입니다.
/// 예: `EURUSD` ← `EURUSD=X`, `MNQ` ← `^IXIC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// 표시용 심볼 (저장소 키에 사용)
    pub symbol: String,
    /// 데이터 소스 티커 (없으면 표시용 심볼 사용)
    #[serde(default)]
    pub source: Option<String>,
    /// 자산 분류
    pub category: AssetCategory,
}

impl SymbolSpec {
    /// 새 심볼을 생성합니다.
    pub fn new(symbol: impl Into<String>, category: AssetCategory) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            source: None,
            category,
        }
    }

    /// 데이터 소스 티커를 설정합니다.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 데이터 소스 조회에 사용할 티커.
    pub fn source_ticker(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.symbol)
    }
}

impl fmt::Display for SymbolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// 기본 분석 유니버스.
pub fn default_universe() -> Vec<SymbolSpec> {
    use AssetCategory::*;

    vec![
        SymbolSpec::new("NVDA", Stock),
        SymbolSpec::new("AMD", Stock),
        SymbolSpec::new("WDC", Stock),
        SymbolSpec::new("SLV", Stock),
        SymbolSpec::new("GS", Stock),
        SymbolSpec::new("NET", Stock),
        SymbolSpec::new("STLD", Stock),
        SymbolSpec::new("TTWO", Stock),
        SymbolSpec::new("UBS", Stock),
        SymbolSpec::new("CRCL", Stock),
        SymbolSpec::new("EURUSD", Forex).with_source("EURUSD=X"),
        SymbolSpec::new("INRJPY", Forex).with_source("INRJPY=X"),
        SymbolSpec::new("MNQ", Index).with_source("^IXIC"),
        SymbolSpec::new("EWJ", Index),
        SymbolSpec::new("ETHUSD", Crypto).with_source("ETH-USD"),
    ]
}
