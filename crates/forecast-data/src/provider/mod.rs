//! 가격 데이터 Provider.
//!
//! - `YahooPriceSource`: Yahoo Finance 일봉

pub mod yahoo;

use crate::error::Result;
use async_trait::async_trait;
use forecast_core::{PricePoint, SymbolSpec};

pub use yahoo::YahooPriceSource;

/// 심볼별 가격 윈도우를 가져오는 소스.
///
/// 실패는 심볼 단위이며 배치 전체를 중단시키지 않습니다.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// 소스 이름.
    fn name(&self) -> &str;

    /// 최근 `trading_days` 거래일의 일봉을 시간 오름차순으로 가져옵니다.
    ///
    /// 레코드의 심볼은 업스트림 티커가 아닌 표시 심볼입니다.
    async fn fetch_window(&self, spec: &SymbolSpec, trading_days: u32) -> Result<Vec<PricePoint>>;
}
