//! 파이프라인 도메인 모델.

mod market_data;

pub use market_data::*;
