//! 저장소 정리 스테이지.

use super::{Stage, StageContext};
use crate::Result;
use async_trait::async_trait;
use tracing::info;

/// 관리 대상 네임스페이스(레코드, 인덱스, 메타데이터)를 모두 삭제합니다.
///
/// 다른 윈도우의 데이터가 섞이지 않도록 수집 전에 한 번만 실행됩니다.
#[derive(Debug, Default)]
pub struct FlushStage;

impl FlushStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for FlushStage {
    fn name(&self) -> &str {
        "clean"
    }

    async fn run(&self, ctx: &StageContext) -> Result<String> {
        let mut removed = 0;
        for namespace in ctx.store.keys().namespaces() {
            let count = ctx.store.flush(&namespace).await?;
            info!(namespace = %namespace, removed = count, "네임스페이스 삭제");
            removed += count;
        }
        Ok(format!("{} keys removed", removed))
    }
}
