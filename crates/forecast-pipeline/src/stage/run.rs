//! 분석 엔진 실행 스테이지.

use super::{Stage, StageContext};
use crate::process::{run_with_timeout, tail, ProcessSpec};
use crate::{PipelineError, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// 디버그 로그에 남길 엔진 출력 길이
const OUTPUT_TAIL_CHARS: usize = 2000;

/// 분석 엔진을 인자 없이 한 번 실행하고 출력을 파일로 저장합니다.
///
/// 이전 실행의 출력 파일은 실행 전에 삭제되므로, 타임아웃이나 실패 시
/// 보고서 스테이지가 오래된 출력을 읽지 않습니다.
#[derive(Debug, Default)]
pub struct OneShotInvocation;

impl OneShotInvocation {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for OneShotInvocation {
    fn name(&self) -> &str {
        "run"
    }

    async fn run(&self, ctx: &StageContext) -> Result<String> {
        let engine = &ctx.config.engine;
        let artifact = engine.artifact_path();
        if !artifact.exists() {
            return Err(PipelineError::MissingArtifact(artifact));
        }

        let output_path = &engine.output_path;
        if output_path.exists() {
            tokio::fs::remove_file(output_path).await?;
            debug!(path = %output_path.display(), "이전 엔진 출력 삭제");
        }

        let program = std::fs::canonicalize(&artifact)?;
        let spec = ProcessSpec::new(program.to_string_lossy()).current_dir(&engine.working_dir);

        info!(
            command = %spec.display(),
            window = %ctx.window,
            timeout_secs = engine.run_timeout_secs,
            "엔진 실행"
        );
        let output = run_with_timeout(&spec, engine.run_timeout()).await?;
        let text = output.combined();

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output_path, &text).await?;

        debug!(output = tail(&text, OUTPUT_TAIL_CHARS), "엔진 출력");
        let lines = text.lines().count();
        info!(
            path = %output_path.display(),
            lines,
            elapsed_ms = output.elapsed.as_millis() as u64,
            "엔진 출력 저장"
        );

        Ok(format!(
            "{} lines captured in {:.1}s",
            lines,
            output.elapsed.as_secs_f64()
        ))
    }
}
