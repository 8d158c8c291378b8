//! 분석 엔진 빌드 스테이지.

use super::{Stage, StageContext};
use crate::process::{run_with_timeout, ProcessSpec};
use crate::{PipelineError, Result};
use async_trait::async_trait;
use tracing::info;

/// 실행 파일이 없거나 강제 빌드가 요청된 경우에만 빌드합니다.
#[derive(Debug, Default)]
pub struct BuildIfAbsent;

impl BuildIfAbsent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for BuildIfAbsent {
    fn name(&self) -> &str {
        "build"
    }

    async fn run(&self, ctx: &StageContext) -> Result<String> {
        let engine = &ctx.config.engine;
        let artifact = engine.artifact_path();

        if artifact.exists() && !ctx.options.force_build {
            info!(artifact = %artifact.display(), "실행 파일 존재, 빌드 생략");
            return Ok(format!("skipped, {} present", artifact.display()));
        }

        let Some(spec) = ProcessSpec::from_command_line(&engine.build_command) else {
            return Err(PipelineError::MissingArtifact(artifact));
        };
        let spec = spec.current_dir(&engine.working_dir);

        info!(command = %spec.display(), timeout_secs = engine.build_timeout_secs, "빌드 시작");
        let output = run_with_timeout(&spec, engine.build_timeout()).await?;

        if !artifact.exists() {
            return Err(PipelineError::MissingArtifact(artifact));
        }
        Ok(format!(
            "built {} in {:.1}s",
            artifact.display(),
            output.elapsed.as_secs_f64()
        ))
    }
}
