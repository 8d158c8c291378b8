//! 실행 옵션.
//!
//! 파일/환경 변수 설정(`AppConfig`)과 별개로 한 번의 실행에만 적용되는
//! 명령줄 옵션입니다.

use crate::Result;
use forecast_core::{AppConfig, WindowPreset};

/// 한 번의 파이프라인 실행 옵션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// 분석 윈도우 (거래일 수)
    pub window_days: u32,
    /// 실행 파일이 있어도 다시 빌드
    pub force_build: bool,
    /// 수집 전에 저장소 네임스페이스 삭제
    pub clean: bool,
    /// 인프라 준비 상태 확인 생략
    pub skip_infra: bool,
}

impl RunOptions {
    /// 기본 옵션으로 생성
    pub fn new(window_days: u32) -> Self {
        Self {
            window_days,
            force_build: false,
            clean: false,
            skip_infra: false,
        }
    }

    pub fn with_build(mut self, force: bool) -> Self {
        self.force_build = force;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_skip_infra(mut self, skip: bool) -> Self {
        self.skip_infra = skip;
        self
    }

    /// 설정된 프리셋에서 윈도우를 찾습니다. 없으면 에러입니다.
    pub fn resolve_window(&self, config: &AppConfig) -> Result<WindowPreset> {
        Ok(config.window(self.window_days)?.clone())
    }
}
