//! 외부 프로세스 실행.
//!
//! 빌드와 엔진 실행은 모두 타임아웃이 있는 자식 프로세스입니다.
//! 타임아웃이 지나면 자식 프로세스는 종료되고 출력은 버려집니다.

use crate::{PipelineError, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// 실패 메시지에 포함할 stderr 최대 길이
const FAILURE_DETAIL_CHARS: usize = 500;

/// 실행할 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// `["cargo", "build", "--release"]` 형태의 명령줄에서 생성합니다.
    pub fn from_command_line(parts: &[String]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        Some(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// 로그/에러 메시지용 명령 문자열
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 정상 종료된 프로세스의 출력
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// stdout 뒤에 stderr를 이어 붙인 전체 출력
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() || self.stdout.ends_with('\n') {
            format!("{}{}", self.stdout, self.stderr)
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// 명령을 실행하고 종료를 기다립니다.
///
/// - 타임아웃: [`PipelineError::ProcessTimeout`] (자식 프로세스 종료)
/// - 0이 아닌 종료 코드: [`PipelineError::ProcessFailure`]
/// - 실행 불가: [`PipelineError::Io`]
pub async fn run_with_timeout(spec: &ProcessSpec, timeout: Duration) -> Result<ProcessOutput> {
    let command_line = spec.display();
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    debug!(command = %command_line, timeout_secs = timeout.as_secs(), "프로세스 시작");
    let started = Instant::now();
    let child = command.spawn()?;

    // 타임아웃 시 future가 drop되면서 kill_on_drop으로 자식 프로세스가 종료됨
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(PipelineError::ProcessTimeout {
                command: command_line,
                timeout,
            })
        }
    };

    let result = ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        elapsed: started.elapsed(),
    };
    debug!(
        command = %command_line,
        code = ?result.code,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "프로세스 종료"
    );

    if !output.status.success() {
        let status = match result.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };
        return Err(PipelineError::ProcessFailure {
            command: command_line,
            status,
            detail: tail(result.stderr.trim(), FAILURE_DETAIL_CHARS).to_string(),
        });
    }

    Ok(result)
}

/// 문자열의 마지막 `max_chars`자 (문자 경계 유지)
pub fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    match text.char_indices().nth(count - max_chars) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
