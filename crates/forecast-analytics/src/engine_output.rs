//! 분석 엔진 출력 파서.
//!
//! 엔진 출력은 자유 형식 텍스트이며 구조화된 형식을 보장하지 않습니다.
//! 각 지표는 독립된 규칙으로 추출하며, 한 규칙이 실패해도 다른 규칙에는
//! 영향이 없습니다. 누락된 섹션이나 줄은 해당 지표의 생략일 뿐 오류가 아닙니다.
//!
//! ```text
//! === Strongest Movers (Alpha Search - Real Data) ===
//! Symbol: UBS      | Alpha:   2.3787 | Probability:  22.59% | Change:   23.30%
//!
//! === Highest Volume ===
//! Symbol: NVDA     | Volume:    312450000 | Alpha:   0.8123
//!
//! === Correlation Analysis (50-Day Window - Real Data) ===
//! Matrix Size: 15x15
//! Highest Correlation: 0.9412
//! Lowest Correlation: -0.5120
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

const SECTION_MARKER: &str = "===";
const MOVERS_SECTION: &str = "Strongest Movers";
const VOLUME_SECTION: &str = "Highest Volume";

/// 엔진 출력에서 추출한 지표. 모든 항목은 독립적으로 선택적입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisOutput {
    /// 심볼별 변화율 (%)
    pub movers: BTreeMap<String, f64>,
    /// `Strongest Movers:` 요약 줄
    pub movers_summary: Option<String>,
    /// 최고 상관계수
    pub correlation_max: Option<f64>,
    /// 최저 상관계수
    pub correlation_min: Option<f64>,
    /// 상관행렬 크기
    pub matrix_size: Option<String>,
    /// 학습 샘플 수
    pub training_samples: Option<u64>,
    /// 거래량 상위 심볼의 alpha (출력 순서)
    pub alpha: Vec<(String, f64)>,
}

impl AnalysisOutput {
    /// 아무 지표도 추출되지 않았는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
            && self.movers_summary.is_none()
            && self.correlation_max.is_none()
            && self.correlation_min.is_none()
            && self.matrix_size.is_none()
            && self.training_samples.is_none()
            && self.alpha.is_empty()
    }

    /// 추출된 지표 수.
    pub fn metric_count(&self) -> usize {
        self.movers.len()
            + self.alpha.len()
            + [
                self.movers_summary.is_some(),
                self.correlation_max.is_some(),
                self.correlation_min.is_some(),
                self.matrix_size.is_some(),
                self.training_samples.is_some(),
            ]
            .iter()
            .filter(|present| **present)
            .count()
    }

    /// 변화율 내림차순 (동률은 심볼 순).
    pub fn movers_ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.movers.iter().map(|(s, c)| (s.as_str(), *c)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// 엔진 출력을 파싱합니다. 실패하지 않습니다.
pub fn parse_engine_output(text: &str) -> AnalysisOutput {
    AnalysisOutput {
        movers: parse_movers(text),
        movers_summary: parse_movers_summary(text),
        correlation_max: first_labeled_float(text, "Highest Correlation"),
        correlation_min: first_labeled_float(text, "Lowest Correlation"),
        matrix_size: parse_matrix_size(text),
        training_samples: parse_training_samples(text),
        alpha: parse_alpha(text),
    }
}

// =============================================================================
// 규칙
// =============================================================================

fn parse_movers(text: &str) -> BTreeMap<String, f64> {
    let mut movers = BTreeMap::new();
    for line in section_lines(text, MOVERS_SECTION) {
        let symbol = labeled_token(line, "Symbol").and_then(symbol_token);
        let change = labeled_token(line, "Change").and_then(parse_number);
        if let (Some(symbol), Some(change)) = (symbol, change) {
            movers.insert(symbol.to_string(), change);
        }
    }
    movers
}

fn parse_alpha(text: &str) -> Vec<(String, f64)> {
    section_lines(text, VOLUME_SECTION)
        .into_iter()
        .filter_map(|line| {
            let symbol = labeled_token(line, "Symbol").and_then(symbol_token)?;
            let alpha = labeled_token(line, "Alpha").and_then(parse_number)?;
            Some((symbol.to_string(), alpha))
        })
        .collect()
}

fn parse_movers_summary(text: &str) -> Option<String> {
    let label = format!("{}:", MOVERS_SECTION);
    text.lines().find_map(|line| {
        let start = line.find(&label)? + label.len();
        let summary = line[start..].trim();
        (!summary.is_empty()).then(|| summary.to_string())
    })
}

fn parse_matrix_size(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let start = line.find("Matrix Size:")? + "Matrix Size:".len();
        let size = line[start..].trim();
        (!size.is_empty()).then(|| size.to_string())
    })
}

/// `... with <n> samples`
fn parse_training_samples(text: &str) -> Option<u64> {
    text.lines().find_map(|line| {
        let mut words = line.split_whitespace().peekable();
        while let Some(word) = words.next() {
            if word != "with" {
                continue;
            }
            let Some(count) = words.peek().and_then(|w| w.parse::<u64>().ok()) else {
                continue;
            };
            words.next();
            if words.peek().is_some_and(|w| w.trim_end_matches(['.', ',']) == "samples") {
                return Some(count);
            }
        }
        None
    })
}

fn first_labeled_float(text: &str, label: &str) -> Option<f64> {
    text.lines()
        .find_map(|line| labeled_token(line, label).and_then(parse_number))
}

// =============================================================================
// 토큰 처리
// =============================================================================

fn is_section_marker(line: &str) -> bool {
    line.trim_start().starts_with(SECTION_MARKER)
}

/// `=== <name>... ===` 헤더 다음 줄부터 다음 `===` 줄(또는 끝)까지.
fn section_lines<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
    let mut lines = text.lines();
    let found = lines.by_ref().any(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix(SECTION_MARKER)
            .map(|inner| inner.trim_start().starts_with(name))
            .unwrap_or(false)
    });
    if !found {
        return Vec::new();
    }

    lines
        .take_while(|line| !is_section_marker(line))
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// 줄에서 `Label:` 다음의 토큰 (공백 또는 `|` 전까지).
fn labeled_token<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let needle = format!("{}:", label);
    let mut search_from = 0;
    while let Some(pos) = line[search_from..].find(&needle) {
        let at = search_from + pos;
        search_from = at + needle.len();

        // 다른 단어의 일부가 아닌 경우만
        let preceded_by_word = line[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        if preceded_by_word {
            continue;
        }

        let rest = line[search_from..].trim_start();
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '|')
            .unwrap_or(rest.len());
        let token = &rest[..end];
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

fn is_symbol(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '=' | '^'))
}

/// 토큰 앞부분의 부호 있는 실수 (`23.30%,` → 23.30).
fn parse_number(token: &str) -> Option<f64> {
    let unsigned = token.trim_start_matches(['+', '-']);
    let sign_len = token.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }
    let digits = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let value: f64 = token[..sign_len + digits].parse().ok()?;
    value.is_finite().then_some(value)
}

/// 구분 문자가 붙은 심볼 토큰 (`UBS,` → `UBS`).
fn symbol_token(token: &str) -> Option<&str> {
    let symbol = token.trim_end_matches([',', ';', ')']);
    is_symbol(symbol).then_some(symbol)
}
