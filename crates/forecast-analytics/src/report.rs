//! 분석 보고서 생성.
//!
//! 상관관계 순위, 엔진 출력 지표, 저장소 요약을 하나의 Markdown 문서로
//! 합칩니다. 섹션 순서는 고정입니다:
//!
//! 1. Summary
//! 2. Performance
//! 3. Correlation Analysis
//! 4. Methodology
//! 5. Recommendations
//!
//! 같은 입력에 대해 항상 같은 문서를 생성합니다.

use crate::correlation::CorrelationRanking;
use crate::engine_output::AnalysisOutput;
use chrono::{DateTime, Utc};
use forecast_core::{AssetCategory, ReportConfig, SymbolSpec, WindowPreset};
use forecast_data::StoreSummary;

/// 보고서 섹션 제목 (출력 순서).
pub const SECTION_TITLES: [&str; 5] = [
    "Summary",
    "Performance",
    "Correlation Analysis",
    "Methodology",
    "Recommendations",
];

/// 강한 성과 기준 (%)
const STRONG_CHANGE: f64 = 50.0;
/// 보통 성과 기준 (%)
const MODERATE_CHANGE: f64 = 20.0;
/// 위험 요인 기준 (%)
const RISK_CHANGE: f64 = -10.0;
/// 기회 항목 수
const OPPORTUNITY_COUNT: usize = 3;

/// 성과 등급.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceStatus {
    Strong,
    Moderate,
    Weak,
}

impl PerformanceStatus {
    pub fn from_change(change: f64) -> Self {
        if change > STRONG_CHANGE {
            PerformanceStatus::Strong
        } else if change > MODERATE_CHANGE {
            PerformanceStatus::Moderate
        } else {
            PerformanceStatus::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceStatus::Strong => "Strong",
            PerformanceStatus::Moderate => "Moderate",
            PerformanceStatus::Weak => "Weak",
        }
    }
}

/// 보고서 입력.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub window: &'a WindowPreset,
    pub generated_at: DateTime<Utc>,
    pub universe: &'a [SymbolSpec],
    pub correlations: &'a CorrelationRanking,
    pub correlation_threshold: f64,
    pub analysis: &'a AnalysisOutput,
    pub store: &'a StoreSummary,
    pub engine_built: bool,
    pub settings: &'a ReportConfig,
}

impl ReportInput<'_> {
    /// 유니버스에 속한 심볼의 변화율 (내림차순, 동률은 심볼 순).
    fn ranked_movers(&self) -> Vec<(&str, f64)> {
        self.analysis
            .movers_ranked()
            .into_iter()
            .filter(|(symbol, _)| self.universe.iter().any(|s| s.symbol == *symbol))
            .collect()
    }
}

/// 보고서 문서를 생성합니다.
pub fn synthesize(input: &ReportInput<'_>) -> String {
    let movers = input.ranked_movers();

    let mut doc = String::new();
    doc.push_str("# Financial Forecasting Analysis Report\n\n");
    doc.push_str(&format!(
        "**Generated:** {}  \n**Analysis Window:** {}  \n**Data Source:** Yahoo Finance via time-series store\n\n---\n\n",
        input.generated_at.format("%Y-%m-%d %H:%M:%S"),
        input.window.label
    ));

    summary_section(&mut doc, input);
    performance_section(&mut doc, input, &movers);
    correlation_section(&mut doc, input);
    methodology_section(&mut doc, input);
    recommendations_section(&mut doc, input, &movers);

    doc.push_str("---\n\n*Report generated by Financial Forecasting System*\n");
    doc
}

// =============================================================================
// 섹션
// =============================================================================

fn summary_section(doc: &mut String, input: &ReportInput<'_>) {
    let analysis = input.analysis;
    doc.push_str(&format!("## {}\n\n### Key Findings\n\n", SECTION_TITLES[0]));

    if let Some(summary) = &analysis.movers_summary {
        doc.push_str(&format!("**Strongest Movers:** {}\n\n", summary));
    }
    doc.push_str(&format!(
        "**Correlation Range:** {} to {}\n\n",
        optional_fixed(analysis.correlation_min, 3),
        optional_fixed(analysis.correlation_max, 3)
    ));
    if let Some(size) = &analysis.matrix_size {
        doc.push_str(&format!("**Correlation Matrix:** {}\n\n", size));
    }
    doc.push_str(&format!(
        "**Training Samples:** {}\n\n",
        analysis
            .training_samples
            .map(|n| group_thousands(n as f64))
            .unwrap_or_else(|| "N/A".to_string())
    ));
    if analysis.is_empty() {
        doc.push_str("_Analysis engine output contained no recognizable metrics._\n\n");
    }

    // 심볼
    doc.push_str("### Symbols Analyzed\n\n| Category | Symbols |\n|----------|---------|\n");
    for category in AssetCategory::all() {
        let symbols: Vec<&str> = input
            .universe
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.symbol.as_str())
            .collect();
        if symbols.is_empty() {
            continue;
        }
        doc.push_str(&format!("| {} | {} |\n", category.label(), symbols.join(", ")));
    }
    doc.push('\n');

    // 저장소
    let store = input.store;
    let date_range = store
        .date_range
        .map(|(start, end)| format!("{} to {}", start, end))
        .unwrap_or_else(|| "N/A".to_string());
    doc.push_str("### Store Summary\n\n| Metric | Value |\n|--------|-------|\n");
    doc.push_str(&format!(
        "| Total Records | {} |\n| Symbols with Data | {} |\n| Date Range | {} |\n\n",
        group_thousands(store.total_records as f64),
        store.symbols_with_data,
        date_range
    ));

    let volumes = store.top_volumes(input.settings.top_volumes);
    if !volumes.is_empty() {
        doc.push_str(&format!(
            "### Average Volumes (Top {})\n\n| Symbol | Avg Volume |\n|--------|------------|\n",
            input.settings.top_volumes
        ));
        for v in volumes {
            doc.push_str(&format!("| {} | {} |\n", v.symbol, group_thousands(v.average_volume)));
        }
        doc.push('\n');
    }
}

fn performance_section(doc: &mut String, input: &ReportInput<'_>, movers: &[(&str, f64)]) {
    doc.push_str(&format!("## {}\n\n", SECTION_TITLES[1]));

    if movers.is_empty() {
        doc.push_str("No performance data available.\n\n");
        return;
    }

    doc.push_str("| Symbol | Change | Status |\n|--------|--------|--------|\n");
    for (symbol, change) in movers {
        doc.push_str(&format!(
            "| {} | {:+.2}% | {} |\n",
            symbol,
            change,
            PerformanceStatus::from_change(*change).as_str()
        ));
    }

    doc.push_str("\n### Top Performers\n\n");
    for (symbol, change) in movers.iter().take(input.settings.top_performers) {
        doc.push_str(&format!("1. **{}**: {:+.2}%\n", symbol, change));
    }
    doc.push('\n');

    if !input.analysis.alpha.is_empty() {
        doc.push_str("### Alpha (Highest Volume)\n\n| Symbol | Alpha |\n|--------|-------|\n");
        for (symbol, alpha) in &input.analysis.alpha {
            doc.push_str(&format!("| {} | {:.4} |\n", symbol, alpha));
        }
        doc.push('\n');
    }
}

fn correlation_section(doc: &mut String, input: &ReportInput<'_>) {
    let ranking = input.correlations;
    doc.push_str(&format!(
        "## {}\n\nAsset pairs with |correlation| > {:.2} over aligned daily returns:\n\n",
        SECTION_TITLES[2], input.correlation_threshold
    ));

    if ranking.pairs.is_empty() {
        doc.push_str("No strong correlations detected.\n\n");
    } else {
        for pair in ranking.pairs.iter().take(input.settings.top_correlations) {
            if let Some(coef) = pair.coefficient {
                doc.push_str(&format!(
                    "- **{} ↔ {}**: {:.2} ({} points)\n",
                    pair.first, pair.second, coef, pair.overlap
                ));
            }
        }
        doc.push('\n');
    }

    if !ranking.skipped_pairs.is_empty() {
        doc.push_str(&format!(
            "{} pair(s) skipped for insufficient or constant data.\n\n",
            ranking.skipped_pairs.len()
        ));
    }
    if !ranking.omitted_symbols.is_empty() {
        doc.push_str(&format!(
            "Not included in pairwise analysis: {}\n\n",
            ranking.omitted_symbols.join(", ")
        ));
    }
}

fn methodology_section(doc: &mut String, input: &ReportInput<'_>) {
    let samples = input
        .analysis
        .training_samples
        .map(|n| group_thousands(n as f64))
        .unwrap_or_else(|| "N/A".to_string());

    doc.push_str(&format!("## {}\n\n", SECTION_TITLES[3]));
    doc.push_str("1. **Data Collection:** Historical OHLCV data fetched from Yahoo Finance\n");
    doc.push_str("2. **Storage:** Records stored with a TTL matching the analysis window\n");
    doc.push_str("3. **Correlation:** Pearson correlation over aligned daily returns\n");
    doc.push_str(&format!(
        "4. **Model Training:** Analysis engine trained on {} samples\n",
        samples
    ));
    doc.push_str("5. **Prediction:** Forecasts and alpha opportunities from engine output\n\n");

    doc.push_str("### Technical Notes\n\n");
    doc.push_str(&format!(
        "- Analysis window: {} ({} trading days)\n",
        input.window.label, input.window.trading_days
    ));
    doc.push_str(&format!(
        "- Store TTL: {} seconds\n",
        group_thousands(input.window.ttl_secs() as f64)
    ));
    doc.push_str(&format!(
        "- Analysis engine: {}\n\n",
        if input.engine_built { "Built" } else { "Not Built" }
    ));
}

fn recommendations_section(doc: &mut String, input: &ReportInput<'_>, movers: &[(&str, f64)]) {
    doc.push_str(&format!(
        "## {}\n\nBased on the {} analysis:\n\n",
        SECTION_TITLES[4], input.window.label
    ));

    let opportunities: Vec<&(&str, f64)> = movers
        .iter()
        .filter(|(_, change)| *change > 0.0)
        .take(OPPORTUNITY_COUNT)
        .collect();
    let risks: Vec<&(&str, f64)> = movers
        .iter()
        .filter(|(_, change)| *change < RISK_CHANGE)
        .collect();

    if opportunities.is_empty() && risks.is_empty() {
        doc.push_str("No actionable signals in this window.\n\n");
        return;
    }

    if !opportunities.is_empty() {
        doc.push_str("### Opportunities\n\n");
        for (symbol, change) in opportunities {
            doc.push_str(&format!(
                "- **{}** shows strong momentum with {:+.2}% gain\n",
                symbol, change
            ));
        }
        doc.push('\n');
    }

    if !risks.is_empty() {
        doc.push_str("### Risk Factors\n\n");
        for (symbol, change) in risks {
            doc.push_str(&format!(
                "- **{}** showing weakness with {:+.2}% decline\n",
                symbol, change
            ));
        }
        doc.push('\n');
    }
}

// =============================================================================
// 포맷
// =============================================================================

fn optional_fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "N/A".to_string())
}

/// 정수부를 반올림하고 천 단위 구분자를 붙입니다.
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
