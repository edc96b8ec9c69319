// flowguard/src/report.rs
//
// The two emitted YAML documents: a compatibility report and a quality report.

use std::collections::HashMap;

use flowguard_core::domain::coverage::{CoverageReport, QualityVerdict};
use flowguard_core::domain::issue::{Category, ValidationIssue, ValidationResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityVerdict {
    FullyCompatible,
    CompatibleWithParseIssues,
    PartialCompatibility,
}

pub fn compatibility_verdict(any_parse_failed: bool, any_normalize_failed: bool) -> CompatibilityVerdict {
    if any_normalize_failed {
        CompatibilityVerdict::PartialCompatibility
    } else if any_parse_failed {
        CompatibilityVerdict::CompatibleWithParseIssues
    } else {
        CompatibilityVerdict::FullyCompatible
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateSummary {
    pub success: usize,
    pub failed: usize,
    pub success_rate_pct: f64,
}

impl RateSummary {
    pub fn new(success: usize, failed: usize) -> Self {
        let total = success + failed;
        let success_rate_pct = if total == 0 { 0.0 } else { (success as f64 / total as f64 * 10000.0).round() / 100.0 };
        Self { success, failed, success_rate_pct }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeSummary {
    pub total_flows: usize,
    pub success: usize,
    pub failed: usize,
    pub success_rate_pct: f64,
}

impl NormalizeSummary {
    pub fn new(success: usize, failed: usize) -> Self {
        let total_flows = success + failed;
        let success_rate_pct = if total_flows == 0 { 0.0 } else { (success as f64 / total_flows as f64 * 10000.0).round() / 100.0 };
        Self { total_flows, success, failed, success_rate_pct }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompatibilitySummary {
    pub total_files: usize,
    pub files_by_category: HashMap<String, usize>,
    pub parse: RateSummary,
    pub normalize: NormalizeSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseFailure {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeFailure {
    pub domain_id: String,
    pub flow_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NormalizeDetail {
    pub domain_id: String,
    pub flow_id: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompatibilityReport {
    pub report: &'static str,
    pub generated_at: String,
    pub project: String,
    pub summary: CompatibilitySummary,
    pub parse_failures: Vec<ParseFailure>,
    pub normalize_failures: Vec<NormalizeFailure>,
    pub normalize_details: Vec<NormalizeDetail>,
    pub compatibility_verdict: CompatibilityVerdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    pub quality_score: u32,
    pub total_issues: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub issues_by_category: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub report: &'static str,
    pub generated_at: String,
    pub project: String,
    pub summary: QualitySummary,
    pub coverage: CoverageReport,
    pub flow_validation: Vec<ValidationResult>,
    pub domain_validation: Vec<ValidationResult>,
    pub system_validation: ValidationResult,
    pub quality_verdict: QualityVerdict,
}

pub fn issues_by_category(all_issues: &[&ValidationIssue]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for issue in all_issues {
        *counts.entry(category_name(issue.category)).or_insert(0) += 1;
    }
    counts
}

fn category_name(category: Category) -> String {
    match category {
        Category::GraphCompleteness => "graph_completeness",
        Category::SpecCompleteness => "spec_completeness",
        Category::ReferenceIntegrity => "reference_integrity",
        Category::AgentValidation => "agent_validation",
        Category::OrchestrationValidation => "orchestration_validation",
        Category::DomainConsistency => "domain_consistency",
        Category::EventWiring => "event_wiring",
    }
    .to_string()
}
