// flowguard-core/src/domain/issue.rs
//
// Issue model and result builder.
// Findings are data, never exceptions: every check produces zero or more
// `ValidationIssue`s which are folded into a `ValidationResult`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Where an issue was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Flow,
    Domain,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GraphCompleteness,
    SpecCompleteness,
    ReferenceIntegrity,
    AgentValidation,
    OrchestrationValidation,
    DomainConsistency,
    EventWiring,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub id: String,
    pub scope: Scope,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(rename = "node_id", skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "flow_id", skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(rename = "domain_id", skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<String>,
}

/// Optional tags contributed when building an issue. Every field defaults to
/// `None`; callers set only what applies.
#[derive(Debug, Clone, Default)]
pub struct IssueOpts {
    pub suggestion: Option<String>,
    pub node_id: Option<String>,
    pub flow_id: Option<String>,
    pub domain_id: Option<String>,
}

impl IssueOpts {
    pub fn suggest(mut self, s: impl Into<String>) -> Self {
        self.suggestion = Some(s.into());
        self
    }

    pub fn node(mut self, id: impl Into<String>) -> Self {
        self.node_id = Some(id.into());
        self
    }

    pub fn flow(mut self, id: impl Into<String>) -> Self {
        self.flow_id = Some(id.into());
        self
    }

    pub fn domain(mut self, id: impl Into<String>) -> Self {
        self.domain_id = Some(id.into());
        self
    }
}

static ISSUE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Produces an 8-character opaque token. Uniqueness within a single process is
/// all that's required; it is not meant to be cryptographically random.
fn next_issue_id() -> String {
    let n = ISSUE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:08x}", n.wrapping_mul(0x9E3779B97F4A7C15) >> 32 & 0xFFFF_FFFF)
}

pub fn new_issue(
    scope: Scope,
    severity: Severity,
    category: Category,
    message: impl Into<String>,
    opts: IssueOpts,
) -> ValidationIssue {
    ValidationIssue {
        id: next_issue_id(),
        scope,
        severity,
        category,
        message: message.into(),
        suggestion: opts.suggestion,
        node_id: opts.node_id,
        flow_id: opts.flow_id,
        domain_id: opts.domain_id,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub scope: Scope,
    pub target_id: String,
    pub issues: Vec<ValidationIssue>,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub is_valid: bool,
    pub validated_at: String,
}

impl ValidationResult {
    /// Builds a result from a scope, target id and the accumulated issues.
    /// Counts are derived once here and never recomputed by mutation.
    pub fn build(scope: Scope, target_id: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        let error_count = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let warning_count = issues.iter().filter(|i| i.severity == Severity::Warning).count();
        let info_count = issues.iter().filter(|i| i.severity == Severity::Info).count();

        Self {
            scope,
            target_id: target_id.into(),
            issues,
            error_count,
            warning_count,
            info_count,
            is_valid: error_count == 0,
            validated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Re-derives counts and validity from `self.issues`, used by the
    /// orchestrator when it folds flow-scope issues into a domain result.
    pub fn recount(&mut self) {
        self.error_count = self.issues.iter().filter(|i| i.severity == Severity::Error).count();
        self.warning_count = self.issues.iter().filter(|i| i.severity == Severity::Warning).count();
        self.info_count = self.issues.iter().filter(|i| i.severity == Severity::Info).count();
        self.is_valid = self.error_count == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_issue_severities() {
        let issues = vec![
            new_issue(Scope::Flow, Severity::Error, Category::GraphCompleteness, "a", IssueOpts::default()),
            new_issue(Scope::Flow, Severity::Warning, Category::GraphCompleteness, "b", IssueOpts::default()),
            new_issue(Scope::Flow, Severity::Warning, Category::GraphCompleteness, "c", IssueOpts::default()),
            new_issue(Scope::Flow, Severity::Info, Category::GraphCompleteness, "d", IssueOpts::default()),
        ];
        let result = ValidationResult::build(Scope::Flow, "orders/create", issues);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.warning_count, 2);
        assert_eq!(result.info_count, 1);
        assert_eq!(result.error_count + result.warning_count + result.info_count, result.issues.len());
        assert!(!result.is_valid);
    }

    #[test]
    fn is_valid_iff_no_errors() {
        let result = ValidationResult::build(Scope::Domain, "orders", vec![]);
        assert!(result.is_valid);
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn issue_ids_are_unique_within_a_result() {
        let issues: Vec<_> = (0..10)
            .map(|i| new_issue(Scope::Flow, Severity::Info, Category::GraphCompleteness, format!("msg {i}"), IssueOpts::default()))
            .collect();
        let mut ids: Vec<_> = issues.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), issues.len());
    }

    #[test]
    fn opts_builder_sets_tags() {
        let issue = new_issue(
            Scope::Flow,
            Severity::Error,
            Category::GraphCompleteness,
            "dead end",
            IssueOpts::default().node("n1").flow("orders/create").domain("orders").suggest("add a connection"),
        );
        assert_eq!(issue.node_id.as_deref(), Some("n1"));
        assert_eq!(issue.flow_id.as_deref(), Some("orders/create"));
        assert_eq!(issue.domain_id.as_deref(), Some("orders"));
        assert_eq!(issue.suggestion.as_deref(), Some("add a connection"));
    }
}
