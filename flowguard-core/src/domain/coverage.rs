// flowguard-core/src/domain/coverage.rs
//
// Coverage metrics and the quality score. Computed over the set
// of successfully normalized flows; does not itself touch the filesystem.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::flow::{FlowDocument, FlowType};
use crate::domain::graph::GraphUtils;
use crate::domain::issue::ValidationResult;
use crate::domain::node::NodeKind;

const MIN_FLOWS_FOR_COVERAGE_PCT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeCoverage {
    pub used: Vec<String>,
    pub unused: Vec<String>,
    pub percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpecFieldTotals {
    pub total_nodes: usize,
    pub nodes_with_description: usize,
    pub triggers_with_event: usize,
    pub decisions_with_condition: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConnectionStats {
    pub total_connections: usize,
    pub average_per_node: f64,
    pub dead_end_count: usize,
    pub orphaned_count: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FlowCounts {
    pub total: usize,
    pub traditional: usize,
    pub agent: usize,
    pub with_errors: usize,
    pub with_warnings: usize,
    pub clean: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageReport {
    pub node_type_coverage: NodeTypeCoverage,
    pub spec_fields: SpecFieldTotals,
    pub connections: ConnectionStats,
    pub flows: FlowCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityVerdict {
    Excellent,
    Good,
    NeedsImprovement,
    Poor,
}

pub fn quality_verdict(score: u32) -> QualityVerdict {
    match score {
        90..=100 => QualityVerdict::Excellent,
        70..=89 => QualityVerdict::Good,
        50..=69 => QualityVerdict::NeedsImprovement,
        _ => QualityVerdict::Poor,
    }
}

/// `100 − ((errors·5 + warnings·1) / max(flowCount, 5)) · 10`, clamped to
/// `[0, 100]` and rounded; 0 outright when there are no flows (
/// "a completely empty project yields ... a quality score of 0 ... POOR").
pub fn quality_score(flow_count: usize, errors: usize, warnings: usize) -> u32 {
    if flow_count == 0 {
        return 0;
    }
    let denom = flow_count.max(MIN_FLOWS_FOR_COVERAGE_PCT) as f64;
    let raw = 100.0 - ((errors as f64 * 5.0 + warnings as f64) / denom) * 10.0;
    raw.clamp(0.0, 100.0).round() as u32
}

pub fn compute_coverage(flows: &[FlowDocument], flow_results: &[ValidationResult]) -> CoverageReport {
    CoverageReport {
        node_type_coverage: node_type_coverage(flows),
        spec_fields: spec_field_totals(flows),
        connections: connection_stats(flows, flow_results),
        flows: flow_counts(flows, flow_results),
    }
}

fn node_type_coverage(flows: &[FlowDocument]) -> NodeTypeCoverage {
    let used: HashSet<NodeKind> = flows.iter().flat_map(|f| GraphUtils::all_nodes(f).into_iter().map(|n| n.kind)).collect();

    let used_names: Vec<String> = NodeKind::ALL.iter().filter(|k| used.contains(k)).map(|k| k.to_string()).collect();
    let unused_names: Vec<String> = NodeKind::ALL.iter().filter(|k| !used.contains(k)).map(|k| k.to_string()).collect();

    if flows.len() < MIN_FLOWS_FOR_COVERAGE_PCT {
        return NodeTypeCoverage {
            used: used_names,
            unused: unused_names,
            percent: None,
            note: Some(format!(
                "Insufficient flows in corpus ({} < 5) to compute a meaningful node-type coverage percentage.",
                flows.len()
            )),
        };
    }

    let percent = (used.len() as f64 / NodeKind::ALL.len() as f64) * 100.0;
    NodeTypeCoverage { used: used_names, unused: unused_names, percent: Some(percent), note: None }
}

fn spec_field_totals(flows: &[FlowDocument]) -> SpecFieldTotals {
    let mut totals = SpecFieldTotals::default();
    for flow in flows {
        for node in GraphUtils::all_nodes(flow) {
            totals.total_nodes += 1;
            if node.spec.non_empty_str("description") {
                totals.nodes_with_description += 1;
            }
            if node.kind == NodeKind::Trigger && node.spec.non_empty_str_or_list("event") {
                totals.triggers_with_event += 1;
            }
            if node.kind == NodeKind::Decision && node.spec.non_empty_str("condition") {
                totals.decisions_with_condition += 1;
            }
        }
    }
    totals
}

fn connection_stats(flows: &[FlowDocument], flow_results: &[ValidationResult]) -> ConnectionStats {
    let mut total_connections = 0;
    let mut total_nodes = 0;
    let mut dead_end_count = 0;

    for flow in flows {
        for node in GraphUtils::all_nodes(flow) {
            total_nodes += 1;
            total_connections += node.connections.len();
            let exempt = matches!(node.kind, NodeKind::Terminal | NodeKind::Loop | NodeKind::Parallel | NodeKind::Trigger);
            if !exempt && node.connections.is_empty() {
                dead_end_count += 1;
            }
        }
    }

    let orphaned_count = flow_results
        .iter()
        .flat_map(|r| r.issues.iter())
        .filter(|i| i.message.contains("unreachable from the trigger"))
        .count();

    let average_per_node = if total_nodes == 0 { 0.0 } else { (total_connections as f64 / total_nodes as f64 * 100.0).round() / 100.0 };

    ConnectionStats { total_connections, average_per_node, dead_end_count, orphaned_count }
}

fn flow_counts(flows: &[FlowDocument], flow_results: &[ValidationResult]) -> FlowCounts {
    let mut counts = FlowCounts { total: flows.len(), ..Default::default() };
    for flow in flows {
        match flow.flow.as_ref().map(|m| m.flow_type) {
            Some(FlowType::Agent) => counts.agent += 1,
            _ => counts.traditional += 1,
        }
    }
    for result in flow_results {
        if result.error_count > 0 {
            counts.with_errors += 1;
        } else if result.warning_count > 0 {
            counts.with_warnings += 1;
        } else {
            counts.clean += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_score_is_zero_for_empty_corpus() {
        assert_eq!(quality_score(0, 0, 0), 0);
        assert_eq!(quality_verdict(0), QualityVerdict::Poor);
    }

    #[test]
    fn quality_score_decreases_with_errors_and_warnings() {
        let clean = quality_score(10, 0, 0);
        let with_errors = quality_score(10, 2, 0);
        let with_warnings = quality_score(10, 0, 2);
        assert_eq!(clean, 100);
        assert!(with_errors < clean);
        assert!(with_warnings < clean);
        assert!(with_errors < with_warnings);
    }

    #[test]
    fn small_corpus_yields_null_coverage_percent_with_note() {
        let coverage = node_type_coverage(&[]);
        assert!(coverage.percent.is_none());
        assert!(coverage.note.unwrap().contains("Insufficient flows"));
    }
}
