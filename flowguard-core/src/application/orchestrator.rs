// flowguard-core/src/application/orchestrator.rs
//
// The validation orchestrator: a registry over the three
// validators' most recent results, keyed by flow/domain/system. Holds no
// hidden state beyond the three maps, and never panics — file-loading
// failures degrade to fewer results rather than aborting a bulk validation.

use std::collections::HashMap;

use crate::domain::config::DomainConfig;
use crate::domain::flow::FlowDocument;
use crate::domain::issue::{Scope, ValidationResult};
use crate::domain::pages::SpecsContext;
use crate::domain::validators::{validate_domain, validate_flow, validate_system};

/// A single flow file plus the id needed to key it, as seen by
/// `validateDomainFlows`. Loading/normalizing happens in the caller (the
/// driver), matching the port-based design of `Normalizer`: the
/// orchestrator itself performs no I/O.
pub struct FlowSource {
    pub flow_id: String,
    pub raw: Result<FlowDocument, String>,
}

#[derive(Debug, Default)]
pub struct ValidationOrchestrator {
    flow_results: HashMap<String, ValidationResult>,
    domain_results: HashMap<String, ValidationResult>,
    system_result: Option<ValidationResult>,
}

impl ValidationOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-runs flow validation for a single already-normalized flow document
    /// and stores it under its `"<domain>/<flow>"` key.
    pub fn validate_current_flow(&mut self, doc: &FlowDocument, domains: &[DomainConfig]) -> &ValidationResult {
        let key = doc.key().unwrap_or_else(|| "<unknown>".to_string());
        let result = validate_flow(doc, domains);
        self.flow_results.insert(key.clone(), result);
        self.flow_results.get(&key).expect("just inserted")
    }

    /// Re-runs domain validation without any flow documents and stores it by
    /// id.
    pub fn validate_domain(&mut self, domain_id: &str, config: &DomainConfig, all_domains: &[DomainConfig]) -> &ValidationResult {
        let result = validate_domain(domain_id, config, all_domains, None);
        self.domain_results.insert(domain_id.to_string(), result);
        self.domain_results.get(domain_id).expect("just inserted")
    }

    /// Validates every flow belonging to `domain_id`, then validates the
    /// domain with those flow docs. Files that fail to load/normalize are
    /// silently skipped — they neither corrupt
    /// the partial aggregate nor abort the batch.
    ///
    /// The domain result's counts are replaced by the sum of its own
    /// domain-scope issues plus the counts across all its flow results.
    pub fn validate_domain_flows(
        &mut self,
        domain_id: &str,
        config: &DomainConfig,
        all_domains: &[DomainConfig],
        sources: &[FlowSource],
    ) -> &ValidationResult {
        let mut flow_docs = Vec::new();

        for source in sources {
            let Ok(doc) = &source.raw else { continue };
            let key = doc.key().unwrap_or_else(|| format!("{domain_id}/{}", source.flow_id));
            let result = validate_flow(doc, all_domains);
            self.flow_results.insert(key, result);
            flow_docs.push(doc.clone());
        }

        let mut domain_result = validate_domain(domain_id, config, all_domains, Some(&flow_docs));

        let flow_keys: Vec<String> = config.flows.iter().map(|f| format!("{domain_id}/{}", f.id)).collect();
        for key in &flow_keys {
            if let Some(flow_result) = self.flow_results.get(key) {
                domain_result.issues.extend(flow_result.issues.iter().cloned());
            }
        }
        domain_result.recount();

        self.domain_results.insert(domain_id.to_string(), domain_result);
        self.domain_results.get(domain_id).expect("just inserted")
    }

    /// Same as `validate_domain_flows`, for every domain.
    pub fn validate_all_domains(
        &mut self,
        domains: &[DomainConfig],
        sources_by_domain: &HashMap<String, Vec<FlowSource>>,
    ) {
        for domain in domains {
            let empty = Vec::new();
            let sources = sources_by_domain.get(&domain.name).unwrap_or(&empty);
            self.validate_domain_flows(&domain.name, domain, domains, sources);
        }
    }

    pub fn validate_system(&mut self, domains: &[DomainConfig], ctx: Option<&SpecsContext>) -> &ValidationResult {
        self.system_result = Some(validate_system(domains, ctx));
        self.system_result.as_ref().expect("just set")
    }

    /// Flow + current domain + system, in that order.
    pub fn validate_all(
        &mut self,
        doc: &FlowDocument,
        domain_id: &str,
        config: &DomainConfig,
        all_domains: &[DomainConfig],
        ctx: Option<&SpecsContext>,
    ) {
        self.validate_current_flow(doc, all_domains);
        self.validate_domain(domain_id, config, all_domains);
        self.validate_system(all_domains, ctx);
    }

    pub fn flow_result(&self, key: &str) -> Option<&ValidationResult> {
        self.flow_results.get(key)
    }

    pub fn domain_result(&self, domain_id: &str) -> Option<&ValidationResult> {
        self.domain_results.get(domain_id)
    }

    pub fn system_result(&self) -> Option<&ValidationResult> {
        self.system_result.as_ref()
    }

    pub fn get_node_issues(&self, flow_key: &str, node_id: &str) -> Vec<&crate::domain::issue::ValidationIssue> {
        self.flow_results
            .get(flow_key)
            .map(|r| r.issues.iter().filter(|i| i.node_id.as_deref() == Some(node_id)).collect())
            .unwrap_or_default()
    }

    /// Aggregates across a flow, its domain, and the system result to answer
    /// "is this flow ready to implement".
    pub fn check_implement_gate(&self, flow_key: &str, domain_id: &str) -> ImplementGate {
        let flow_errors = self.flow_results.get(flow_key).map(|r| r.error_count).unwrap_or(0);
        let domain_errors = self.domain_results.get(domain_id).map(|r| r.error_count).unwrap_or(0);
        let system_errors = self.system_result.as_ref().map(|r| r.error_count).unwrap_or(0);

        let flow_warnings = self.flow_results.get(flow_key).map(|r| r.warning_count).unwrap_or(0);
        let domain_warnings = self.domain_results.get(domain_id).map(|r| r.warning_count).unwrap_or(0);
        let system_warnings = self.system_result.as_ref().map(|r| r.warning_count).unwrap_or(0);

        ImplementGate {
            can_implement: flow_errors + domain_errors + system_errors == 0,
            has_warnings: flow_warnings + domain_warnings + system_warnings > 0,
        }
    }

    /// Clears all three maps (no other hidden state to reset).
    pub fn reset(&mut self) {
        self.flow_results.clear();
        self.domain_results.clear();
        self.system_result = None;
    }

    pub fn all_flow_results(&self) -> impl Iterator<Item = (&String, &ValidationResult)> {
        self.flow_results.iter()
    }

    pub fn all_domain_results(&self) -> impl Iterator<Item = (&String, &ValidationResult)> {
        self.domain_results.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplementGate {
    pub can_implement: bool,
    pub has_warnings: bool,
}

/// Merges scattered results back into deterministic, lexicographically
/// sorted-by-`targetId` order for report emission (concurrent
/// flow validation is permitted, but results must be merged deterministically).
pub fn sort_by_target_id(results: &mut [ValidationResult]) {
    results.sort_by(|a, b| a.target_id.cmp(&b.target_id));
}

/// Just for clarity at call sites that only hold a `Scope` and want to assert
/// they are sorting the expected kind of result set.
pub fn assert_scope(results: &[ValidationResult], scope: Scope) {
    debug_assert!(results.iter().all(|r| r.scope == scope));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow::{FlowMeta, FlowType};
    use crate::domain::node::{Node, NodeKind, SpecPayload};

    fn domain_config(name: &str) -> DomainConfig {
        DomainConfig {
            name: name.into(),
            description: None,
            role: None,
            owns_schemas: vec![],
            flows: vec![],
            publishes_events: vec![],
            consumes_events: vec![],
            event_groups: vec![],
            stores: vec![],
            layout: None,
        }
    }

    fn minimal_flow(domain: &str, id: &str) -> FlowDocument {
        FlowDocument {
            flow: Some(FlowMeta { id: id.into(), domain: domain.into(), name: id.into(), flow_type: FlowType::Traditional }),
            trigger: Some(Node {
                id: "trigger".into(),
                kind: NodeKind::Trigger,
                label: String::new(),
                spec: SpecPayload(serde_yaml::from_str("event: start\n").unwrap()),
                connections: vec![],
            }),
            nodes: vec![],
        }
    }

    #[test]
    fn reset_clears_all_three_maps() {
        let mut orchestrator = ValidationOrchestrator::new();
        let domain = domain_config("orders");
        orchestrator.validate_current_flow(&minimal_flow("orders", "create"), &[domain.clone()]);
        orchestrator.validate_domain("orders", &domain, &[domain.clone()]);
        orchestrator.validate_system(&[domain], None);

        assert!(orchestrator.flow_result("orders/create").is_some());
        assert!(orchestrator.domain_result("orders").is_some());
        assert!(orchestrator.system_result().is_some());

        orchestrator.reset();

        assert!(orchestrator.flow_result("orders/create").is_none());
        assert!(orchestrator.domain_result("orders").is_none());
        assert!(orchestrator.system_result().is_none());
    }

    #[test]
    fn implement_gate_is_blocked_by_any_scope_error() {
        let mut orchestrator = ValidationOrchestrator::new();
        let domain = domain_config("orders");
        // no terminal -> flow-scope error
        orchestrator.validate_current_flow(&minimal_flow("orders", "create"), &[domain.clone()]);
        orchestrator.validate_domain("orders", &domain, &[domain.clone()]);
        orchestrator.validate_system(&[domain], None);

        let gate = orchestrator.check_implement_gate("orders/create", "orders");
        assert!(!gate.can_implement);
    }

    #[test]
    fn validate_domain_flows_folds_flow_counts_into_domain_result() {
        let mut orchestrator = ValidationOrchestrator::new();
        let mut domain = domain_config("orders");
        domain.flows = vec![crate::domain::config::FlowEntry {
            id: "create".into(),
            name: "create".into(),
            flow_type: FlowType::Traditional,
            tags: vec![],
            group: None,
            keyboard_shortcut: None,
        }];
        let sources = vec![FlowSource { flow_id: "create".to_string(), raw: Ok(minimal_flow("orders", "create")) }];

        let result = orchestrator.validate_domain_flows("orders", &domain, &[domain.clone()], &sources);
        assert!(result.error_count > 0);
    }
}
