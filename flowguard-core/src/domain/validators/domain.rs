// flowguard-core/src/domain/validators/domain.rs
//
// The domain validator: duplicate flow IDs, duplicate event-group
// names, event_group: reference resolution, and (when flow documents are
// supplied) duplicate HTTP endpoints plus schema/memory-store reference
// checks.

use std::collections::HashMap;

use crate::domain::config::DomainConfig;
use crate::domain::flow::FlowDocument;
use crate::domain::issue::{new_issue, Category, IssueOpts, Scope, Severity, ValidationIssue, ValidationResult};
use crate::domain::node::NodeKind;

pub fn validate_domain(
    domain_id: &str,
    config: &DomainConfig,
    all_domains: &[DomainConfig],
    flow_docs: Option<&[FlowDocument]>,
) -> ValidationResult {
    let mut issues = Vec::new();

    check_duplicate_flow_ids(config, &mut issues);
    check_duplicate_event_groups(config, &mut issues);
    if let Some(docs) = flow_docs {
        check_event_group_refs(config, docs, &mut issues);
        check_duplicate_http_endpoints(docs, &mut issues);
        check_schema_and_store_refs(docs, config, all_domains, &mut issues);
    }

    for issue in &mut issues {
        issue.domain_id = Some(domain_id.to_string());
    }

    ValidationResult::build(Scope::Domain, domain_id, issues)
}

fn domain_issue(severity: Severity, category: Category, message: impl Into<String>) -> ValidationIssue {
    new_issue(Scope::Domain, severity, category, message, IssueOpts::default())
}

fn check_duplicate_flow_ids(config: &DomainConfig, issues: &mut Vec<ValidationIssue>) {
    let mut seen = std::collections::HashSet::new();
    for entry in &config.flows {
        if !seen.insert(entry.id.as_str()) {
            issues.push(domain_issue(Severity::Error, Category::DomainConsistency, format!("Duplicate flow id '{}'", entry.id)));
        }
    }
}

fn check_duplicate_event_groups(config: &DomainConfig, issues: &mut Vec<ValidationIssue>) {
    let mut seen = std::collections::HashSet::new();
    for group in &config.event_groups {
        if !seen.insert(group.name.as_str()) {
            issues.push(domain_issue(Severity::Error, Category::DomainConsistency, format!("Duplicate event_group name '{}'", group.name)));
        }
    }
}

/// A trigger event value of `event_group:<suffix>` must resolve to a
/// declared `event_groups[*].name` in this domain.
fn check_event_group_refs(config: &DomainConfig, docs: &[FlowDocument], issues: &mut Vec<ValidationIssue>) {
    let group_names: std::collections::HashSet<&str> = config.event_groups.iter().map(|g| g.name.as_str()).collect();
    for doc in docs {
        let Some(trigger) = &doc.trigger else { continue };
        let Some(event) = trigger.spec.str("event") else { continue };
        let Some(suffix) = event.strip_prefix("event_group:") else { continue };
        if !group_names.contains(suffix) {
            issues.push(domain_issue(
                Severity::Error,
                Category::DomainConsistency,
                format!("Flow '{}' references unknown event_group '{suffix}'", doc.key().unwrap_or_default()),
            ));
        }
    }
}

fn check_duplicate_http_endpoints(docs: &[FlowDocument], issues: &mut Vec<ValidationIssue>) {
    let mut seen: HashMap<String, String> = HashMap::new();
    for doc in docs {
        let Some(trigger) = &doc.trigger else { continue };
        let Some(method) = trigger.spec.str("method") else { continue };
        let Some(path) = trigger.spec.str("path") else { continue };
        let key = format!("{} {}", method.to_uppercase(), path);
        let flow_label = doc.key().unwrap_or_default();
        match seen.get(&key) {
            Some(prior) => issues.push(domain_issue(
                Severity::Error,
                Category::ReferenceIntegrity,
                format!("Duplicate HTTP endpoint '{key}' in flows '{prior}' and '{flow_label}'"),
            )),
            None => {
                seen.insert(key, flow_label);
            }
        }
    }
}

fn check_schema_and_store_refs(
    docs: &[FlowDocument],
    config: &DomainConfig,
    all_domains: &[DomainConfig],
    issues: &mut Vec<ValidationIssue>,
) {
    let known_schemas: std::collections::HashSet<&str> =
        all_domains.iter().flat_map(|d| d.owns_schemas.iter().map(|s| s.as_str())).collect();
    let known_stores: std::collections::HashSet<&str> =
        all_domains.iter().flat_map(|d| d.stores.iter().map(|s| s.name.as_str())).collect();
    let _ = config;

    for doc in docs {
        for node in &doc.nodes {
            if node.kind != NodeKind::DataStore {
                continue;
            }
            let store_type = node.spec.str("store_type").unwrap_or("database");
            match store_type {
                "database" => {
                    if let Some(model) = node.spec.str("model").filter(|s| !s.is_empty()) {
                        if !known_schemas.contains(model) {
                            issues.push(domain_issue(
                                Severity::Warning,
                                Category::ReferenceIntegrity,
                                format!("data_store '{}' in flow '{}' references unknown schema '{model}'", node.id, doc.key().unwrap_or_default()),
                            ));
                        }
                    }
                }
                "memory" => {
                    if let Some(store) = node.spec.str("store").filter(|s| !s.is_empty()) {
                        if !known_stores.contains(store) {
                            issues.push(domain_issue(
                                Severity::Warning,
                                Category::ReferenceIntegrity,
                                format!("data_store '{}' in flow '{}' references unknown memory store '{store}'", node.id, doc.key().unwrap_or_default()),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{FlowEntry, StoreDef};
    use crate::domain::flow::{FlowMeta, FlowType};
    use crate::domain::node::{Node, SpecPayload};

    fn flow_entry(id: &str) -> FlowEntry {
        FlowEntry { id: id.into(), name: id.into(), flow_type: FlowType::Traditional, tags: vec![], group: None, keyboard_shortcut: None }
    }

    fn domain_config(name: &str, flows: Vec<FlowEntry>) -> DomainConfig {
        DomainConfig {
            name: name.into(),
            description: None,
            role: None,
            owns_schemas: vec![],
            flows,
            publishes_events: vec![],
            consumes_events: vec![],
            event_groups: vec![],
            stores: vec![],
            layout: None,
        }
    }

    fn http_flow(domain: &str, id: &str, method: &str, path: &str) -> FlowDocument {
        FlowDocument {
            flow: Some(FlowMeta { id: id.into(), domain: domain.into(), name: id.into(), flow_type: FlowType::Traditional }),
            trigger: Some(Node {
                id: "trigger".into(),
                kind: NodeKind::Trigger,
                label: String::new(),
                spec: SpecPayload(serde_yaml::from_str(&format!("event: http_request\nmethod: {method}\npath: {path}\n")).unwrap()),
                connections: vec![],
            }),
            nodes: vec![],
        }
    }

    #[test]
    fn duplicate_flow_ids_are_errors() {
        let config = domain_config("orders", vec![flow_entry("create"), flow_entry("create")]);
        let result = validate_domain("orders", &config, &[config.clone()], None);
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn duplicate_http_endpoint_names_both_flows() {
        let config = domain_config("users", vec![flow_entry("signup"), flow_entry("register")]);
        let docs = vec![http_flow("users", "signup", "POST", "/users"), http_flow("users", "register", "post", "/users")];
        let result = validate_domain("users", &config, &[config.clone()], Some(&docs));
        assert_eq!(result.error_count, 1);
        assert!(result.issues[0].message.contains("signup"));
        assert!(result.issues[0].message.contains("register"));
    }

    #[test]
    fn memory_store_reference_checked_against_declared_stores() {
        let mut config = domain_config("sessions", vec![]);
        config.stores = vec![StoreDef { name: "sessions".into() }];
        let docs = vec![FlowDocument {
            flow: Some(FlowMeta { id: "f".into(), domain: "sessions".into(), name: "f".into(), flow_type: FlowType::Traditional }),
            trigger: None,
            nodes: vec![Node {
                id: "ds".into(),
                kind: NodeKind::DataStore,
                label: String::new(),
                spec: SpecPayload(serde_yaml::from_str("operation: get\nstore_type: memory\nstore: unknown_store\nselector: id\n").unwrap()),
                connections: vec![],
            }],
        }];
        let result = validate_domain("sessions", &config, &[config.clone()], Some(&docs));
        assert_eq!(result.warning_count, 1);
    }
}
