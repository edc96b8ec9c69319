// flowguard-core/src/domain/validators/system.rs
//
// The system validator: cross-domain event wiring, naming
// uniformity, schema ownership, portal targets, and (when a specs context is
// supplied) pages/navigation/schema-file checks.

use std::collections::{HashMap, HashSet};

use crate::domain::config::DomainConfig;
use crate::domain::flow::FlowDocument;
use crate::domain::issue::{new_issue, Category, IssueOpts, Scope, Severity, ValidationIssue, ValidationResult};
use crate::domain::node::NodeKind;
use crate::domain::pages::SpecsContext;

pub fn validate_system(domains: &[DomainConfig], ctx: Option<&SpecsContext>) -> ValidationResult {
    let mut issues = Vec::new();

    check_event_wiring(domains, &mut issues);
    check_event_naming_uniformity(domains, &mut issues);
    check_portal_targets(domains, &mut issues);
    check_schema_ownership(domains, &mut issues);

    if let Some(ctx) = ctx {
        check_pages_to_flows(domains, ctx, &mut issues);
        check_navigation_to_pages(ctx, &mut issues);
        check_schema_file_availability_for_flows(&ctx.flow_docs, ctx, &mut issues);
    }

    ValidationResult::build(Scope::System, "system", issues)
}

fn sys_issue(severity: Severity, category: Category, message: impl Into<String>) -> ValidationIssue {
    new_issue(Scope::System, severity, category, message, IssueOpts::default())
}

fn check_event_wiring(domains: &[DomainConfig], issues: &mut Vec<ValidationIssue>) {
    let mut published: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut consumed: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut publisher_fields: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut consumer_fields: HashMap<&str, HashSet<&str>> = HashMap::new();

    for domain in domains {
        for wiring in &domain.publishes_events {
            published.entry(wiring.event.as_str()).or_default().push(domain.name.as_str());
            publisher_fields.entry(wiring.event.as_str()).or_default().extend(wiring.payload.keys().map(|k| k.as_str()));
        }
        for wiring in &domain.consumes_events {
            consumed.entry(wiring.event.as_str()).or_default().push(domain.name.as_str());
            consumer_fields.entry(wiring.event.as_str()).or_default().extend(wiring.payload.keys().map(|k| k.as_str()));
        }
    }

    for event in consumed.keys() {
        if !published.contains_key(event) {
            issues.push(sys_issue(Severity::Error, Category::EventWiring, format!("Event '{event}' is consumed but never published")));
        }
    }
    for event in published.keys() {
        if !consumed.contains_key(event) {
            issues.push(sys_issue(Severity::Warning, Category::EventWiring, format!("Event '{event}' is published but never consumed")));
        }
    }

    for (event, fields) in &consumer_fields {
        if !published.contains_key(event) {
            continue;
        }
        let empty = HashSet::new();
        let pub_fields = publisher_fields.get(event).unwrap_or(&empty);
        for field in fields {
            if !pub_fields.contains(field) {
                issues.push(sys_issue(
                    Severity::Warning,
                    Category::EventWiring,
                    format!("Event '{event}' consumer expects payload field '{field}' not present on any publisher"),
                ));
            }
        }
    }
}

fn check_event_naming_uniformity(domains: &[DomainConfig], issues: &mut Vec<ValidationIssue>) {
    let camel_case = regex::Regex::new(r"[a-z][A-Z]").unwrap();
    let mut has_dot = false;
    let mut has_camel = false;

    let all_events = domains
        .iter()
        .flat_map(|d| d.publishes_events.iter().chain(d.consumes_events.iter()))
        .map(|w| w.event.as_str());

    for event in all_events {
        if event.contains('.') {
            has_dot = true;
        } else if camel_case.is_match(event) {
            has_camel = true;
        }
    }

    if has_dot && has_camel {
        issues.push(sys_issue(
            Severity::Warning,
            Category::EventWiring,
            "Event names mix dot-notation and camelCase styles",
        ));
    }
}

fn check_portal_targets(domains: &[DomainConfig], issues: &mut Vec<ValidationIssue>) {
    let known_ids: HashSet<&str> = domains.iter().map(|d| d.name.as_str()).collect();
    for domain in domains {
        let Some(layout) = &domain.layout else { continue };
        for key in layout.portals.keys() {
            if !known_ids.contains(key.as_str()) {
                issues.push(sys_issue(
                    Severity::Error,
                    Category::ReferenceIntegrity,
                    format!("Domain '{}' layout portal references unknown domain '{key}'", domain.name),
                ));
            }
        }
    }
}

fn check_schema_ownership(domains: &[DomainConfig], issues: &mut Vec<ValidationIssue>) {
    let mut owners: HashMap<&str, Vec<&str>> = HashMap::new();
    for domain in domains {
        for schema in &domain.owns_schemas {
            owners.entry(schema.as_str()).or_default().push(domain.name.as_str());
        }
    }
    for (schema, owning_domains) in owners {
        if owning_domains.len() > 1 {
            issues.push(sys_issue(
                Severity::Warning,
                Category::DomainConsistency,
                format!("Schema '{schema}' is owned by multiple domains: {}", owning_domains.join(", ")),
            ));
        }
    }
}

fn check_pages_to_flows(domains: &[DomainConfig], ctx: &SpecsContext, issues: &mut Vec<ValidationIssue>) {
    let valid_refs: HashSet<String> = domains
        .iter()
        .flat_map(|d| d.flows.iter().map(move |f| format!("{}/{}", d.name, f.id)))
        .collect();

    let Some(_pages_config) = &ctx.pages_config else { return };

    for page in &ctx.page_specs {
        for section in &page.sections {
            if let Some(data_source) = &section.data_source {
                if data_source.contains('/') && !valid_refs.contains(data_source) {
                    issues.push(sys_issue(Severity::Warning, Category::ReferenceIntegrity, format!("Page '{}' data_source references unknown flow '{data_source}'", page.id)));
                }
            }
            for form in &section.forms {
                if let Some(flow) = &form.submit.flow {
                    if flow.contains('/') && !valid_refs.contains(flow) {
                        issues.push(sys_issue(Severity::Warning, Category::ReferenceIntegrity, format!("Page '{}' form submit references unknown flow '{flow}'", page.id)));
                    }
                }
            }
            for fetch in &section.state.initial_fetch {
                if fetch.contains('/') && !valid_refs.contains(fetch) {
                    issues.push(sys_issue(Severity::Warning, Category::ReferenceIntegrity, format!("Page '{}' initial_fetch references unknown flow '{fetch}'", page.id)));
                }
            }
        }
    }
}

fn check_navigation_to_pages(ctx: &SpecsContext, issues: &mut Vec<ValidationIssue>) {
    let Some(pages_config) = &ctx.pages_config else { return };
    let known_pages: HashSet<&str> = ctx.page_specs.iter().map(|p| p.id.as_str()).collect();
    for item in &pages_config.navigation.items {
        if !known_pages.contains(item.page.as_str()) {
            issues.push(sys_issue(Severity::Warning, Category::ReferenceIntegrity, format!("Navigation item references unknown page '{}'", item.page)));
        }
    }
}

/// Needs the normalized flow documents (when schemas and flow
/// docs available"), carried on `SpecsContext` rather than `DomainConfig`.
fn check_schema_file_availability_for_flows(flow_docs: &[FlowDocument], ctx: &SpecsContext, issues: &mut Vec<ValidationIssue>) {
    if ctx.schemas.is_empty() {
        return;
    }
    let known_schema_files: HashSet<String> = ctx.schemas.iter().map(|s| s.name.to_lowercase()).collect();
    for doc in flow_docs {
        for node in &doc.nodes {
            if node.kind != NodeKind::DataStore {
                continue;
            }
            if node.spec.str("store_type").unwrap_or("database") != "database" {
                continue;
            }
            let Some(model) = node.spec.str("model").filter(|s| !s.is_empty()) else { continue };
            if !known_schema_files.contains(&model.to_lowercase()) {
                issues.push(sys_issue(
                    Severity::Info,
                    Category::ReferenceIntegrity,
                    format!("No schema file matches data_store model '{model}' (flow '{}')", doc.key().unwrap_or_default()),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::EventWiring;

    fn domain_with_events(name: &str, publishes: Vec<EventWiring>, consumes: Vec<EventWiring>) -> DomainConfig {
        DomainConfig {
            name: name.into(),
            description: None,
            role: None,
            owns_schemas: vec![],
            flows: vec![],
            publishes_events: publishes,
            consumes_events: consumes,
            event_groups: vec![],
            stores: vec![],
            layout: None,
        }
    }

    fn payload(fields: &[(&str, &str)]) -> HashMap<String, serde_yaml::Value> {
        fields.iter().map(|(k, v)| (k.to_string(), serde_yaml::Value::String(v.to_string()))).collect()
    }

    #[test]
    fn event_wiring_mismatch_produces_one_payload_warning() {
        let domain_a = domain_with_events(
            "a",
            vec![EventWiring { event: "order.created".into(), payload: payload(&[("id", "string"), ("total", "number")]), ..Default::default() }],
            vec![],
        );
        let domain_b = domain_with_events(
            "b",
            vec![],
            vec![EventWiring { event: "order.created".into(), payload: payload(&[("id", "string"), ("amount", "number")]), ..Default::default() }],
        );
        let result = validate_system(&[domain_a, domain_b], None);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 1);
        assert!(result.issues[0].message.contains("amount"));
    }

    #[test]
    fn consumed_without_publisher_is_an_error() {
        let domain = domain_with_events("a", vec![], vec![EventWiring { event: "ghost.event".into(), ..Default::default() }]);
        let result = validate_system(&[domain], None);
        assert_eq!(result.error_count, 1);
    }

    #[test]
    fn published_and_consumed_event_raises_no_wiring_error() {
        let domain_a = domain_with_events("a", vec![EventWiring { event: "order.created".into(), ..Default::default() }], vec![]);
        let domain_b = domain_with_events("b", vec![], vec![EventWiring { event: "order.created".into(), ..Default::default() }]);
        let result = validate_system(&[domain_a, domain_b], None);
        assert!(!result.issues.iter().any(|i| i.category == Category::EventWiring && i.severity == Severity::Error));
    }
}
