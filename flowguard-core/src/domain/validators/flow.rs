// flowguard-core/src/domain/validators/flow.rs
//
// The flow validator: graph completeness, per-kind branch-handle
// completeness, per-kind spec completeness, agent-flow rules, orchestration
// rules, and the sub_flow cross-reference check.

use std::collections::HashSet;

use crate::domain::config::DomainConfig;
use crate::domain::flow::FlowDocument;
use crate::domain::graph::GraphUtils;
use crate::domain::issue::{new_issue, Category, IssueOpts, Scope, Severity, ValidationIssue, ValidationResult};
use crate::domain::node::{Node, NodeKind};

/// Runs the full check battery against a single flow document and folds the
/// findings into a `ValidationResult` tagged with `flowId`/`domainId`.
///
/// `domains` is the set of known domain configs, used only by the
/// `sub_flow` cross-reference check.
pub fn validate_flow(doc: &FlowDocument, domains: &[DomainConfig]) -> ValidationResult {
    let target_id = doc.key().unwrap_or_else(|| "<unknown>".to_string());
    let mut issues = Vec::new();

    if doc.trigger.is_none() {
        issues.push(new_issue(
            Scope::Flow,
            Severity::Error,
            Category::GraphCompleteness,
            "Flow has no trigger node",
            IssueOpts::default(),
        ));
        return tag_and_build(doc, issues, target_id);
    }

    check_graph_completeness(doc, &mut issues);
    check_branch_handles(doc, &mut issues);
    check_spec_completeness(doc, &mut issues);
    check_agent_rules(doc, &mut issues);
    check_orchestration_rules(doc, &mut issues);
    check_sub_flow_refs(doc, domains, &mut issues);

    tag_and_build(doc, issues, target_id)
}

fn tag_and_build(doc: &FlowDocument, mut issues: Vec<ValidationIssue>, target_id: String) -> ValidationResult {
    if let Some(meta) = &doc.flow {
        for issue in &mut issues {
            issue.flow_id = Some(meta.id.clone());
            issue.domain_id = Some(meta.domain.clone());
        }
    }
    ValidationResult::build(Scope::Flow, target_id, issues)
}

fn node_issue(severity: Severity, category: Category, message: impl Into<String>, node_id: &str) -> ValidationIssue {
    new_issue(Scope::Flow, severity, category, message, IssueOpts::default().node(node_id))
}

// ---------------------------------------------------------------------
// Graph completeness
// ---------------------------------------------------------------------

fn check_graph_completeness(doc: &FlowDocument, issues: &mut Vec<ValidationIssue>) {
    let adj = GraphUtils::adjacency(doc);
    let trigger = doc.trigger.as_ref().expect("checked by caller");
    let reachable = GraphUtils::reachable(&trigger.id, &adj);

    let has_terminal = GraphUtils::all_nodes(doc).iter().any(|n| n.kind == NodeKind::Terminal);
    if !has_terminal {
        issues.push(new_issue(
            Scope::Flow,
            Severity::Error,
            Category::GraphCompleteness,
            "Flow has no terminal nodes",
            IssueOpts::default(),
        ));
    }

    for node in GraphUtils::all_nodes(doc) {
        if !reachable.contains(&node.id) {
            continue;
        }
        let exempt = matches!(node.kind, NodeKind::Terminal | NodeKind::Loop | NodeKind::Parallel);
        if !exempt && node.connections.is_empty() {
            issues.push(node_issue(
                Severity::Error,
                Category::GraphCompleteness,
                format!("Node '{}' is a dead end (no outgoing connections)", node.id),
                &node.id,
            ));
        }
    }

    // Terminal nodes are excluded here: a terminal with no path leading to it
    // is already explained by whichever upstream node dead-ends before
    // reaching it (reported above), so flagging the terminal too would
    // double-report the same broken wiring.
    for node in &doc.nodes {
        if node.kind == NodeKind::Terminal {
            continue;
        }
        if !reachable.contains(&node.id) {
            issues.push(node_issue(
                Severity::Error,
                Category::GraphCompleteness,
                format!("Node '{}' is unreachable from the trigger", node.id),
                &node.id,
            ));
        }
    }

    if GraphUtils::has_cycle(doc) {
        issues.push(new_issue(
            Scope::Flow,
            Severity::Error,
            Category::GraphCompleteness,
            "circular path detected in flow graph",
            IssueOpts::default(),
        ));
    }

    for node in &doc.nodes {
        if node.kind == NodeKind::Decision {
            let handles = node.handles();
            if !(handles.contains("true") && handles.contains("false")) {
                issues.push(node_issue(
                    Severity::Error,
                    Category::GraphCompleteness,
                    format!("Decision node '{}' must branch on both 'true' and 'false'", node.id),
                    &node.id,
                ));
            }
        }

        if node.kind == NodeKind::Terminal && !node.connections.is_empty() {
            issues.push(node_issue(
                Severity::Warning,
                Category::GraphCompleteness,
                format!("Terminal node '{}' has outgoing connections", node.id),
                &node.id,
            ));
        }

        if node.kind == NodeKind::Input && node.spec.non_empty_sequence("validation") {
            let handles = node.handles();
            if !(handles.contains("valid") || handles.contains("invalid")) {
                issues.push(node_issue(
                    Severity::Error,
                    Category::GraphCompleteness,
                    format!("Input node '{}' declares validation but has no 'valid'/'invalid' handle", node.id),
                    &node.id,
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------
// Branch-handle completeness
// ---------------------------------------------------------------------

fn check_branch_handles(doc: &FlowDocument, issues: &mut Vec<ValidationIssue>) {
    for node in GraphUtils::all_nodes(doc) {
        let handles = node.handles();
        match node.kind {
            NodeKind::DataStore
            | NodeKind::ServiceCall
            | NodeKind::IpcCall
            | NodeKind::LlmCall
            | NodeKind::Parse
            | NodeKind::Crypto => require_handles(node, &handles, &["success", "error"], issues),

            NodeKind::Batch | NodeKind::AgentLoop => require_handles(node, &handles, &["done", "error"], issues),

            NodeKind::Transaction => require_handles(node, &handles, &["committed", "rolled_back"], issues),

            NodeKind::Loop => require_handles(node, &handles, &["body", "done"], issues),

            NodeKind::Cache => require_handles(node, &handles, &["hit", "miss"], issues),

            NodeKind::Collection => require_handles(node, &handles, &["result", "empty"], issues),

            NodeKind::Guardrail => {
                if !(handles.contains("pass") || handles.contains("valid")) {
                    issues.push(missing_handle_issue(node, "pass' or 'valid"));
                }
                if !(handles.contains("block") || handles.contains("invalid")) {
                    issues.push(missing_handle_issue(node, "block' or 'invalid"));
                }
            }

            NodeKind::Parallel => {
                let branch_count = node.spec.sequence("branches").map(|s| s.len()).unwrap_or(0);
                for i in 0..branch_count {
                    let handle = format!("branch-{i}");
                    if !handles.contains(handle.as_str()) {
                        issues.push(missing_handle_issue(node, &handle));
                    }
                }
                if !handles.contains("done") {
                    issues.push(missing_handle_issue(node, "done"));
                }
            }

            NodeKind::SmartRouter => {
                if let Some(rules) = node.spec.sequence("rules") {
                    for rule in rules {
                        if let Some(route) = rule.as_mapping().and_then(|m| m.get(serde_yaml::Value::String("route".into()))).and_then(|v| v.as_str()) {
                            if !handles.contains(route) {
                                issues.push(node_issue(
                                    Severity::Warning,
                                    Category::GraphCompleteness,
                                    format!("Smart router '{}' is missing a connection for route '{route}'", node.id),
                                    &node.id,
                                ));
                            }
                        }
                    }
                }
                if let Some(routing) = node.spec.mapping("llm_routing") {
                    if let Some(routes) = routing.get(serde_yaml::Value::String("routes".into())).and_then(|v| v.as_mapping()) {
                        for key in routes.keys() {
                            if let Some(key) = key.as_str() {
                                if !handles.contains(key) {
                                    issues.push(node_issue(
                                        Severity::Warning,
                                        Category::GraphCompleteness,
                                        format!("Smart router '{}' is missing a connection for LLM route '{key}'", node.id),
                                        &node.id,
                                    ));
                                }
                            }
                        }
                    }
                }
            }

            NodeKind::HumanGate => {
                if let Some(options) = node.spec.sequence("approval_options") {
                    for opt in options {
                        if let Some(id) = opt.as_mapping().and_then(|m| m.get(serde_yaml::Value::String("id".into()))).and_then(|v| v.as_str()) {
                            if !handles.contains(id) {
                                issues.push(node_issue(
                                    Severity::Warning,
                                    Category::GraphCompleteness,
                                    format!("Human gate '{}' is missing a connection for approval option '{id}'", node.id),
                                    &node.id,
                                ));
                            }
                        }
                    }
                }
            }

            _ => {}
        }
    }
}

fn require_handles(node: &Node, handles: &HashSet<&str>, required: &[&str], issues: &mut Vec<ValidationIssue>) {
    for handle in required {
        if !handles.contains(handle) {
            issues.push(missing_handle_issue(node, handle));
        }
    }
}

fn missing_handle_issue(node: &Node, handle: &str) -> ValidationIssue {
    new_issue(
        Scope::Flow,
        Severity::Error,
        Category::GraphCompleteness,
        format!("Node '{}' ({}) is missing required handle '{handle}'", node.id, node.kind),
        IssueOpts::default().node(&node.id).suggest(format!("Add a connection wired to the '{handle}' handle")),
    )
}

// ---------------------------------------------------------------------
// Spec completeness
// ---------------------------------------------------------------------

fn check_spec_completeness(doc: &FlowDocument, issues: &mut Vec<ValidationIssue>) {
    if let Some(trigger) = &doc.trigger {
        if !trigger.spec.non_empty_str_or_list("event") {
            issues.push(node_issue(
                Severity::Error,
                Category::SpecCompleteness,
                "Trigger requires a non-empty 'event'",
                &trigger.id,
            ));
        }

        let event = trigger.spec.str("event").unwrap_or_default();
        let source = trigger.spec.str("source").unwrap_or_default();
        let is_http = matches!(event, "http_request" | "HTTP" | "api") || matches!(source, "http" | "api");
        if is_http {
            if !trigger.spec.non_empty_str("method") {
                issues.push(node_issue(Severity::Error, Category::SpecCompleteness, "HTTP trigger requires 'method'", &trigger.id));
            }
            if !trigger.spec.non_empty_str("path") {
                issues.push(node_issue(Severity::Error, Category::SpecCompleteness, "HTTP trigger requires 'path'", &trigger.id));
            }
        }
    }

    for node in &doc.nodes {
        match node.kind {
            NodeKind::Input => check_input_spec(node, issues),
            NodeKind::Decision => {
                if !node.spec.non_empty_str("condition") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("Decision '{}' requires a non-empty 'condition'", node.id), &node.id));
                }
            }
            NodeKind::Process => {
                let description = node.spec.non_empty_str("description");
                let action = node.spec.non_empty_str("action");
                if !description && !action {
                    issues.push(node_issue(Severity::Warning, Category::SpecCompleteness, format!("Process '{}' has neither 'description' nor 'action'", node.id), &node.id));
                }
            }
            NodeKind::DataStore => check_data_store_spec(node, issues),
            NodeKind::ServiceCall => {
                if !node.spec.non_empty_str("method") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("service_call '{}' requires 'method'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("url") && !node.spec.is_present("integration") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("service_call '{}' requires 'url' unless 'integration' is set", node.id), &node.id));
                }
            }
            NodeKind::IpcCall => {
                if !node.spec.non_empty_str("command") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("ipc_call '{}' requires 'command'", node.id), &node.id));
                }
            }
            NodeKind::Event => {
                let direction = node.spec.str("direction");
                if !matches!(direction, Some("emit") | Some("consume")) {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("event node '{}' requires direction 'emit' or 'consume'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("event_name") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("event node '{}' requires a non-empty 'event_name'", node.id), &node.id));
                }
            }
            NodeKind::Loop => {
                if !node.spec.non_empty_str("collection") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("loop '{}' requires 'collection'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("iterator") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("loop '{}' requires 'iterator'", node.id), &node.id));
                }
            }
            NodeKind::Parallel => {
                let branch_count = node.spec.sequence("branches").map(|s| s.len()).unwrap_or(0);
                if branch_count < 2 {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("parallel '{}' requires at least 2 branches", node.id), &node.id));
                }
                if node.spec.str("join") == Some("n_of") {
                    let join_count = node.spec.number("join_count").unwrap_or(0.0);
                    if join_count < 1.0 {
                        issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("parallel '{}' with join=n_of requires join_count >= 1", node.id), &node.id));
                    }
                }
            }
            NodeKind::SubFlow => check_sub_flow_spec(node, issues),
            NodeKind::LlmCall => {
                if !node.spec.non_empty_str("model") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("llm_call '{}' requires 'model'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("prompt_template") {
                    issues.push(node_issue(Severity::Warning, Category::SpecCompleteness, format!("llm_call '{}' has an empty 'prompt_template'", node.id), &node.id));
                }
            }
            NodeKind::Collection => {
                if !node.spec.non_empty_str("operation") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("collection '{}' requires 'operation'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("input") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("collection '{}' requires 'input'", node.id), &node.id));
                }
            }
            NodeKind::Parse => {
                if !node.spec.non_empty_str("format") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("parse '{}' requires 'format'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("input") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("parse '{}' requires 'input'", node.id), &node.id));
                }
                if let Some(strategy) = node.spec.mapping("strategy") {
                    if let Some(selectors) = strategy.get(serde_yaml::Value::String("selectors".into())).and_then(|v| v.as_sequence()) {
                        for selector in selectors {
                            let map = selector.as_mapping();
                            let has_name = map.and_then(|m| m.get(serde_yaml::Value::String("name".into()))).and_then(|v| v.as_str()).map(|s| !s.is_empty()).unwrap_or(false);
                            let has_css = map.and_then(|m| m.get(serde_yaml::Value::String("css".into()))).and_then(|v| v.as_str()).map(|s| !s.is_empty()).unwrap_or(false);
                            if !has_name || !has_css {
                                issues.push(node_issue(Severity::Warning, Category::SpecCompleteness, format!("parse '{}' has a selector missing 'name' or 'css'", node.id), &node.id));
                            }
                        }
                    }
                }
            }
            NodeKind::Crypto => {
                if !node.spec.non_empty_str("operation") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("crypto '{}' requires 'operation'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("algorithm") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("crypto '{}' requires 'algorithm'", node.id), &node.id));
                }
                let operation = node.spec.str("operation").unwrap_or_default();
                if matches!(operation, "encrypt" | "decrypt" | "sign") {
                    let key_source = node.spec.str("key_source");
                    if !matches!(key_source, Some("env") | Some("vault")) {
                        issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("crypto '{}' with operation '{operation}' requires key_source 'env' or 'vault'", node.id), &node.id));
                    }
                }
            }
            NodeKind::Batch => {
                if !node.spec.non_empty_str("input") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("batch '{}' requires 'input'", node.id), &node.id));
                }
                let template_type = node.spec.mapping("operation_template").and_then(|m| m.get(serde_yaml::Value::String("type".into()))).and_then(|v| v.as_str());
                if template_type.map(|s| s.is_empty()).unwrap_or(true) {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("batch '{}' requires 'operation_template.type'", node.id), &node.id));
                }
            }
            NodeKind::Transaction => {
                let steps = node.spec.sequence("steps").map(|s| s.len()).unwrap_or(0);
                if steps < 2 {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("transaction '{}' requires at least 2 steps", node.id), &node.id));
                }
            }
            NodeKind::Cache => {
                if !node.spec.non_empty_str("key") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("cache '{}' requires 'key'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("store") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("cache '{}' requires 'store'", node.id), &node.id));
                }
            }
            NodeKind::Transform => {
                if !node.spec.non_empty_str("input_schema") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("transform '{}' requires 'input_schema'", node.id), &node.id));
                }
                if !node.spec.non_empty_str("output_schema") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("transform '{}' requires 'output_schema'", node.id), &node.id));
                }
            }
            NodeKind::Delay => {
                if !node.spec.is_present("min_ms") {
                    issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("delay '{}' requires 'min_ms'", node.id), &node.id));
                }
            }
            _ => {}
        }
    }
}

fn check_input_spec(node: &Node, issues: &mut Vec<ValidationIssue>) {
    if let Some(fields) = node.spec.sequence("fields") {
        for field in fields {
            let ty = field.as_mapping().and_then(|m| m.get(serde_yaml::Value::String("type".into()))).and_then(|v| v.as_str());
            if ty.map(|s| s.is_empty()).unwrap_or(true) {
                issues.push(node_issue(
                    Severity::Error,
                    Category::SpecCompleteness,
                    format!("Input '{}' has a field with a missing or empty 'type'", node.id),
                    &node.id,
                ));
            }
        }
    }
}

fn check_data_store_spec(node: &Node, issues: &mut Vec<ValidationIssue>) {
    if !node.spec.non_empty_str("operation") {
        issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' requires 'operation'", node.id), &node.id));
    }
    let operation = node.spec.str("operation").unwrap_or_default();
    let store_type = node.spec.str("store_type").unwrap_or("database");

    if matches!(operation, "get" | "set" | "merge" | "reset" | "subscribe" | "update_where") && store_type != "memory" {
        issues.push(node_issue(
            Severity::Warning,
            Category::SpecCompleteness,
            format!("data_store '{}' uses operation '{operation}' typically reserved for memory stores", node.id),
            &node.id,
        ));
    }

    match store_type {
        "database" => {
            if !node.spec.non_empty_str("model") {
                issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' (database) requires 'model'", node.id), &node.id));
            }
        }
        "filesystem" => {
            if !node.spec.non_empty_str("path") {
                issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' (filesystem) requires 'path'", node.id), &node.id));
            }
        }
        "memory" => {
            if !node.spec.non_empty_str("store") {
                issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' (memory) requires 'store'", node.id), &node.id));
            }
            if operation != "reset" && !node.spec.non_empty_str("selector") {
                issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' (memory) requires 'selector'", node.id), &node.id));
            }
        }
        _ => {}
    }

    if operation == "update_where" {
        if !node.spec.non_empty_str("predicate") {
            issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' (update_where) requires a non-empty 'predicate'", node.id), &node.id));
        }
        if !node.spec.non_empty_str("patch") {
            issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("data_store '{}' (update_where) requires a non-empty 'patch'", node.id), &node.id));
        }
    }
}

fn check_sub_flow_spec(node: &Node, issues: &mut Vec<ValidationIssue>) {
    if !node.spec.non_empty_str("flow_ref") {
        issues.push(node_issue(Severity::Error, Category::SpecCompleteness, format!("sub_flow '{}' requires 'flow_ref'", node.id), &node.id));
        return;
    }
    let flow_ref = node.spec.str("flow_ref").unwrap_or_default();
    if !flow_ref.contains('/') {
        issues.push(node_issue(Severity::Warning, Category::SpecCompleteness, format!("sub_flow '{}' flow_ref '{flow_ref}' should be of the form '<domain>/<flow>'", node.id), &node.id));
    }

    let Some(contract) = node.spec.mapping("contract") else { return };
    let inputs: HashSet<&str> = contract
        .get(serde_yaml::Value::String("inputs".into()))
        .and_then(|v| v.as_sequence())
        .map(|s| s.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    let outputs: HashSet<&str> = contract
        .get(serde_yaml::Value::String("outputs".into()))
        .and_then(|v| v.as_sequence())
        .map(|s| s.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    if let Some(mapping) = node.spec.mapping("input_mapping") {
        for key in mapping.keys().filter_map(|k| k.as_str()) {
            if !inputs.is_empty() && !inputs.contains(key) {
                issues.push(node_issue(Severity::Warning, Category::SpecCompleteness, format!("sub_flow '{}' input_mapping key '{key}' is not declared in the contract inputs", node.id), &node.id));
            }
        }
    }
    if let Some(mapping) = node.spec.mapping("output_mapping") {
        for key in mapping.keys().filter_map(|k| k.as_str()) {
            if !outputs.is_empty() && !outputs.contains(key) {
                issues.push(node_issue(Severity::Warning, Category::SpecCompleteness, format!("sub_flow '{}' output_mapping key '{key}' is not declared in the contract outputs", node.id), &node.id));
            }
        }
    }
}

// ---------------------------------------------------------------------
// Agent flow rules
// ---------------------------------------------------------------------

fn check_agent_rules(doc: &FlowDocument, issues: &mut Vec<ValidationIssue>) {
    if !doc.is_agent_flow() {
        return;
    }

    let coordinators: Vec<&Node> = doc
        .nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::AgentLoop | NodeKind::AgentGroup | NodeKind::Orchestrator))
        .collect();

    if coordinators.is_empty() {
        issues.push(new_issue(
            Scope::Flow,
            Severity::Error,
            Category::AgentValidation,
            "Agent flow must contain an agent_loop, agent_group, or orchestrator node",
            IssueOpts::default(),
        ));
        return;
    }

    let agent_loops: Vec<&Node> = doc.nodes.iter().filter(|n| n.kind == NodeKind::AgentLoop).collect();
    if agent_loops.is_empty() {
        return;
    }
    if agent_loops.len() > 1 {
        issues.push(new_issue(
            Scope::Flow,
            Severity::Warning,
            Category::AgentValidation,
            format!("Agent flow has {} agent_loop nodes; typically only one is needed", agent_loops.len()),
            IssueOpts::default(),
        ));
    }

    for node in agent_loops {
        if !node.spec.non_empty_sequence("tools") {
            issues.push(node_issue(Severity::Error, Category::AgentValidation, format!("agent_loop '{}' requires a non-empty 'tools' list", node.id), &node.id));
        }
        let has_terminal_tool = node
            .spec
            .sequence("tools")
            .map(|tools| {
                tools.iter().any(|t| {
                    t.as_mapping()
                        .and_then(|m| m.get(serde_yaml::Value::String("is_terminal".into())))
                        .and_then(|v| v.as_bool())
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false);
        if !has_terminal_tool {
            issues.push(node_issue(Severity::Error, Category::AgentValidation, format!("agent_loop '{}' requires at least one tool with is_terminal == true", node.id), &node.id));
        }
        if !node.spec.is_present("max_iterations") {
            issues.push(node_issue(Severity::Warning, Category::AgentValidation, format!("agent_loop '{}' has no 'max_iterations'", node.id), &node.id));
        }
        if !node.spec.non_empty_str("model") {
            issues.push(node_issue(Severity::Error, Category::AgentValidation, format!("agent_loop '{}' requires a non-empty 'model'", node.id), &node.id));
        }
    }
}

// ---------------------------------------------------------------------
// Orchestration-node rules
// ---------------------------------------------------------------------

fn check_orchestration_rules(doc: &FlowDocument, issues: &mut Vec<ValidationIssue>) {
    for node in &doc.nodes {
        match node.kind {
            NodeKind::Orchestrator => {
                let agents = node.spec.sequence("agents").map(|s| s.len()).unwrap_or(0);
                if agents < 2 {
                    issues.push(node_issue(Severity::Error, Category::OrchestrationValidation, format!("orchestrator '{}' requires at least 2 agents", node.id), &node.id));
                }
                if !node.spec.non_empty_str("strategy") {
                    issues.push(node_issue(Severity::Error, Category::OrchestrationValidation, format!("orchestrator '{}' requires a 'strategy'", node.id), &node.id));
                }
            }
            NodeKind::SmartRouter => {
                let rules_empty = !node.spec.non_empty_sequence("rules");
                let llm_enabled = node.spec.mapping("llm_routing").and_then(|m| m.get(serde_yaml::Value::String("enabled".into()))).and_then(|v| v.as_bool()).unwrap_or(false);
                if rules_empty && !llm_enabled {
                    issues.push(node_issue(Severity::Error, Category::OrchestrationValidation, format!("smart_router '{}' requires 'rules' or enabled llm_routing", node.id), &node.id));
                }
                if !node.spec.non_empty_sequence("fallback_chain") && !llm_enabled {
                    issues.push(node_issue(Severity::Warning, Category::OrchestrationValidation, format!("smart_router '{}' has no 'fallback_chain'", node.id), &node.id));
                }
            }
            NodeKind::Handoff => {
                let target_flow = node.spec.mapping("target").and_then(|m| m.get(serde_yaml::Value::String("flow".into()))).and_then(|v| v.as_str());
                if target_flow.map(|s| s.trim().is_empty()).unwrap_or(true) {
                    issues.push(node_issue(Severity::Error, Category::OrchestrationValidation, format!("handoff '{}' requires a non-empty 'target.flow'", node.id), &node.id));
                }
            }
            NodeKind::AgentGroup => {
                let members = node.spec.sequence("members").map(|s| s.len()).unwrap_or(0);
                if members < 2 {
                    issues.push(node_issue(Severity::Error, Category::OrchestrationValidation, format!("agent_group '{}' requires at least 2 members", node.id), &node.id));
                }
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------
// Cross-reference: sub_flow.flow_ref
// ---------------------------------------------------------------------

fn check_sub_flow_refs(doc: &FlowDocument, domains: &[DomainConfig], issues: &mut Vec<ValidationIssue>) {
    for node in &doc.nodes {
        if node.kind != NodeKind::SubFlow {
            continue;
        }
        let Some(flow_ref) = node.spec.str("flow_ref") else { continue };
        let Some((domain_id, flow_id)) = flow_ref.split_once('/') else { continue };

        match domains.iter().find(|d| d.id() == domain_id) {
            None => issues.push(node_issue(
                Severity::Error,
                Category::ReferenceIntegrity,
                format!("sub_flow '{}' references unknown domain '{domain_id}'", node.id),
                &node.id,
            )),
            Some(domain) => {
                if !domain.flows.iter().any(|f| f.id == flow_id) {
                    issues.push(node_issue(
                        Severity::Error,
                        Category::ReferenceIntegrity,
                        format!("sub_flow '{}' references unknown flow '{flow_id}' in domain '{domain_id}'", node.id),
                        &node.id,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::{Connection, SpecPayload};
    use crate::domain::flow::{FlowMeta, FlowType};

    fn mapping(yaml: &str) -> SpecPayload {
        SpecPayload(serde_yaml::from_str(yaml).unwrap())
    }

    fn trigger(spec: &str) -> Node {
        Node {
            id: "trigger".into(),
            kind: NodeKind::Trigger,
            label: String::new(),
            spec: mapping(spec),
            connections: vec![Connection { target_node_id: "proc".into(), source_handle: "success".into() }],
        }
    }

    fn meta() -> FlowMeta {
        FlowMeta { id: "create".into(), domain: "orders".into(), name: "Create order".into(), flow_type: FlowType::Traditional }
    }

    #[test]
    fn single_flow_good_path_has_no_issues() {
        let doc = FlowDocument {
            flow: Some(meta()),
            trigger: Some(trigger("event: http_request\nmethod: POST\npath: /orders\n")),
            nodes: vec![
                Node {
                    id: "proc".into(),
                    kind: NodeKind::Process,
                    label: String::new(),
                    spec: mapping("description: create order\n"),
                    connections: vec![Connection { target_node_id: "term".into(), source_handle: "success".into() }],
                },
                Node { id: "term".into(), kind: NodeKind::Terminal, label: String::new(), spec: SpecPayload::default(), connections: vec![] },
            ],
        };
        let result = validate_flow(&doc, &[]);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 0);
    }

    #[test]
    fn dead_end_process_is_an_error() {
        let doc = FlowDocument {
            flow: Some(meta()),
            trigger: Some(trigger("event: http_request\nmethod: POST\npath: /orders\n")),
            nodes: vec![
                Node { id: "proc".into(), kind: NodeKind::Process, label: String::new(), spec: mapping("description: create order\n"), connections: vec![] },
                Node { id: "term".into(), kind: NodeKind::Terminal, label: String::new(), spec: SpecPayload::default(), connections: vec![] },
            ],
        };
        let result = validate_flow(&doc, &[]);
        assert_eq!(result.error_count, 1);
        assert!(result.issues[0].message.contains("dead end"));
    }

    #[test]
    fn decision_missing_false_branch_is_an_error() {
        let doc = FlowDocument {
            flow: Some(meta()),
            trigger: Some(Node {
                id: "trigger".into(),
                kind: NodeKind::Trigger,
                label: String::new(),
                spec: mapping("event: order_created\n"),
                connections: vec![Connection { target_node_id: "dec".into(), source_handle: "success".into() }],
            }),
            nodes: vec![
                Node {
                    id: "dec".into(),
                    kind: NodeKind::Decision,
                    label: String::new(),
                    spec: mapping("condition: qty > 0\n"),
                    connections: vec![Connection { target_node_id: "term".into(), source_handle: "true".into() }],
                },
                Node { id: "term".into(), kind: NodeKind::Terminal, label: String::new(), spec: SpecPayload::default(), connections: vec![] },
            ],
        };
        let result = validate_flow(&doc, &[]);
        assert_eq!(result.error_count, 1);
        assert!(result.issues[0].message.contains("false"));
    }

    #[test]
    fn agent_flow_skips_cycle_error() {
        let doc = FlowDocument {
            flow: Some(FlowMeta { id: "loop_demo".into(), domain: "agents".into(), name: "Loop demo".into(), flow_type: FlowType::Agent }),
            trigger: Some(Node {
                id: "trigger".into(),
                kind: NodeKind::Trigger,
                label: String::new(),
                spec: mapping("event: start\n"),
                connections: vec![Connection { target_node_id: "loop1".into(), source_handle: "success".into() }],
            }),
            nodes: vec![
                Node {
                    id: "loop1".into(),
                    kind: NodeKind::AgentLoop,
                    label: String::new(),
                    spec: mapping("tools:\n  - name: finish\n    is_terminal: true\nmodel: claude-sonnet\nmax_iterations: 10\n"),
                    connections: vec![
                        Connection { target_node_id: "loop1".into(), source_handle: "error".into() },
                        Connection { target_node_id: "term".into(), source_handle: "done".into() },
                    ],
                },
                Node { id: "term".into(), kind: NodeKind::Terminal, label: String::new(), spec: SpecPayload::default(), connections: vec![] },
            ],
        };
        let result = validate_flow(&doc, &[]);
        assert!(!result.issues.iter().any(|i| i.message.contains("circular path")));
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn crypto_hash_does_not_require_key_source() {
        let doc = FlowDocument {
            flow: Some(meta()),
            trigger: Some(Node {
                id: "trigger".into(),
                kind: NodeKind::Trigger,
                label: String::new(),
                spec: mapping("event: start\n"),
                connections: vec![Connection { target_node_id: "hash".into(), source_handle: "success".into() }],
            }),
            nodes: vec![
                Node {
                    id: "hash".into(),
                    kind: NodeKind::Crypto,
                    label: String::new(),
                    spec: mapping("operation: hash\nalgorithm: sha256\n"),
                    connections: vec![
                        Connection { target_node_id: "term".into(), source_handle: "success".into() },
                        Connection { target_node_id: "term".into(), source_handle: "error".into() },
                    ],
                },
                Node { id: "term".into(), kind: NodeKind::Terminal, label: String::new(), spec: SpecPayload::default(), connections: vec![] },
            ],
        };
        let result = validate_flow(&doc, &[]);
        assert!(!result.issues.iter().any(|i| i.message.contains("key_source")));
    }

    #[test]
    fn parallel_missing_branches_and_done() {
        let doc = FlowDocument {
            flow: Some(meta()),
            trigger: Some(Node {
                id: "trigger".into(),
                kind: NodeKind::Trigger,
                label: String::new(),
                spec: mapping("event: start\n"),
                connections: vec![Connection { target_node_id: "par".into(), source_handle: "success".into() }],
            }),
            nodes: vec![
                Node {
                    id: "par".into(),
                    kind: NodeKind::Parallel,
                    label: String::new(),
                    spec: mapping("branches:\n  - a\n  - b\n  - c\n"),
                    connections: vec![Connection { target_node_id: "term".into(), source_handle: "branch-0".into() }],
                },
                Node { id: "term".into(), kind: NodeKind::Terminal, label: String::new(), spec: SpecPayload::default(), connections: vec![] },
            ],
        };
        let result = validate_flow(&doc, &[]);
        // missing branch-1, branch-2, done
        assert_eq!(result.error_count, 3);
    }
}
