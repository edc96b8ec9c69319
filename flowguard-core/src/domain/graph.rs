// flowguard-core/src/domain/graph.rs
//
// Graph utilities: adjacency construction, BFS reachability, and
// DFS cycle detection with the loop/parallel back-edge exception.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::flow::FlowDocument;
use crate::domain::node::Node;

pub struct GraphUtils;

impl GraphUtils {
    /// `[trigger] ++ nodes` when a trigger is present, else just `nodes`.
    pub fn all_nodes(doc: &FlowDocument) -> Vec<&Node> {
        let mut all = Vec::with_capacity(doc.nodes.len() + 1);
        if let Some(trigger) = &doc.trigger {
            all.push(trigger);
        }
        all.extend(doc.nodes.iter());
        all
    }

    pub fn adjacency(doc: &FlowDocument) -> HashMap<String, Vec<String>> {
        let mut adj = HashMap::new();
        for node in Self::all_nodes(doc) {
            let targets = node.connections.iter().map(|c| c.target_node_id.clone()).collect();
            adj.insert(node.id.clone(), targets);
        }
        adj
    }

    pub fn reachable(start_id: &str, adj: &HashMap<String, Vec<String>>) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start_id.to_string());
        visited.insert(start_id.to_string());

        while let Some(current) = queue.pop_front() {
            if let Some(targets) = adj.get(&current) {
                for target in targets {
                    if visited.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        visited
    }

    /// DFS from the trigger with a recursion stack. An edge into a loop-like
    /// node whose target is currently on the stack is not a back-edge — loop
    /// and parallel nodes legitimately re-enter themselves.
    /// Skipped entirely for agent flows (agent flows never
    /// raise "circular path").
    pub fn has_cycle(doc: &FlowDocument) -> bool {
        if doc.is_agent_flow() {
            return false;
        }

        let Some(trigger) = &doc.trigger else {
            return false;
        };

        let adj = Self::adjacency(doc);
        let loop_like: HashSet<&str> = Self::all_nodes(doc)
            .into_iter()
            .filter(|n| n.kind.is_loop_like())
            .map(|n| n.id.as_str())
            .collect();

        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();

        Self::dfs_has_cycle(&trigger.id, &adj, &loop_like, &mut visited, &mut on_stack)
    }

    fn dfs_has_cycle(
        node_id: &str,
        adj: &HashMap<String, Vec<String>>,
        loop_like: &HashSet<&str>,
        visited: &mut HashSet<String>,
        on_stack: &mut HashSet<String>,
    ) -> bool {
        if on_stack.contains(node_id) {
            // Only a genuine back-edge if the target is not loop-like.
            return !loop_like.contains(node_id);
        }
        if visited.contains(node_id) {
            return false;
        }

        visited.insert(node_id.to_string());
        on_stack.insert(node_id.to_string());

        if let Some(targets) = adj.get(node_id) {
            for target in targets {
                if on_stack.contains(target) {
                    if !loop_like.contains(target.as_str()) {
                        return true;
                    }
                    continue;
                }
                if Self::dfs_has_cycle(target, adj, loop_like, visited, on_stack) {
                    return true;
                }
            }
        }

        on_stack.remove(node_id);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::flow::FlowType;
    use crate::domain::node::{Connection, NodeKind, SpecPayload};

    fn node(id: &str, kind: NodeKind, targets: &[(&str, &str)]) -> Node {
        Node {
            id: id.to_string(),
            kind,
            label: String::new(),
            spec: SpecPayload::default(),
            connections: targets
                .iter()
                .map(|(t, h)| Connection { target_node_id: t.to_string(), source_handle: h.to_string() })
                .collect(),
        }
    }

    fn meta(flow_type: FlowType) -> crate::domain::flow::FlowMeta {
        crate::domain::flow::FlowMeta {
            id: "f".into(),
            domain: "d".into(),
            name: "f".into(),
            flow_type,
        }
    }

    #[test]
    fn reachable_finds_bfs_closure() {
        let doc = FlowDocument {
            flow: Some(meta(FlowType::Traditional)),
            trigger: Some(node("trigger", NodeKind::Trigger, &[("a", "success")])),
            nodes: vec![
                node("a", NodeKind::Process, &[("b", "success")]),
                node("b", NodeKind::Terminal, &[]),
                node("orphan", NodeKind::Process, &[]),
            ],
        };
        let adj = GraphUtils::adjacency(&doc);
        let reached = GraphUtils::reachable("trigger", &adj);
        assert!(reached.contains("a"));
        assert!(reached.contains("b"));
        assert!(!reached.contains("orphan"));
    }

    #[test]
    fn cycle_detected_for_plain_nodes() {
        let doc = FlowDocument {
            flow: Some(meta(FlowType::Traditional)),
            trigger: Some(node("trigger", NodeKind::Trigger, &[("a", "success")])),
            nodes: vec![
                node("a", NodeKind::Process, &[("b", "success")]),
                node("b", NodeKind::Process, &[("a", "success")]),
            ],
        };
        assert!(GraphUtils::has_cycle(&doc));
    }

    #[test]
    fn loop_back_edge_is_not_a_cycle() {
        let doc = FlowDocument {
            flow: Some(meta(FlowType::Traditional)),
            trigger: Some(node("trigger", NodeKind::Trigger, &[("loop1", "success")])),
            nodes: vec![
                node("loop1", NodeKind::Loop, &[("body1", "body"), ("done1", "done")]),
                node("body1", NodeKind::Process, &[("loop1", "success")]),
                node("done1", NodeKind::Terminal, &[]),
            ],
        };
        assert!(!GraphUtils::has_cycle(&doc));
    }

    #[test]
    fn agent_flows_skip_cycle_detection() {
        let doc = FlowDocument {
            flow: Some(meta(FlowType::Agent)),
            trigger: Some(node("trigger", NodeKind::Trigger, &[("a", "success")])),
            nodes: vec![
                node("a", NodeKind::Process, &[("b", "success")]),
                node("b", NodeKind::Process, &[("a", "success")]),
            ],
        };
        assert!(!GraphUtils::has_cycle(&doc));
    }
}
