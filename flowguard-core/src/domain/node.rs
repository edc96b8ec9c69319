// flowguard-core/src/domain/node.rs
//
// The data model's node layer: a closed 27-variant NodeKind, a
// Connection carrying a handle name, and a generic-but-typed SpecPayload that
// the validators interpret per-kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Trigger,
    Input,
    Process,
    Decision,
    Terminal,
    DataStore,
    ServiceCall,
    IpcCall,
    Event,
    Loop,
    Parallel,
    SubFlow,
    LlmCall,
    Collection,
    Parse,
    Crypto,
    Batch,
    Transaction,
    Cache,
    Transform,
    Delay,
    AgentLoop,
    Guardrail,
    HumanGate,
    Orchestrator,
    SmartRouter,
    Handoff,
    AgentGroup,
}

impl NodeKind {
    /// The closed set of 27 kinds, used by coverage scoring.
    pub const ALL: [NodeKind; 27] = [
        NodeKind::Trigger,
        NodeKind::Input,
        NodeKind::Process,
        NodeKind::Decision,
        NodeKind::Terminal,
        NodeKind::DataStore,
        NodeKind::ServiceCall,
        NodeKind::IpcCall,
        NodeKind::Event,
        NodeKind::Loop,
        NodeKind::Parallel,
        NodeKind::SubFlow,
        NodeKind::LlmCall,
        NodeKind::Collection,
        NodeKind::Parse,
        NodeKind::Crypto,
        NodeKind::Batch,
        NodeKind::Transaction,
        NodeKind::Cache,
        NodeKind::Transform,
        NodeKind::Delay,
        NodeKind::AgentLoop,
        NodeKind::Guardrail,
        NodeKind::HumanGate,
        NodeKind::Orchestrator,
        NodeKind::SmartRouter,
        NodeKind::Handoff,
        NodeKind::AgentGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Trigger => "trigger",
            NodeKind::Input => "input",
            NodeKind::Process => "process",
            NodeKind::Decision => "decision",
            NodeKind::Terminal => "terminal",
            NodeKind::DataStore => "data_store",
            NodeKind::ServiceCall => "service_call",
            NodeKind::IpcCall => "ipc_call",
            NodeKind::Event => "event",
            NodeKind::Loop => "loop",
            NodeKind::Parallel => "parallel",
            NodeKind::SubFlow => "sub_flow",
            NodeKind::LlmCall => "llm_call",
            NodeKind::Collection => "collection",
            NodeKind::Parse => "parse",
            NodeKind::Crypto => "crypto",
            NodeKind::Batch => "batch",
            NodeKind::Transaction => "transaction",
            NodeKind::Cache => "cache",
            NodeKind::Transform => "transform",
            NodeKind::Delay => "delay",
            NodeKind::AgentLoop => "agent_loop",
            NodeKind::Guardrail => "guardrail",
            NodeKind::HumanGate => "human_gate",
            NodeKind::Orchestrator => "orchestrator",
            NodeKind::SmartRouter => "smart_router",
            NodeKind::Handoff => "handoff",
            NodeKind::AgentGroup => "agent_group",
        }
    }

    /// `loop` and `parallel` nodes are exempt from cycle back-edge treatment
    /// because re-entry into them is intentional.
    pub fn is_loop_like(&self) -> bool {
        matches!(self, NodeKind::Loop | NodeKind::Parallel)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| DomainError::UnknownNodeKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub target_node_id: String,
    pub source_handle: String,
}

/// A generic, order-preserving view over a node's `spec:` mapping. The 27
/// node kinds share a handful of shapes (required string, required non-empty
/// list, nested mapping with sub-requirements); rather than 27 near-duplicate
/// payload structs, validators match on `NodeKind` and pull typed values out
/// of this accessor layer (design note: "runtime-tag + typed accessors").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecPayload(pub serde_yaml::Mapping);

impl SpecPayload {
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.0.get(serde_yaml::Value::String(key.to_string()))
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// True when the field is a string or (for the trigger event field,
    /// which may be a list) a non-empty sequence, and is not blank.
    pub fn non_empty_str(&self, key: &str) -> bool {
        self.str(key).map(|s| !s.trim().is_empty()).unwrap_or(false)
    }

    pub fn non_empty_str_or_list(&self, key: &str) -> bool {
        match self.get(key) {
            Some(serde_yaml::Value::String(s)) => !s.trim().is_empty(),
            Some(serde_yaml::Value::Sequence(seq)) => !seq.is_empty(),
            _ => false,
        }
    }

    pub fn bool_flag(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        let v = self.get(key)?;
        v.as_f64().or_else(|| v.as_i64().map(|n| n as f64)).or_else(|| v.as_u64().map(|n| n as f64))
    }

    pub fn sequence(&self, key: &str) -> Option<&Vec<serde_yaml::Value>> {
        self.get(key)?.as_sequence()
    }

    pub fn non_empty_sequence(&self, key: &str) -> bool {
        self.sequence(key).map(|s| !s.is_empty()).unwrap_or(false)
    }

    pub fn mapping(&self, key: &str) -> Option<&serde_yaml::Mapping> {
        self.get(key)?.as_mapping()
    }

    /// Present and not explicitly `null` (used for fields like `delay.min_ms`
    /// where `0` is a legal value but absence is not).
    pub fn is_present(&self, key: &str) -> bool {
        !matches!(self.get(key), None | Some(serde_yaml::Value::Null))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub spec: SpecPayload,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Node {
    /// Handles actually wired on this node's outgoing connections.
    pub fn handles(&self) -> std::collections::HashSet<&str> {
        self.connections.iter().map(|c| c.source_handle.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_round_trips_through_str() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("not_a_kind".parse::<NodeKind>().is_err());
    }

    #[test]
    fn spec_payload_reads_nested_values() {
        let yaml = "operation: get\nstore_type: memory\nstore: sessions\n";
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).unwrap();
        let spec = SpecPayload(mapping);
        assert_eq!(spec.str("operation"), Some("get"));
        assert!(spec.non_empty_str("store"));
        assert!(!spec.non_empty_str("missing"));
    }

    #[test]
    fn event_field_accepts_string_or_list() {
        let as_str: serde_yaml::Mapping = serde_yaml::from_str("event: http_request\n").unwrap();
        assert!(SpecPayload(as_str).non_empty_str_or_list("event"));

        let as_list: serde_yaml::Mapping = serde_yaml::from_str("event:\n  - a\n  - b\n").unwrap();
        assert!(SpecPayload(as_list).non_empty_str_or_list("event"));

        let empty_list: serde_yaml::Mapping = serde_yaml::from_str("event: []\n").unwrap();
        assert!(!SpecPayload(empty_list).non_empty_str_or_list("event"));
    }

    #[test]
    fn is_present_distinguishes_null_from_missing_and_zero() {
        let with_zero: serde_yaml::Mapping = serde_yaml::from_str("min_ms: 0\n").unwrap();
        assert!(SpecPayload(with_zero).is_present("min_ms"));

        let with_null: serde_yaml::Mapping = serde_yaml::from_str("min_ms: null\n").unwrap();
        assert!(!SpecPayload(with_null).is_present("min_ms"));

        let missing = SpecPayload::default();
        assert!(!missing.is_present("min_ms"));
    }
}
