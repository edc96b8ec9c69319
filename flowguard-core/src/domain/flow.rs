// flowguard-core/src/domain/flow.rs

use serde::{Deserialize, Serialize};

use crate::domain::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Traditional,
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowMeta {
    pub id: String,
    pub domain: String,
    pub name: String,
    #[serde(rename = "type")]
    pub flow_type: FlowType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowDocument {
    #[serde(default)]
    pub flow: Option<FlowMeta>,
    #[serde(default)]
    pub trigger: Option<Node>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl FlowDocument {
    /// `"<domain>/<flow>"`, used as the orchestrator's flow-result cache key
    /// when `flow` metadata is present.
    pub fn key(&self) -> Option<String> {
        self.flow.as_ref().map(|m| format!("{}/{}", m.domain, m.id))
    }

    pub fn is_agent_flow(&self) -> bool {
        matches!(self.flow.as_ref().map(|m| m.flow_type), Some(FlowType::Agent))
    }
}
