// flowguard-core/src/domain/config.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::flow::FlowType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub flow_type: FlowType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default, rename = "keyboard_shortcut")]
    pub keyboard_shortcut: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventWiring {
    pub event: String,
    #[serde(default)]
    pub payload: HashMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub from_flow: Option<String>,
    #[serde(default)]
    pub handled_by_flow: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGroupDef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub portals: HashMap<String, Position>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub owns_schemas: Vec<String>,
    #[serde(default)]
    pub flows: Vec<FlowEntry>,
    #[serde(default)]
    pub publishes_events: Vec<EventWiring>,
    #[serde(default)]
    pub consumes_events: Vec<EventWiring>,
    #[serde(default)]
    pub event_groups: Vec<EventGroupDef>,
    #[serde(default)]
    pub stores: Vec<StoreDef>,
    #[serde(default)]
    pub layout: Option<Layout>,
}

impl DomainConfig {
    pub fn id(&self) -> &str {
        &self.name
    }
}
