// flowguard-core/src/domain/pages.rs
//
// The auxiliary "pages/schemas/infrastructure" data consumed by the system
// validator. These documents are optional — the system
// validator only runs the checks that depend on them when they are present.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::flow::FlowDocument;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSubmit {
    pub flow: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageForm {
    #[serde(default)]
    pub submit: FormSubmit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageState {
    #[serde(default)]
    pub initial_fetch: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSection {
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub forms: Vec<PageForm>,
    #[serde(default)]
    pub state: PageState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSpec {
    pub id: String,
    #[serde(default)]
    pub sections: Vec<PageSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationItem {
    pub page: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Navigation {
    #[serde(default)]
    pub items: Vec<NavigationItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default)]
    pub navigation: Navigation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Infrastructure {
    #[serde(default)]
    pub services: HashMap<String, serde_yaml::Value>,
}

/// Everything the system validator may optionally consult beyond the domain
/// configs themselves (an optional specs context).
#[derive(Debug, Clone, Default)]
pub struct SpecsContext {
    pub schemas: Vec<SchemaFile>,
    pub pages_config: Option<PagesConfig>,
    pub page_specs: Vec<PageSpec>,
    pub infrastructure: Option<Infrastructure>,
    pub flow_docs: Vec<FlowDocument>,
}
