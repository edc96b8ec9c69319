// flowguard-core/src/infrastructure/normalizer.rs
//
// Default adapter for the `Normalizer` port, mirroring a manifest-loader
// implementing its own loader trait: a concrete unit struct doing the real
// deserialization work. Turns the raw parsed mapping into the
// node/trigger/connections shape and stamps a `FlowMeta` from the path
// information the driver already knows when the raw document omits one.

use crate::domain::error::DomainError;
use crate::domain::flow::{FlowDocument, FlowMeta, FlowType};
use crate::domain::node::Node;
use crate::domain::ports::Normalizer;

#[derive(Debug, Default)]
pub struct YamlNormalizer;

impl Normalizer for YamlNormalizer {
    fn normalize(
        &self,
        raw: &serde_yaml::Mapping,
        domain_id: &str,
        flow_id: &str,
        flow_type: FlowType,
    ) -> Result<FlowDocument, DomainError> {
        let trigger: Option<Node> = raw
            .get(serde_yaml::Value::String("trigger".into()))
            .map(|v| serde_yaml::from_value(v.clone()))
            .transpose()
            .map_err(|e| DomainError::NormalizeError { flow_id: flow_id.to_string(), reason: e.to_string() })?;

        let nodes: Vec<Node> = raw
            .get(serde_yaml::Value::String("nodes".into()))
            .map(|v| serde_yaml::from_value(v.clone()))
            .transpose()
            .map_err(|e| DomainError::NormalizeError { flow_id: flow_id.to_string(), reason: e.to_string() })?
            .unwrap_or_default();

        let flow_meta = raw
            .get(serde_yaml::Value::String("flow".into()))
            .and_then(|v| serde_yaml::from_value::<FlowMeta>(v.clone()).ok())
            .unwrap_or_else(|| FlowMeta {
                id: flow_id.to_string(),
                domain: domain_id.to_string(),
                name: flow_id.to_string(),
                flow_type,
            });

        Ok(FlowDocument { flow: Some(flow_meta), trigger, nodes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_in_flow_meta_when_absent_from_raw() {
        let raw: serde_yaml::Mapping = serde_yaml::from_str(
            "trigger:\n  id: trigger\n  type: trigger\n  spec:\n    event: http_request\nnodes: []\n",
        )
        .unwrap();
        let doc = YamlNormalizer.normalize(&raw, "orders", "create", FlowType::Traditional).unwrap();
        let meta = doc.flow.unwrap();
        assert_eq!(meta.domain, "orders");
        assert_eq!(meta.id, "create");
    }

    #[test]
    fn normalize_error_wraps_malformed_node_section() {
        let raw: serde_yaml::Mapping = serde_yaml::from_str("nodes: \"not-a-list\"\n").unwrap();
        let result = YamlNormalizer.normalize(&raw, "orders", "create", FlowType::Traditional);
        assert!(result.is_err());
    }
}
