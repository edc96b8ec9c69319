// flowguard-core/src/domain/ports/normalizer.rs
//
// The normalizer port: turns a raw parsed YAML mapping into a
// `FlowDocument` satisfying the data model's invariants. A loosely-typed
// source format needs some concrete adapter to bridge it to typed data;
// this trait is the seam a caller plugs one into.

use crate::domain::error::DomainError;
use crate::domain::flow::{FlowDocument, FlowType};

pub trait Normalizer {
    fn normalize(
        &self,
        raw: &serde_yaml::Mapping,
        domain_id: &str,
        flow_id: &str,
        flow_type: FlowType,
    ) -> Result<FlowDocument, DomainError>;
}
