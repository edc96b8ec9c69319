// flowguard-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Unknown node kind: '{0}'")]
    #[diagnostic(
        code(flowguard::domain::unknown_node_kind),
        help("Node 'type' must be one of the 27 closed node kinds (see the data model glossary).")
    )]
    UnknownNodeKind(String),

    #[error("Normalization failed for '{flow_id}': {reason}")]
    #[diagnostic(code(flowguard::domain::normalize))]
    NormalizeError { flow_id: String, reason: String },
}
