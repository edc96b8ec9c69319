// flowguard-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

/// Covers the core's own infrastructure surface: interpreting YAML already
/// read from disk. Actual file/directory I/O belongs to the driver in the
/// `flowguard` binary crate; this crate performs no I/O of its own.
#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    #[error("YAML parsing error: {0}")]
    #[diagnostic(code(flowguard::infra::yaml), help("Check the document's YAML syntax (indentation, types)."))]
    Yaml(#[from] serde_yaml::Error),
}
