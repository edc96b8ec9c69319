// flowguard-core/src/error.rs

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;

#[derive(Error, Debug)]
pub enum FlowguardError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}
