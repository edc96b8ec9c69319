// flowguard-core/src/lib.rs

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

// --- HEXAGONAL MODULES ---

// 1. Ports (interfaces the domain needs from the outside world)
pub mod ports {
    pub use crate::domain::ports::*;
}

// 2. Domain (the validation engine proper — depends on nothing else)
pub mod domain;

// 3. Infrastructure (adapters — depends on domain and ports)
pub mod infrastructure;

// 4. Application (orchestration — depends on domain, infrastructure, ports)
pub mod application;

// --- GLOBAL ERROR FACADE ---
pub mod error;

pub use error::FlowguardError;
