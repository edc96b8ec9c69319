// flowguard-core/src/infrastructure/mod.rs

pub mod error;
pub mod normalizer;

pub use error::InfrastructureError;
pub use normalizer::YamlNormalizer;
