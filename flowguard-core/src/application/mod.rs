// flowguard-core/src/application/mod.rs

pub mod orchestrator;

pub use orchestrator::{FlowSource, ImplementGate, ValidationOrchestrator};
