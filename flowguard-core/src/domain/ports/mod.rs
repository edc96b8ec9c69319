// flowguard-core/src/domain/ports/mod.rs
//
// Trait-as-port boundary (mirrors a `ports::ManifestLoader` /
// `ports::SchemaSource` pattern): the domain layer declares what it needs
// from the outside world, infrastructure supplies a concrete adapter.

mod normalizer;

pub use normalizer::Normalizer;
