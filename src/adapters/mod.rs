// Adapters layer: concrete implementations of the domain ports for external systems.
// Local file storage lives under config::cli next to the CLI configuration.

pub mod repository;

pub use repository::{InMemoryRepository, JsonSnapshotRepository};
