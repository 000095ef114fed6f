pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, CliConfig, ImportConfig};

pub use adapters::{InMemoryRepository, JsonSnapshotRepository};
pub use crate::core::{etl::ImportEngine, importer::Importer, pipeline::ImportPipeline};
pub use domain::model::{
    Alias, AliasType, AliasUse, ConflictResolution, ImportKind, ImportOptions, ParsedBatch,
    SourceFormat, SourceInput, Zone, ZoneMember, ZoneType,
};
pub use utils::error::{ImportError, Result};
