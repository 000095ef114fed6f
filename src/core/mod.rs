pub mod dedup;
pub mod detect;
pub mod etl;
pub mod existence;
pub mod extract;
pub mod importer;
pub mod matcher;
pub mod parser;
pub mod pipeline;
pub mod wwpn;

pub use crate::domain::model::{Alias, ParsedBatch, SourceInput, Zone};
pub use crate::domain::ports::{AliasRepository, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
