use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::model::{Alias, FabricId, ProjectId, Zone};
use crate::domain::ports::AliasRepository;
use crate::utils::error::{ImportError, Result};

/// Inventory held in memory. Counts queries so callers can check round trips.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    aliases: Vec<Alias>,
    zones: Vec<Zone>,
    alias_queries: AtomicUsize,
    zone_queries: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(mut self, aliases: Vec<Alias>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_zones(mut self, zones: Vec<Zone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn alias_queries(&self) -> usize {
        self.alias_queries.load(Ordering::Relaxed)
    }

    pub fn zone_queries(&self) -> usize {
        self.zone_queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AliasRepository for InMemoryRepository {
    async fn existing_aliases_for_fabric(&self, fabric_id: FabricId) -> Result<Vec<Alias>> {
        self.alias_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .aliases
            .iter()
            .filter(|a| a.fabric_id == fabric_id)
            .cloned()
            .collect())
    }

    async fn existing_zones_for_project(&self, _project_id: ProjectId) -> Result<Vec<Zone>> {
        self.zone_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self.zones.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    aliases: Vec<Alias>,
    #[serde(default)]
    zones: Vec<Zone>,
}

/// Inventory exported to a JSON file shaped like the import payload:
/// `{"aliases": [...], "zones": [...]}`. The file is scoped to one project.
#[derive(Debug, Clone)]
pub struct JsonSnapshotRepository {
    path: PathBuf,
}

impl JsonSnapshotRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Snapshot> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ImportError::RepositoryUnavailable {
                message: format!("cannot read {}: {}", self.path.display(), e),
            }
        })?;
        serde_json::from_str(&content).map_err(|e| ImportError::RepositoryUnavailable {
            message: format!("invalid snapshot {}: {}", self.path.display(), e),
        })
    }
}

#[async_trait]
impl AliasRepository for JsonSnapshotRepository {
    async fn existing_aliases_for_fabric(&self, fabric_id: FabricId) -> Result<Vec<Alias>> {
        let snapshot = self.load().await?;
        Ok(snapshot
            .aliases
            .into_iter()
            .filter(|a| a.fabric_id == fabric_id)
            .collect())
    }

    async fn existing_zones_for_project(&self, _project_id: ProjectId) -> Result<Vec<Zone>> {
        Ok(self.load().await?.zones)
    }
}
