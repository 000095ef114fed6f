//! Existence checks against the persisted inventory.
//!
//! One repository read per fabric (aliases) or per project (zones), never per record.
//! A failed read leaves the flags `false` and is reported alongside the results.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::core::matcher::AliasIndex;
use crate::domain::model::{
    Alias, Duplicate, DuplicateKind, DuplicateReason, FabricId, ProjectId, Zone,
};
use crate::domain::ports::AliasRepository;
use crate::utils::error::ImportError;

#[derive(Debug, Default)]
pub struct ExistenceOutcome {
    pub existing: HashMap<FabricId, AliasIndex>,
    pub duplicates: Vec<Duplicate>,
    pub errors: Vec<ImportError>,
}

impl ExistenceOutcome {
    pub fn existing_for(&self, fabric_id: FabricId) -> Option<&AliasIndex> {
        self.existing.get(&fabric_id)
    }
}

fn unavailable(err: ImportError) -> ImportError {
    match err {
        ImportError::RepositoryUnavailable { .. } => err,
        other => ImportError::RepositoryUnavailable {
            message: other.to_string(),
        },
    }
}

/// Read the persisted aliases of each fabric once.
pub async fn load_existing_aliases<R, I>(fabrics: I, repository: &R) -> ExistenceOutcome
where
    R: AliasRepository + ?Sized,
    I: IntoIterator<Item = FabricId>,
{
    let mut outcome = ExistenceOutcome::default();
    let fabrics: BTreeSet<FabricId> = fabrics.into_iter().collect();

    for fabric_id in fabrics {
        match repository.existing_aliases_for_fabric(fabric_id).await {
            Ok(existing) => {
                tracing::debug!(
                    "Loaded {} existing aliases for fabric {}",
                    existing.len(),
                    fabric_id
                );
                outcome
                    .existing
                    .insert(fabric_id, AliasIndex::from_aliases(&existing));
            }
            Err(e) => {
                tracing::warn!("Existing aliases for fabric {} unavailable: {}", fabric_id, e);
                outcome.errors.push(unavailable(e));
            }
        }
    }

    outcome
}

/// Flag every alias whose name (case-insensitive) or WWPN is already persisted.
/// Aliases of a fabric that could not be loaded are left untouched.
pub fn flag_existing_aliases(
    aliases: &mut [Alias],
    existing: &HashMap<FabricId, AliasIndex>,
) -> Vec<Duplicate> {
    let mut duplicates = Vec::new();

    for alias in aliases.iter_mut() {
        let Some(index) = existing.get(&alias.fabric_id) else {
            continue;
        };
        if index.contains_name(&alias.name) || index.contains_wwpn(&alias.wwpn) {
            alias.exists_in_database = true;
            alias.create = false;
            duplicates.push(Duplicate {
                kind: DuplicateKind::Alias,
                name: alias.name.clone(),
                wwpn: Some(alias.wwpn.clone()),
                reason: DuplicateReason::ExistsInDatabase,
            });
        }
    }

    duplicates
}

pub async fn mark_existing_aliases<R>(aliases: &mut [Alias], repository: &R) -> ExistenceOutcome
where
    R: AliasRepository + ?Sized,
{
    let fabrics: Vec<FabricId> = aliases.iter().map(|a| a.fabric_id).collect();
    let mut outcome = load_existing_aliases(fabrics, repository).await;
    outcome.duplicates = flag_existing_aliases(aliases, &outcome.existing);
    outcome
}

/// Flag zones whose name already exists in the same fabric of the project.
pub async fn mark_existing_zones<R>(
    zones: &mut [Zone],
    project_id: ProjectId,
    repository: &R,
) -> Result<Vec<Duplicate>, ImportError>
where
    R: AliasRepository + ?Sized,
{
    if zones.is_empty() {
        return Ok(Vec::new());
    }

    let existing = repository
        .existing_zones_for_project(project_id)
        .await
        .map_err(unavailable)?;

    let names: HashSet<(FabricId, String)> = existing
        .iter()
        .map(|z| (z.fabric_id, z.name.to_lowercase()))
        .collect();

    let mut duplicates = Vec::new();
    for zone in zones.iter_mut() {
        if names.contains(&(zone.fabric_id, zone.name.to_lowercase())) {
            zone.exists = true;
            zone.create = false;
            duplicates.push(Duplicate {
                kind: DuplicateKind::Zone,
                name: zone.name.clone(),
                wwpn: None,
                reason: DuplicateReason::ExistsInDatabase,
            });
        }
    }
    Ok(duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::repository::InMemoryRepository;
    use crate::core::parser::test_defaults;
    use crate::domain::model::AliasType;
    use crate::utils::error::Result;
    use async_trait::async_trait;

    fn alias(name: &str, wwpn: &str) -> Alias {
        test_defaults().build(name.into(), wwpn.into(), AliasType::DeviceAlias, String::new())
    }

    struct DownRepository;

    #[async_trait]
    impl AliasRepository for DownRepository {
        async fn existing_aliases_for_fabric(&self, _fabric_id: FabricId) -> Result<Vec<Alias>> {
            Err(ImportError::ConfigError {
                message: "connection refused".into(),
            })
        }

        async fn existing_zones_for_project(&self, _project_id: ProjectId) -> Result<Vec<Zone>> {
            Err(ImportError::RepositoryUnavailable {
                message: "connection refused".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_marks_by_name_or_wwpn() {
        let repo = InMemoryRepository::new()
            .with_aliases(vec![alias("host1", "10:00:00:00:00:00:00:01")]);
        let mut aliases = vec![
            alias("HOST1", "10:00:00:00:00:00:00:05"),
            alias("renamed", "10:00:00:00:00:00:00:01"),
            alias("fresh", "10:00:00:00:00:00:00:09"),
        ];

        let outcome = mark_existing_aliases(&mut aliases, &repo).await;

        assert!(aliases[0].exists_in_database);
        assert!(aliases[1].exists_in_database);
        assert!(!aliases[2].exists_in_database);
        assert!(aliases[2].create);
        assert!(!aliases[0].create);
        assert_eq!(outcome.duplicates.len(), 2);
        assert_eq!(repo.alias_queries(), 1);
    }

    #[tokio::test]
    async fn test_repository_failure_fails_open() {
        let mut aliases = vec![alias("HOST1", "10:00:00:00:00:00:00:05")];
        let outcome = mark_existing_aliases(&mut aliases, &DownRepository).await;

        assert!(!aliases[0].exists_in_database);
        assert!(matches!(
            outcome.errors.as_slice(),
            [ImportError::RepositoryUnavailable { .. }]
        ));

        let mut zones: Vec<Zone> = Vec::new();
        assert!(mark_existing_zones(&mut zones, 1, &DownRepository).await.is_ok());
    }
}
