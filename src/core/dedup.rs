//! Batch de-duplication and alias-type conflict resolution.
//!
//! Conflict resolution runs before the `(name, wwpn)` key pass: a plain key pass cannot
//! see one WWPN registered under two different type/name pairs.

use std::collections::{HashMap, HashSet};

use crate::domain::model::{
    Alias, AliasType, ConflictResolution, Duplicate, DuplicateKind, DuplicateReason, Zone,
};

#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome<T> {
    pub records: Vec<T>,
    pub duplicates: Vec<Duplicate>,
}

impl<T> Default for DedupOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

fn preferred_type(policy: ConflictResolution) -> Option<AliasType> {
    match policy {
        ConflictResolution::PreferDeviceAlias => Some(AliasType::DeviceAlias),
        ConflictResolution::PreferFcalias => Some(AliasType::Fcalias),
        ConflictResolution::ImportBoth => None,
    }
}

fn alias_duplicate(alias: &Alias, reason: DuplicateReason) -> Duplicate {
    Duplicate {
        kind: DuplicateKind::Alias,
        name: alias.name.clone(),
        wwpn: Some(alias.wwpn.clone()),
        reason,
    }
}

/// Drop records whose WWPN is also declared under the preferred alias type.
pub fn resolve_conflicts(aliases: Vec<Alias>, policy: ConflictResolution) -> DedupOutcome<Alias> {
    let Some(preferred) = preferred_type(policy) else {
        return DedupOutcome {
            records: aliases,
            duplicates: Vec::new(),
        };
    };

    let mut types_by_wwpn: HashMap<&str, HashSet<AliasType>> = HashMap::new();
    for alias in &aliases {
        types_by_wwpn
            .entry(alias.wwpn.as_str())
            .or_default()
            .insert(alias.alias_type);
    }

    // Groups without the preferred type keep every record.
    let contested: HashSet<String> = types_by_wwpn
        .into_iter()
        .filter(|(_, types)| types.len() > 1 && types.contains(&preferred))
        .map(|(wwpn, _)| wwpn.to_string())
        .collect();

    let mut outcome = DedupOutcome::default();
    for alias in aliases {
        if contested.contains(&alias.wwpn) && alias.alias_type != preferred {
            tracing::debug!(
                "Dropping {} {} ({}) in favour of {}",
                alias.alias_type,
                alias.name,
                alias.wwpn,
                preferred
            );
            outcome
                .duplicates
                .push(alias_duplicate(&alias, DuplicateReason::TypeConflict));
        } else {
            outcome.records.push(alias);
        }
    }
    outcome
}

/// Conflict resolution followed by a first-wins `(name, wwpn)` key pass. Names compare
/// case-insensitively. Surviving name or WWPN collisions are reported but kept.
pub fn dedupe_aliases(aliases: Vec<Alias>, policy: ConflictResolution) -> DedupOutcome<Alias> {
    let resolved = resolve_conflicts(aliases, policy);
    let mut outcome = DedupOutcome {
        records: Vec::with_capacity(resolved.records.len()),
        duplicates: resolved.duplicates,
    };

    let mut seen_keys: HashSet<(String, String)> = HashSet::new();
    let mut wwpn_by_name: HashMap<String, String> = HashMap::new();
    let mut names_by_wwpn_type: HashMap<(String, AliasType), String> = HashMap::new();

    for alias in resolved.records {
        let name_key = alias.name.to_lowercase();
        if !seen_keys.insert((name_key.clone(), alias.wwpn.clone())) {
            outcome
                .duplicates
                .push(alias_duplicate(&alias, DuplicateReason::InBatch));
            continue;
        }

        match wwpn_by_name.get(&name_key) {
            Some(wwpn) if *wwpn != alias.wwpn => outcome
                .duplicates
                .push(alias_duplicate(&alias, DuplicateReason::NameConflict)),
            Some(_) => {}
            None => {
                wwpn_by_name.insert(name_key.clone(), alias.wwpn.clone());
            }
        }

        let type_key = (alias.wwpn.clone(), alias.alias_type);
        match names_by_wwpn_type.get(&type_key) {
            Some(name) if *name != name_key => outcome
                .duplicates
                .push(alias_duplicate(&alias, DuplicateReason::WwpnConflict)),
            Some(_) => {}
            None => {
                names_by_wwpn_type.insert(type_key, name_key);
            }
        }

        outcome.records.push(alias);
    }

    tracing::debug!(
        "Alias dedup kept {} records, reported {} duplicates",
        outcome.records.len(),
        outcome.duplicates.len()
    );
    outcome
}

/// Zones are unique per `(name, vsan)`; the first occurrence wins.
pub fn dedupe_zones(zones: Vec<Zone>) -> DedupOutcome<Zone> {
    dedupe_zones_by(zones, |zone| zone)
}

/// Same as [`dedupe_zones`] for records that carry a zone plus per-zone data, so the
/// data of dropped zones is dropped with them.
pub fn dedupe_zones_by<T, F>(items: Vec<T>, zone_of: F) -> DedupOutcome<T>
where
    F: Fn(&T) -> &Zone,
{
    let mut outcome = DedupOutcome::default();
    let mut seen: HashSet<(String, u32)> = HashSet::new();

    for item in items {
        let zone = zone_of(&item);
        if seen.insert((zone.name.to_lowercase(), zone.vsan)) {
            outcome.records.push(item);
        } else {
            outcome.duplicates.push(Duplicate {
                kind: DuplicateKind::Zone,
                name: zone.name.clone(),
                wwpn: None,
                reason: DuplicateReason::InBatch,
            });
        }
    }
    outcome
}
