//! Batch alias pool and zone member matching.
//!
//! The pool is built once from Pass-1 output by a pure fold and is only read during
//! Pass 2, so zone parses in any order see the same aliases.

use std::collections::HashMap;

use crate::core::parser::{LineWarning, ParsedZone};
use crate::core::wwpn::normalize_wwpn;
use crate::domain::model::{Alias, FabricId, UnmatchedWwpn, Zone, ZoneMember};

/// Lookup of alias names by WWPN and WWPNs by case-insensitive name. First entry wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasIndex {
    by_wwpn: HashMap<String, String>,
    by_name: HashMap<String, (String, String)>,
}

impl AliasIndex {
    pub fn from_aliases<'a, I>(aliases: I) -> Self
    where
        I: IntoIterator<Item = &'a Alias>,
    {
        let mut index = Self::default();
        for alias in aliases {
            index.insert(alias);
        }
        index
    }

    fn insert(&mut self, alias: &Alias) {
        // Persisted records may predate normalization.
        let wwpn = normalize_wwpn(&alias.wwpn).unwrap_or_else(|_| alias.wwpn.to_lowercase());
        self.by_wwpn
            .entry(wwpn.clone())
            .or_insert_with(|| alias.name.clone());
        self.by_name
            .entry(alias.name.to_lowercase())
            .or_insert_with(|| (alias.name.clone(), wwpn));
    }

    pub fn name_for_wwpn(&self, wwpn: &str) -> Option<&str> {
        self.by_wwpn.get(wwpn).map(String::as_str)
    }

    /// Returns `(name as declared, wwpn)` for a name, ignoring case.
    pub fn lookup_name(&self, name: &str) -> Option<(&str, &str)> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|(n, w)| (n.as_str(), w.as_str()))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    pub fn contains_wwpn(&self, wwpn: &str) -> bool {
        self.by_wwpn.contains_key(wwpn)
    }

    pub fn len(&self) -> usize {
        self.by_wwpn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_wwpn.is_empty()
    }
}

/// Immutable snapshot of every alias declared anywhere in the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAliasPool {
    index: AliasIndex,
}

impl BatchAliasPool {
    pub fn from_outputs<'a, I>(outputs: I) -> Self
    where
        I: IntoIterator<Item = &'a [Alias]>,
    {
        let index = outputs
            .into_iter()
            .flatten()
            .fold(AliasIndex::default(), |mut index, alias| {
                index.insert(alias);
                index
            });
        Self { index }
    }

    pub fn index(&self) -> &AliasIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub zone: Zone,
    pub unmatched: Vec<UnmatchedWwpn>,
    pub warnings: Vec<LineWarning>,
}

/// Resolves zone members against the batch pool first, then the persisted aliases.
#[derive(Debug, Clone, Copy)]
pub struct MemberMatcher<'a> {
    pool: &'a BatchAliasPool,
    existing: &'a AliasIndex,
}

impl<'a> MemberMatcher<'a> {
    pub fn new(pool: &'a BatchAliasPool, existing: &'a AliasIndex) -> Self {
        Self { pool, existing }
    }

    pub fn resolve_wwpn(&self, wwpn: &str) -> Option<&'a str> {
        self.pool
            .index()
            .name_for_wwpn(wwpn)
            .or_else(|| self.existing.name_for_wwpn(wwpn))
    }

    pub fn resolve_name(&self, name: &str) -> Option<(&'a str, &'a str)> {
        self.pool
            .index()
            .lookup_name(name)
            .or_else(|| self.existing.lookup_name(name))
    }

    pub fn match_zone(
        &self,
        parsed: ParsedZone,
        fabric_id: FabricId,
        create: bool,
        source: &str,
    ) -> MatchOutcome {
        let mut members = Vec::with_capacity(parsed.members.len());
        let mut unmatched = Vec::new();
        let mut warnings = Vec::new();

        for raw in parsed.members {
            let member = match (raw.wwpn, raw.alias_hint) {
                (Some(wwpn), _) => {
                    let matched = self.resolve_wwpn(&wwpn).map(str::to_string);
                    ZoneMember {
                        wwpn,
                        matched_alias_name: matched,
                    }
                }
                (None, Some(hint)) => match self.resolve_name(&hint) {
                    Some((name, wwpn)) => ZoneMember {
                        wwpn: wwpn.to_string(),
                        matched_alias_name: Some(name.to_string()),
                    },
                    None => {
                        warnings.push(LineWarning {
                            line_number: raw.line_number,
                            line: hint.clone(),
                            reason: format!(
                                "member {} of zone {} does not name a known alias",
                                hint, parsed.name
                            ),
                        });
                        continue;
                    }
                },
                (None, None) => continue,
            };

            if member.matched_alias_name.is_none() {
                unmatched.push(UnmatchedWwpn {
                    zone: parsed.name.clone(),
                    source: source.to_string(),
                    wwpn: member.wwpn.clone(),
                });
            }
            members.push(member);
        }

        let notes = parsed
            .zoneset
            .as_ref()
            .map(|zs| format!("zoneset {}", zs))
            .unwrap_or_default();

        MatchOutcome {
            zone: Zone {
                name: parsed.name,
                vsan: parsed.vsan,
                fabric_id,
                zone_type: parsed.zone_type,
                create,
                exists: false,
                notes,
                zoneset: parsed.zoneset,
                members,
            },
            unmatched,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{test_defaults, RawMember};
    use crate::domain::model::{AliasType, ZoneType};

    fn alias(name: &str, wwpn: &str) -> Alias {
        test_defaults().build(name.into(), wwpn.into(), AliasType::DeviceAlias, String::new())
    }

    fn member(wwpn: Option<&str>, hint: Option<&str>) -> RawMember {
        RawMember {
            line_number: 1,
            wwpn: wwpn.map(str::to_string),
            alias_hint: hint.map(str::to_string),
        }
    }

    fn zone(members: Vec<RawMember>) -> ParsedZone {
        ParsedZone {
            name: "Z1".into(),
            vsan: 75,
            zone_type: ZoneType::Standard,
            zoneset: Some("ZS".into()),
            line_number: 1,
            members,
        }
    }

    #[test]
    fn test_pool_is_first_wins_across_outputs() {
        let first = vec![alias("A", "10:00:00:00:00:00:00:01")];
        let second = vec![alias("B", "10:00:00:00:00:00:00:01"), alias("C", "10:00:00:00:00:00:00:02")];
        let pool = BatchAliasPool::from_outputs([first.as_slice(), second.as_slice()]);

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.index().name_for_wwpn("10:00:00:00:00:00:00:01"), Some("A"));
        assert_eq!(pool.index().lookup_name("c"), Some(("C", "10:00:00:00:00:00:00:02")));
    }

    #[test]
    fn test_pool_takes_priority_over_existing() {
        let pool = BatchAliasPool::from_outputs([vec![alias("NEW", "10:00:00:00:00:00:00:01")].as_slice()]);
        let existing = AliasIndex::from_aliases(&[
            alias("OLD", "10:00:00:00:00:00:00:01"),
            alias("Host1", "10:00:00:00:00:00:00:02"),
        ]);
        let matcher = MemberMatcher::new(&pool, &existing);

        assert_eq!(matcher.resolve_wwpn("10:00:00:00:00:00:00:01"), Some("NEW"));
        assert_eq!(matcher.resolve_wwpn("10:00:00:00:00:00:00:02"), Some("Host1"));
    }

    #[test]
    fn test_existing_wwpns_are_normalized_in_the_index() {
        let existing = AliasIndex::from_aliases(&[alias("Legacy", "C0-50-76-09-15-09-01-08")]);
        assert!(existing.contains_wwpn("c0:50:76:09:15:09:01:08"));
        assert!(existing.contains_name("LEGACY"));
    }

    #[test]
    fn test_match_zone_counts_add_up() {
        let pool = BatchAliasPool::default();
        let existing = AliasIndex::from_aliases(&[alias("Host1", "10:00:00:00:00:00:00:01")]);
        let matcher = MemberMatcher::new(&pool, &existing);

        let outcome = matcher.match_zone(
            zone(vec![
                member(Some("10:00:00:00:00:00:00:01"), None),
                member(Some("10:00:00:00:00:00:00:09"), None),
                member(None, Some("host1")),
                member(None, Some("GHOST")),
            ]),
            7,
            true,
            "zones.txt",
        );

        let z = &outcome.zone;
        assert_eq!(z.members.len(), 3);
        assert_eq!(z.members[0].matched_alias_name.as_deref(), Some("Host1"));
        assert_eq!(z.members[1].matched_alias_name, None);
        assert_eq!(z.members[2].wwpn, "10:00:00:00:00:00:00:01");
        assert_eq!(z.notes, "zoneset ZS");

        let matched = z.members.iter().filter(|m| m.matched_alias_name.is_some()).count();
        assert_eq!(z.members.len(), matched + outcome.unmatched.len());
        assert_eq!(outcome.unmatched[0].source, "zones.txt");
        assert_eq!(outcome.warnings.len(), 1);
    }
}
