use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ImportError;

pub type FabricId = u64;
pub type ProjectId = u64;

/// Tech-support dumps larger than this are never treated as a direct alias paste.
pub const DEFAULT_TECH_SUPPORT_THRESHOLD: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasUse {
    #[default]
    Init,
    Target,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasType {
    DeviceAlias,
    Fcalias,
    Wwpn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    #[default]
    Standard,
    Smart,
}

/// Policy applied when one WWPN is declared under more than one alias type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    #[default]
    PreferDeviceAlias,
    PreferFcalias,
    ImportBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Aliases,
    Zones,
    #[default]
    All,
}

impl ImportKind {
    pub fn includes_aliases(self) -> bool {
        matches!(self, ImportKind::Aliases | ImportKind::All)
    }

    pub fn includes_zones(self) -> bool {
        matches!(self, ImportKind::Zones | ImportKind::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    DeviceAlias,
    Fcalias,
    TechSupport,
    Unknown,
}

macro_rules! kebab_enum_str {
    ($ty:ty, $field:literal, { $($variant:path => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($variant => $text),+
                };
                f.write_str(text)
            }
        }

        impl FromStr for $ty {
            type Err = ImportError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(ImportError::InvalidConfigValueError {
                        field: $field.to_string(),
                        value: other.to_string(),
                        reason: format!("expected one of: {}", [$($text),+].join(", ")),
                    }),
                }
            }
        }
    };
}

kebab_enum_str!(AliasUse, "use", {
    AliasUse::Init => "init",
    AliasUse::Target => "target",
    AliasUse::Both => "both",
});

kebab_enum_str!(AliasType, "alias_type", {
    AliasType::DeviceAlias => "device-alias",
    AliasType::Fcalias => "fcalias",
    AliasType::Wwpn => "wwpn",
});

kebab_enum_str!(ZoneType, "zone_type", {
    ZoneType::Standard => "standard",
    ZoneType::Smart => "smart",
});

kebab_enum_str!(ConflictResolution, "conflict_resolution", {
    ConflictResolution::PreferDeviceAlias => "prefer-device-alias",
    ConflictResolution::PreferFcalias => "prefer-fcalias",
    ConflictResolution::ImportBoth => "import-both",
});

kebab_enum_str!(ImportKind, "import_kind", {
    ImportKind::Aliases => "aliases",
    ImportKind::Zones => "zones",
    ImportKind::All => "all",
});

kebab_enum_str!(SourceFormat, "format", {
    SourceFormat::DeviceAlias => "device-alias",
    SourceFormat::Fcalias => "fcalias",
    SourceFormat::TechSupport => "tech-support",
    SourceFormat::Unknown => "unknown",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    pub name: String,
    pub wwpn: String,
    #[serde(rename = "use", default)]
    pub alias_use: AliasUse,
    pub alias_type: AliasType,
    pub fabric_id: FabricId,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub include_in_zoning: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub imported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exists_in_database: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMember {
    pub wwpn: String,
    pub matched_alias_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    pub vsan: u32,
    pub fabric_id: FabricId,
    #[serde(default)]
    pub zone_type: ZoneType,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneset: Option<String>,
    #[serde(default)]
    pub members: Vec<ZoneMember>,
}

/// One operator-submitted file or paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    pub name: String,
    pub text: String,
}

impl SourceInput {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Runtime knobs for one import request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub fabric_id: FabricId,
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub conflict_resolution: ConflictResolution,
    #[serde(default)]
    pub default_use: AliasUse,
    #[serde(default = "default_true")]
    pub include_in_zoning: bool,
    #[serde(default = "default_true")]
    pub create: bool,
    #[serde(default = "default_threshold")]
    pub tech_support_threshold: usize,
    #[serde(default)]
    pub import_kind: ImportKind,
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> usize {
    DEFAULT_TECH_SUPPORT_THRESHOLD
}

impl ImportOptions {
    pub fn for_fabric(fabric_id: FabricId) -> Self {
        Self {
            fabric_id,
            project_id: None,
            conflict_resolution: ConflictResolution::default(),
            default_use: AliasUse::default(),
            include_in_zoning: true,
            create: true,
            tech_support_threshold: DEFAULT_TECH_SUPPORT_THRESHOLD,
            import_kind: ImportKind::default(),
        }
    }

    pub fn with_conflict_resolution(mut self, policy: ConflictResolution) -> Self {
        self.conflict_resolution = policy;
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub source: String,
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateKind {
    Alias,
    Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateReason {
    /// Same key seen earlier in this batch; the later record was dropped.
    InBatch,
    /// WWPN declared under another alias type and removed by the conflict policy.
    TypeConflict,
    /// Name reused for a different WWPN within the batch; both records are kept.
    NameConflict,
    /// WWPN registered under a second name of the same alias type; both records are kept.
    WwpnConflict,
    /// Name or WWPN already present in the persisted inventory.
    ExistsInDatabase,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duplicate {
    pub kind: DuplicateKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wwpn: Option<String>,
    pub reason: DuplicateReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedWwpn {
    pub zone: String,
    pub source: String,
    pub wwpn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub source: String,
    pub format: SourceFormat,
    pub aliases: usize,
    pub zones: usize,
    pub warnings: usize,
}

/// Payload handed to the caller-owned save operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatchPayload {
    pub aliases: Vec<Alias>,
    pub zones: Vec<Zone>,
}

/// Everything produced by one import request. Nothing here is persisted by this crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBatch {
    pub aliases: Vec<Alias>,
    pub zones: Vec<Zone>,
    pub duplicates: Vec<Duplicate>,
    #[serde(rename = "unmatchedWWPNs")]
    pub unmatched_wwpns: Vec<UnmatchedWwpn>,
    pub warnings: Vec<ParseWarning>,
    pub sources: Vec<SourceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_error: Option<String>,
}

impl ParsedBatch {
    pub fn payload(&self) -> BatchPayload {
        BatchPayload {
            aliases: self.aliases.clone(),
            zones: self.zones.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.zones.is_empty()
    }

    pub fn unmatched_for_zone<'a>(&'a self, zone: &'a str) -> impl Iterator<Item = &'a UnmatchedWwpn> {
        self.unmatched_wwpns.iter().filter(move |u| u.zone == zone)
    }
}
