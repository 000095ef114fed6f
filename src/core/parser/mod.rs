//! Line parsers for Cisco MDS alias and zone output.
//!
//! Parsers consume `(line_number, line)` pairs so that line numbers in warnings refer
//! to the original source even when only an extracted section is fed in.

pub mod device_alias;
pub mod fcalias;
pub mod state;
pub mod zone;

use chrono::{DateTime, Utc};

use crate::domain::model::{Alias, AliasType, AliasUse, FabricId, ImportOptions};

pub use device_alias::parse_device_aliases;
pub use fcalias::parse_fcaliases;
pub use state::LineState;
pub use zone::{parse_zones, ParsedZone, RawMember};

/// A single line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWarning {
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

impl LineWarning {
    pub fn new(line_number: usize, line: &str, reason: impl Into<String>) -> Self {
        Self {
            line_number,
            line: line.trim().to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput<T> {
    pub records: Vec<T>,
    pub warnings: Vec<LineWarning>,
}

impl<T> Default for ParseOutput<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> ParseOutput<T> {
    pub fn extend(&mut self, other: ParseOutput<T>) {
        self.records.extend(other.records);
        self.warnings.extend(other.warnings);
    }
}

/// Caller-supplied values stamped onto every alias a parser builds.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasDefaults {
    pub fabric_id: FabricId,
    pub alias_use: AliasUse,
    pub include_in_zoning: bool,
    pub create: bool,
    pub imported_at: DateTime<Utc>,
}

impl AliasDefaults {
    pub fn from_options(options: &ImportOptions, imported_at: DateTime<Utc>) -> Self {
        Self {
            fabric_id: options.fabric_id,
            alias_use: options.default_use,
            include_in_zoning: options.include_in_zoning,
            create: options.create,
            imported_at,
        }
    }

    pub fn build(&self, name: String, wwpn: String, alias_type: AliasType, notes: String) -> Alias {
        Alias {
            name,
            wwpn,
            alias_use: self.alias_use,
            alias_type,
            fabric_id: self.fabric_id,
            create: self.create,
            include_in_zoning: self.include_in_zoning,
            notes,
            imported_at: Some(self.imported_at),
            exists_in_database: false,
        }
    }
}

pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Number the lines of a blob starting at 1.
pub fn numbered(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().map(|(i, line)| (i + 1, line))
}

#[cfg(test)]
pub(crate) fn test_defaults() -> AliasDefaults {
    AliasDefaults::from_options(&ImportOptions::for_fabric(7), Utc::now())
}
