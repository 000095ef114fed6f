//! Section extraction for `show tech-support` and other mixed dumps.
//!
//! Only line slices are produced; nothing is copied out of the source text. The first
//! occurrence of each section wins, later repeats (call-home logs, duplicated command
//! output) are ignored.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::detect::PatternCounts;
use crate::core::parser::fcalias::{FCALIAS_HEADER, PWWN_MEMBER};
use crate::core::parser::numbered;

pub type Lines<'a> = Vec<(usize, &'a str)>;

static SHOW_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:\S+#\s*)?`?\s*show\s+([^`]+?)\s*`?\s*$").unwrap()
});

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-=*#]{20,}\s*$").unwrap());

static DEVICE_ALIAS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*device-alias\s+name\s+\S+\s+pwwn\s+\S+").unwrap()
});

static BLOCK_MEMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:member\s|pwwn\s)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    DeviceAliasDatabase,
    Fcalias,
    ZoneDatabase,
}

impl SectionKind {
    /// Classify the command text of a `show ...` header.
    pub fn from_command(command: &str) -> Option<Self> {
        let command = command
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        if command.starts_with("device-alias database") {
            Some(SectionKind::DeviceAliasDatabase)
        } else if command.starts_with("fcalias") {
            Some(SectionKind::Fcalias)
        } else if (command.starts_with("zoneset") && !command.contains("brief"))
            || command == "zone"
            || command.starts_with("zone vsan")
            || command.starts_with("zone name")
        {
            Some(SectionKind::ZoneDatabase)
        } else {
            None
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Sections<'a> {
    pub device_alias: Option<Lines<'a>>,
    pub fcalias: Option<Lines<'a>>,
    pub zones: Option<Lines<'a>>,
}

impl<'a> Sections<'a> {
    fn slot(&mut self, kind: SectionKind) -> &mut Option<Lines<'a>> {
        match kind {
            SectionKind::DeviceAliasDatabase => &mut self.device_alias,
            SectionKind::Fcalias => &mut self.fcalias,
            SectionKind::ZoneDatabase => &mut self.zones,
        }
    }

    fn close(&mut self, collecting: Option<(SectionKind, Lines<'a>)>) {
        if let Some((kind, lines)) = collecting {
            tracing::debug!("Closed {:?} section with {} lines", kind, lines.len());
            *self.slot(kind) = Some(lines);
        }
    }
}

/// Walk the dump once, collecting the first section of each kind.
pub fn extract_sections(text: &str) -> Sections<'_> {
    let mut sections = Sections::default();
    let mut collecting: Option<(SectionKind, Lines<'_>)> = None;

    for (line_number, line) in numbered(text) {
        if let Some(caps) = SHOW_HEADER.captures(line) {
            sections.close(collecting.take());
            match SectionKind::from_command(&caps[1]) {
                Some(kind) if sections.slot(kind).is_none() => {
                    collecting = Some((kind, Vec::new()));
                }
                Some(kind) => {
                    tracing::debug!(
                        "Ignoring repeated {:?} section at line {}",
                        kind,
                        line_number
                    );
                }
                None => {}
            }
            continue;
        }

        if SEPARATOR.is_match(line) {
            sections.close(collecting.take());
            continue;
        }

        if let Some((_, lines)) = collecting.as_mut() {
            lines.push((line_number, line));
        }
    }
    sections.close(collecting);

    sections
}

/// Alias lines pulled from a blob that had no recognizable section headers.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FallbackLines<'a> {
    pub device_alias: Lines<'a>,
    pub fcalias: Lines<'a>,
}

/// Two-stage extraction across the whole blob: a line regex for device-alias entries,
/// then a block assembler for fcalias headers and the member lines that follow them.
pub fn extract_fallback(text: &str) -> FallbackLines<'_> {
    let mut fallback = FallbackLines::default();
    let mut in_block = false;

    for (line_number, line) in numbered(text) {
        if DEVICE_ALIAS_LINE.is_match(line) {
            fallback.device_alias.push((line_number, line));
            in_block = false;
            continue;
        }

        if FCALIAS_HEADER.is_match(line) {
            fallback.fcalias.push((line_number, line));
            in_block = true;
            continue;
        }

        if !in_block || line.trim().is_empty() {
            continue;
        }

        if BLOCK_MEMBER_LINE.is_match(line) {
            if PWWN_MEMBER.is_match(line) {
                fallback.fcalias.push((line_number, line));
            }
        } else {
            in_block = false;
        }
    }

    fallback
}

/// The alias-bearing lines of a tech-support dump, split per parser.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AliasLines<'a> {
    pub device_alias: Lines<'a>,
    pub fcalias: Lines<'a>,
    pub used_fallback: bool,
}

pub fn extract_alias_lines<'a>(text: &'a str, counts: &PatternCounts) -> AliasLines<'a> {
    let sections = extract_sections(text);

    if sections.device_alias.is_some() || sections.fcalias.is_some() {
        return AliasLines {
            device_alias: sections.device_alias.unwrap_or_default(),
            fcalias: sections.fcalias.unwrap_or_default(),
            used_fallback: false,
        };
    }

    if counts.any() {
        tracing::debug!("No alias section headers found, falling back to direct extraction");
        let fallback = extract_fallback(text);
        return AliasLines {
            device_alias: fallback.device_alias,
            fcalias: fallback.fcalias,
            used_fallback: true,
        };
    }

    AliasLines::default()
}

/// Lines the zone parser should see: the first zone section, or the whole blob.
pub fn extract_zone_lines(text: &str) -> Lines<'_> {
    match extract_sections(text).zones {
        Some(lines) => lines,
        None => numbered(text).collect(),
    }
}
