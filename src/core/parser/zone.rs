//! Zone-database parser for `show zoneset`, `show zoneset active`, `show zone` and
//! running-config zone blocks.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::fcalias::{FCALIAS_HEADER, PWWN_MEMBER};
use super::{indent_of, LineState, LineWarning, ParseOutput};
use crate::core::wwpn::normalize_wwpn;
use crate::domain::model::ZoneType;

const DEFAULT_VSAN: u32 = 1;

static VSAN_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*!.*zone\s+database\s+section\s+for\s+vsan\s+(\d+)").unwrap()
});

static SMART_ZONING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*zone\s+smart-zoning\s+enable\s+vsan\s+(\d+)").unwrap()
});

static ZONESET_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*zoneset\s+name\s+(\S+)(?:\s+vsan\s+(\d+))?").unwrap()
});

static ZONE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*zone\s+name\s+(\S+)(?:\s+vsan\s+(\d+))?").unwrap()
});

static FCID_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*\*?\s*fcid\s+0x[0-9a-f]+(.*)$").unwrap());

static BRACKET_PWWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[?pwwn\s+([0-9a-f:.\-]+)\]?").unwrap());

static BRACKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[(?:device-alias\s+)?([^\]\s]+)\]").unwrap()
});

static NAMED_MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:member\s+)?(?:device-alias|fcalias\s+name|fcalias)\s+(\S+)(?:\s+\[?pwwn\s+([0-9a-f:.\-]+)\]?)?")
        .unwrap()
});

static SECTION_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:\S+#\s*)?`?show\s").unwrap());

/// A zone member as written in the source: a WWPN, an alias name, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMember {
    pub line_number: usize,
    pub wwpn: Option<String>,
    pub alias_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedZone {
    pub name: String,
    pub vsan: u32,
    pub zone_type: ZoneType,
    pub zoneset: Option<String>,
    pub line_number: usize,
    pub members: Vec<RawMember>,
}

#[derive(Debug, Default)]
struct ZonesetContext {
    name: Option<String>,
    vsan: Option<u32>,
}

fn parse_vsan(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .filter(|v: &u32| *v > 0)
}

fn member_from_line(line: &str, line_number: usize) -> Option<Result<RawMember, LineWarning>> {
    let normalize = |token: &str| {
        normalize_wwpn(token).map_err(|e| LineWarning::new(line_number, line, e.to_string()))
    };
    // A malformed pwwn next to a usable name keeps the row as a by-name member.
    let name_only = |warning: LineWarning, alias_hint: Option<String>| match alias_hint {
        Some(hint) => {
            tracing::debug!("Line {}: {}; matching {} by name", line_number, warning.reason, hint);
            Ok(RawMember {
                line_number,
                wwpn: None,
                alias_hint: Some(hint),
            })
        }
        None => Err(warning),
    };

    if let Some(caps) = FCID_MEMBER.captures(line) {
        let rest = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let alias_hint = BRACKET_NAME
            .captures_iter(rest)
            .map(|c| c[1].to_string())
            .find(|name| !name.eq_ignore_ascii_case("pwwn"));
        let wwpn = match BRACKET_PWWN.captures(rest) {
            Some(p) => match normalize(&p[1]) {
                Ok(w) => Some(w),
                Err(w) => return Some(name_only(w, alias_hint)),
            },
            None => None,
        };
        if wwpn.is_none() && alias_hint.is_none() {
            return None;
        }
        return Some(Ok(RawMember {
            line_number,
            wwpn,
            alias_hint,
        }));
    }

    if let Some(caps) = PWWN_MEMBER.captures(line) {
        let alias_hint = BRACKET_NAME.captures(line).map(|c| c[1].to_string());
        return Some(normalize(&caps[1]).map(|wwpn| RawMember {
            line_number,
            wwpn: Some(wwpn),
            alias_hint,
        }));
    }

    if let Some(caps) = NAMED_MEMBER.captures(line) {
        let alias_hint = Some(caps[1].to_string());
        let wwpn = match caps.get(2) {
            Some(m) => match normalize(m.as_str()) {
                Ok(w) => Some(w),
                Err(w) => return Some(name_only(w, alias_hint)),
            },
            None => None,
        };
        return Some(Ok(RawMember {
            line_number,
            wwpn,
            alias_hint,
        }));
    }

    None
}

/// An fcalias listed inside a zone display (`show zone`, `show zoneset`). Its indented
/// `pwwn` lines are members of the enclosing zone.
#[derive(Debug)]
struct NestedFcalias {
    line_number: usize,
    name: String,
    indent: usize,
    members: usize,
}

/// A nested fcalias that listed no pwwn stays in the zone as a by-name member.
fn close_nested(zone: Option<&mut ParsedZone>, nested: Option<NestedFcalias>) {
    if let (Some(zone), Some(nested)) = (zone, nested) {
        if nested.members == 0 {
            zone.members.push(RawMember {
                line_number: nested.line_number,
                wwpn: None,
                alias_hint: Some(nested.name),
            });
        }
    }
}

pub fn parse_zones<'a, I>(lines: I) -> ParseOutput<ParsedZone>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut output = ParseOutput::default();
    let mut state: LineState<ParsedZone> = LineState::default();
    let mut zoneset = ZonesetContext::default();
    let mut section_vsan: Option<u32> = None;
    let mut smart_vsans: HashSet<u32> = HashSet::new();

    let mut nested: Option<NestedFcalias> = None;

    for (line_number, line) in lines {
        if let Some(caps) = VSAN_SECTION.captures(line) {
            close_nested(state.current_mut(), nested.take());
            output.records.extend(state.flush());
            section_vsan = parse_vsan(&caps, 1);
            zoneset = ZonesetContext::default();
            continue;
        }

        if let Some(caps) = SMART_ZONING.captures(line) {
            smart_vsans.extend(parse_vsan(&caps, 1));
            continue;
        }

        if let Some(caps) = ZONESET_HEADER.captures(line) {
            close_nested(state.current_mut(), nested.take());
            output.records.extend(state.flush());
            zoneset = ZonesetContext {
                name: Some(caps[1].to_string()),
                vsan: parse_vsan(&caps, 2).or(section_vsan),
            };
            continue;
        }

        if let Some(caps) = ZONE_HEADER.captures(line) {
            close_nested(state.current_mut(), nested.take());
            let vsan = parse_vsan(&caps, 2)
                .or(zoneset.vsan)
                .or(section_vsan)
                .unwrap_or(DEFAULT_VSAN);
            // Only annotate zones that sit inside a zoneset of the same VSAN.
            let enclosing = zoneset.name.clone().filter(|_| zoneset.vsan == Some(vsan));
            let zone = ParsedZone {
                name: caps[1].to_string(),
                vsan,
                zone_type: ZoneType::Standard,
                zoneset: enclosing,
                line_number,
                members: Vec::new(),
            };
            output.records.extend(state.open(zone));
            continue;
        }

        if let Some(caps) = FCALIAS_HEADER.captures(line) {
            close_nested(state.current_mut(), nested.take());
            let indent = indent_of(line);
            if indent > 0 && !state.is_idle() {
                nested = Some(NestedFcalias {
                    line_number,
                    name: caps[1].to_string(),
                    indent,
                    members: 0,
                });
            } else {
                // 頂層的 fcalias 定義結束目前的 zone
                output.records.extend(state.flush());
            }
            continue;
        }

        if SECTION_BREAK.is_match(line) {
            close_nested(state.current_mut(), nested.take());
            output.records.extend(state.flush());
            continue;
        }

        let Some(zone) = state.current_mut() else {
            continue;
        };
        let dedented = nested
            .as_ref()
            .is_some_and(|n| !line.trim().is_empty() && indent_of(line) <= n.indent);
        if dedented {
            close_nested(Some(&mut *zone), nested.take());
        }
        match member_from_line(line, line_number) {
            Some(Ok(member)) => {
                if let Some(n) = nested.as_mut() {
                    n.members += 1;
                }
                zone.members.push(member);
            }
            Some(Err(warning)) => output.warnings.push(warning),
            None => {}
        }
    }

    close_nested(state.current_mut(), nested.take());
    output.records.extend(state.flush());

    for zone in output
        .records
        .iter_mut()
        .filter(|z| smart_vsans.contains(&z.vsan))
    {
        zone.zone_type = ZoneType::Smart;
    }

    output
}
