use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::{AliasDefaults, LineWarning, ParseOutput};
use crate::core::wwpn::normalize_wwpn;
use crate::domain::model::{Alias, AliasType};

static CANONICAL_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*device-alias\s+name\s+(\S+)\s+pwwn\s+(\S+)").unwrap()
});

// `show device-alias database` display rows without the `name`/`pwwn` keywords.
static DISPLAY_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*device-alias\s+(\S+)\s+((?:[0-9a-f]{2}[:\-]){7}[0-9a-f]{2}|[0-9a-f]{16})\s*$")
        .unwrap()
});

/// Rewrite a display row into `device-alias name <n> pwwn <wwpn>`; other lines pass through.
pub fn canonicalize_line(line: &str) -> Cow<'_, str> {
    match DISPLAY_ENTRY.captures(line) {
        Some(caps) => Cow::Owned(format!("device-alias name {} pwwn {}", &caps[1], &caps[2])),
        None => Cow::Borrowed(line),
    }
}

pub fn parse_device_aliases<'a, I>(lines: I, defaults: &AliasDefaults) -> ParseOutput<Alias>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut output = ParseOutput::default();

    for (line_number, raw) in lines {
        let line = canonicalize_line(raw);
        let Some(caps) = CANONICAL_ENTRY.captures(&line) else {
            continue;
        };

        match normalize_wwpn(&caps[2]) {
            Ok(wwpn) => output.records.push(defaults.build(
                caps[1].to_string(),
                wwpn,
                AliasType::DeviceAlias,
                String::new(),
            )),
            Err(e) => {
                tracing::debug!("Skipping device-alias line {}: {}", line_number, e);
                output
                    .warnings
                    .push(LineWarning::new(line_number, raw, e.to_string()));
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::{numbered, test_defaults};

    #[test]
    fn test_parses_entries_in_source_order() {
        let text = "device-alias name H1 pwwn c0:50:76:09:15:09:01:08\n\
                    device-alias name H2 pwwn c0:50:76:09:15:09:01:0a";
        let output = parse_device_aliases(numbered(text), &test_defaults());

        let names: Vec<&str> = output.records.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["H1", "H2"]);
        assert!(output
            .records
            .iter()
            .all(|a| a.alias_type == AliasType::DeviceAlias && a.fabric_id == 7));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_display_variant_is_canonicalized() {
        assert_eq!(
            canonicalize_line("device-alias DB_HOST C0:50:76:09:15:09:01:08"),
            "device-alias name DB_HOST pwwn C0:50:76:09:15:09:01:08"
        );
        let output = parse_device_aliases(
            numbered("  device-alias DB_HOST 2100001b32a1b2c3\n"),
            &test_defaults(),
        );
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].wwpn, "21:00:00:1b:32:a1:b2:c3");
    }

    #[test]
    fn test_keywords_are_not_mistaken_for_entries() {
        let text = "device-alias database\ndevice-alias mode enhanced\ndevice-alias commit\n";
        let output = parse_device_aliases(numbered(text), &test_defaults());
        assert!(output.records.is_empty());
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_invalid_wwpn_skips_only_that_line() {
        let text = "device-alias name BAD pwwn c0:50:76\n\
                    device-alias name GOOD pwwn c0:50:76:09:15:09:01:08\n";
        let output = parse_device_aliases(numbered(text), &test_defaults());
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].name, "GOOD");
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].line_number, 1);
    }
}
