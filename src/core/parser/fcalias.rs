use regex::Regex;
use std::sync::LazyLock;

use super::{indent_of, AliasDefaults, LineState, LineWarning, ParseOutput};
use crate::core::wwpn::normalize_wwpn;
use crate::domain::model::{Alias, AliasType};

pub(crate) static FCALIAS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*fcalias\s+name\s+(\S+)(?:\s+vsan\s+(\d+))?").unwrap()
});

pub(crate) static PWWN_MEMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:member\s+)?pwwn\s+([0-9a-f:.\-]+)").unwrap()
});

static BLOCK_TERMINATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:zone|zoneset)\s+name\b|^\s*(?:\S+#\s*)?`?show\s").unwrap()
});

#[derive(Debug, PartialEq, Eq)]
struct FcaliasContext {
    name: String,
    vsan: Option<u32>,
    indent: usize,
    wwpns: Vec<String>,
}

/// One alias per WWPN. A multi-member fcalias fans out into `<name>_1..<name>_N`.
fn fan_out(ctx: FcaliasContext, defaults: &AliasDefaults, out: &mut Vec<Alias>) {
    let vsan_note = ctx
        .vsan
        .map(|v| format!(" (vsan {})", v))
        .unwrap_or_default();
    let total = ctx.wwpns.len();

    match total {
        0 => tracing::debug!("fcalias {} has no pwwn members, skipped", ctx.name),
        1 => {
            let notes = ctx.vsan.map(|v| format!("fcalias vsan {}", v)).unwrap_or_default();
            let wwpn = ctx.wwpns.into_iter().next().unwrap_or_default();
            out.push(defaults.build(ctx.name, wwpn, AliasType::Fcalias, notes));
        }
        _ => {
            for (i, wwpn) in ctx.wwpns.into_iter().enumerate() {
                let position = i + 1;
                let notes = format!(
                    "Member {} of {} from fcalias {}{}",
                    position, total, ctx.name, vsan_note
                );
                out.push(defaults.build(
                    format!("{}_{}", ctx.name, position),
                    wwpn,
                    AliasType::Fcalias,
                    notes,
                ));
            }
        }
    }
}

pub fn parse_fcaliases<'a, I>(lines: I, defaults: &AliasDefaults) -> ParseOutput<Alias>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut output = ParseOutput::default();
    let mut state: LineState<FcaliasContext> = LineState::default();

    for (line_number, line) in lines {
        if let Some(caps) = FCALIAS_HEADER.captures(line) {
            let ctx = FcaliasContext {
                name: caps[1].to_string(),
                vsan: caps.get(2).and_then(|m| m.as_str().parse().ok()),
                indent: indent_of(line),
                wwpns: Vec::new(),
            };
            if let Some(prev) = state.open(ctx) {
                fan_out(prev, defaults, &mut output.records);
            }
            continue;
        }

        if BLOCK_TERMINATOR.is_match(line) {
            if let Some(prev) = state.flush() {
                fan_out(prev, defaults, &mut output.records);
            }
            continue;
        }

        let Some(ctx) = state.current_mut() else {
            continue;
        };
        // 巢狀於 zone 顯示中的 fcalias：縮排退回即結束
        if ctx.indent > 0 && !line.trim().is_empty() && indent_of(line) <= ctx.indent {
            if let Some(prev) = state.flush() {
                fan_out(prev, defaults, &mut output.records);
            }
            continue;
        }
        if let Some(caps) = PWWN_MEMBER.captures(line) {
            match normalize_wwpn(&caps[1]) {
                Ok(wwpn) => ctx.wwpns.push(wwpn),
                Err(e) => output
                    .warnings
                    .push(LineWarning::new(line_number, line, e.to_string())),
            }
        }
    }

    if let Some(last) = state.flush() {
        fan_out(last, defaults, &mut output.records);
    }

    output
}
