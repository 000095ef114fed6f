//! Source format detection.
//!
//! Detection is a prioritized list of named rules; the first rule that applies wins.
//! Tech-support rules sit ahead of the pattern-count rules because full dumps contain
//! alias-like lines that would otherwise look like a direct paste.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::domain::model::{SourceFormat, DEFAULT_TECH_SUPPORT_THRESHOLD};

static DEVICE_ALIAS_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*device-alias\s+name\s+\S+\s+pwwn\s+[0-9a-f:.\-]+").unwrap()
});

static FCALIAS_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^\s*fcalias\s+name\s+\S+").unwrap());

static TECH_SUPPORT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)show\s+tech-support|running-config|startup-config|^\s*`?(?:show\s+)?device-alias\s+database\b")
        .unwrap()
});

/// How many direct-format entries of each family a blob contains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatternCounts {
    pub device_alias: usize,
    pub fcalias: usize,
}

impl PatternCounts {
    pub fn count(text: &str) -> Self {
        Self {
            device_alias: DEVICE_ALIAS_ENTRY.find_iter(text).count(),
            fcalias: FCALIAS_ENTRY.find_iter(text).count(),
        }
    }

    pub fn any(&self) -> bool {
        self.device_alias > 0 || self.fcalias > 0
    }
}

pub struct DetectionInput<'a> {
    pub text: &'a str,
    pub counts: PatternCounts,
    pub threshold: usize,
}

#[derive(Clone, Copy)]
pub struct DetectionRule {
    pub name: &'static str,
    pub format: SourceFormat,
    pub applies: fn(&DetectionInput<'_>) -> bool,
}

impl std::fmt::Debug for DetectionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionRule")
            .field("name", &self.name)
            .field("format", &self.format)
            .finish()
    }
}

pub const DEFAULT_RULES: &[DetectionRule] = &[
    DetectionRule {
        name: "tech-support-marker",
        format: SourceFormat::TechSupport,
        applies: |input| TECH_SUPPORT_MARKER.is_match(input.text),
    },
    DetectionRule {
        name: "oversized-dump",
        format: SourceFormat::TechSupport,
        // Threshold is in characters; the byte length is an upper bound.
        applies: |input| {
            input.text.len() > input.threshold && input.text.chars().count() > input.threshold
        },
    },
    DetectionRule {
        name: "device-alias-dominant",
        format: SourceFormat::DeviceAlias,
        applies: |input| input.counts.device_alias > input.counts.fcalias,
    },
    DetectionRule {
        name: "fcalias-dominant",
        format: SourceFormat::Fcalias,
        applies: |input| input.counts.fcalias > input.counts.device_alias,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub format: SourceFormat,
    pub counts: PatternCounts,
    pub rule: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct FormatDetector {
    rules: Vec<DetectionRule>,
    threshold: usize,
}

impl Default for FormatDetector {
    fn default() -> Self {
        Self::new(DEFAULT_TECH_SUPPORT_THRESHOLD)
    }
}

impl FormatDetector {
    pub fn new(threshold: usize) -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
            threshold,
        }
    }

    /// Register a rule ahead of the built-in ones.
    pub fn with_rule(mut self, rule: DetectionRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn detect(&self, text: &str) -> Detection {
        let input = DetectionInput {
            text,
            counts: PatternCounts::count(text),
            threshold: self.threshold,
        };

        let hit = self.rules.iter().find(|rule| (rule.applies)(&input));
        let detection = Detection {
            format: hit.map(|r| r.format).unwrap_or(SourceFormat::Unknown),
            counts: input.counts,
            rule: hit.map(|r| r.name),
        };

        tracing::debug!(
            "Detected format {} via {:?} (device-alias: {}, fcalias: {})",
            detection.format,
            detection.rule,
            detection.counts.device_alias,
            detection.counts.fcalias
        );
        detection
    }
}
