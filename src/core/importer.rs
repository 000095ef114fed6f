//! Two-pass batch import.
//!
//! Pass 1 detects each source's format and parses its aliases; sources are independent
//! and parsed in parallel. The results are de-duplicated, checked against the inventory
//! and folded into a [`BatchAliasPool`]. Pass 2 parses zones from every source, again in
//! parallel, matching members against the finished pool and the persisted aliases.

use chrono::Utc;
use rayon::prelude::*;
use std::sync::Arc;

use crate::core::dedup::{dedupe_aliases, dedupe_zones_by};
use crate::core::detect::FormatDetector;
use crate::core::existence::{flag_existing_aliases, load_existing_aliases, mark_existing_zones};
use crate::core::extract::{extract_alias_lines, extract_zone_lines};
use crate::core::matcher::{BatchAliasPool, MatchOutcome, MemberMatcher};
use crate::core::parser::{
    numbered, parse_device_aliases, parse_fcaliases, parse_zones, AliasDefaults, LineWarning,
    ParseOutput,
};
use crate::domain::model::{
    Alias, FabricId, ImportOptions, ParseWarning, ParsedBatch, SourceFormat, SourceInput,
    SourceSummary,
};
use crate::domain::ports::AliasRepository;
use crate::utils::error::{ImportError, Result};

#[derive(Debug)]
struct AliasPass {
    format: SourceFormat,
    output: ParseOutput<Alias>,
}

#[derive(Debug)]
struct ZonePass {
    outcomes: Vec<MatchOutcome>,
    warnings: Vec<LineWarning>,
}

fn parse_source_aliases(
    source: &SourceInput,
    detector: &FormatDetector,
    defaults: &AliasDefaults,
) -> AliasPass {
    let text = source.text.as_str();
    let detection = detector.detect(text);

    let output = match detection.format {
        SourceFormat::DeviceAlias => parse_device_aliases(numbered(text), defaults),
        SourceFormat::Fcalias => parse_fcaliases(numbered(text), defaults),
        SourceFormat::TechSupport => {
            let lines = extract_alias_lines(text, &detection.counts);
            let mut output = parse_device_aliases(lines.device_alias, defaults);
            output.extend(parse_fcaliases(lines.fcalias, defaults));
            output
        }
        SourceFormat::Unknown => {
            let mut output = parse_device_aliases(numbered(text), defaults);
            output.extend(parse_fcaliases(numbered(text), defaults));
            output
        }
    };

    tracing::debug!(
        "📄 {}: {} format, {} aliases, {} skipped lines",
        source.name,
        detection.format,
        output.records.len(),
        output.warnings.len()
    );
    AliasPass {
        format: detection.format,
        output,
    }
}

fn parse_source_zones(
    source: &SourceInput,
    format: SourceFormat,
    matcher: &MemberMatcher<'_>,
    fabric_id: FabricId,
    create: bool,
) -> ZonePass {
    let parsed = match format {
        SourceFormat::TechSupport => parse_zones(extract_zone_lines(&source.text)),
        _ => parse_zones(numbered(&source.text)),
    };

    let mut warnings = parsed.warnings;
    let outcomes = parsed
        .records
        .into_iter()
        .map(|zone| {
            let mut outcome = matcher.match_zone(zone, fabric_id, create, &source.name);
            warnings.append(&mut outcome.warnings);
            outcome
        })
        .collect();

    ZonePass { outcomes, warnings }
}

fn with_source(source: &str, warnings: Vec<LineWarning>) -> impl Iterator<Item = ParseWarning> + '_ {
    warnings.into_iter().map(move |w| ParseWarning {
        source: source.to_string(),
        line_number: w.line_number,
        line: w.line,
        reason: w.reason,
    })
}

fn join_error(e: tokio::task::JoinError) -> ImportError {
    ImportError::IoError(std::io::Error::other(format!("parse worker failed: {}", e)))
}

/// Runs one import request. Holds no state between requests; callers serialize imports
/// per fabric.
pub struct Importer<R: AliasRepository> {
    repository: R,
    options: ImportOptions,
    detector: FormatDetector,
}

impl<R: AliasRepository> Importer<R> {
    pub fn new(repository: R, options: ImportOptions) -> Self {
        let detector = FormatDetector::new(options.tech_support_threshold);
        Self {
            repository,
            options,
            detector,
        }
    }

    pub fn with_detector(mut self, detector: FormatDetector) -> Self {
        self.detector = detector;
        self
    }

    pub async fn import(&self, sources: Vec<SourceInput>) -> Result<ParsedBatch> {
        let options = &self.options;
        let defaults = AliasDefaults::from_options(options, Utc::now());
        let sources = Arc::new(sources);
        let mut batch = ParsedBatch::default();
        let mut repository_errors: Vec<String> = Vec::new();

        // Pass 1: aliases from every source.
        let pass_one = {
            let sources = Arc::clone(&sources);
            let detector = self.detector.clone();
            let defaults = defaults.clone();
            tokio::task::spawn_blocking(move || {
                sources
                    .par_iter()
                    .map(|source| parse_source_aliases(source, &detector, &defaults))
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(join_error)?
        };

        let mut parsed_aliases = Vec::new();
        let mut formats = Vec::with_capacity(sources.len());
        for (source, pass) in sources.iter().zip(pass_one) {
            batch.sources.push(SourceSummary {
                source: source.name.clone(),
                format: pass.format,
                aliases: pass.output.records.len(),
                zones: 0,
                warnings: pass.output.warnings.len(),
            });
            batch
                .warnings
                .extend(with_source(&source.name, pass.output.warnings));
            parsed_aliases.extend(pass.output.records);
            formats.push(pass.format);
        }
        tracing::info!(
            "🔎 Pass 1 parsed {} aliases from {} sources",
            parsed_aliases.len(),
            sources.len()
        );

        let deduped = dedupe_aliases(parsed_aliases, options.conflict_resolution);
        let mut aliases = deduped.records;

        let fabrics = aliases
            .iter()
            .map(|a| a.fabric_id)
            .chain(std::iter::once(options.fabric_id));
        let existence = load_existing_aliases(fabrics, &self.repository).await;
        repository_errors.extend(existence.errors.iter().map(|e| e.to_string()));
        let existing_duplicates = flag_existing_aliases(&mut aliases, &existence.existing);

        if options.import_kind.includes_aliases() {
            batch.duplicates.extend(deduped.duplicates);
            batch.duplicates.extend(existing_duplicates);
        }

        // Pass 2: zones, matched against the completed pool.
        if options.import_kind.includes_zones() {
            let pool = Arc::new(BatchAliasPool::from_outputs([aliases.as_slice()]));
            let existing = Arc::new(
                existence
                    .existing_for(options.fabric_id)
                    .cloned()
                    .unwrap_or_default(),
            );
            tracing::debug!(
                "Batch alias pool holds {} WWPNs, inventory {}",
                pool.len(),
                existing.len()
            );

            let pass_two = {
                let sources = Arc::clone(&sources);
                let fabric_id = options.fabric_id;
                let create = options.create;
                tokio::task::spawn_blocking(move || {
                    let matcher = MemberMatcher::new(&pool, &existing);
                    sources
                        .par_iter()
                        .zip(formats.par_iter())
                        .map(|(source, format)| {
                            parse_source_zones(source, *format, &matcher, fabric_id, create)
                        })
                        .collect::<Vec<_>>()
                })
                .await
                .map_err(join_error)?
            };

            let mut outcomes = Vec::new();
            for ((source, pass), summary) in sources.iter().zip(pass_two).zip(batch.sources.iter_mut()) {
                summary.zones = pass.outcomes.len();
                summary.warnings += pass.warnings.len();
                batch.warnings.extend(with_source(&source.name, pass.warnings));
                outcomes.extend(pass.outcomes);
            }

            let zones = dedupe_zones_by(outcomes, |outcome| &outcome.zone);
            batch.duplicates.extend(zones.duplicates);
            for outcome in zones.records {
                batch.unmatched_wwpns.extend(outcome.unmatched);
                batch.zones.push(outcome.zone);
            }

            if let Some(project_id) = options.project_id {
                match mark_existing_zones(&mut batch.zones, project_id, &self.repository).await {
                    Ok(duplicates) => batch.duplicates.extend(duplicates),
                    Err(e) => {
                        tracing::warn!("Existing zones for project {} unavailable: {}", project_id, e);
                        repository_errors.push(e.to_string());
                    }
                }
            }
        }

        if options.import_kind.includes_aliases() {
            batch.aliases = aliases;
        }

        if batch.is_empty() {
            return Err(ImportError::NoEntriesFound {
                sources: sources.len(),
            });
        }

        if !repository_errors.is_empty() {
            batch.repository_error = Some(repository_errors.join("; "));
        }

        tracing::info!(
            "✅ Import produced {} aliases, {} zones, {} duplicates, {} unmatched WWPNs",
            batch.aliases.len(),
            batch.zones.len(),
            batch.duplicates.len(),
            batch.unmatched_wwpns.len()
        );
        Ok(batch)
    }
}
