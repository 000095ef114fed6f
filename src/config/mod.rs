pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::domain::model::{
    AliasUse, ConflictResolution, FabricId, ImportKind, ImportOptions, ProjectId,
    DEFAULT_TECH_SUPPORT_THRESHOLD,
};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";

/// Fully resolved settings for one import run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub options: ImportOptions,
    pub input_files: Vec<String>,
    pub output_path: String,
    pub existing_snapshot: Option<String>,
}

impl ConfigProvider for ImportConfig {
    fn import_options(&self) -> ImportOptions {
        self.options.clone()
    }

    fn input_files(&self) -> &[String] {
        &self.input_files
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for ImportConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("fabric", self.options.fabric_id, 1)?;
        validation::validate_positive_number(
            "tech_support_threshold",
            self.options.tech_support_threshold as u64,
            1,
        )?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty_list("inputs", &self.input_files)?;
        for input in &self.input_files {
            validation::validate_path("inputs", input)?;
        }
        Ok(())
    }
}

#[cfg_attr(feature = "cli", derive(clap::Parser))]
#[cfg_attr(feature = "cli", command(name = "fabric-import"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Turn Cisco MDS alias and zone CLI output into SAN inventory records")
)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Input files: device-alias database, fcalias config, zone output or show tech-support
    pub inputs: Vec<String>,

    /// Fabric the imported records belong to
    #[cfg_attr(feature = "cli", arg(long))]
    pub fabric: Option<FabricId>,

    /// Project used for the zone-name existence check
    #[cfg_attr(feature = "cli", arg(long))]
    pub project: Option<ProjectId>,

    /// prefer-device-alias, prefer-fcalias or import-both
    #[cfg_attr(feature = "cli", arg(long))]
    pub policy: Option<ConflictResolution>,

    /// Default alias use: init, target or both
    #[cfg_attr(feature = "cli", arg(long = "use"))]
    pub alias_use: Option<AliasUse>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub include_in_zoning: Option<bool>,

    /// What to emit: aliases, zones or all
    #[cfg_attr(feature = "cli", arg(long))]
    pub kind: Option<ImportKind>,

    /// Inputs longer than this many characters are treated as tech-support dumps
    #[cfg_attr(feature = "cli", arg(long))]
    pub threshold: Option<usize>,

    /// JSON snapshot of the existing inventory ({"aliases": [...], "zones": [...]})
    #[cfg_attr(feature = "cli", arg(long))]
    pub existing: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub output_path: Option<String>,

    /// TOML configuration file; command-line flags take precedence
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub config: Option<String>,

    /// Parse and report without writing any files
    #[cfg_attr(feature = "cli", arg(long))]
    pub dry_run: bool,

    /// Emit JSON log lines
    #[cfg_attr(feature = "cli", arg(long))]
    pub json_logs: bool,

    #[cfg_attr(feature = "cli", arg(short, long, help = "Enable verbose output"))]
    pub verbose: bool,
}

impl CliConfig {
    pub fn resolve(&self) -> Result<ImportConfig> {
        let file = match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                Some(file)
            }
            None => None,
        };
        self.resolve_with(file.unwrap_or_default())
    }

    /// 命令列參數優先於 TOML 設定
    pub fn resolve_with(&self, file: TomlConfig) -> Result<ImportConfig> {
        let import = file.import;
        let fabric = self.fabric.or(import.fabric_id);
        let fabric_id = *validation::validate_required_field("fabric", &fabric)?;

        let options = ImportOptions {
            fabric_id,
            project_id: self.project.or(import.project_id),
            conflict_resolution: self
                .policy
                .or(import.conflict_resolution)
                .unwrap_or_default(),
            default_use: self.alias_use.or(import.default_use).unwrap_or_default(),
            include_in_zoning: self
                .include_in_zoning
                .or(import.include_in_zoning)
                .unwrap_or(true),
            create: import.create.unwrap_or(true),
            tech_support_threshold: self
                .threshold
                .or(import.tech_support_threshold)
                .unwrap_or(DEFAULT_TECH_SUPPORT_THRESHOLD),
            import_kind: self.kind.or(import.import_kind).unwrap_or_default(),
        };

        let input_files = if self.inputs.is_empty() {
            import.inputs.unwrap_or_default()
        } else {
            self.inputs.clone()
        };

        Ok(ImportConfig {
            options,
            input_files,
            output_path: self
                .output_path
                .clone()
                .or(file.output.path)
                .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string()),
            existing_snapshot: self.existing.clone().or(file.repository.snapshot),
        })
    }
}
