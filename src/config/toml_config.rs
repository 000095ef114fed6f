use crate::domain::model::{AliasUse, ConflictResolution, FabricId, ImportKind, ProjectId};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub import: ImportSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub repository: RepositorySection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSection {
    pub fabric_id: Option<FabricId>,
    pub project_id: Option<ProjectId>,
    pub conflict_resolution: Option<ConflictResolution>,
    pub default_use: Option<AliasUse>,
    pub include_in_zoning: Option<bool>,
    pub create: Option<bool>,
    pub tech_support_threshold: Option<usize>,
    pub import_kind: Option<ImportKind>,
    pub inputs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositorySection {
    /// JSON export of the existing inventory.
    pub snapshot: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INVENTORY_DIR})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(fabric_id) = self.import.fabric_id {
            validation::validate_positive_number("import.fabric_id", fabric_id, 1)?;
        }

        if let Some(threshold) = self.import.tech_support_threshold {
            validation::validate_positive_number("import.tech_support_threshold", threshold as u64, 1)?;
        }

        if let Some(path) = &self.output.path {
            validation::validate_path("output.path", path)?;
        }

        if let Some(snapshot) = &self.repository.snapshot {
            validation::validate_path("repository.snapshot", snapshot)?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
