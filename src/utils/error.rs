use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid WWPN '{input}': expected 16 hex digits, found {digits}")]
    InvalidWwpn { input: String, digits: usize },

    #[error("No aliases or zones found in {sources} input source(s)")]
    NoEntriesFound { sources: usize },

    #[error("Repository unavailable: {message}")]
    RepositoryUnavailable { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Repository,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ImportError::InvalidWwpn { .. } | ImportError::NoEntriesFound { .. } => {
                ErrorCategory::Input
            }
            ImportError::RepositoryUnavailable { .. } => ErrorCategory::Repository,
            ImportError::ConfigError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ImportError::IoError(_)
            | ImportError::SerializationError(_)
            | ImportError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ImportError::InvalidWwpn { .. } => ErrorSeverity::Low,
            ImportError::RepositoryUnavailable { .. } => ErrorSeverity::Medium,
            ImportError::NoEntriesFound { .. }
            | ImportError::ConfigError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => ErrorSeverity::High,
            ImportError::IoError(_)
            | ImportError::SerializationError(_)
            | ImportError::CsvError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ImportError::InvalidWwpn { .. } => {
                "Check the WWPN for typos; it must contain exactly 16 hex digits"
            }
            ImportError::NoEntriesFound { .. } => {
                "Paste 'show device-alias database', fcalias config, zone output or a full 'show tech-support'"
            }
            ImportError::RepositoryUnavailable { .. } => {
                "Retry the import; results are shown without existence flags until the inventory is reachable"
            }
            ImportError::ConfigError { .. }
            | ImportError::InvalidConfigValueError { .. }
            | ImportError::MissingConfigError { .. } => {
                "Fix the configuration file or command-line flags and run again"
            }
            ImportError::IoError(_) => "Check that the input files exist and the output directory is writable",
            ImportError::SerializationError(_) | ImportError::CsvError(_) => {
                "Check the existing-inventory snapshot and output files for corruption"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ImportError::NoEntriesFound { sources } => format!(
                "Nothing to import: none of the {} input(s) contained device-alias, fcalias or zone entries",
                sources
            ),
            ImportError::RepositoryUnavailable { .. } => {
                "The existing inventory could not be read; duplicates were not checked".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering_matches_exit_policy() {
        let repo = ImportError::RepositoryUnavailable {
            message: "timeout".to_string(),
        };
        let empty = ImportError::NoEntriesFound { sources: 2 };
        assert_eq!(repo.category(), ErrorCategory::Repository);
        assert_eq!(empty.category(), ErrorCategory::Input);
        assert!(repo.severity() < empty.severity());
        assert!(empty.user_friendly_message().contains("2 input(s)"));
    }
}
