//! Job configuration, read from a RON file.
//!
//! ```ron
//! (
//!     tracker: (domain: "gitlab.example.com"),
//!     export_dir: "export/Tasks",
//!     filters: [(column: "Status", operator: "equals", value: "Open")],
//!     mapping: (
//!         title_column: Some("Name"),
//!         default_repository: Some("team/api"),
//!         label_columns: ["Tags"],
//!     ),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use importer_core::{FilterOperator, IssueMapping};
use importer_engine::{CatalogSettings, TrackerSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("filter on column {column:?} has unknown operator {operator:?}")]
    UnknownOperator { column: String, operator: String },
    #[error("tracker domain is empty")]
    MissingDomain,
    #[error("no access token: set tracker.token or IMPORTER_TOKEN")]
    MissingToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub tracker: TrackerConfig,
    pub export_dir: PathBuf,
    /// CSV inside `export_dir`; the first one found when unset.
    #[serde(default)]
    pub csv_file: Option<String>,
    /// Skips identifier detection when set.
    #[serde(default)]
    pub identifier_column: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    #[serde(default)]
    pub mapping: MappingConfig,
    /// External ids left out of submission.
    #[serde(default)]
    pub excluded_ids: Vec<String>,
    #[serde(default)]
    pub exclude_invalid: bool,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub domain: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_pages")]
    pub max_project_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "yes")]
    pub enabled: bool,
}

impl FilterConfig {
    pub fn operator(&self) -> Result<FilterOperator, ConfigError> {
        self.operator
            .parse()
            .map_err(|_| ConfigError::UnknownOperator {
                column: self.column.clone(),
                operator: self.operator.clone(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub title_column: Option<String>,
    pub repository_column: Option<String>,
    pub default_repository: Option<String>,
    pub use_document_description: bool,
    pub section_heading: Option<String>,
    pub label_columns: Vec<String>,
    pub static_labels: Vec<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        let mapping = IssueMapping::default();
        Self {
            title_column: mapping.title_column,
            repository_column: mapping.repository_column,
            default_repository: mapping.default_repository,
            use_document_description: mapping.use_document_description,
            section_heading: mapping.section_heading,
            label_columns: mapping.label_columns,
            static_labels: mapping.static_labels,
        }
    }
}

impl From<MappingConfig> for IssueMapping {
    fn from(config: MappingConfig) -> Self {
        IssueMapping {
            title_column: config.title_column,
            repository_column: config.repository_column,
            default_repository: config.default_repository,
            use_document_description: config.use_document_description,
            section_heading: config.section_heading,
            label_columns: config.label_columns,
            static_labels: config.static_labels,
        }
    }
}

fn yes() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_connect_timeout() -> u64 {
    TrackerSettings::default().connect_timeout.as_secs()
}

fn default_request_timeout() -> u64 {
    TrackerSettings::default().request_timeout.as_secs()
}

fn default_max_pages() -> u32 {
    CatalogSettings::default().max_pages
}

impl JobConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|err| match err {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse and check a config; filter operators are resolved here so a
    /// typo fails before any file or network work.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: JobConfig = ron::from_str(text).map_err(|err| ConfigError::Parse {
            path: PathBuf::new(),
            message: err.to_string(),
        })?;
        if config.tracker.domain.trim().is_empty() {
            return Err(ConfigError::MissingDomain);
        }
        for filter in &config.filters {
            filter.operator()?;
        }
        Ok(config)
    }

    /// `override_token` (from the command line or environment) wins over
    /// the file.
    pub fn token(&self, override_token: Option<&str>) -> Result<String, ConfigError> {
        override_token
            .or(self.tracker.token.as_deref())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned)
            .ok_or(ConfigError::MissingToken)
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            connect_timeout: Duration::from_secs(self.tracker.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.tracker.request_timeout_secs),
            ..TrackerSettings::default()
        }
    }

    pub fn catalog_settings(&self) -> CatalogSettings {
        CatalogSettings {
            max_pages: self.tracker.max_project_pages,
            ..CatalogSettings::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
