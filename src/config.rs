//! Runner configuration
//!
//! The configuration bundle a build step hands to the orchestrator:
//! connection parameters, declarative source/test resource specs with
//! their regex and type-mapping overrides, reporter requests, tag
//! filters, random-order controls and the failure-tolerance flag.
//!
//! Loaded from a TOML file, with environment-variable fallback for the
//! database credentials (SQLUNIT_DB_URL / SQLUNIT_DB_USER /
//! SQLUNIT_DB_PASSWORD).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Convention directory scanned for source files when no spec is configured
pub const DEFAULT_SOURCE_DIRECTORY: &str = "src/main/sql";

/// Convention directory scanned for test files when no spec is configured
pub const DEFAULT_TEST_DIRECTORY: &str = "src/test/sql";

/// Convention include pattern used when a spec lists none
pub const DEFAULT_FILE_PATTERN: &str = "**/*.sql";

/// Reporter kind registered when no reporter is requested
pub const DEFAULT_REPORTER: &str = "documentation";

/// Default report output directory, relative to the base directory
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "target";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid <directory> '{0}' in resource spec: not an existing readable directory")]
    InvalidDirectory(String),

    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid mapping regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Missing database URL: set [database] url or SQLUNIT_DB_URL")]
    MissingUrl,
}

/// Database connection parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    pub url: String,
    pub user: String,
    pub password: String,
}

/// One configured source or test group: a directory plus
/// include/exclude glob patterns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSpec {
    pub directory: Option<String>,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

/// Maps a nonstandard filename token to a canonical database object type
/// (e.g. "pkb" -> "PACKAGE BODY"). A non-empty list entirely replaces
/// the engine's default mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMapping {
    pub token: String,
    pub object_type: String,
}

/// Resource specs and path-to-object mapping overrides for one object
/// group (sources or tests)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectGroupConfig {
    pub spec: Vec<ResourceSpec>,
    pub owner: Option<String>,
    pub regex_pattern: Option<String>,
    pub owner_subexpression: Option<u32>,
    pub name_subexpression: Option<u32>,
    pub type_subexpression: Option<u32>,
    pub type_mappings: Vec<TypeMapping>,
}

/// Three-valued console-output setting for a reporter request
///
/// Missing key deserializes to `Unset`; an explicit boolean maps to
/// `Enabled`/`Disabled`. The resolution rule (unset + no file output
/// means console on) is applied exactly once, in the reporter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleSetting {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl ConsoleSetting {
    pub fn is_unset(&self) -> bool {
        matches!(self, ConsoleSetting::Unset)
    }
}

impl<'de> Deserialize<'de> for ConsoleSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let enabled = bool::deserialize(deserializer)?;
        Ok(if enabled {
            ConsoleSetting::Enabled
        } else {
            ConsoleSetting::Disabled
        })
    }
}

impl Serialize for ConsoleSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(matches!(self, ConsoleSetting::Enabled))
    }
}

/// One requested reporter with its output destinations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReporterRequest {
    /// Reporter kind known to the remote engine
    pub name: String,

    /// Report file path; relative paths resolve against the output directory
    #[serde(default)]
    pub file_output: Option<String>,

    /// Tri-state console toggle
    #[serde(default, skip_serializing_if = "ConsoleSetting::is_unset")]
    pub console_output: ConsoleSetting,
}

impl ReporterRequest {
    pub fn named(name: &str) -> Self {
        ReporterRequest {
            name: name.to_string(),
            file_output: None,
            console_output: ConsoleSetting::Unset,
        }
    }

    /// True if a non-blank file output path is configured
    pub fn has_file_output(&self) -> bool {
        self.file_output
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false)
    }
}

/// The full configuration bundle for one invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub database: ConnectionParams,

    /// Skip the whole invocation (logged, exits successfully)
    pub skip_tests: bool,

    /// Project base directory all relative paths resolve against
    pub base_dir: Option<PathBuf>,

    /// Report output directory (default: "target" under the base dir)
    pub output_dir: Option<PathBuf>,

    /// Suite paths handed verbatim to the remote engine
    pub paths: Vec<String>,

    pub include_object: Option<String>,
    pub exclude_object: Option<String>,

    pub skip_compatibility_check: bool,

    /// Failure tolerance: a "some tests failed" outcome still exits
    /// successfully (the failure is reported, with a warning)
    pub ignore_failure: bool,

    /// Capture ad-hoc diagnostic text emitted during the run
    pub diagnostic_output: bool,

    pub color_console: bool,

    pub tags: Vec<String>,
    pub random_test_order: bool,
    pub random_test_order_seed: Option<u64>,

    pub sources: ObjectGroupConfig,
    pub tests: ObjectGroupConfig,

    pub reporters: Vec<ReporterRequest>,
}

impl RunnerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<RunnerConfig, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Fill empty connection parameters from the environment
    pub fn apply_env_fallback(&mut self) {
        if self.database.url.is_empty() {
            if let Ok(url) = std::env::var("SQLUNIT_DB_URL") {
                self.database.url = url;
            }
        }
        if self.database.user.is_empty() {
            if let Ok(user) = std::env::var("SQLUNIT_DB_USER") {
                self.database.user = user;
            }
        }
        if self.database.password.is_empty() {
            if let Ok(password) = std::env::var("SQLUNIT_DB_PASSWORD") {
                self.database.password = password;
            }
        }
    }

    /// Connection parameters, validated
    pub fn connection_params(&self) -> Result<&ConnectionParams, ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        Ok(&self.database)
    }

    /// Base directory (default: current directory)
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Report output directory, resolved against the base directory
    pub fn output_dir(&self) -> PathBuf {
        let dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIRECTORY));
        if dir.is_absolute() {
            dir
        } else {
            self.base_dir().join(dir)
        }
    }
}
