//! Path-to-database-object mapping resolution
//!
//! Turns declarative resource specs (directory + include/exclude
//! patterns) into an ordered list of relative file paths, and builds
//! the `FileMappingOptions` the remote engine uses to derive each
//! file's target object identity (owner/name/type).

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigError, ObjectGroupConfig, ResourceSpec, TypeMapping};
use crate::scan::DirectoryScanner;

/// Resolved file paths plus the rules deriving a database object
/// identity from each path
///
/// `None`/empty fields leave the remote engine's built-in defaults
/// untouched. A non-empty `type_mappings` list entirely replaces the
/// engine's default mapping table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileMappingOptions {
    pub file_paths: Vec<String>,
    pub object_owner: Option<String>,
    pub regex_pattern: Option<String>,
    pub owner_subexpression: Option<u32>,
    pub name_subexpression: Option<u32>,
    pub type_subexpression: Option<u32>,
    pub type_mappings: Vec<TypeMapping>,
}

impl FileMappingOptions {
    pub fn empty() -> Self {
        FileMappingOptions::default()
    }
}

/// Resolves resource specs into relative file paths via the scanner
pub struct PathMappingResolver<'a> {
    scanner: &'a dyn DirectoryScanner,
}

impl<'a> PathMappingResolver<'a> {
    pub fn new(scanner: &'a dyn DirectoryScanner) -> Self {
        PathMappingResolver { scanner }
    }

    /// Resolve all specs into one ordered path list
    ///
    /// Specs are processed in declaration order; within one spec the
    /// scan order is the scanner's (sorted). Results from different
    /// specs are concatenated without cross-spec deduplication.
    ///
    /// With zero specs, a single implicit spec over `default_directory`
    /// is used only if that directory exists on disk; otherwise the
    /// result is an empty list, meaning "no files of this kind".
    pub fn resolve(
        &self,
        base_dir: &Path,
        specs: &[ResourceSpec],
        default_directory: &str,
        default_pattern: &str,
    ) -> Result<Vec<String>, ConfigError> {
        let implicit;
        let effective: &[ResourceSpec] = if specs.is_empty() {
            if !base_dir.join(default_directory).exists() {
                debug!(
                    directory = default_directory,
                    "default directory absent, resolving to empty path list"
                );
                return Ok(Vec::new());
            }
            implicit = [ResourceSpec {
                directory: Some(default_directory.to_string()),
                includes: vec![default_pattern.to_string()],
                excludes: Vec::new(),
            }];
            &implicit
        } else {
            specs
        };

        let mut paths = Vec::new();
        for spec in effective {
            self.resolve_spec(base_dir, spec, default_directory, default_pattern, &mut paths)?;
        }
        Ok(paths)
    }

    fn resolve_spec(
        &self,
        base_dir: &Path,
        spec: &ResourceSpec,
        default_directory: &str,
        default_pattern: &str,
        out: &mut Vec<String>,
    ) -> Result<(), ConfigError> {
        let directory = spec.directory.as_deref().unwrap_or(default_directory);

        let scan_root = base_dir.join(directory);
        if !is_readable_directory(&scan_root) {
            return Err(ConfigError::InvalidDirectory(directory.to_string()));
        }

        let default_includes;
        let includes: &[String] = if spec.includes.is_empty() {
            default_includes = [default_pattern.to_string()];
            &default_includes
        } else {
            &spec.includes
        };

        let found = self
            .scanner
            .scan(&scan_root, includes, &spec.excludes)
            .map_err(|e| match e {
                crate::scan::ScanError::InvalidPattern { pattern, reason } => {
                    ConfigError::InvalidPattern { pattern, reason }
                }
            })?;

        for relative in found {
            // Paths are reported relative to the base directory, with
            // the spec's directory as leading component.
            let path = Path::new(directory).join(relative);
            out.push(path.to_string_lossy().replace('\\', "/"));
        }
        Ok(())
    }
}

/// Build mapping options from resolved paths plus group overrides
///
/// Every optional field is applied only if present and non-blank;
/// absent fields leave the engine defaults untouched, so a caller can
/// override a single subexpression index without respecifying the
/// whole regex.
pub fn build_mapping_options(
    file_paths: Vec<String>,
    group: &ObjectGroupConfig,
) -> Result<FileMappingOptions, ConfigError> {
    let mut options = FileMappingOptions {
        file_paths,
        ..FileMappingOptions::default()
    };

    if let Some(owner) = non_blank(group.owner.as_deref()) {
        options.object_owner = Some(owner.to_string());
    }

    if let Some(pattern) = non_blank(group.regex_pattern.as_deref()) {
        regex::Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        options.regex_pattern = Some(pattern.to_string());
    }

    options.owner_subexpression = group.owner_subexpression;
    options.name_subexpression = group.name_subexpression;
    options.type_subexpression = group.type_subexpression;

    if !group.type_mappings.is_empty() {
        options.type_mappings = group.type_mappings.clone();
    }

    Ok(options)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_readable_directory(path: &Path) -> bool {
    path.is_dir() && std::fs::read_dir(path).is_ok()
}
