//! Directory scanning collaborator
//!
//! Pure include/exclude glob scan over one directory. Results are
//! relative to the scanned directory, deterministically sorted and
//! deduplicated within a single call.
//!
//! Uses the glob crate for pattern matching.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Result type for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Directory scanner boundary
///
/// Treated as a pure function with no side effects: given a base
/// directory and include/exclude patterns, yields the set of matching
/// file paths relative to that base.
pub trait DirectoryScanner {
    fn scan(
        &self,
        base_dir: &Path,
        includes: &[String],
        excludes: &[String],
    ) -> Result<BTreeSet<PathBuf>>;
}

/// Default scanner built on glob patterns
#[derive(Debug, Default)]
pub struct GlobScanner;

impl DirectoryScanner for GlobScanner {
    fn scan(
        &self,
        base_dir: &Path,
        includes: &[String],
        excludes: &[String],
    ) -> Result<BTreeSet<PathBuf>> {
        let exclude_patterns: Vec<glob::Pattern> = excludes
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| ScanError::InvalidPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<_>>()?;

        let mut found = BTreeSet::new();

        for include in includes {
            let full_pattern = base_dir.join(include);
            let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
                ScanError::InvalidPattern {
                    pattern: include.clone(),
                    reason: e.to_string(),
                }
            })?;

            for entry in entries.flatten() {
                if !entry.is_file() {
                    continue;
                }
                // Paths come back prefixed with base_dir; strip it so
                // exclusion patterns match against the relative form.
                let relative = match entry.strip_prefix(base_dir) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => entry.clone(),
                };
                if exclude_patterns.iter().any(|p| p.matches_path(&relative)) {
                    continue;
                }
                found.insert(relative);
            }
        }

        Ok(found)
    }
}
