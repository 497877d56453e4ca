//! Report writer
//!
//! Owns the (reporter, destination-set) pairs for one run. For each
//! binding it opens the requested file (creating parent directories
//! idempotently), adds the console stream if asked, and drains the
//! reporter's buffer to every destination. A binding's failure is
//! recorded and isolated; sibling bindings still run. Every file
//! handle opened for a binding is released before the next binding
//! starts, success or failure. Console streams are never closed.
//!
//! This is the only component permitted to create directories on disk.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::buffer::{resolve_output_buffer, DrainError};
use crate::engine::EngineSession;
use crate::reporter::ReporterBinding;
use crate::version::Version;

/// Per-binding write failure
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Cannot create report directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot open report file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Drain(#[from] DrainError),
}

/// Result record for one binding
#[derive(Debug, Clone, Serialize)]
pub struct WriteEntry {
    pub reporter: String,
    pub file: Option<PathBuf>,
    pub console: bool,
    pub error: Option<String>,
}

/// Per-binding success/failure record for the whole write phase
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    pub entries: Vec<WriteEntry>,
}

impl WriteReport {
    pub fn all_ok(&self) -> bool {
        self.entries.iter().all(|e| e.error.is_none())
    }
}

/// Drains registered reporters to their destinations
pub struct ReportWriter {
    output_dir: PathBuf,
    framework_version: Version,
    bindings: Vec<ReporterBinding>,
}

impl ReportWriter {
    pub fn new(output_dir: PathBuf, framework_version: Version) -> Self {
        ReportWriter {
            output_dir,
            framework_version,
            bindings: Vec::new(),
        }
    }

    pub fn add_binding(&mut self, binding: ReporterBinding) {
        self.bindings.push(binding);
    }

    pub fn bindings(&self) -> &[ReporterBinding] {
        &self.bindings
    }

    /// Drain every binding, in registration order
    ///
    /// Never fails for a single binding's problem: each failure is
    /// recorded in the returned report and logged, and the remaining
    /// bindings are still attempted.
    pub fn write_all(&self, session: &mut dyn EngineSession) -> WriteReport {
        let mut report = WriteReport::default();

        for binding in &self.bindings {
            let error = match self.write_one(session, binding) {
                Ok(()) => None,
                Err(e) => {
                    error!(reporter = %binding.handle.kind, "failed to write report: {e}");
                    Some(e.to_string())
                }
            };
            report.entries.push(WriteEntry {
                reporter: binding.handle.kind.clone(),
                file: binding
                    .destinations
                    .file
                    .as_ref()
                    .map(|f| self.resolve_file_path(f)),
                console: binding.destinations.console,
                error,
            });
        }

        report
    }

    fn write_one(
        &self,
        session: &mut dyn EngineSession,
        binding: &ReporterBinding,
    ) -> Result<(), WriteError> {
        // File handles opened here live until the end of this scope,
        // so they are released whether draining succeeds or fails.
        let mut destinations: Vec<Box<dyn Write>> = Vec::new();

        if let Some(file_output) = &binding.destinations.file {
            let path = self.resolve_file_path(file_output);
            if let Some(parent) = path.parent() {
                // Idempotent: succeeds if the directory already exists.
                fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            let file = File::create(&path).map_err(|source| WriteError::OpenFile {
                path: path.display().to_string(),
                source,
            })?;
            info!(reporter = %binding.handle.kind, "writing report to {}", path.display());
            destinations.push(Box::new(BufWriter::new(file)));
        }

        if binding.destinations.console {
            info!(reporter = %binding.handle.kind, "writing report to console");
            destinations.push(Box::new(io::stdout()));
        }

        let mut buffer = resolve_output_buffer(&self.framework_version, binding.handle.clone());
        buffer.drain(session, &mut destinations)?;
        Ok(())
    }

    fn resolve_file_path(&self, file_output: &Path) -> PathBuf {
        if file_output.is_absolute() {
            file_output.to_path_buf()
        } else {
            self.output_dir.join(file_output)
        }
    }
}
