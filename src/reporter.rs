//! Reporter registration
//!
//! Instantiates and initializes one server-side reporter per request
//! against the open session, and resolves each request's destination
//! set (file, console, both, or none) exactly once.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{ConsoleSetting, ReporterRequest, DEFAULT_REPORTER};
use crate::engine::{EngineSession, ReporterError, ReporterHandle};

/// Where one reporter's output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSet {
    /// Report file path; relative paths resolve against the run's
    /// output directory
    pub file: Option<PathBuf>,
    pub console: bool,
}

impl DestinationSet {
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && !self.console
    }
}

/// A registered reporter paired with its resolved destinations
///
/// Created only after the connection opens (a reporter needs a live
/// session to register itself); drained exactly once by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterBinding {
    pub handle: ReporterHandle,
    pub destinations: DestinationSet,
}

/// Outcome of reporter registration
#[derive(Debug)]
pub struct RegisteredReporters {
    /// Every instantiated reporter, handed to the engine's run call
    pub handles: Vec<ReporterHandle>,
    /// Reporters with at least one destination, handed to the writer
    pub bindings: Vec<ReporterBinding>,
}

/// Reporter registry: request list in, initialized bindings out
pub struct ReporterRegistry;

impl ReporterRegistry {
    /// Register all requested reporters against the open session
    ///
    /// An empty request list synthesizes one implicit documentation
    /// reporter with console output forced on. A request with console
    /// unset and no file output resolves to console-enabled; the only
    /// way to register a reporter and drop its output is an explicit
    /// `console_output = false` with no file.
    pub fn register(
        session: &mut dyn EngineSession,
        requests: &[ReporterRequest],
    ) -> Result<RegisteredReporters, ReporterError> {
        let implicit;
        let effective: &[ReporterRequest] = if requests.is_empty() {
            let mut request = ReporterRequest::named(DEFAULT_REPORTER);
            request.console_output = ConsoleSetting::Enabled;
            implicit = [request];
            &implicit
        } else {
            requests
        };

        let mut handles = Vec::with_capacity(effective.len());
        let mut bindings = Vec::new();

        for request in effective {
            let handle = session.create_reporter(&request.name)?;
            session.init_reporter(&handle)?;
            info!(reporter = %handle.kind, id = %handle.id, "registered reporter");
            handles.push(handle.clone());

            let destinations = resolve_destinations(request);
            if destinations.is_empty() {
                // Still instantiated (visible above), but nothing to write.
                debug!(reporter = %handle.kind, "reporter has no output destination, skipping writer");
                continue;
            }
            bindings.push(ReporterBinding {
                handle,
                destinations,
            });
        }

        Ok(RegisteredReporters { handles, bindings })
    }
}

fn resolve_destinations(request: &ReporterRequest) -> DestinationSet {
    let file = request
        .file_output
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from);

    let console = match request.console_output {
        ConsoleSetting::Enabled => true,
        ConsoleSetting::Disabled => false,
        // Unset with no file output defaults to console.
        ConsoleSetting::Unset => file.is_none(),
    };

    DestinationSet { file, console }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleSetting;

    fn request(file: Option<&str>, console: ConsoleSetting) -> ReporterRequest {
        ReporterRequest {
            name: "documentation".to_string(),
            file_output: file.map(str::to_string),
            console_output: console,
        }
    }

    #[test]
    fn unset_console_without_file_defaults_to_console() {
        let set = resolve_destinations(&request(None, ConsoleSetting::Unset));
        assert_eq!(set, DestinationSet { file: None, console: true });
    }

    #[test]
    fn unset_console_with_file_stays_file_only() {
        let set = resolve_destinations(&request(Some("out/doc.txt"), ConsoleSetting::Unset));
        assert!(!set.console);
        assert_eq!(set.file, Some(PathBuf::from("out/doc.txt")));
    }

    #[test]
    fn explicit_console_false_with_no_file_is_empty() {
        let set = resolve_destinations(&request(None, ConsoleSetting::Disabled));
        assert!(set.is_empty());
    }

    #[test]
    fn file_and_console_may_both_be_active() {
        let set = resolve_destinations(&request(Some("out/doc.txt"), ConsoleSetting::Enabled));
        assert!(set.console);
        assert!(set.file.is_some());
    }
}
