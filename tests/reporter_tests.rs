//! Reporter registration tests
//!
//! Covers:
//! - A. Implicit default reporter when none is requested
//! - B. Tri-state console resolution
//! - C. Unknown reporter kind rejection
//! - D. Initialization failure rejection
//! - E. Destination-less reporters are instantiated but not bound

use std::path::PathBuf;

use sqlunit_runner::config::{ConsoleSetting, ReporterRequest};
use sqlunit_runner::engine::{
    ConnectionError, EngineError, EngineSession, ReporterError, ReporterHandle, RunError,
    RunRequest,
};
use sqlunit_runner::{ReporterRegistry, Version};

// Test utilities

/// Session fake that recognizes a fixed set of reporter kinds
struct StubSession {
    known_kinds: Vec<String>,
    fail_init_for: Option<String>,
    created: Vec<String>,
    initialized: Vec<String>,
    next_id: u32,
}

impl StubSession {
    fn new(known_kinds: &[&str]) -> Self {
        StubSession {
            known_kinds: known_kinds.iter().map(|s| s.to_string()).collect(),
            fail_init_for: None,
            created: Vec::new(),
            initialized: Vec::new(),
            next_id: 0,
        }
    }
}

impl EngineSession for StubSession {
    fn framework_version(&mut self) -> Result<Version, EngineError> {
        Ok(Version::new(3, 1, 7))
    }

    fn create_reporter(&mut self, kind: &str) -> Result<ReporterHandle, ReporterError> {
        if !self.known_kinds.iter().any(|k| k == kind) {
            return Err(ReporterError::Unknown(kind.to_string()));
        }
        self.next_id += 1;
        self.created.push(kind.to_string());
        Ok(ReporterHandle {
            kind: kind.to_string(),
            id: self.next_id.to_string(),
        })
    }

    fn init_reporter(&mut self, handle: &ReporterHandle) -> Result<(), ReporterError> {
        if self.fail_init_for.as_deref() == Some(handle.kind.as_str()) {
            return Err(ReporterError::Init {
                kind: handle.kind.clone(),
                reason: "incompatible schema".to_string(),
            });
        }
        self.initialized.push(handle.kind.clone());
        Ok(())
    }

    fn enable_diagnostics(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn disable_diagnostics(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn run(&mut self, _request: &RunRequest<'_>) -> Result<(), RunError> {
        Ok(())
    }

    fn fetch_buffer(&mut self, _handle: &ReporterHandle) -> Result<Vec<String>, EngineError> {
        Ok(Vec::new())
    }

    fn poll_buffer(&mut self, _handle: &ReporterHandle) -> Result<Option<Vec<String>>, EngineError> {
        Ok(None)
    }

    fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        Ok(())
    }
}

fn request(name: &str, file: Option<&str>, console: ConsoleSetting) -> ReporterRequest {
    ReporterRequest {
        name: name.to_string(),
        file_output: file.map(str::to_string),
        console_output: console,
    }
}

#[test]
fn empty_request_list_synthesizes_console_documentation_reporter() {
    let mut session = StubSession::new(&["documentation"]);
    let registered = ReporterRegistry::register(&mut session, &[]).unwrap();

    assert_eq!(registered.handles.len(), 1);
    assert_eq!(registered.handles[0].kind, "documentation");
    assert_eq!(registered.bindings.len(), 1);
    assert!(registered.bindings[0].destinations.console);
    assert!(registered.bindings[0].destinations.file.is_none());
    assert_eq!(session.initialized, vec!["documentation"]);
}

#[test]
fn unset_console_with_no_file_resolves_to_console() {
    let mut session = StubSession::new(&["documentation"]);
    let registered = ReporterRegistry::register(
        &mut session,
        &[request("documentation", None, ConsoleSetting::Unset)],
    )
    .unwrap();

    assert!(registered.bindings[0].destinations.console);
}

#[test]
fn file_output_with_unset_console_is_file_only() {
    let mut session = StubSession::new(&["junit"]);
    let registered = ReporterRegistry::register(
        &mut session,
        &[request("junit", Some("reports/junit.xml"), ConsoleSetting::Unset)],
    )
    .unwrap();

    let destinations = &registered.bindings[0].destinations;
    assert!(!destinations.console);
    assert_eq!(destinations.file, Some(PathBuf::from("reports/junit.xml")));
}

#[test]
fn explicitly_silenced_reporter_is_instantiated_but_not_bound() {
    let mut session = StubSession::new(&["documentation"]);
    let registered = ReporterRegistry::register(
        &mut session,
        &[request("documentation", None, ConsoleSetting::Disabled)],
    )
    .unwrap();

    assert_eq!(registered.handles.len(), 1);
    assert!(registered.bindings.is_empty());
    assert_eq!(session.created, vec!["documentation"]);
    assert_eq!(session.initialized, vec!["documentation"]);
}

#[test]
fn unknown_reporter_kind_is_rejected() {
    let mut session = StubSession::new(&["documentation"]);
    let result = ReporterRegistry::register(
        &mut session,
        &[request("no-such-reporter", None, ConsoleSetting::Unset)],
    );

    assert!(matches!(result, Err(ReporterError::Unknown(name)) if name == "no-such-reporter"));
}

#[test]
fn init_failure_is_rejected() {
    let mut session = StubSession::new(&["documentation"]);
    session.fail_init_for = Some("documentation".to_string());

    let result = ReporterRegistry::register(
        &mut session,
        &[request("documentation", None, ConsoleSetting::Unset)],
    );

    assert!(matches!(result, Err(ReporterError::Init { .. })));
}
