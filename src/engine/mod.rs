//! Remote test-engine boundary
//!
//! The engine executes tests inside the database and buffers
//! structured reporter output server-side. This module only defines
//! the client-side contract; the engine itself is the system under
//! orchestration, not reimplemented here.
//!
//! - `TestEngine` — session factory (one session per invocation)
//! - `EngineSession` — the live connection: reporter registration,
//!   diagnostics toggle, the run call, and the two buffer protocols
//!   (legacy chunked polling vs bulk fetch)

pub mod sqlite;

use crate::config::ConnectionParams;
use crate::mapping::FileMappingOptions;
use crate::version::Version;

pub use sqlite::SqliteEngine;

/// Connectivity errors
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Cannot open database session at '{url}': {reason}")]
    Open { url: String, reason: String },

    #[error("Failed to close database session: {0}")]
    Close(String),
}

/// Reporter registration errors
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    #[error("Unknown reporter kind '{0}'")]
    Unknown(String),

    #[error("Reporter '{kind}' failed to initialize: {reason}")]
    Init { kind: String, reason: String },
}

/// Engine call failure outside the run step itself
#[derive(Debug, thiserror::Error)]
#[error("Engine call failed: {0}")]
pub struct EngineError(pub String);

/// Outcome of the run step
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// One or more remote assertions failed. Not an infrastructure
    /// fault; reports are still written.
    #[error("Some tests failed: {0}")]
    TestsFailed(String),

    /// Engine or transport fault during the run
    #[error("Test execution failed: {0}")]
    Execution(String),
}

/// Server-side reporter instance handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterHandle {
    /// Reporter kind, as registered with the engine
    pub kind: String,
    /// Engine-assigned instance id
    pub id: String,
}

/// Everything the remote engine needs for one run
#[derive(Debug)]
pub struct RunRequest<'a> {
    pub source_mapping: &'a FileMappingOptions,
    pub test_mapping: &'a FileMappingOptions,
    pub reporters: &'a [ReporterHandle],
    pub suite_paths: &'a [String],
    pub tags: &'a [String],
    pub include_object: Option<&'a str>,
    pub exclude_object: Option<&'a str>,
    pub random_test_order: bool,
    pub random_test_order_seed: Option<u64>,
    pub skip_compatibility_check: bool,
    pub color_console: bool,
    pub fail_on_errors: bool,
}

/// Session factory boundary
pub trait TestEngine {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn EngineSession>, ConnectionError>;
}

/// One live database session
///
/// Used strictly sequentially: version check, reporter registration,
/// run, buffer draining, close. Never shared across threads.
pub trait EngineSession {
    /// Version of the test framework installed in the database
    fn framework_version(&mut self) -> Result<Version, EngineError>;

    /// Instantiate a named reporter kind server-side
    fn create_reporter(&mut self, kind: &str) -> Result<ReporterHandle, ReporterError>;

    /// Initialize a reporter instance against this session
    fn init_reporter(&mut self, handle: &ReporterHandle) -> Result<(), ReporterError>;

    /// Enable capture of ad-hoc diagnostic text. Idempotent.
    fn enable_diagnostics(&mut self) -> Result<(), EngineError>;

    /// Disable diagnostic capture. Idempotent.
    fn disable_diagnostics(&mut self) -> Result<(), EngineError>;

    /// Execute the test run
    fn run(&mut self, request: &RunRequest<'_>) -> Result<(), RunError>;

    /// Bulk-fetch a reporter's entire buffered output. Consumes the
    /// server-side buffer.
    fn fetch_buffer(&mut self, handle: &ReporterHandle) -> Result<Vec<String>, EngineError>;

    /// Legacy protocol: consume the next buffered chunk, `None` when
    /// the buffer is exhausted.
    fn poll_buffer(&mut self, handle: &ReporterHandle) -> Result<Option<Vec<String>>, EngineError>;

    /// Close the session. Called exactly once, after all reporters
    /// have drained.
    fn close(self: Box<Self>) -> Result<(), ConnectionError>;
}
