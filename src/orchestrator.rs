//! Execution orchestrator
//!
//! Top-level coordinator for one invocation:
//! resolve configuration → open connection → register reporters →
//! run → drain reports → close. The draining and closing steps are
//! always reached once a connection exists, whatever the run step
//! did; their own failures are logged and never replace the outcome
//! the run already determined.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{
    ConfigError, RunnerConfig, DEFAULT_FILE_PATTERN, DEFAULT_SOURCE_DIRECTORY,
    DEFAULT_TEST_DIRECTORY,
};
use crate::engine::{
    ConnectionError, EngineSession, ReporterError, RunError, RunRequest, TestEngine,
};
use crate::mapping::{build_mapping_options, FileMappingOptions, PathMappingResolver};
use crate::reporter::ReporterRegistry;
use crate::scan::DirectoryScanner;
use crate::writer::{ReportWriter, WriteEntry};

/// Final classification of one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunOutcome {
    Success,
    TestsFailed(String),
    InfrastructureFailure(String),
}

/// What one invocation did, for logs and the `--json` surface
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub skipped: bool,
    /// True when a tests-failed outcome was converted to success by
    /// the failure-tolerance flag
    pub tolerated_failure: bool,
    pub framework_version: Option<String>,
    pub source_file_count: usize,
    pub test_file_count: usize,
    pub reports: Vec<WriteEntry>,
}

impl RunSummary {
    fn skipped() -> Self {
        RunSummary {
            outcome: RunOutcome::Success,
            skipped: true,
            tolerated_failure: false,
            framework_version: None,
            source_file_count: 0,
            test_file_count: 0,
            reports: Vec::new(),
        }
    }
}

/// Top-level errors an invocation can end with
///
/// Test-failure and execution errors are deferred until after the
/// reporting phase; configuration, connection and reporter errors
/// abort immediately.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Reporter(#[from] ReporterError),

    #[error("Test execution failed: {0}")]
    Execution(String),

    #[error("Some tests failed: {0}")]
    TestsFailed(String),
}

/// Coordinates one full invocation against an engine and a scanner
pub struct ExecutionOrchestrator<'a> {
    engine: &'a dyn TestEngine,
    scanner: &'a dyn DirectoryScanner,
}

impl<'a> ExecutionOrchestrator<'a> {
    pub fn new(engine: &'a dyn TestEngine, scanner: &'a dyn DirectoryScanner) -> Self {
        ExecutionOrchestrator { engine, scanner }
    }

    /// Run the whole pipeline for one configuration bundle
    ///
    /// Returns `Ok` for a clean run and for a tolerated test failure;
    /// every other outcome is a hard error. Reports are attempted for
    /// clean, failed-tests and failed-execution runs alike.
    pub fn run(&self, config: &RunnerConfig) -> Result<RunSummary, RunnerError> {
        if config.skip_tests {
            info!("database unit tests are skipped");
            return Ok(RunSummary::skipped());
        }

        // Idle → ConfigResolved. Any configuration error aborts before
        // a connection is ever opened.
        let base_dir = config.base_dir();
        let resolver = PathMappingResolver::new(self.scanner);

        let source_paths = resolver.resolve(
            &base_dir,
            &config.sources.spec,
            DEFAULT_SOURCE_DIRECTORY,
            DEFAULT_FILE_PATTERN,
        )?;
        let source_mapping = build_mapping_options(source_paths, &config.sources)?;

        let test_paths = resolver.resolve(
            &base_dir,
            &config.tests.spec,
            DEFAULT_TEST_DIRECTORY,
            DEFAULT_FILE_PATTERN,
        )?;
        let test_mapping = build_mapping_options(test_paths, &config.tests)?;

        let params = config.connection_params()?;

        // ConfigResolved → Connected. Failure here is fatal; no
        // reporter exists yet, nothing to clean up.
        let mut session = self.engine.connect(params)?;

        // Connected → ReportersBound.
        let version = match session.framework_version() {
            Ok(version) => version,
            Err(e) => {
                close_session(session);
                return Err(RunnerError::Execution(e.to_string()));
            }
        };
        info!("test framework version = {version}");

        let registered = match ReporterRegistry::register(session.as_mut(), &config.reporters) {
            Ok(registered) => registered,
            Err(e) => {
                // A half-initialized reporter set would make the
                // report-writing phase unreliable; abort before running.
                close_session(session);
                return Err(e.into());
            }
        };

        let mut writer = ReportWriter::new(config.output_dir(), version.clone());
        for binding in registered.bindings {
            writer.add_binding(binding);
        }

        log_run_parameters(&source_mapping, &test_mapping, &registered.handles);

        // ReportersBound → Running.
        let outcome = match run_step(
            session.as_mut(),
            config,
            &source_mapping,
            &test_mapping,
            &registered.handles,
        ) {
            Ok(()) => RunOutcome::Success,
            Err(RunError::TestsFailed(detail)) => RunOutcome::TestsFailed(detail),
            Err(RunError::Execution(cause)) => RunOutcome::InfrastructureFailure(cause),
        };

        // Running → Draining. Always reached, for all three outcomes;
        // a draining problem is recorded per binding and never
        // replaces the outcome the run determined.
        let write_report = writer.write_all(session.as_mut());

        // Draining → Closed.
        if config.diagnostic_output {
            if let Err(e) = session.disable_diagnostics() {
                warn!("failed to disable diagnostic output: {e}");
            }
        }
        close_session(session);

        let mut summary = RunSummary {
            outcome,
            skipped: false,
            tolerated_failure: false,
            framework_version: Some(version.to_string()),
            source_file_count: source_mapping.file_paths.len(),
            test_file_count: test_mapping.file_paths.len(),
            reports: write_report.entries,
        };

        // Terminal decision: only an infrastructure failure, or failed
        // tests without tolerance, escalates to a hard failure.
        match summary.outcome {
            RunOutcome::Success => Ok(summary),
            RunOutcome::TestsFailed(ref detail) => {
                if config.ignore_failure {
                    warn!("some tests failed (tolerated by configuration): {detail}");
                    summary.tolerated_failure = true;
                    Ok(summary)
                } else {
                    Err(RunnerError::TestsFailed(detail.clone()))
                }
            }
            RunOutcome::InfrastructureFailure(cause) => Err(RunnerError::Execution(cause)),
        }
    }
}

/// The run step proper: optional diagnostics enablement plus the
/// delegated engine call
fn run_step(
    session: &mut dyn EngineSession,
    config: &RunnerConfig,
    source_mapping: &FileMappingOptions,
    test_mapping: &FileMappingOptions,
    reporters: &[crate::engine::ReporterHandle],
) -> Result<(), RunError> {
    if config.diagnostic_output {
        session
            .enable_diagnostics()
            .map_err(|e| RunError::Execution(e.to_string()))?;
        info!("enabled diagnostic output capture");
    }

    let request = RunRequest {
        source_mapping,
        test_mapping,
        reporters,
        suite_paths: &config.paths,
        tags: &config.tags,
        include_object: non_blank(config.include_object.as_deref()),
        exclude_object: non_blank(config.exclude_object.as_deref()),
        random_test_order: config.random_test_order,
        random_test_order_seed: config.random_test_order_seed,
        skip_compatibility_check: config.skip_compatibility_check,
        color_console: config.color_console,
        fail_on_errors: !config.ignore_failure,
    };

    session.run(&request)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn close_session(session: Box<dyn EngineSession>) {
    if let Err(e) = session.close() {
        // The run's outcome already stands; a close failure is only logged.
        error!("failed to close database session: {e}");
    }
}

fn log_run_parameters(
    source_mapping: &FileMappingOptions,
    test_mapping: &FileMappingOptions,
    reporters: &[crate::engine::ReporterHandle],
) {
    debug!("invoking test runner with:");
    for reporter in reporters {
        debug!("reporter: {}", reporter.kind);
    }
    for path in &source_mapping.file_paths {
        debug!("source: {path}");
    }
    for path in &test_mapping.file_paths {
        debug!("test: {path}");
    }
}
