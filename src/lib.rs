//! sqlunit-runner: build-step orchestration for database-resident unit tests
//!
//! Opens one database session per invocation, resolves which database
//! objects constitute test sources and tests from declarative
//! path/pattern configuration, triggers a run of the in-database test
//! framework, and fans the buffered reporter output out to files and
//! the console — with version-aware buffer protocols, partial-failure
//! tolerance and guaranteed resource cleanup.

pub mod buffer;
pub mod cli;
pub mod config;
pub mod engine;
pub mod mapping;
pub mod orchestrator;
pub mod reporter;
pub mod scan;
pub mod version;
pub mod writer;

// Re-export the pipeline surface
pub use config::{
    ConfigError, ConnectionParams, ConsoleSetting, ObjectGroupConfig, ReporterRequest,
    ResourceSpec, RunnerConfig, TypeMapping,
};
pub use engine::{
    ConnectionError, EngineError, EngineSession, ReporterError, ReporterHandle, RunError,
    RunRequest, SqliteEngine, TestEngine,
};
pub use mapping::{build_mapping_options, FileMappingOptions, PathMappingResolver};
pub use orchestrator::{ExecutionOrchestrator, RunOutcome, RunSummary, RunnerError};
pub use reporter::{DestinationSet, RegisteredReporters, ReporterBinding, ReporterRegistry};
pub use scan::{DirectoryScanner, GlobScanner};
pub use version::Version;
pub use writer::{ReportWriter, WriteEntry, WriteError, WriteReport};
