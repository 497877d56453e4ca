//! SQLite-resident engine client
//!
//! Default `TestEngine` implementation for a test framework installed
//! inside a SQLite database. The framework owns the schema; this
//! client only speaks its wire surface:
//!
//! - `sqlunit_framework(version, diagnostics)` — framework metadata
//! - `sqlunit_reporter_kinds(kind)` — reporter kinds the engine knows
//! - `sqlunit_reporter_instances(id, kind, initialized)` — live reporters
//! - `sqlunit_run_requests(request)` / `sqlunit_run_results(status, detail)`
//!   — run invocation and its outcome (populated inside the database)
//! - `sqlunit_output_buffer(reporter_id, seq, line)` — buffered report
//!   content, consumed destructively on read

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;

use crate::config::ConnectionParams;
use crate::version::Version;

use super::{
    ConnectionError, EngineError, EngineSession, ReporterError, ReporterHandle, RunError,
    RunRequest, TestEngine,
};

/// Rows consumed per legacy polling round-trip
const POLL_CHUNK_ROWS: usize = 64;

/// Engine client for a framework resident in a SQLite database
#[derive(Debug, Default)]
pub struct SqliteEngine;

impl TestEngine for SqliteEngine {
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn EngineSession>, ConnectionError> {
        let path = params
            .url
            .strip_prefix("sqlite://")
            .or_else(|| params.url.strip_prefix("sqlite:"))
            .unwrap_or(&params.url);

        let conn = Connection::open(path).map_err(|e| ConnectionError::Open {
            url: params.url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Box::new(SqliteSession { conn }))
    }
}

/// One open session against the framework database
pub struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    fn engine_err(e: rusqlite::Error) -> EngineError {
        EngineError(e.to_string())
    }
}

impl EngineSession for SqliteSession {
    fn framework_version(&mut self) -> Result<Version, EngineError> {
        let raw: String = self
            .conn
            .query_row("SELECT version FROM sqlunit_framework LIMIT 1", [], |row| {
                row.get(0)
            })
            .map_err(Self::engine_err)?;
        raw.parse()
            .map_err(|e: crate::version::VersionError| EngineError(e.to_string()))
    }

    fn create_reporter(&mut self, kind: &str) -> Result<ReporterHandle, ReporterError> {
        let known: Option<String> = self
            .conn
            .query_row(
                "SELECT kind FROM sqlunit_reporter_kinds WHERE kind = ?1",
                params![kind],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ReporterError::Init {
                kind: kind.to_string(),
                reason: e.to_string(),
            })?;

        if known.is_none() {
            return Err(ReporterError::Unknown(kind.to_string()));
        }

        self.conn
            .execute(
                "INSERT INTO sqlunit_reporter_instances (kind, initialized) VALUES (?1, 0)",
                params![kind],
            )
            .map_err(|e| ReporterError::Init {
                kind: kind.to_string(),
                reason: e.to_string(),
            })?;

        Ok(ReporterHandle {
            kind: kind.to_string(),
            id: self.conn.last_insert_rowid().to_string(),
        })
    }

    fn init_reporter(&mut self, handle: &ReporterHandle) -> Result<(), ReporterError> {
        let updated = self
            .conn
            .execute(
                "UPDATE sqlunit_reporter_instances SET initialized = 1 WHERE id = ?1",
                params![handle.id],
            )
            .map_err(|e| ReporterError::Init {
                kind: handle.kind.clone(),
                reason: e.to_string(),
            })?;

        if updated == 0 {
            return Err(ReporterError::Init {
                kind: handle.kind.clone(),
                reason: format!("no reporter instance with id {}", handle.id),
            });
        }
        Ok(())
    }

    fn enable_diagnostics(&mut self) -> Result<(), EngineError> {
        self.conn
            .execute("UPDATE sqlunit_framework SET diagnostics = 1", [])
            .map(|_| ())
            .map_err(Self::engine_err)
    }

    fn disable_diagnostics(&mut self) -> Result<(), EngineError> {
        self.conn
            .execute("UPDATE sqlunit_framework SET diagnostics = 0", [])
            .map(|_| ())
            .map_err(Self::engine_err)
    }

    fn run(&mut self, request: &RunRequest<'_>) -> Result<(), RunError> {
        let payload = json!({
            "source_paths": request.source_mapping.file_paths,
            "source_rules": request.source_mapping,
            "test_paths": request.test_mapping.file_paths,
            "test_rules": request.test_mapping,
            "reporters": request.reporters.iter().map(|r| &r.id).collect::<Vec<_>>(),
            "suite_paths": request.suite_paths,
            "tags": request.tags,
            "include_object": request.include_object,
            "exclude_object": request.exclude_object,
            "random_test_order": request.random_test_order,
            "random_test_order_seed": request.random_test_order_seed,
            "skip_compatibility_check": request.skip_compatibility_check,
            "color_console": request.color_console,
            "fail_on_errors": request.fail_on_errors,
        });

        self.conn
            .execute(
                "INSERT INTO sqlunit_run_requests (request) VALUES (?1)",
                params![payload.to_string()],
            )
            .map_err(|e| RunError::Execution(e.to_string()))?;

        // The framework populates the result row from inside the
        // database as part of the insert.
        let (status, detail): (String, String) = self
            .conn
            .query_row(
                "SELECT status, detail FROM sqlunit_run_results ORDER BY rowid DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| RunError::Execution(e.to_string()))?;

        match status.as_str() {
            "success" => Ok(()),
            "failures" => Err(RunError::TestsFailed(detail)),
            _ => Err(RunError::Execution(detail)),
        }
    }

    fn fetch_buffer(&mut self, handle: &ReporterHandle) -> Result<Vec<String>, EngineError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT line FROM sqlunit_output_buffer WHERE reporter_id = ?1 ORDER BY seq",
            )
            .map_err(Self::engine_err)?;
        let lines: Vec<String> = stmt
            .query_map(params![handle.id], |row| row.get(0))
            .map_err(Self::engine_err)?
            .collect::<Result<_, _>>()
            .map_err(Self::engine_err)?;
        drop(stmt);

        self.conn
            .execute(
                "DELETE FROM sqlunit_output_buffer WHERE reporter_id = ?1",
                params![handle.id],
            )
            .map_err(Self::engine_err)?;

        Ok(lines)
    }

    fn poll_buffer(&mut self, handle: &ReporterHandle) -> Result<Option<Vec<String>>, EngineError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT seq, line FROM sqlunit_output_buffer \
                 WHERE reporter_id = ?1 ORDER BY seq LIMIT ?2",
            )
            .map_err(Self::engine_err)?;
        let rows: Vec<(i64, String)> = stmt
            .query_map(params![handle.id, POLL_CHUNK_ROWS as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .map_err(Self::engine_err)?
            .collect::<Result<_, _>>()
            .map_err(Self::engine_err)?;
        drop(stmt);

        if rows.is_empty() {
            return Ok(None);
        }

        let last_seq = rows.last().map(|(seq, _)| *seq).unwrap_or(0);
        self.conn
            .execute(
                "DELETE FROM sqlunit_output_buffer WHERE reporter_id = ?1 AND seq <= ?2",
                params![handle.id, last_seq],
            )
            .map_err(Self::engine_err)?;

        Ok(Some(rows.into_iter().map(|(_, line)| line).collect()))
    }

    fn close(self: Box<Self>) -> Result<(), ConnectionError> {
        self.conn
            .close()
            .map_err(|(_, e)| ConnectionError::Close(e.to_string()))
    }
}
