//! Output-buffer protocols
//!
//! A reporter's content lives in a server-side buffer that is consumed
//! destructively: it must be read once and replicated to every
//! destination, never re-queried per destination. Older framework
//! versions only support chunked polling; newer ones expose a bulk
//! fetch. The protocol is selected per call, never cached, since
//! different reporters in one run could face a mixed-version setup.

use std::io::Write;

use crate::engine::{EngineError, EngineSession, ReporterHandle};
use crate::version::Version;

/// First framework version supporting the bulk-fetch protocol
pub const BULK_FETCH_SINCE: Version = Version {
    major: 3,
    minor: 1,
    bugfix: 0,
    build: None,
};

/// Errors while draining a buffer
#[derive(Debug, thiserror::Error)]
pub enum DrainError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed writing report output: {0}")]
    Io(#[from] std::io::Error),
}

/// A version-compatible drain strategy for one reporter's buffer
pub trait OutputBuffer {
    /// Pull all buffered content and write it to every destination,
    /// in the order given.
    fn drain(
        &mut self,
        session: &mut dyn EngineSession,
        destinations: &mut [Box<dyn Write + '_>],
    ) -> Result<(), DrainError>;
}

/// Select the wire-compatible buffer strategy for a reporter
pub fn resolve_output_buffer(
    framework_version: &Version,
    handle: ReporterHandle,
) -> Box<dyn OutputBuffer> {
    if framework_version.is_older_than(&BULK_FETCH_SINCE) {
        Box::new(LegacyPollingBuffer { handle })
    } else {
        Box::new(BulkFetchBuffer { handle })
    }
}

/// Bulk-fetch protocol: one round trip for the whole buffer
struct BulkFetchBuffer {
    handle: ReporterHandle,
}

impl OutputBuffer for BulkFetchBuffer {
    fn drain(
        &mut self,
        session: &mut dyn EngineSession,
        destinations: &mut [Box<dyn Write + '_>],
    ) -> Result<(), DrainError> {
        let lines = session.fetch_buffer(&self.handle)?;
        replicate(&lines, destinations)?;
        flush_all(destinations)
    }
}

/// Legacy protocol: poll and consume chunk by chunk until exhausted
struct LegacyPollingBuffer {
    handle: ReporterHandle,
}

impl OutputBuffer for LegacyPollingBuffer {
    fn drain(
        &mut self,
        session: &mut dyn EngineSession,
        destinations: &mut [Box<dyn Write + '_>],
    ) -> Result<(), DrainError> {
        while let Some(chunk) = session.poll_buffer(&self.handle)? {
            replicate(&chunk, destinations)?;
        }
        flush_all(destinations)
    }
}

fn replicate(lines: &[String], destinations: &mut [Box<dyn Write + '_>]) -> Result<(), DrainError> {
    for destination in destinations.iter_mut() {
        for line in lines {
            writeln!(destination, "{}", line)?;
        }
    }
    Ok(())
}

fn flush_all(destinations: &mut [Box<dyn Write + '_>]) -> Result<(), DrainError> {
    for destination in destinations.iter_mut() {
        destination.flush()?;
    }
    Ok(())
}
