//! Per-request journal appended to a workspace.
//!
//! Each recorded request becomes one block in `log.txt`: a timestamped
//! header naming the request kind and entry count, then up to a capped
//! number of indented detail lines. The cap defaults to the value given at
//! construction and can be overridden per request.

use std::io::Write;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};

use crate::error::Result;
use crate::storage::Storage;

/// File name of the journal inside a workspace.
pub const JOURNAL_FILE: &str = "log.txt";

/// Default number of detail lines per recorded request.
pub const DEFAULT_LOG_ENTRIES: usize = 1;

/// Appends one human-readable block per request to the workspace journal.
#[derive(Debug)]
pub struct RequestJournal {
    storage: Arc<dyn Storage>,
    default_log_entries: usize,
}

impl RequestJournal {
    /// Create a journal over the given storage, creating `log.txt` if it
    /// does not exist yet.
    pub fn new(storage: Arc<dyn Storage>, default_log_entries: usize) -> Result<Self> {
        if !storage.file_exists(JOURNAL_FILE) {
            let mut output = storage.create_output(JOURNAL_FILE)?;
            output.close()?;
        }

        Ok(RequestJournal {
            storage,
            default_log_entries,
        })
    }

    /// Number of detail lines recorded when no per-request override is given.
    pub fn default_log_entries(&self) -> usize {
        self.default_log_entries
    }

    /// Append one block for a request of the given kind.
    ///
    /// `details` holds one line per entry in the request; only the first
    /// `log_entries` (or the construction-time default) are written.
    pub fn record(&self, kind: &str, details: &[String], log_entries: Option<usize>) -> Result<()> {
        let limit = log_entries.unwrap_or(self.default_log_entries);
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut block = format!(
            "{kind} request at {timestamp} with {} entries:\n",
            details.len()
        );
        for line in details.iter().take(limit) {
            block.push('\t');
            block.push_str(line);
            block.push('\n');
        }

        let mut output = self.storage.create_output_append(JOURNAL_FILE)?;
        output.write_all(block.as_bytes())?;
        output.close()?;

        Ok(())
    }
}
