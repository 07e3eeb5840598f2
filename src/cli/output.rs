//! Messages written to stdout

use super::commands::OutputFormat;
use crate::catalog::ResourceDescriptor;
use crate::error::Result;
use crate::state::State;
use crate::types::Record;
use serde::Serialize;
use std::io::Write;

/// Outcome of a connection check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    /// Token exchange succeeded
    Succeeded,
    /// Token exchange failed
    Failed,
}

/// One line of CLI output
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message<'a> {
    /// An extracted record
    Record {
        /// Resource name
        stream: &'a str,
        /// The record, numbers in their exact source text
        record: &'a Record,
    },
    /// Bookmarks after a resource finished
    State {
        /// Full state
        value: &'a State,
    },
    /// Result of `check`
    ConnectionStatus {
        /// Outcome
        status: ConnectionStatus,
        /// Detail
        message: String,
    },
    /// Result of `streams`
    Streams {
        /// Catalog entries
        streams: &'a [ResourceDescriptor],
    },
}

/// Write `message` as one line
pub fn emit(out: &mut dyn Write, format: OutputFormat, message: &Message<'_>) -> Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut *out, message)?,
        OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *out, message)?,
    }
    out.write_all(b"\n")?;
    Ok(())
}
