//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Exchange the client credentials for a token
//! - `streams` - List catalog resources
//! - `read` - Extract records, one JSON message per line on stdout

mod commands;
mod output;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{emit, ConnectionStatus, Message};
pub use runner::Runner;
