//! Logging infrastructure: structured command audit log.
//!
//! Provides [`JsonlCommandLogger`], a JSONL file writer that implements
//! the [`CommandLogger`](addy_application::CommandLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlCommandLogger;
