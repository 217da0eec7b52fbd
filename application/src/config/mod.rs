//! Application-level configuration.
//!
//! - [`DispatchConfig`] — confidence floor, confirmation mode and timeouts

pub mod dispatch_config;

pub use dispatch_config::{ConfirmationMode, DispatchConfig, UnknownConfirmationMode};
