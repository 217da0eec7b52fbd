//! Security domain module
//!
//! [`SecurityPolicy::classify`] decides, before any tool runs, whether a
//! command is allowed, needs a yes/no confirmation, or is denied because one
//! of its path entities lands under a restricted prefix.
//!
//! Path entities are resolved the same way the file tool resolves them
//! (relative to the configured base directory), normalized, and canonicalized
//! up to the longest existing ancestor.

pub mod path;
pub mod policy;

pub use policy::{PolicyDecision, SecurityPolicy};
