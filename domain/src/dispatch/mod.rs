//! Dispatch domain module
//!
//! Value types shared by the dispatcher and the tools: the uniform
//! [`ExecutionResult`] contract, the [`FailureKind`] taxonomy and the
//! per-command [`CommandPhase`] state machine.

pub mod phase;
pub mod result;

pub use phase::CommandPhase;
pub use result::{ExecutionResult, ExecutionStatus, FailureKind};
