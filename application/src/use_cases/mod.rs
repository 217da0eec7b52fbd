//! Use cases (application services)

pub mod dispatch_command;
pub mod recommend;
