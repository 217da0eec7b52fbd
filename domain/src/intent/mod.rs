//! Intent domain module
//!
//! What a command *means*: the closed [`Intent`] enumeration, the typed
//! [`EntityValue`]s extracted from the text, and the [`ParsedCommand`] that
//! carries both to the dispatcher.
//!
//! Coercion functions in [`coercion`] are pure. Date expressions stay symbolic
//! ([`DateTimeSpec`]) so that parsing is deterministic; resolving "明天" to a
//! calendar date is left to the tool that needs it.

pub mod coercion;
pub mod command;
pub mod entity;
pub mod kind;

pub use coercion::{SlotKind, normalize_app_name};
pub use command::ParsedCommand;
pub use entity::{ClockTime, DateSpec, DateTimeSpec, Entities, EntityValue};
pub use kind::{Intent, UnknownIntent};
