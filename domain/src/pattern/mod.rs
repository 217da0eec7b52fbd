//! Pattern domain module
//!
//! The rule table behind intent recognition. A [`Rule`] pairs a regular
//! expression with named capture slots and a priority; the [`PatternLibrary`]
//! keeps rules in one global order so that rule precedence is data that can be
//! inspected and tested, not an accident of control flow.
//!
//! ```text
//! priority 80  system.set_volume      ^(?:设置|调整|调)音量(?:到|为|至|成)\s*(?P<level>…)
//! priority 30  system.open_application ^(?:打开|启动|运行)\s*(?P<app>.+)$
//! priority -10 reminder.generic_set   ^(?:设置|设定)\s*(?P<content>.+)$   (confidence 0.4)
//! ```

mod builtin;
pub mod library;
pub mod rule;

pub use library::PatternLibrary;
pub use rule::{PatternError, Rule, RuleBuilder, SlotSpec};
