//! Entity values extracted from command text.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Day component of a [`DateTimeSpec`].
///
/// Kept symbolic so that parsing never consults the clock; tools resolve it
/// against the current date when they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateSpec {
    /// Offset in days from today (`今天` = 0, `明天` = 1, `昨天` = -1).
    Relative { days: i32 },
    /// Calendar date. A missing year means "the current year".
    Absolute {
        year: Option<i32>,
        month: u32,
        day: u32,
    },
}

/// Wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
}

/// A date with an optional time of day, as spoken by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeSpec {
    pub date: DateSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
}

impl DateTimeSpec {
    pub fn today() -> Self {
        Self {
            date: DateSpec::Relative { days: 0 },
            time: None,
        }
    }
}

impl std::fmt::Display for DateTimeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.date {
            DateSpec::Relative { days } => write!(f, "today{:+}d", days)?,
            DateSpec::Absolute {
                year: Some(year),
                month,
                day,
            } => write!(f, "{:04}-{:02}-{:02}", year, month, day)?,
            DateSpec::Absolute {
                year: None,
                month,
                day,
            } => write!(f, "--{:02}-{:02}", month, day)?,
        }
        if let Some(time) = self.time {
            write!(f, " {:02}:{:02}", time.hour, time.minute)?;
        }
        Ok(())
    }
}

/// A single extracted parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EntityValue {
    Text(String),
    Integer(i64),
    Number(f64),
    /// Whole percentage in `0..=100`.
    Percentage(u8),
    Path(PathBuf),
    DateTime(DateTimeSpec),
    Flag(bool),
}

impl EntityValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntityValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            EntityValue::Path(p) => Some(p),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityValue::Text(s) => write!(f, "{}", s),
            EntityValue::Integer(n) => write!(f, "{}", n),
            EntityValue::Number(n) => write!(f, "{}", n),
            EntityValue::Percentage(p) => write!(f, "{}%", p),
            EntityValue::Path(p) => write!(f, "{}", p.display()),
            EntityValue::DateTime(dt) => write!(f, "{}", dt),
            EntityValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// Named entities of one parsed command.
///
/// Ordered by name so that two parses of the same text compare and serialize
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entities(BTreeMap<String, EntityValue>);

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: EntityValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: EntityValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&EntityValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text view of an entity. Non-text values are rendered with `Display`.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| v.to_string())
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.get(name).and_then(EntityValue::as_path)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            EntityValue::Integer(n) => Some(*n),
            EntityValue::Percentage(p) => Some(i64::from(*p)),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            EntityValue::Number(n) => Some(*n),
            EntityValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn percentage(&self, name: &str) -> Option<u8> {
        match self.get(name)? {
            EntityValue::Percentage(p) => Some(*p),
            _ => None,
        }
    }

    pub fn datetime(&self, name: &str) -> Option<DateTimeSpec> {
        match self.get(name)? {
            EntityValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Names from `required` that have no value.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect()
    }

    /// All path-valued entities.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.iter()
            .filter_map(|(name, value)| value.as_path().map(|p| (name, p)))
    }
}
