//! Slot coercion — turning captured text into typed entity values.
//!
//! Every function here is pure: the same input always yields the same output,
//! and nothing reads the clock or the filesystem. A `None` return means the
//! text cannot be interpreted as the requested kind; the parser decides whether
//! that demotes the match or keeps the raw text.

use super::entity::{ClockTime, DateSpec, DateTimeSpec, EntityValue};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// How a captured slot is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Text,
    Integer,
    Number,
    Percentage,
    Path,
    DateTime,
    /// Application name, normalized through [`normalize_app_name`].
    AppName,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Text => "text",
            SlotKind::Integer => "integer",
            SlotKind::Number => "number",
            SlotKind::Percentage => "percentage",
            SlotKind::Path => "path",
            SlotKind::DateTime => "datetime",
            SlotKind::AppName => "app_name",
        }
    }

    /// Coerce captured text into a value of this kind.
    pub fn coerce(&self, raw: &str) -> Option<EntityValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            SlotKind::Text => Some(EntityValue::Text(raw.to_string())),
            SlotKind::Integer => parse_integer(raw).map(EntityValue::Integer),
            SlotKind::Number => parse_number(raw).map(EntityValue::Number),
            SlotKind::Percentage => parse_percentage(raw).map(EntityValue::Percentage),
            SlotKind::Path => parse_path(raw).map(EntityValue::Path),
            SlotKind::DateTime => parse_datetime(raw).map(EntityValue::DateTime),
            SlotKind::AppName => Some(EntityValue::Text(normalize_app_name(raw))),
        }
    }
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn chinese_digit(c: char) -> Option<i64> {
    Some(match c {
        '零' | '〇' => 0,
        '一' => 1,
        '二' | '两' => 2,
        '三' => 3,
        '四' => 4,
        '五' => 5,
        '六' => 6,
        '七' => 7,
        '八' => 8,
        '九' => 9,
        _ => return None,
    })
}

/// Parse a Chinese numeral such as `五十`, `一百二十`, `两千零五` or `三万`.
pub fn parse_chinese_numeral(s: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }

    let mut total: i64 = 0;
    let mut section: i64 = 0;
    let mut number: i64 = 0;
    let mut seen_digit = false;

    for c in s.chars() {
        if let Some(d) = chinese_digit(c) {
            number = d;
            seen_digit = true;
            continue;
        }
        let unit = match c {
            '十' => 10,
            '百' => 100,
            '千' => 1000,
            '万' => {
                section += number;
                total = total.checked_add(section.checked_mul(10_000)?)?;
                section = 0;
                number = 0;
                continue;
            }
            _ => return None,
        };
        // "十五" means fifteen
        if number == 0 && unit == 10 && !seen_digit {
            number = 1;
        }
        section += number * unit;
        number = 0;
        seen_digit = false;
    }

    Some(total + section + number)
}

/// Integer from ASCII digits (optionally signed) or a Chinese numeral.
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| parse_chinese_numeral(s))
}

/// Finite real number from ASCII notation or a Chinese integer numeral.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        Ok(_) => None,
        Err(_) => parse_chinese_numeral(s).map(|n| n as f64),
    }
}

/// Whole percentage in `0..=100`: `50`, `50%`, `百分之五十`.
pub fn parse_percentage(s: &str) -> Option<u8> {
    let s = s.trim();
    let body = s
        .strip_prefix("百分之")
        .or_else(|| s.strip_suffix('%'))
        .unwrap_or(s)
        .trim();
    let value = parse_integer(body)?;
    u8::try_from(value).ok().filter(|p| *p <= 100)
}

/// Path text with surrounding quotes removed.
pub fn parse_path(s: &str) -> Option<PathBuf> {
    let trimmed = s
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”' | '「' | '」'))
        .trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

static ISO_DATE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<y>\d{4})[-/](?P<m>\d{1,2})[-/](?P<d>\d{1,2})\s*").ok()
});

static CN_DATE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<y>\d{4})年)?(?P<m>[\d一二三四五六七八九十]{1,3})月(?P<d>[\d一二三四五六七八九十]{1,3})[日号]\s*")
        .ok()
});

static CLOCK_COLON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(?P<h>\d{1,2}):(?P<m>\d{2})$").ok());

static CLOCK_CN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?P<h>[\d零一二两三四五六七八九十]{1,3})点(?:(?P<half>半)|(?P<m>[\d零一二三四五六七八九十]{1,3})分?)?$")
        .ok()
});

const RELATIVE_DAYS: [(&str, i32); 6] = [
    ("大后天", 3),
    ("后天", 2),
    ("明天", 1),
    ("今天", 0),
    ("昨天", -1),
    ("前天", -2),
];

const DAY_PERIODS: [(&str, u32); 7] = [
    ("凌晨", 0),
    ("早上", 0),
    ("上午", 0),
    ("中午", 12),
    ("下午", 12),
    ("傍晚", 12),
    ("晚上", 12),
];

fn parse_date_prefix(s: &str) -> Option<(DateSpec, &str)> {
    for (word, days) in RELATIVE_DAYS {
        if let Some(rest) = s.strip_prefix(word) {
            return Some((DateSpec::Relative { days }, rest.trim_start()));
        }
    }

    for re in [ISO_DATE.as_ref(), CN_DATE.as_ref()].into_iter().flatten() {
        if let Some(caps) = re.captures(s) {
            let year = match caps.name("y") {
                Some(y) => Some(y.as_str().parse::<i32>().ok()?),
                None => None,
            };
            let month = u32::try_from(parse_integer(caps.name("m")?.as_str())?).ok()?;
            let day = u32::try_from(parse_integer(caps.name("d")?.as_str())?).ok()?;
            if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                return None;
            }
            let consumed = caps.get(0)?.end();
            return Some((DateSpec::Absolute { year, month, day }, &s[consumed..]));
        }
    }

    None
}

fn parse_clock(s: &str) -> Option<ClockTime> {
    let mut rest = s.trim();
    let mut offset = 0;
    for (word, add) in DAY_PERIODS {
        if let Some(r) = rest.strip_prefix(word) {
            rest = r.trim_start();
            offset = add;
            break;
        }
    }

    let (hour, minute) = if let Some(caps) = CLOCK_COLON.as_ref()?.captures(rest) {
        (
            caps.name("h")?.as_str().parse::<u32>().ok()?,
            caps.name("m")?.as_str().parse::<u32>().ok()?,
        )
    } else if let Some(caps) = CLOCK_CN.as_ref()?.captures(rest) {
        let hour = u32::try_from(parse_integer(caps.name("h")?.as_str())?).ok()?;
        let minute = if caps.name("half").is_some() {
            30
        } else {
            match caps.name("m") {
                Some(m) => u32::try_from(parse_integer(m.as_str())?).ok()?,
                None => 0,
            }
        };
        (hour, minute)
    } else {
        return None;
    };

    let hour = if offset == 12 && hour < 12 { hour + 12 } else { hour };
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(ClockTime { hour, minute })
}

/// Date and/or time: `明天`, `2025-03-09 15:30`, `3月9日 下午3点`, `晚上8点半`.
///
/// A bare time means today. The whole input must be consumed.
pub fn parse_datetime(s: &str) -> Option<DateTimeSpec> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (date, rest) = match parse_date_prefix(s) {
        Some((date, rest)) => (Some(date), rest.trim()),
        None => (None, s),
    };

    let time = if rest.is_empty() {
        None
    } else {
        Some(parse_clock(rest)?)
    };

    if date.is_none() && time.is_none() {
        return None;
    }

    Some(DateTimeSpec {
        date: date.unwrap_or(DateSpec::Relative { days: 0 }),
        time,
    })
}

const APP_ALIASES: [(&str, &str); 16] = [
    ("记事本", "notepad"),
    ("文本编辑器", "notepad"),
    ("计算器", "calculator"),
    ("浏览器", "browser"),
    ("谷歌浏览器", "chrome"),
    ("chrome", "chrome"),
    ("google chrome", "chrome"),
    ("edge", "edge"),
    ("微软浏览器", "edge"),
    ("火狐", "firefox"),
    ("火狐浏览器", "firefox"),
    ("firefox", "firefox"),
    ("word", "word"),
    ("excel", "excel"),
    ("终端", "terminal"),
    ("文件管理器", "file_manager"),
];

/// Map spoken application names onto canonical identifiers.
///
/// Unknown names pass through lowercased so the launcher can still try them.
pub fn normalize_app_name(s: &str) -> String {
    let needle = s.trim().to_lowercase();
    APP_ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, canonical)| (*canonical).to_string())
        .unwrap_or(needle)
}
