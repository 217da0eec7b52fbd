//! `calendar` tool — events, reminders and date questions.
//!
//! Events and reminders persist in a single JSON file. Symbolic dates from
//! the parser (`明天`, `5月1日`) are resolved against the local clock when a
//! command executes, never when it is parsed.
//!
//! Every operation re-reads the file under the store lock, so edits made
//! outside the assistant are picked up and concurrent commands cannot lose
//! each other's writes.

use addy_domain::{
    ClockTime, DateSpec, DateTimeSpec, Entities, ExecutionResult, Intent, Tool, ToolDescriptor,
    ToolError,
};
use async_trait::async_trait;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Canonical tool name.
pub const CALENDAR: &str = "calendar";

const DEFAULT_DURATION_MINUTES: u32 = 60;

const WEEKDAYS: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarToolConfig {
    pub data_file: PathBuf,
}

impl Default for CalendarToolConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("calendar.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub duration_minutes: u32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub completed: bool,
}

/// On-disk layout of the calendar file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarData {
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl CalendarData {
    fn next_id(&self, prefix: &str) -> String {
        let max = self
            .events
            .iter()
            .map(|e| e.id.as_str())
            .chain(self.reminders.iter().map(|r| r.id.as_str()))
            .filter_map(|id| id.strip_prefix(prefix)?.strip_prefix('-')?.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("{}-{}", prefix, max + 1)
    }

    /// Events on `date`, earliest first; all-day events lead.
    pub fn events_on(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        let mut events: Vec<_> = self.events.iter().filter(|e| e.date == date).collect();
        events.sort_by_key(|e| e.time);
        events
    }
}

/// Resolve a symbolic date against `today`.
pub fn resolve_date(spec: DateSpec, today: NaiveDate) -> Option<NaiveDate> {
    match spec {
        DateSpec::Relative { days } => today.checked_add_signed(Duration::days(i64::from(days))),
        DateSpec::Absolute { year, month, day } => {
            NaiveDate::from_ymd_opt(year.unwrap_or(today.year()), month, day)
        }
    }
}

fn resolve_time(time: Option<ClockTime>) -> Option<NaiveTime> {
    time.and_then(|t| NaiveTime::from_hms_opt(t.hour, t.minute, 0))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}

fn format_when(date: NaiveDate, time: Option<NaiveTime>) -> String {
    match time {
        Some(t) => format!("{} {}", format_date(date), t.format("%H:%M")),
        None => format_date(date),
    }
}

pub struct CalendarTool {
    descriptor: ToolDescriptor,
    config: CalendarToolConfig,
    clock: fn() -> NaiveDateTime,
    store: Mutex<()>,
}

impl CalendarTool {
    pub fn new(config: CalendarToolConfig) -> Self {
        Self::with_clock(config, || Local::now().naive_local())
    }

    pub fn with_clock(config: CalendarToolConfig, clock: fn() -> NaiveDateTime) -> Self {
        Self {
            descriptor: ToolDescriptor::new(CALENDAR, "日历: 创建日程、查看日程、设置提醒、日期查询")
                .with_intents([
                    Intent::CreateEvent,
                    Intent::ListEvents,
                    Intent::SetReminder,
                    Intent::GetDateInfo,
                ]),
            config,
            clock,
            store: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<CalendarData, ToolError> {
        let path = &self.config.data_file;
        if !fs::try_exists(path).await? {
            return Ok(CalendarData::default());
        }
        let raw = fs::read_to_string(path).await?;
        if raw.trim().is_empty() {
            return Ok(CalendarData::default());
        }
        serde_json::from_str(&raw).map_err(|e| {
            ToolError::execution_failed(format!("Corrupt calendar file {}: {}", path.display(), e))
        })
    }

    async fn save(&self, data: &CalendarData) -> Result<(), ToolError> {
        let path = &self.config.data_file;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| ToolError::execution_failed(format!("Failed to encode calendar: {}", e)))?;
        // atomic replace
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    fn target(&self, spec: Option<DateTimeSpec>) -> Option<(NaiveDate, Option<NaiveTime>)> {
        let spec = spec.unwrap_or_else(DateTimeSpec::today);
        let today = (self.clock)().date();
        Some((resolve_date(spec.date, today)?, resolve_time(spec.time)))
    }

    async fn create_event(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let Some(title) = entities.text("title").filter(|t| !t.trim().is_empty()) else {
            return Ok(ExecutionResult::missing_parameters(&["title"]));
        };
        let Some((date, time)) = self.target(entities.datetime("when")) else {
            return Ok(ExecutionResult::rejected("无效的日期"));
        };

        let _guard = self.store.lock().await;
        let mut data = self.load().await?;
        let event = CalendarEvent {
            id: data.next_id("evt"),
            title: title.trim().to_string(),
            date,
            time,
            duration_minutes: DEFAULT_DURATION_MINUTES,
            created_at: (self.clock)(),
        };
        data.events.push(event.clone());
        self.save(&data).await?;
        tracing::debug!(id = %event.id, "Calendar event stored");

        Ok(ExecutionResult::success(format!(
            "事件 '{}' 已添加到 {}",
            event.title,
            format_when(date, time)
        ))
        .with_data(json!(event)))
    }

    async fn list_events(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let Some((date, _)) = self.target(entities.datetime("when")) else {
            return Ok(ExecutionResult::rejected("无效的日期"));
        };

        let _guard = self.store.lock().await;
        let data = self.load().await?;
        let events = data.events_on(date);
        if events.is_empty() {
            return Ok(ExecutionResult::success(format!("{}没有安排日程", format_date(date)))
                .with_data(json!({ "date": date, "events": [] })));
        }

        let mut message = format!("{}的日程:", format_date(date));
        for (i, e) in events.iter().enumerate() {
            match e.time {
                Some(t) => message.push_str(&format!("\n{}. {} {}", i + 1, t.format("%H:%M"), e.title)),
                None => message.push_str(&format!("\n{}. 全天 {}", i + 1, e.title)),
            }
        }
        Ok(ExecutionResult::success(message).with_data(json!({ "date": date, "events": events })))
    }

    async fn set_reminder(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let Some(content) = entities.text("content").filter(|c| !c.trim().is_empty()) else {
            return Ok(ExecutionResult::missing_parameters(&["content"]));
        };
        let due = match entities.datetime("when") {
            Some(spec) => match self.target(Some(spec)) {
                Some((date, time)) => Some(date.and_time(time.unwrap_or(NaiveTime::MIN))),
                None => return Ok(ExecutionResult::rejected("无效的日期")),
            },
            None => None,
        };

        let _guard = self.store.lock().await;
        let mut data = self.load().await?;
        let reminder = Reminder {
            id: data.next_id("rem"),
            content: content.trim().to_string(),
            due,
            created_at: (self.clock)(),
            completed: false,
        };
        data.reminders.push(reminder.clone());
        self.save(&data).await?;

        let message = match due {
            Some(due) => format!(
                "提醒已设置: {} ({})",
                reminder.content,
                due.format("%Y年%m月%d日 %H:%M")
            ),
            None => format!("提醒已设置: {}", reminder.content),
        };
        Ok(ExecutionResult::success(message).with_data(json!(reminder)))
    }

    fn date_info(&self, entities: &Entities) -> ExecutionResult {
        let Some((date, _)) = self.target(entities.datetime("when")) else {
            return ExecutionResult::rejected("无效的日期");
        };
        let today = (self.clock)().date();
        let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
        let diff = (date - today).num_days();

        let relation = match diff {
            0 => "就是今天".to_string(),
            d if d > 0 => format!("距离今天还有 {} 天", d),
            d => format!("距离今天已过去 {} 天", -d),
        };
        ExecutionResult::success(format!(
            "{} {}，一年中的第 {} 天，{}",
            format_date(date),
            weekday,
            date.ordinal(),
            relation
        ))
        .with_data(json!({
            "date": date,
            "weekday": weekday,
            "day_of_year": date.ordinal(),
            "days_from_today": diff,
        }))
    }
}

#[async_trait]
impl Tool for CalendarTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        match intent {
            Intent::CreateEvent => self.create_event(entities).await,
            Intent::ListEvents => self.list_events(entities).await,
            Intent::SetReminder => self.set_reminder(entities).await,
            Intent::GetDateInfo => Ok(self.date_info(entities)),
            other => Ok(ExecutionResult::rejected(format!("不支持的日历操作: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addy_domain::EntityValue;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn tool(dir: &std::path::Path) -> CalendarTool {
        CalendarTool::with_clock(
            CalendarToolConfig {
                data_file: dir.join("calendar.json"),
            },
            fixed_now,
        )
    }

    fn when(days: i32, time: Option<(u32, u32)>) -> EntityValue {
        EntityValue::DateTime(DateTimeSpec {
            date: DateSpec::Relative { days },
            time: time.map(|(hour, minute)| ClockTime { hour, minute }),
        })
    }

    #[test]
    fn test_resolve_date() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(
            resolve_date(DateSpec::Relative { days: 1 }, today),
            NaiveDate::from_ymd_opt(2026, 1, 1)
        );
        assert_eq!(
            resolve_date(
                DateSpec::Absolute {
                    year: None,
                    month: 2,
                    day: 14
                },
                today
            ),
            NaiveDate::from_ymd_opt(2025, 2, 14)
        );
        assert_eq!(
            resolve_date(
                DateSpec::Absolute {
                    year: Some(2025),
                    month: 2,
                    day: 30
                },
                today
            ),
            None
        );
    }

    #[tokio::test]
    async fn test_create_and_list_events() {
        let dir = tempfile::tempdir().unwrap();
        let tool = tool(dir.path());

        let meeting = Entities::new()
            .with("title", EntityValue::Text("周会".into()))
            .with("when", when(1, Some((10, 0))));
        let result = tool.execute(Intent::CreateEvent, &meeting, "").await.unwrap();
        assert_eq!(result.message, "事件 '周会' 已添加到 2025年05月02日 10:00");

        let all_day = Entities::new()
            .with("title", EntityValue::Text("出差".into()))
            .with("when", when(1, None));
        tool.execute(Intent::CreateEvent, &all_day, "").await.unwrap();

        let list = tool
            .execute(Intent::ListEvents, &Entities::new().with("when", when(1, None)), "")
            .await
            .unwrap();
        assert_eq!(list.message, "2025年05月02日的日程:\n1. 全天 出差\n2. 10:00 周会");

        let today = tool.execute(Intent::ListEvents, &Entities::new(), "").await.unwrap();
        assert_eq!(today.message, "2025年05月01日没有安排日程");
    }

    #[tokio::test]
    async fn test_events_persist_with_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let entities = Entities::new().with("title", EntityValue::Text("A".into()));
        tool(dir.path()).execute(Intent::CreateEvent, &entities, "").await.unwrap();
        tool(dir.path()).execute(Intent::CreateEvent, &entities, "").await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("calendar.json")).unwrap();
        let data: CalendarData = serde_json::from_str(&raw).unwrap();
        let ids: Vec<_> = data.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["evt-1", "evt-2"]);
    }

    #[tokio::test]
    async fn test_set_reminder() {
        let dir = tempfile::tempdir().unwrap();
        let entities = Entities::new()
            .with("content", EntityValue::Text("开会".into()))
            .with("when", when(0, Some((15, 0))));
        let result = tool(dir.path())
            .execute(Intent::SetReminder, &entities, "")
            .await
            .unwrap();
        assert_eq!(result.message, "提醒已设置: 开会 (2025年05月01日 15:00)");

        let bare = Entities::new().with("content", EntityValue::Text("喝水".into()));
        let result = tool(dir.path())
            .execute(Intent::SetReminder, &bare, "")
            .await
            .unwrap();
        assert_eq!(result.message, "提醒已设置: 喝水");
        assert_eq!(result.data.unwrap()["id"], "rem-2");
    }

    #[tokio::test]
    async fn test_date_info() {
        let dir = tempfile::tempdir().unwrap();
        let result = tool(dir.path())
            .execute(Intent::GetDateInfo, &Entities::new().with("when", when(2, None)), "")
            .await
            .unwrap();
        assert_eq!(
            result.message,
            "2025年05月03日 周六，一年中的第 123 天，距离今天还有 2 天"
        );
    }

    #[tokio::test]
    async fn test_missing_title() {
        let dir = tempfile::tempdir().unwrap();
        let result = tool(dir.path())
            .execute(Intent::CreateEvent, &Entities::new(), "")
            .await
            .unwrap();
        assert_eq!(result.message, "缺少必需的参数: title");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_fault() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("calendar.json"), "{not json").unwrap();
        let err = tool(dir.path())
            .execute(Intent::ListEvents, &Entities::new(), "")
            .await
            .unwrap_err();
        assert_eq!(err.code, "EXECUTION_FAILED");
    }
}
