//! The closed set of intents the assistant understands.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Symbolic action a command maps to.
///
/// The set is closed: patterns, tools and the security policy all refer to
/// these variants, never to free-form strings. The snake_case name returned by
/// [`Intent::as_str`] is the stable identifier used in configuration files and
/// structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    // Conversation
    Greeting,
    GetTime,
    ExitAssistant,

    // Files
    CreateFile,
    CreateFolder,
    DeleteFile,
    DeleteFolder,
    CopyFile,
    MoveFile,
    RenameFile,
    ListFiles,
    ReadFile,
    SearchFiles,
    GetFileInfo,

    // System
    GetSystemInfo,
    ListProcesses,
    KillProcess,
    ShutdownSystem,
    RestartSystem,
    LockScreen,
    SetVolume,
    GetVolume,
    OpenApplication,

    // Calculation
    Calculate,
    ConvertTemperature,
    ConvertUnit,

    // Weather
    GetWeather,
    GetWeatherForecast,
    GetAirQuality,

    // Web
    SearchWeb,
    DownloadFile,
    CheckWebsite,

    // Email
    SendEmail,
    ReadEmails,
    SearchEmails,

    // Calendar
    CreateEvent,
    ListEvents,
    SetReminder,
    GetDateInfo,
}

impl Intent {
    /// Every intent, in declaration order.
    pub const ALL: [Intent; 39] = [
        Intent::Greeting,
        Intent::GetTime,
        Intent::ExitAssistant,
        Intent::CreateFile,
        Intent::CreateFolder,
        Intent::DeleteFile,
        Intent::DeleteFolder,
        Intent::CopyFile,
        Intent::MoveFile,
        Intent::RenameFile,
        Intent::ListFiles,
        Intent::ReadFile,
        Intent::SearchFiles,
        Intent::GetFileInfo,
        Intent::GetSystemInfo,
        Intent::ListProcesses,
        Intent::KillProcess,
        Intent::ShutdownSystem,
        Intent::RestartSystem,
        Intent::LockScreen,
        Intent::SetVolume,
        Intent::GetVolume,
        Intent::OpenApplication,
        Intent::Calculate,
        Intent::ConvertTemperature,
        Intent::ConvertUnit,
        Intent::GetWeather,
        Intent::GetWeatherForecast,
        Intent::GetAirQuality,
        Intent::SearchWeb,
        Intent::DownloadFile,
        Intent::CheckWebsite,
        Intent::SendEmail,
        Intent::ReadEmails,
        Intent::SearchEmails,
        Intent::CreateEvent,
        Intent::ListEvents,
        Intent::SetReminder,
        Intent::GetDateInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::GetTime => "get_time",
            Intent::ExitAssistant => "exit_assistant",
            Intent::CreateFile => "create_file",
            Intent::CreateFolder => "create_folder",
            Intent::DeleteFile => "delete_file",
            Intent::DeleteFolder => "delete_folder",
            Intent::CopyFile => "copy_file",
            Intent::MoveFile => "move_file",
            Intent::RenameFile => "rename_file",
            Intent::ListFiles => "list_files",
            Intent::ReadFile => "read_file",
            Intent::SearchFiles => "search_files",
            Intent::GetFileInfo => "get_file_info",
            Intent::GetSystemInfo => "get_system_info",
            Intent::ListProcesses => "list_processes",
            Intent::KillProcess => "kill_process",
            Intent::ShutdownSystem => "shutdown_system",
            Intent::RestartSystem => "restart_system",
            Intent::LockScreen => "lock_screen",
            Intent::SetVolume => "set_volume",
            Intent::GetVolume => "get_volume",
            Intent::OpenApplication => "open_application",
            Intent::Calculate => "calculate",
            Intent::ConvertTemperature => "convert_temperature",
            Intent::ConvertUnit => "convert_unit",
            Intent::GetWeather => "get_weather",
            Intent::GetWeatherForecast => "get_weather_forecast",
            Intent::GetAirQuality => "get_air_quality",
            Intent::SearchWeb => "search_web",
            Intent::DownloadFile => "download_file",
            Intent::CheckWebsite => "check_website",
            Intent::SendEmail => "send_email",
            Intent::ReadEmails => "read_emails",
            Intent::SearchEmails => "search_emails",
            Intent::CreateEvent => "create_event",
            Intent::ListEvents => "list_events",
            Intent::SetReminder => "set_reminder",
            Intent::GetDateInfo => "get_date_info",
        }
    }

    /// Short user-facing label, used in confirmation prompts and listings.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Greeting => "问候",
            Intent::GetTime => "查询时间",
            Intent::ExitAssistant => "退出助手",
            Intent::CreateFile => "创建文件",
            Intent::CreateFolder => "创建文件夹",
            Intent::DeleteFile => "删除文件",
            Intent::DeleteFolder => "删除文件夹",
            Intent::CopyFile => "复制文件",
            Intent::MoveFile => "移动文件",
            Intent::RenameFile => "重命名文件",
            Intent::ListFiles => "列出文件",
            Intent::ReadFile => "读取文件",
            Intent::SearchFiles => "搜索文件",
            Intent::GetFileInfo => "文件信息",
            Intent::GetSystemInfo => "系统信息",
            Intent::ListProcesses => "列出进程",
            Intent::KillProcess => "结束进程",
            Intent::ShutdownSystem => "关机",
            Intent::RestartSystem => "重启",
            Intent::LockScreen => "锁屏",
            Intent::SetVolume => "设置音量",
            Intent::GetVolume => "查询音量",
            Intent::OpenApplication => "打开应用",
            Intent::Calculate => "计算",
            Intent::ConvertTemperature => "温度换算",
            Intent::ConvertUnit => "单位换算",
            Intent::GetWeather => "天气",
            Intent::GetWeatherForecast => "天气预报",
            Intent::GetAirQuality => "空气质量",
            Intent::SearchWeb => "网页搜索",
            Intent::DownloadFile => "下载文件",
            Intent::CheckWebsite => "检查网站",
            Intent::SendEmail => "发送邮件",
            Intent::ReadEmails => "查看邮件",
            Intent::SearchEmails => "搜索邮件",
            Intent::CreateEvent => "创建日程",
            Intent::ListEvents => "查看日程",
            Intent::SetReminder => "设置提醒",
            Intent::GetDateInfo => "日期信息",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a string names no known intent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent: {0}")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
    type Err = UnknownIntent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == needle)
            .ok_or_else(|| UnknownIntent(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_names_are_unique() {
        let names: HashSet<_> = Intent::ALL.iter().map(|i| i.as_str()).collect();
        assert_eq!(names.len(), Intent::ALL.len());
    }

    #[test]
    fn test_from_str_roundtrip() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>().unwrap(), intent);
        }
        assert_eq!(" Delete_File ".parse::<Intent>().unwrap(), Intent::DeleteFile);
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "make_coffee".parse::<Intent>().unwrap_err();
        assert_eq!(err.to_string(), "unknown intent: make_coffee");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Intent::SetVolume).unwrap();
        assert_eq!(json, "\"set_volume\"");
        let back: Intent = serde_json::from_str("\"shutdown_system\"").unwrap();
        assert_eq!(back, Intent::ShutdownSystem);
    }
}
