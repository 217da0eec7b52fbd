//! Built-in Chinese command catalogue.
//!
//! Patterns run against normalized text (lowercase, single spaces, ASCII
//! punctuation), so they only spell `?`, `%`, `(` and friends in ASCII.
//!
//! | Priority | Kind of rule |
//! |----------|--------------|
//! | 90 | fixed conversational phrases |
//! | 80 | volume with an explicit level |
//! | 55–75 | specific verb + object forms |
//! | 20–40 | verb-only catch-alls (`打开 …`, `搜索 …`, `计算 …`) |
//! | < 0 | keyword rules with reduced confidence |

use super::rule::{PatternError, Rule};
use crate::intent::{Intent, SlotKind};

pub(super) fn builtin_rules() -> Result<Vec<Rule>, PatternError> {
    use Intent::*;
    use SlotKind::*;

    let rules = vec![
        // Conversation
        Rule::builder(
            "assistant.greeting",
            Greeting,
            r"^(?:你好|您好|嗨|哈喽|hello|hi|hey)(?:\s*addy)?[!。]?$",
        )
        .priority(90),
        Rule::builder(
            "assistant.time",
            GetTime,
            r"^(?:现在)?(?:几点了?|几点钟|什么时间|现在时间|当前时间)[?]?$",
        )
        .priority(90),
        Rule::builder(
            "assistant.exit",
            ExitAssistant,
            r"^(?:退出|再见|拜拜|exit|quit|bye)[!。]?$",
        )
        .priority(90),
        // Volume
        Rule::builder(
            "system.set_volume",
            SetVolume,
            r"^(?:设置|调整|调)音量(?:到|为|至|成)\s*(?P<level>[^\s%]+)\s*%?$",
        )
        .priority(80)
        .slot("level", Percentage),
        Rule::builder(
            "system.set_volume_subject",
            SetVolume,
            r"^(?:把)?音量(?:调到|调成|设为|设置为|设置到|调整到)\s*(?P<level>[^\s%]+)\s*%?$",
        )
        .priority(80)
        .slot("level", Percentage),
        Rule::builder(
            "system.get_volume",
            GetVolume,
            r"^(?:(?:当前|现在)的?)?音量(?:是)?多少[?]?$",
        )
        .priority(75),
        Rule::builder("system.get_volume_query", GetVolume, r"^(?:查看|获取|查询)音量$")
            .priority(75),
        // Power and session
        Rule::builder(
            "system.shutdown",
            ShutdownSystem,
            r"^(?:关机|关闭(?:电脑|计算机|系统))$",
        )
        .priority(75),
        Rule::builder(
            "system.restart",
            RestartSystem,
            r"^(?:重启|重新启动)(?:电脑|计算机|系统)?$",
        )
        .priority(75),
        Rule::builder("system.lock", LockScreen, r"^(?:锁屏|锁定(?:屏幕|电脑))$").priority(75),
        // Processes
        Rule::builder(
            "system.kill_process",
            KillProcess,
            r"^(?:结束|终止|杀死|关闭)进程(?:\s*(?P<process>\S+))?$",
        )
        .priority(75)
        .slot("process", Text),
        Rule::builder(
            "system.list_processes",
            ListProcesses,
            r"^(?:列出|查看|显示)(?:所有|运行中的|正在运行的)?进程(?:列表)?$",
        )
        .priority(75),
        Rule::builder(
            "system.info",
            GetSystemInfo,
            r"^(?:查看|显示|获取)?(?:系统信息|电脑信息|系统状态)$",
        )
        .priority(75),
        // Calendar
        Rule::builder(
            "calendar.create_event",
            CreateEvent,
            r"^(?:创建|添加|新建)(?:事件|日程|会议|活动)(?:\s*(?P<title>\S+)(?:\s+(?P<when>.+))?)?$",
        )
        .priority(70)
        .slot("title", Text)
        .optional_slot("when", DateTime),
        Rule::builder(
            "calendar.list_events",
            ListEvents,
            r"^(?:查看|显示|列出)?(?P<when>今天|明天|后天|昨天|\d{4}-\d{1,2}-\d{1,2})?的?(?:日程|事件|安排|会议)(?:列表)?$",
        )
        .priority(70)
        .optional_slot("when", DateTime),
        Rule::builder(
            "calendar.date_info",
            GetDateInfo,
            r"^(?P<when>今天|明天|后天|昨天|前天)?(?:是)?(?:几号|几月几号|星期几|周几|礼拜几|什么日子)[?]?$",
        )
        .priority(70)
        .optional_slot("when", DateTime),
        Rule::builder(
            "calendar.remind_me",
            SetReminder,
            r"^(?:(?P<when>.+?)\s*)?提醒我\s*(?P<content>.+)$",
        )
        .priority(68)
        .slot("content", Text)
        .optional_slot("when", DateTime),
        Rule::builder(
            "calendar.set_reminder",
            SetReminder,
            r"^(?:设置|添加|设定)(?:一个)?提醒\s*(?P<content>.+)$",
        )
        .priority(66)
        .slot("content", Text),
        // Weather
        Rule::builder(
            "weather.air_quality",
            GetAirQuality,
            r"^(?P<location>[^\s的]+?)?的?(?:空气质量|空气|pm2\.5|aqi)(?:怎么样|如何|指数)?[?]?$",
        )
        .priority(66)
        .optional_slot("location", Text),
        Rule::builder(
            "weather.forecast",
            GetWeatherForecast,
            r"^(?P<location>[^\s的未]+?)?的?(?:未来\s*(?P<days>\S+?)\s*天的?)?天气预报[?]?$",
        )
        .priority(64)
        .optional_slot("location", Text)
        .optional_slot("days", Integer),
        Rule::builder(
            "weather.day",
            GetWeather,
            r"^(?P<day>今天|明天|后天)的?天气(?:怎么样|如何|情况)?[?]?$",
        )
        .priority(63)
        .optional_slot("day", DateTime),
        Rule::builder(
            "weather.current",
            GetWeather,
            r"^(?P<location>[^\s的]+?)?的?(?P<day>今天|明天|后天)?的?天气(?:怎么样|如何|情况)?[?]?$",
        )
        .priority(62)
        .optional_slot("location", Text)
        .optional_slot("day", DateTime),
        // Temperature and units
        Rule::builder(
            "calc.temperature",
            ConvertTemperature,
            r"^(?:把)?\s*(?P<value>-?\d+(?:\.\d+)?)\s*(?:度)?\s*(?P<from_unit>摄氏度|华氏度|开尔文|℃|℉|c|f|k)\s*(?:转换成|转换为|换算成|转成|转为|等于多少|是多少)\s*(?P<to_unit>摄氏度|华氏度|开尔文|℃|℉|c|f|k)[?]?$",
        )
        .priority(65)
        .slot("value", Number)
        .slot("from_unit", Text)
        .slot("to_unit", Text),
        Rule::builder(
            "calc.unit",
            ConvertUnit,
            r"^(?:把)?\s*(?P<value>-?\d+(?:\.\d+)?)\s*(?P<from_unit>[^\d\s]+?)\s*(?:转换成|转换为|换算成|转成|转为|等于多少|是多少)\s*(?P<to_unit>[^\d\s?]+)[?]?$",
        )
        .priority(60)
        .slot("value", Number)
        .slot("from_unit", Text)
        .slot("to_unit", Text),
        // Files
        Rule::builder(
            "file.copy",
            CopyFile,
            r"^(?:复制|拷贝)(?:文件)?\s*(?P<source>\S+)\s*(?:到|至)\s*(?P<destination>\S+)$",
        )
        .priority(60)
        .slot("source", Path)
        .slot("destination", Path),
        Rule::builder(
            "file.move",
            MoveFile,
            r"^(?:移动|剪切)(?:文件)?\s*(?P<source>\S+)\s*(?:到|至)\s*(?P<destination>\S+)$",
        )
        .priority(60)
        .slot("source", Path)
        .slot("destination", Path),
        Rule::builder(
            "file.rename",
            RenameFile,
            r"^(?:重命名|改名)(?:文件)?\s*(?P<source>\S+)\s*(?:为|成)\s*(?P<new_name>\S+)$",
        )
        .priority(60)
        .slot("source", Path)
        .slot("new_name", Text),
        Rule::builder(
            "file.rename_ba",
            RenameFile,
            r"^把\s*(?P<source>\S+?)\s*(?:重命名|改名)(?:为|成)\s*(?P<new_name>\S+)$",
        )
        .priority(60)
        .slot("source", Path)
        .slot("new_name", Text),
        Rule::builder(
            "file.create_folder",
            CreateFolder,
            r"^(?:创建|新建)(?:文件夹|目录)\s*(?P<path>\S+)$",
        )
        .priority(58)
        .slot("path", Path),
        Rule::builder(
            "file.delete_folder",
            DeleteFolder,
            r"^删除(?:文件夹|目录)\s*(?P<path>\S+)$",
        )
        .priority(58)
        .slot("path", Path),
        Rule::builder("file.create", CreateFile, r"^(?:创建|新建)文件\s*(?P<path>\S+)$")
            .priority(55)
            .slot("path", Path),
        Rule::builder("file.delete", DeleteFile, r"^删除(?:文件)?\s*(?P<path>\S+)$")
            .priority(55)
            .slot("path", Path),
        Rule::builder("file.open", ReadFile, r"^打开文件\s*(?P<path>\S+)$")
            .priority(55)
            .slot("path", Path),
        Rule::builder(
            "file.search",
            SearchFiles,
            r"^(?:搜索|查找)文件\s*(?P<pattern>\S+)(?:\s+(?:在|于)\s*(?P<path>\S+))?$",
        )
        .priority(55)
        .slot("pattern", Text)
        .optional_slot("path", Path),
        Rule::builder("file.info", GetFileInfo, r"^(?:查看)?文件信息\s*(?P<path>\S+)$")
            .priority(55)
            .slot("path", Path),
        Rule::builder(
            "file.list",
            ListFiles,
            r"^(?:列出|显示|查看)(?:文件|文件列表)(?:\s+(?P<path>\S+))?$",
        )
        .priority(50)
        .optional_slot("path", Path),
        Rule::builder(
            "file.list_in",
            ListFiles,
            r"^(?:列出|显示|查看)\s*(?P<path>\S+?)\s*(?:目录|文件夹)?(?:下|中|里)的?(?:所有)?文件$",
        )
        .priority(50)
        .optional_slot("path", Path),
        Rule::builder("file.read", ReadFile, r"^(?:读取|阅读)(?:文件)?\s*(?P<path>\S+)$")
            .priority(50)
            .slot("path", Path),
        // Email
        Rule::builder(
            "email.search",
            SearchEmails,
            r"^(?:搜索|查找)邮件\s*(?P<query>.+)$",
        )
        .priority(56)
        .slot("query", Text),
        Rule::builder(
            "email.send",
            SendEmail,
            r"^(?:发送?邮件|发送电子邮件|写邮件)(?:给|到)\s*(?P<to>[^\s@]+@[^\s@]+\.\S+?)(?:\s+(?:主题|标题)\s*(?P<subject>\S+))?(?:\s+(?:内容|正文)\s*(?P<body>.+))?$",
        )
        .priority(55)
        .slot("to", Text)
        .optional_slot("subject", Text)
        .optional_slot("body", Text),
        Rule::builder(
            "email.send_bare",
            SendEmail,
            r"^(?:发送?邮件|发送电子邮件|写邮件)(?:给\s*(?P<to>\S+))?$",
        )
        .priority(54)
        .slot("to", Text),
        Rule::builder(
            "email.read",
            ReadEmails,
            r"^(?:查看|读取|检查|收)(?:一下)?(?:我的)?(?:新|未读|最新的?)?邮件$",
        )
        .priority(55),
        Rule::builder(
            "email.read_recent",
            ReadEmails,
            r"^(?:查看|读取)最近\s*(?P<count>\S+?)\s*封邮件$",
        )
        .priority(55)
        .slot("count", Integer),
        // Web
        Rule::builder(
            "web.download",
            DownloadFile,
            r"^下载\s*(?P<url>https?://\S+?)(?:\s*(?:到|至)\s*(?P<destination>\S+))?$",
        )
        .priority(55)
        .slot("url", Text)
        .optional_slot("destination", Path),
        Rule::builder(
            "web.check",
            CheckWebsite,
            r"^(?:检查|测试)(?:网站|网址|网页)\s*(?P<url>\S+)$",
        )
        .priority(55)
        .slot("url", Text),
        Rule::builder(
            "web.reachable",
            CheckWebsite,
            r"^(?:网站|网址)\s*(?P<url>\S+)\s*(?:能访问吗|可以访问吗|能打开吗)[?]?$",
        )
        .priority(55)
        .slot("url", Text),
        // Catch-alls
        Rule::builder(
            "calc.expression",
            Calculate,
            r"^(?:计算|算一下|算算|算)\s*(?P<expression>.+?)\s*(?:等于多少|是多少|等于几)?[?=]?$",
        )
        .priority(40)
        .slot("expression", Text),
        Rule::builder(
            "calc.bare",
            Calculate,
            r"^(?P<expression>[\d\s.+\-*/×÷()%^]+?)\s*(?:等于多少|等于几|是多少|=)\s*[?]?$",
        )
        .priority(40)
        .slot("expression", Text),
        Rule::builder(
            "system.open_application",
            OpenApplication,
            r"^(?:打开|启动|运行)\s*(?P<app>.+)$",
        )
        .priority(30)
        .slot("app", AppName),
        Rule::builder(
            "web.search",
            SearchWeb,
            r"^(?:搜索|百度|谷歌|google|搜一下|查一下|上网搜索?)(?:一下)?\s*(?P<query>.+)$",
        )
        .priority(20)
        .slot("query", Text),
        // Keywords
        Rule::builder("weather.keyword", GetWeather, r"天气")
            .priority(-5)
            .confidence(0.6),
        Rule::builder("email.keyword", ReadEmails, r"邮件")
            .priority(-5)
            .confidence(0.4),
        Rule::builder(
            "reminder.generic_set",
            SetReminder,
            r"^(?:设置|设定)\s*(?P<content>.+)$",
        )
        .priority(-10)
        .confidence(0.4)
        .slot("content", Text),
    ];

    rules.into_iter().map(|b| b.build()).collect()
}
