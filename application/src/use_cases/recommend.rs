//! Tool suggestions for commands that were not understood.

use addy_domain::ToolDescriptor;
use serde::Serialize;

/// Keyword → tool names. A keyword may point at several tools.
const KEYWORD_TOOLS: &[(&str, &[&str])] = &[
    ("文件", &["file"]),
    ("目录", &["file"]),
    ("复制", &["file"]),
    ("移动", &["file"]),
    ("重命名", &["file"]),
    ("创建", &["file", "calendar"]),
    ("删除", &["file", "calendar"]),
    ("系统", &["system"]),
    ("音量", &["system"]),
    ("声音", &["system"]),
    ("进程", &["system"]),
    ("内存", &["system"]),
    ("cpu", &["system"]),
    ("磁盘", &["system"]),
    ("关机", &["system"]),
    ("重启", &["system"]),
    ("打开", &["system"]),
    ("计算", &["calculator"]),
    ("等于", &["calculator"]),
    ("温度", &["calculator", "weather"]),
    ("转换", &["unit_conversion", "calculator"]),
    ("换算", &["unit_conversion"]),
    ("天气", &["weather"]),
    ("空气", &["weather"]),
    ("网络", &["web"]),
    ("网站", &["web"]),
    ("下载", &["web", "file"]),
    ("搜索", &["web", "file"]),
    ("查询", &["weather", "web", "system"]),
    ("邮件", &["email"]),
    ("发送", &["email"]),
    ("日历", &["calendar"]),
    ("日程", &["calendar"]),
    ("提醒", &["calendar"]),
    ("时间", &["calendar", "assistant"]),
];

/// A suggested tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub tool: String,
    pub description: String,
    pub confidence: f32,
}

/// Ranks registered tools by how many of their keywords occur in the text.
///
/// Ties keep registration order, so the output is deterministic.
#[derive(Debug, Clone)]
pub struct ToolRecommender {
    limit: usize,
    confidence: f32,
}

impl Default for ToolRecommender {
    fn default() -> Self {
        Self {
            limit: 5,
            confidence: 0.8,
        }
    }
}

impl ToolRecommender {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn recommend(&self, text: &str, descriptors: &[ToolDescriptor]) -> Vec<Recommendation> {
        let text = text.to_lowercase();
        let mut hits: Vec<(usize, &ToolDescriptor)> = descriptors
            .iter()
            .filter_map(|descriptor| {
                let count = KEYWORD_TOOLS
                    .iter()
                    .filter(|(keyword, tools)| {
                        text.contains(keyword) && tools.contains(&descriptor.name.as_str())
                    })
                    .count();
                (count > 0).then_some((count, descriptor))
            })
            .collect();

        // stable: equal counts keep registration order
        hits.sort_by(|a, b| b.0.cmp(&a.0));

        hits.into_iter()
            .take(self.limit)
            .map(|(_, descriptor)| Recommendation {
                tool: descriptor.name.clone(),
                description: descriptor.description.clone(),
                confidence: self.confidence,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<ToolDescriptor> {
        ["assistant", "file", "system", "calculator", "weather", "web", "email", "calendar"]
            .into_iter()
            .map(|name| ToolDescriptor::new(name, format!("{} tool", name)))
            .collect()
    }

    #[test]
    fn test_keyword_suggests_tool() {
        let recs = ToolRecommender::default().recommend("帮我弄一下音量", &descriptors());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].tool, "system");
        assert_eq!(recs[0].confidence, 0.8);
    }

    #[test]
    fn test_more_hits_rank_first() {
        let recs = ToolRecommender::default().recommend("下载 复制 文件", &descriptors());
        assert_eq!(recs[0].tool, "file");
        assert_eq!(recs[1].tool, "web");
    }

    #[test]
    fn test_unregistered_tools_are_not_suggested() {
        let only_file = vec![ToolDescriptor::new("file", "files")];
        let recs = ToolRecommender::default().recommend("天气怎么样呢", &only_file);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_limit_applies() {
        let recs = ToolRecommender::default()
            .with_limit(2)
            .recommend("查询 创建 删除 时间", &descriptors());
        assert_eq!(recs.len(), 2);
    }

    #[test]
    fn test_no_keyword_no_suggestion() {
        assert!(
            ToolRecommender::default()
                .recommend("asdfgh", &descriptors())
                .is_empty()
        );
    }
}
