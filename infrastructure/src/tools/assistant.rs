//! `assistant` tool — conversational intents.
//!
//! | Intent | Answer |
//! |--------|--------|
//! | `greeting` | a greeting |
//! | `get_time` | the local wall-clock time |
//! | `exit_assistant` | a farewell; `data.exit = true` tells the REPL to stop |

use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::json;

/// Canonical tool name.
pub const ASSISTANT: &str = "assistant";

pub struct AssistantTool {
    descriptor: ToolDescriptor,
}

impl AssistantTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(ASSISTANT, "对话: 问候、报时、退出助手").with_intents([
                Intent::Greeting,
                Intent::GetTime,
                Intent::ExitAssistant,
            ]),
        }
    }
}

impl Default for AssistantTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for AssistantTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        _entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        let result = match intent {
            Intent::Greeting => ExecutionResult::success("你好！有什么可以帮您的吗？"),
            Intent::GetTime => {
                let now = chrono::Local::now();
                ExecutionResult::success(format!("现在是{}", now.format("%H点%M分")))
                    .with_data(json!({ "time": now.format("%H:%M").to_string() }))
            }
            Intent::ExitAssistant => {
                ExecutionResult::success("再见！").with_data(json!({ "exit": true }))
            }
            other => ExecutionResult::rejected(format!("不支持的操作: {}", other)),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_greeting() {
        let result = AssistantTool::new()
            .execute(Intent::Greeting, &Entities::new(), "你好")
            .await
            .unwrap();
        assert!(result.is_success());
        assert!(!result.requests_exit());
    }

    #[tokio::test]
    async fn test_get_time_reports_clock() {
        let result = AssistantTool::new()
            .execute(Intent::GetTime, &Entities::new(), "现在几点")
            .await
            .unwrap();
        assert!(result.message.starts_with("现在是"));
        assert!(result.data.unwrap()["time"].as_str().unwrap().contains(':'));
    }

    #[tokio::test]
    async fn test_exit_sets_flag() {
        let result = AssistantTool::new()
            .execute(Intent::ExitAssistant, &Entities::new(), "再见")
            .await
            .unwrap();
        assert!(result.requests_exit());
    }

    #[tokio::test]
    async fn test_unsupported_intent_is_rejected() {
        let result = AssistantTool::new()
            .execute(Intent::Calculate, &Entities::new(), "")
            .await
            .unwrap();
        assert!(result.is_failure());
    }
}
