//! The capability interface every tool implements.

use async_trait::async_trait;

use super::entities::ToolDescriptor;
use super::value_objects::ToolError;
use crate::dispatch::ExecutionResult;
use crate::intent::{Entities, Intent};

/// A capability module that handles one or more intents.
///
/// Implementations validate their own entities: bad input is answered with
/// `Ok(ExecutionResult::failure(..))`, while `Err(ToolError)` is reserved for
/// faults the tool could not handle (I/O, HTTP, process errors).
///
/// Tools are shared behind `Arc` and may be called from any task; a tool with
/// internal mutable state serializes access to it itself.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &ToolDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn supports(&self, intent: Intent) -> bool {
        self.descriptor().supports(intent)
    }

    /// Execute `intent` with the parsed entities.
    ///
    /// `raw_text` is the original utterance, for tools that want to re-read it.
    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        raw_text: &str,
    ) -> Result<ExecutionResult, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::EntityValue;

    struct EchoTool {
        descriptor: ToolDescriptor,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                descriptor: ToolDescriptor::new("echo", "Echo tool").with_intent(Intent::Greeting),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }

        async fn execute(
            &self,
            intent: Intent,
            entities: &Entities,
            raw_text: &str,
        ) -> Result<ExecutionResult, ToolError> {
            if !self.supports(intent) {
                return Err(ToolError::invalid_argument(format!("unsupported {}", intent)));
            }
            let missing = entities.missing(&["name"]);
            if !missing.is_empty() {
                return Ok(ExecutionResult::missing_parameters(&missing));
            }
            Ok(ExecutionResult::success(raw_text))
        }
    }

    #[tokio::test]
    async fn test_tool_defaults_delegate_to_descriptor() {
        let tool = EchoTool::new();
        assert_eq!(tool.name(), "echo");
        assert!(tool.supports(Intent::Greeting));
        assert!(!tool.supports(Intent::GetTime));
    }

    #[tokio::test]
    async fn test_validation_failure_is_a_result_not_an_error() {
        let tool = EchoTool::new();
        let result = tool
            .execute(Intent::Greeting, &Entities::new(), "hi")
            .await
            .unwrap();
        assert!(result.is_failure());
        assert_eq!(result.message, "缺少必需的参数: name");
    }

    #[tokio::test]
    async fn test_execute_success() {
        let tool = EchoTool::new();
        let entities = Entities::new().with("name", EntityValue::Text("addy".into()));
        let result = tool.execute(Intent::Greeting, &entities, "hi").await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.message, "hi");

        assert!(tool.execute(Intent::GetTime, &entities, "").await.is_err());
    }
}
