//! Dispatch Command use case.
//!
//! The orchestrator: one utterance in, one [`ExecutionResult`] out.
//!
//! # Flow
//!
//! ```text
//! Received ──parse──▶ Parsed ──policy──▶ SecurityChecked ──▶ [AwaitingConfirmation]
//!                        │                     │                    │
//!                        ▼                     ▼                    ▼
//!                    Rejected ◀────────── Rejected ◀────────── Rejected
//!
//! SecurityChecked / AwaitingConfirmation ──resolve──▶ Dispatched ──tool──▶ Completed
//! ```
//!
//! Every short-circuit is a [`DispatchError`]; [`DispatchError::into_result`]
//! is the only place that turns one into the user-facing result. Faults inside
//! a tool (an `Err`, a panic, a timeout) are caught at the invocation boundary
//! and never reach the caller.
//!
//! Commands are serialized through a turn gate: while one command waits for
//! confirmation no other command is dispatched.

use crate::config::DispatchConfig;
use crate::ports::command_logger::{CommandEvent, CommandLogger, NoCommandLogger};
use crate::ports::confirmation::ConfirmationPort;
use crate::ports::tool_registry::ToolRegistryPort;
use crate::use_cases::recommend::ToolRecommender;
use addy_domain::{
    CommandPhase, ExecutionResult, ExecutionStatus, FailureKind, Intent, IntentParser,
    ParseError, ParsedCommand, PolicyDecision, SecurityPolicy, Tool, ToolError,
};
use futures::FutureExt;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Why a command did not reach (or did not survive) its tool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("no rule matched '{0}'")]
    NoMatch(String),

    #[error("{} matched with confidence {:.2}, below floor {:.2}", .intent, .confidence, .floor)]
    LowConfidence {
        intent: Intent,
        confidence: f32,
        floor: f32,
    },

    #[error("{} is missing required parameters: {}", .intent, .missing.join(", "))]
    Incomplete { intent: Intent, missing: Vec<String> },

    #[error("{} denied: {} is under a restricted path", .intent, .path.display())]
    PolicyDenied { intent: Intent, path: PathBuf },

    #[error("{} not confirmed (timed out: {})", .intent, .timed_out)]
    ConfirmationDeclined { intent: Intent, timed_out: bool },

    #[error("no tool handles intent {0}")]
    UnresolvedIntent(Intent),

    #[error("tool '{}' faulted on {}: {}", .tool, .intent, .cause)]
    ToolFault {
        tool: String,
        intent: Intent,
        cause: String,
    },
}

impl From<ParseError> for DispatchError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::NoMatch(text) => DispatchError::NoMatch(text),
        }
    }
}

impl DispatchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DispatchError::NoMatch(_) => FailureKind::NoMatch,
            DispatchError::LowConfidence { .. } => FailureKind::LowConfidence,
            DispatchError::Incomplete { .. } => FailureKind::Incomplete,
            DispatchError::PolicyDenied { .. } => FailureKind::PolicyDenied,
            DispatchError::ConfirmationDeclined { .. } => FailureKind::ConfirmationDeclined,
            DispatchError::UnresolvedIntent(_) => FailureKind::UnresolvedIntent,
            DispatchError::ToolFault { .. } => FailureKind::ToolFault,
        }
    }

    pub fn intent(&self) -> Option<Intent> {
        match self {
            DispatchError::NoMatch(_) => None,
            DispatchError::LowConfidence { intent, .. }
            | DispatchError::Incomplete { intent, .. }
            | DispatchError::PolicyDenied { intent, .. }
            | DispatchError::ConfirmationDeclined { intent, .. }
            | DispatchError::UnresolvedIntent(intent)
            | DispatchError::ToolFault { intent, .. } => Some(*intent),
        }
    }

    /// User-facing result for this error.
    ///
    /// `ToolFault` keeps the underlying cause in `cause`; the message stays
    /// generic.
    pub fn into_result(self) -> ExecutionResult {
        let kind = self.kind();
        match self {
            DispatchError::NoMatch(_) => {
                ExecutionResult::failure(kind, "抱歉，我没有理解这个命令")
            }
            DispatchError::LowConfidence { .. } => {
                ExecutionResult::failure(kind, "抱歉，我不太确定您的意思，请换个说法再试一次")
            }
            DispatchError::Incomplete { missing, .. } => {
                ExecutionResult::failure(kind, format!("缺少必需的参数: {}", missing.join(", ")))
                    .with_data(json!({ "missing": missing }))
            }
            DispatchError::PolicyDenied { path, .. } => ExecutionResult::failure(
                kind,
                format!("操作被拒绝: 无权访问受限路径 {}", path.display()),
            )
            .with_data(json!({ "path": path.display().to_string() })),
            DispatchError::ConfirmationDeclined {
                timed_out: true, ..
            } => ExecutionResult::failure(kind, "确认超时，操作已取消"),
            DispatchError::ConfirmationDeclined { .. } => {
                ExecutionResult::failure(kind, "操作已取消")
            }
            DispatchError::UnresolvedIntent(intent) => {
                ExecutionResult::failure(kind, "没有可以处理该命令的工具")
                    .with_data(json!({ "intent": intent.as_str() }))
            }
            DispatchError::ToolFault { cause, .. } => {
                ExecutionResult::failure(kind, "执行命令时发生内部错误").with_cause(cause)
            }
        }
    }

    /// Misrecognition is routine; a registry gap is a configuration defect
    /// and is logged louder than anything the user can cause.
    fn log(&self, command_id: u64) {
        let kind = self.kind().as_str();
        match self {
            DispatchError::NoMatch(_)
            | DispatchError::LowConfidence { .. }
            | DispatchError::Incomplete { .. } => {
                info!(command_id, kind, "Command rejected: {}", self);
            }
            DispatchError::PolicyDenied { .. } | DispatchError::ConfirmationDeclined { .. } => {
                warn!(command_id, kind, "Command rejected: {}", self);
            }
            DispatchError::UnresolvedIntent(intent) => {
                error!(
                    command_id,
                    kind,
                    intent = intent.as_str(),
                    config_defect = true,
                    "No tool registered for intent: {}",
                    self
                );
            }
            DispatchError::ToolFault { tool, cause, .. } => {
                error!(command_id, kind, tool = %tool, cause = %cause, "Tool fault: {}", self);
            }
        }
    }
}

/// Walks one command through [`CommandPhase`] and records every step.
struct PhaseTracker<'a> {
    command_id: u64,
    phase: CommandPhase,
    logger: &'a dyn CommandLogger,
}

impl<'a> PhaseTracker<'a> {
    fn new(command_id: u64, logger: &'a dyn CommandLogger) -> Self {
        Self {
            command_id,
            phase: CommandPhase::Received,
            logger,
        }
    }

    fn advance(&mut self, next: CommandPhase) {
        if !self.phase.can_transition_to(next) {
            warn!(
                command_id = self.command_id,
                from = self.phase.as_str(),
                to = next.as_str(),
                "Unexpected phase transition"
            );
        }
        debug!(
            command_id = self.command_id,
            from = self.phase.as_str(),
            to = next.as_str(),
            "Phase transition"
        );
        self.logger.log(CommandEvent::new(
            "phase",
            json!({
                "command_id": self.command_id,
                "from": self.phase.as_str(),
                "to": next.as_str(),
            }),
        ));
        self.phase = next;
    }

    /// Terminal phase for a failed command.
    fn reject(&mut self) {
        let next = if self.phase.can_transition_to(CommandPhase::Rejected) {
            CommandPhase::Rejected
        } else {
            // tool faults happen after dispatch; the command still completes
            CommandPhase::Completed
        };
        self.advance(next);
    }
}

/// Use case for dispatching one command.
///
/// Holds read-only collaborators only: the parser, the registry and the
/// policy are shared and never mutated after assembly.
pub struct DispatchCommandUseCase {
    parser: Arc<IntentParser>,
    registry: Arc<dyn ToolRegistryPort>,
    policy: Arc<SecurityPolicy>,
    confirmation: Arc<dyn ConfirmationPort>,
    config: DispatchConfig,
    recommender: ToolRecommender,
    command_logger: Arc<dyn CommandLogger>,
    turn: Mutex<()>,
    sequence: AtomicU64,
}

impl DispatchCommandUseCase {
    pub fn new(
        parser: Arc<IntentParser>,
        registry: Arc<dyn ToolRegistryPort>,
        policy: Arc<SecurityPolicy>,
        confirmation: Arc<dyn ConfirmationPort>,
    ) -> Self {
        Self {
            parser,
            registry,
            policy,
            confirmation,
            config: DispatchConfig::default(),
            recommender: ToolRecommender::default(),
            command_logger: Arc::new(NoCommandLogger),
            turn: Mutex::new(()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Create with a command audit logger.
    pub fn with_command_logger(mut self, logger: Arc<dyn CommandLogger>) -> Self {
        self.command_logger = logger;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Parse without dispatching.
    pub fn parse(&self, text: &str) -> Result<ParsedCommand, ParseError> {
        self.parser.parse(text)
    }

    /// Parse, authorize and dispatch `text`.
    ///
    /// Never fails: every outcome, including tool faults, is an
    /// [`ExecutionResult`].
    pub async fn execute(&self, text: &str) -> ExecutionResult {
        let _turn = self.turn.lock().await;
        let command_id = self.next_command_id();
        let mut tracker = PhaseTracker::new(command_id, self.command_logger.as_ref());
        info!(command_id, text, "Command received");

        let (intent, outcome) = match self.recognize(text, &mut tracker) {
            Ok(command) => (
                Some(command.intent),
                self.authorize_and_dispatch(command, &mut tracker, true).await,
            ),
            Err(err) => (None, Err(err)),
        };
        self.finish(&mut tracker, text, intent, outcome)
    }

    /// Dispatch a command whose confirmation the caller already obtained.
    ///
    /// Used after a deferred `needs_confirmation` result. The policy runs
    /// again, so a restricted path is still denied; only the confirmation
    /// round-trip is skipped.
    pub async fn execute_confirmed(&self, command: ParsedCommand) -> ExecutionResult {
        let _turn = self.turn.lock().await;
        let command_id = self.next_command_id();
        let mut tracker = PhaseTracker::new(command_id, self.command_logger.as_ref());
        info!(command_id, intent = command.intent.as_str(), "Confirmed command received");

        let text = command.raw_text.clone();
        let intent = command.intent;
        tracker.advance(CommandPhase::Parsed);
        let outcome = match self.validate(&command) {
            Ok(()) => self.authorize_and_dispatch(command, &mut tracker, false).await,
            Err(err) => Err(err),
        };
        self.finish(&mut tracker, &text, Some(intent), outcome)
    }

    fn next_command_id(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn recognize(
        &self,
        text: &str,
        tracker: &mut PhaseTracker<'_>,
    ) -> Result<ParsedCommand, DispatchError> {
        let parsed = self.parser.parse(text);
        tracker.advance(CommandPhase::Parsed);
        let command = parsed?;

        debug!(
            command_id = tracker.command_id,
            intent = command.intent.as_str(),
            rule = %command.rule_id,
            confidence = command.confidence,
            "Command parsed"
        );
        self.validate(&command)?;
        Ok(command)
    }

    fn validate(&self, command: &ParsedCommand) -> Result<(), DispatchError> {
        if command.confidence < self.config.confidence_floor {
            return Err(DispatchError::LowConfidence {
                intent: command.intent,
                confidence: command.confidence,
                floor: self.config.confidence_floor,
            });
        }
        if !command.is_complete() {
            return Err(DispatchError::Incomplete {
                intent: command.intent,
                missing: command.missing.clone(),
            });
        }
        Ok(())
    }

    async fn authorize_and_dispatch(
        &self,
        command: ParsedCommand,
        tracker: &mut PhaseTracker<'_>,
        ask: bool,
    ) -> Result<ExecutionResult, DispatchError> {
        let decision = self.policy.classify(command.intent, &command.entities);
        tracker.advance(CommandPhase::SecurityChecked);
        debug!(
            command_id = tracker.command_id,
            intent = command.intent.as_str(),
            decision = decision.as_str(),
            "Security check"
        );

        match decision {
            PolicyDecision::Denied { path, .. } => {
                return Err(DispatchError::PolicyDenied {
                    intent: command.intent,
                    path,
                });
            }
            PolicyDecision::RequiresConfirmation { prompt } if ask => {
                tracker.advance(CommandPhase::AwaitingConfirmation);
                if self.config.defers_confirmation() {
                    info!(
                        command_id = tracker.command_id,
                        intent = command.intent.as_str(),
                        "Confirmation deferred to caller"
                    );
                    let data = json!({
                        "command": serde_json::to_value(&command).unwrap_or_default(),
                        "prompt": prompt,
                    });
                    return Ok(ExecutionResult::needs_confirmation(prompt).with_data(data));
                }
                self.confirm(&command, &prompt).await?;
            }
            PolicyDecision::RequiresConfirmation { .. } | PolicyDecision::Allowed => {}
        }

        let tool = self
            .registry
            .resolve(command.intent)
            .ok_or(DispatchError::UnresolvedIntent(command.intent))?;

        tracker.advance(CommandPhase::Dispatched);
        self.invoke(tool, &command, tracker.command_id).await
    }

    async fn confirm(&self, command: &ParsedCommand, prompt: &str) -> Result<(), DispatchError> {
        let declined = |timed_out| DispatchError::ConfirmationDeclined {
            intent: command.intent,
            timed_out,
        };

        let answer = tokio::time::timeout(
            self.config.confirmation_timeout,
            self.confirmation.confirm(command, prompt),
        )
        .await;

        match answer {
            Ok(Ok(true)) => {
                info!(intent = command.intent.as_str(), "Confirmation accepted");
                Ok(())
            }
            Ok(Ok(false)) => Err(declined(false)),
            Ok(Err(e)) => {
                warn!(intent = command.intent.as_str(), error = %e, "Confirmation failed, treating as decline");
                Err(declined(false))
            }
            Err(_) => Err(declined(true)),
        }
    }

    async fn invoke(
        &self,
        tool: Arc<dyn Tool>,
        command: &ParsedCommand,
        command_id: u64,
    ) -> Result<ExecutionResult, DispatchError> {
        let fault = |cause: String| DispatchError::ToolFault {
            tool: tool.name().to_string(),
            intent: command.intent,
            cause,
        };

        debug!(
            command_id,
            tool = tool.name(),
            intent = command.intent.as_str(),
            "Invoking tool"
        );

        let call = AssertUnwindSafe(tool.execute(
            command.intent,
            &command.entities,
            &command.raw_text,
        ))
        .catch_unwind();

        let outcome = match self.config.tool_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let err = ToolError::timeout(tool.name())
                        .with_details(format!("after {:.1}s", limit.as_secs_f64()));
                    return Err(fault(err.to_string()));
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(Ok(result)) => Ok(normalize_tool_result(result)),
            Ok(Err(e)) => Err(fault(e.to_string())),
            Err(payload) => Err(fault(format!("panicked: {}", panic_message(payload.as_ref())))),
        }
    }

    fn finish(
        &self,
        tracker: &mut PhaseTracker<'_>,
        text: &str,
        intent: Option<Intent>,
        outcome: Result<ExecutionResult, DispatchError>,
    ) -> ExecutionResult {
        let (result, intent) = match outcome {
            Ok(result) => {
                if tracker.phase == CommandPhase::Dispatched {
                    tracker.advance(CommandPhase::Completed);
                }
                info!(
                    command_id = tracker.command_id,
                    status = result.status.as_str(),
                    "Command finished"
                );
                (result, intent)
            }
            Err(err) => {
                err.log(tracker.command_id);
                tracker.reject();
                let intent = err.intent().or(intent);
                let suggest = err.kind().is_misrecognition();
                let mut result = err.into_result();
                if suggest {
                    let suggestions = self
                        .recommender
                        .recommend(text, &self.registry.descriptors());
                    if !suggestions.is_empty() {
                        result = result.with_data(json!({
                            "suggestions": serde_json::to_value(&suggestions).unwrap_or_default(),
                        }));
                    }
                }
                (result, intent)
            }
        };

        self.command_logger.log(CommandEvent::new(
            "command_result",
            json!({
                "command_id": tracker.command_id,
                "text": text,
                "intent": intent.map(|i| i.as_str()),
                "phase": tracker.phase.as_str(),
                "result": serde_json::to_value(&result).unwrap_or_default(),
            }),
        ));
        result
    }
}

/// A tool that builds a failure by hand may leave the kind unset.
fn normalize_tool_result(mut result: ExecutionResult) -> ExecutionResult {
    if result.status == ExecutionStatus::Failure && result.failure.is_none() {
        result.failure = Some(FailureKind::ToolFailure);
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::confirmation::{
        AutoApproveConfirmation, AutoDeclineConfirmation, ConfirmationError,
    };
    use addy_domain::{Entities, EntityValue, PatternLibrary, ToolDescriptor, ToolError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    // ==================== Test doubles ====================

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Reject,
        Fault,
        Panic,
        Sleep(Duration),
    }

    struct SpyTool {
        descriptor: ToolDescriptor,
        behavior: Behavior,
        calls: AtomicUsize,
        last_entities: StdMutex<Option<Entities>>,
    }

    impl SpyTool {
        fn new(name: &str, intents: &[Intent], behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                descriptor: ToolDescriptor::new(name, format!("{} spy", name))
                    .with_intents(intents.iter().copied()),
                behavior,
                calls: AtomicUsize::new(0),
                last_entities: StdMutex::new(None),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Tool for SpyTool {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }

        async fn execute(
            &self,
            intent: Intent,
            entities: &Entities,
            _raw_text: &str,
        ) -> Result<ExecutionResult, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_entities.lock().unwrap() = Some(entities.clone());
            match self.behavior {
                Behavior::Succeed => Ok(ExecutionResult::success(format!("{} done", intent))),
                Behavior::Reject => Ok(ExecutionResult::rejected("bad input")),
                Behavior::Fault => Err(ToolError::execution_failed("disk on fire")),
                Behavior::Panic => panic!("tool exploded"),
                Behavior::Sleep(duration) => {
                    tokio::time::sleep(duration).await;
                    Ok(ExecutionResult::success("slow"))
                }
            }
        }
    }

    #[derive(Default)]
    struct MockRegistry {
        tools: HashMap<Intent, Arc<dyn Tool>>,
        order: Vec<ToolDescriptor>,
    }

    impl MockRegistry {
        fn with(mut self, tool: Arc<dyn Tool>) -> Self {
            for intent in &tool.descriptor().supported_intents {
                self.tools.insert(*intent, tool.clone());
            }
            self.order.push(tool.descriptor().clone());
            self
        }
    }

    impl ToolRegistryPort for MockRegistry {
        fn resolve(&self, intent: Intent) -> Option<Arc<dyn Tool>> {
            self.tools.get(&intent).cloned()
        }

        fn descriptors(&self) -> Vec<ToolDescriptor> {
            self.order.clone()
        }
    }

    struct SpyConfirmation {
        answer: Result<bool, ConfirmationError>,
        delay: Option<Duration>,
        asked: AtomicUsize,
        prompts: StdMutex<Vec<String>>,
    }

    impl SpyConfirmation {
        fn answering(answer: Result<bool, ConfirmationError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                delay: None,
                asked: AtomicUsize::new(0),
                prompts: StdMutex::new(Vec::new()),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(true),
                delay: Some(delay),
                asked: AtomicUsize::new(0),
                prompts: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ConfirmationPort for SpyConfirmation {
        async fn confirm(
            &self,
            _command: &ParsedCommand,
            prompt: &str,
        ) -> Result<bool, ConfirmationError> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.answer.clone()
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: StdMutex<Vec<(String, serde_json::Value)>>,
    }

    impl CommandLogger for RecordingLogger {
        fn log(&self, event: CommandEvent) {
            self.events
                .lock()
                .unwrap()
                .push((event.event_type.to_string(), event.payload));
        }
    }

    impl RecordingLogger {
        fn phases(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(kind, _)| kind == "phase")
                .map(|(_, payload)| payload["to"].as_str().unwrap_or_default().to_string())
                .collect()
        }
    }

    fn parser() -> Arc<IntentParser> {
        Arc::new(IntentParser::new(Arc::new(PatternLibrary::builtin().unwrap())))
    }

    fn use_case(
        registry: MockRegistry,
        policy: SecurityPolicy,
        confirmation: Arc<dyn ConfirmationPort>,
    ) -> DispatchCommandUseCase {
        DispatchCommandUseCase::new(parser(), Arc::new(registry), Arc::new(policy), confirmation)
    }

    fn system_spy(behavior: Behavior) -> Arc<SpyTool> {
        SpyTool::new(
            "system",
            &[
                Intent::SetVolume,
                Intent::ShutdownSystem,
                Intent::KillProcess,
            ],
            behavior,
        )
    }

    // ==================== Scenarios ====================

    #[tokio::test]
    async fn test_set_volume_dispatches_with_level() {
        let spy = system_spy(Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoDeclineConfirmation),
        );

        let result = uc.execute("设置音量到 50").await;
        assert!(result.is_success());
        assert_eq!(spy.calls(), 1);
        let entities = spy.last_entities.lock().unwrap().clone().unwrap();
        assert_eq!(entities.get("level"), Some(&EntityValue::Percentage(50)));
    }

    #[tokio::test]
    async fn test_gibberish_is_no_match() {
        let spy = system_spy(Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("qwxz plorb").await;
        assert!(result.is_failure());
        assert_eq!(result.failure, Some(FailureKind::NoMatch));
        assert!(result.message.contains("没有理解"));
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_is_rejected_with_suggestions() {
        let email = SpyTool::new("email", &[Intent::ReadEmails], Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(email.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("我的邮件呢").await;
        assert_eq!(result.failure, Some(FailureKind::LowConfidence));
        assert_eq!(email.calls(), 0);
        let data = result.data.unwrap();
        assert_eq!(data["suggestions"][0]["tool"], "email");
    }

    #[tokio::test]
    async fn test_confidence_floor_is_configurable() {
        let email = SpyTool::new("email", &[Intent::ReadEmails], Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(email.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        )
        .with_config(DispatchConfig::default().with_confidence_floor(0.3));

        assert!(uc.execute("我的邮件呢").await.is_success());
        assert_eq!(email.calls(), 1);
    }

    #[tokio::test]
    async fn test_incomplete_command_names_missing_parameter() {
        let email = SpyTool::new("email", &[Intent::SendEmail], Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(email.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("发邮件").await;
        assert_eq!(result.failure, Some(FailureKind::Incomplete));
        assert!(result.message.contains("to"));
        assert_eq!(email.calls(), 0);
    }

    #[tokio::test]
    async fn test_restricted_path_is_denied_without_invocation() {
        let file = SpyTool::new("file", &[Intent::DeleteFile], Behavior::Succeed);
        let confirmation = SpyConfirmation::answering(Ok(true));
        let policy = SecurityPolicy::new("/nonexistent-vault").with_restricted_path("/nonexistent-vault");
        let uc = use_case(
            MockRegistry::default().with(file.clone()),
            policy,
            confirmation.clone(),
        );

        let result = uc.execute("删除文件 secret.txt").await;
        assert_eq!(result.failure, Some(FailureKind::PolicyDenied));
        assert!(result.message.contains("拒绝"));
        assert_eq!(file.calls(), 0);
        // a denied command is never offered for confirmation
        assert_eq!(confirmation.asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_declined_shutdown_never_invokes_tool() {
        let spy = system_spy(Behavior::Succeed);
        let confirmation = SpyConfirmation::answering(Ok(false));
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            confirmation.clone(),
        );

        let result = uc.execute("关机").await;
        assert_eq!(result.failure, Some(FailureKind::ConfirmationDeclined));
        assert!(result.message.contains("取消"));
        assert_eq!(spy.calls(), 0);
        assert_eq!(confirmation.asked.load(Ordering::SeqCst), 1);
        assert_eq!(confirmation.prompts.lock().unwrap()[0], "确定要关机吗?");
    }

    #[tokio::test]
    async fn test_accepted_confirmation_invokes_exactly_once() {
        let spy = system_spy(Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            SpyConfirmation::answering(Ok(true)),
        );

        assert!(uc.execute("关机").await.is_success());
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_error_is_a_decline() {
        let spy = system_spy(Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            SpyConfirmation::answering(Err(ConfirmationError::Cancelled)),
        );

        let result = uc.execute("关机").await;
        assert_eq!(result.failure, Some(FailureKind::ConfirmationDeclined));
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_a_decline() {
        let spy = system_spy(Behavior::Succeed);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            SpyConfirmation::slow(Duration::from_secs(5)),
        )
        .with_config(
            DispatchConfig::default().with_confirmation_timeout(Duration::from_millis(20)),
        );

        let result = uc.execute("关机").await;
        assert_eq!(result.failure, Some(FailureKind::ConfirmationDeclined));
        assert!(result.message.contains("超时"));
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolved_intent_is_config_defect() {
        let uc = use_case(
            MockRegistry::default(),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("设置音量到 30").await;
        assert_eq!(result.failure, Some(FailureKind::UnresolvedIntent));
        assert!(result.failure.unwrap().is_config_defect());
    }

    #[tokio::test]
    async fn test_tool_error_becomes_fault_with_cause() {
        let spy = system_spy(Behavior::Fault);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("设置音量到 30").await;
        assert_eq!(result.failure, Some(FailureKind::ToolFault));
        assert_eq!(result.message, "执行命令时发生内部错误");
        assert!(result.cause.unwrap().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_panicking_tool_is_contained() {
        let spy = system_spy(Behavior::Panic);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("设置音量到 30").await;
        assert_eq!(result.failure, Some(FailureKind::ToolFault));
        assert!(result.cause.unwrap().contains("tool exploded"));

        // the engine keeps serving
        let again = uc.execute("qwxz").await;
        assert_eq!(again.failure, Some(FailureKind::NoMatch));
    }

    #[tokio::test]
    async fn test_tool_timeout_is_fault() {
        let spy = system_spy(Behavior::Sleep(Duration::from_secs(5)));
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        )
        .with_config(DispatchConfig::default().with_tool_timeout(Some(Duration::from_millis(20))));

        let result = uc.execute("设置音量到 30").await;
        assert_eq!(result.failure, Some(FailureKind::ToolFault));
        assert!(result.cause.unwrap().contains("did not finish in time"));
    }

    #[tokio::test]
    async fn test_tool_rejection_passes_through() {
        let spy = system_spy(Behavior::Reject);
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        );

        let result = uc.execute("设置音量到 30").await;
        assert_eq!(result.failure, Some(FailureKind::ToolFailure));
        assert_eq!(result.message, "bad input");
    }

    #[tokio::test]
    async fn test_defer_mode_then_execute_confirmed() {
        let spy = system_spy(Behavior::Succeed);
        let confirmation = SpyConfirmation::answering(Ok(false));
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            confirmation.clone(),
        )
        .with_config(
            DispatchConfig::default()
                .with_confirmation_mode(crate::config::ConfirmationMode::Defer),
        );

        let pending = uc.execute("关机").await;
        assert!(pending.needs_confirmation_status());
        assert_eq!(spy.calls(), 0);
        assert_eq!(confirmation.asked.load(Ordering::SeqCst), 0);

        let data = pending.data.unwrap();
        let command: ParsedCommand = serde_json::from_value(data["command"].clone()).unwrap();
        let result = uc.execute_confirmed(command).await;
        assert!(result.is_success());
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn test_execute_confirmed_still_applies_denial() {
        let file = SpyTool::new("file", &[Intent::DeleteFile], Behavior::Succeed);
        let policy = SecurityPolicy::new("/").with_restricted_path("/nonexistent-secure");
        let uc = use_case(
            MockRegistry::default().with(file.clone()),
            policy,
            Arc::new(AutoApproveConfirmation),
        );

        let command = ParsedCommand::new(Intent::DeleteFile, "删除文件 /nonexistent-secure/key")
            .with_entities(Entities::new().with(
                "path",
                EntityValue::Path(PathBuf::from("/nonexistent-secure/key")),
            ));
        let result = uc.execute_confirmed(command).await;
        assert_eq!(result.failure, Some(FailureKind::PolicyDenied));
        assert_eq!(file.calls(), 0);
    }

    #[tokio::test]
    async fn test_phases_are_recorded() {
        let spy = system_spy(Behavior::Succeed);
        let logger = Arc::new(RecordingLogger::default());
        let uc = use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        )
        .with_command_logger(logger.clone());

        uc.execute("关机").await;
        assert_eq!(
            logger.phases(),
            vec![
                "parsed",
                "security_checked",
                "awaiting_confirmation",
                "dispatched",
                "completed"
            ]
        );

        let events = logger.events.lock().unwrap();
        let (kind, payload) = events.last().unwrap();
        assert_eq!(kind, "command_result");
        assert_eq!(payload["intent"], "shutdown_system");
        assert_eq!(payload["result"]["status"], "success");
    }

    #[tokio::test]
    async fn test_rejection_phase_after_parse() {
        let logger = Arc::new(RecordingLogger::default());
        let uc = use_case(
            MockRegistry::default(),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        )
        .with_command_logger(logger.clone());

        uc.execute("qwxz").await;
        assert_eq!(logger.phases(), vec!["parsed", "rejected"]);
    }

    #[tokio::test]
    async fn test_commands_are_serialized() {
        let spy = system_spy(Behavior::Sleep(Duration::from_millis(30)));
        let uc = Arc::new(use_case(
            MockRegistry::default().with(spy.clone()),
            SecurityPolicy::new("/"),
            Arc::new(AutoApproveConfirmation),
        ));

        let started = std::time::Instant::now();
        let a = tokio::spawn({
            let uc = uc.clone();
            async move { uc.execute("设置音量到 10").await }
        });
        let b = tokio::spawn({
            let uc = uc.clone();
            async move { uc.execute("设置音量到 20").await }
        });
        assert!(a.await.unwrap().is_success());
        assert!(b.await.unwrap().is_success());
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(spy.calls(), 2);
    }

    #[test]
    fn test_into_result_messages() {
        let denied = DispatchError::PolicyDenied {
            intent: Intent::DeleteFile,
            path: PathBuf::from("/etc/passwd"),
        }
        .into_result();
        assert_eq!(denied.failure, Some(FailureKind::PolicyDenied));
        assert!(denied.message.contains("/etc/passwd"));

        let fault = DispatchError::ToolFault {
            tool: "file".into(),
            intent: Intent::ReadFile,
            cause: "EACCES".into(),
        }
        .into_result();
        assert_eq!(fault.cause.as_deref(), Some("EACCES"));
        assert!(!fault.message.contains("EACCES"));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
