//! End-to-end dispatch scenarios: the builtin pattern library, the real tool
//! registry and real tools, with OS access replaced by a recording fake.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use addy_application::{
    AutoApproveConfirmation, AutoDeclineConfirmation, ConfirmationError, ConfirmationPort,
    DispatchCommandUseCase, DispatchConfig,
};
use addy_domain::{
    Entities, ExecutionResult, FailureKind, Intent, IntentParser, ParsedCommand, PatternLibrary,
    SecurityPolicy, Tool, ToolDescriptor, ToolError,
};
use addy_infrastructure::tools::system::{ProcessEntry, SystemInfo};
use addy_infrastructure::tools::{
    AssistantTool, CalculatorTool, FileTool, FileToolConfig, SystemControl, SystemTool,
    SystemToolConfig,
};
use addy_infrastructure::{
    AssemblyError, FileConfig, RegistryError, ToolRegistry, ToolSettings, assemble_registry,
};
use async_trait::async_trait;

// ==================== Test doubles ====================

/// Records every OS call instead of making it.
#[derive(Default)]
struct RecordingControl {
    volume: StdMutex<Option<u8>>,
    shutdowns: AtomicUsize,
}

#[async_trait]
impl SystemControl for RecordingControl {
    async fn system_info(&self) -> Result<SystemInfo, ToolError> {
        Ok(SystemInfo {
            os: "linux".into(),
            arch: "x86_64".into(),
            hostname: Some("test-host".into()),
            cpus: 4,
        })
    }

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>, ToolError> {
        Ok(vec![ProcessEntry {
            pid: 1,
            name: "init".into(),
        }])
    }

    async fn kill_process(&self, _target: &str) -> Result<usize, ToolError> {
        Ok(0)
    }

    async fn shutdown(&self) -> Result<(), ToolError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn restart(&self) -> Result<(), ToolError> {
        Ok(())
    }

    async fn lock_screen(&self) -> Result<(), ToolError> {
        Ok(())
    }

    async fn set_volume(&self, level: u8) -> Result<(), ToolError> {
        *self.volume.lock().unwrap() = Some(level);
        Ok(())
    }

    async fn get_volume(&self) -> Result<Option<u8>, ToolError> {
        Ok(*self.volume.lock().unwrap())
    }

    async fn open_application(&self, _app: &str) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Wraps a real tool and counts invocations.
struct Counting<T> {
    inner: T,
    calls: AtomicUsize,
}

impl<T: Tool> Counting<T> {
    fn new(inner: T) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Tool> Tool for Counting<T> {
    fn descriptor(&self) -> &ToolDescriptor {
        self.inner.descriptor()
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(intent, entities, raw_text).await
    }
}

struct PanickingTool {
    descriptor: ToolDescriptor,
}

#[async_trait]
impl Tool for PanickingTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        _intent: Intent,
        _entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        panic!("calculator blew up")
    }
}

struct SlowConfirmation;

#[async_trait]
impl ConfirmationPort for SlowConfirmation {
    async fn confirm(
        &self,
        _command: &ParsedCommand,
        _prompt: &str,
    ) -> Result<bool, ConfirmationError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(true)
    }
}

// ==================== Helpers ====================

fn parser() -> Arc<IntentParser> {
    Arc::new(IntentParser::new(Arc::new(PatternLibrary::builtin().unwrap())))
}

fn dispatcher(
    registry: ToolRegistry,
    policy: SecurityPolicy,
    confirmation: Arc<dyn ConfirmationPort>,
) -> DispatchCommandUseCase {
    DispatchCommandUseCase::new(parser(), Arc::new(registry), Arc::new(policy), confirmation)
}

fn system_tool(control: Arc<RecordingControl>, allow_power_actions: bool) -> SystemTool {
    SystemTool::with_control(SystemToolConfig { allow_power_actions }, control)
}

// ==================== Scenarios ====================

#[tokio::test]
async fn test_set_volume_to_fifty() {
    let control = Arc::new(RecordingControl::default());
    let registry = ToolRegistry::new()
        .register_tool(system_tool(control.clone(), false))
        .unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoDeclineConfirmation));

    let parsed = uc.parse("设置音量到 50").unwrap();
    assert_eq!(parsed.intent, Intent::SetVolume);
    assert_eq!(parsed.entities.percentage("level"), Some(50));

    let result = uc.execute("设置音量到 50").await;
    assert!(result.is_success(), "{}", result.message);
    assert!(result.message.contains("50"));
    assert_eq!(*control.volume.lock().unwrap(), Some(50));
}

#[tokio::test]
async fn test_delete_under_restricted_directory_is_denied() {
    let dir = tempfile::tempdir().unwrap();
    let vault = dir.path().join("vault");
    std::fs::create_dir(&vault).unwrap();
    let secret = vault.join("secret.txt");
    std::fs::write(&secret, "top secret").unwrap();

    let file = Counting::new(FileTool::new(FileToolConfig {
        base_dir: vault.clone(),
        ..FileToolConfig::default()
    }));
    let registry = ToolRegistry::new().register(file.clone()).unwrap();
    let policy = SecurityPolicy::new(&vault).with_restricted_path(&vault);
    let uc = dispatcher(registry, policy, Arc::new(AutoApproveConfirmation));

    let result = uc.execute("删除文件 secret.txt").await;
    assert!(result.is_failure());
    assert_eq!(result.failure, Some(FailureKind::PolicyDenied));
    assert!(result.message.contains("拒绝"));
    assert_eq!(file.calls(), 0);
    assert!(secret.exists());
}

#[tokio::test]
async fn test_delete_outside_restricted_directory_runs_after_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let scratch = dir.path().join("scratch.txt");
    std::fs::write(&scratch, "tmp").unwrap();

    let file = Counting::new(FileTool::new(FileToolConfig {
        base_dir: dir.path().to_path_buf(),
        ..FileToolConfig::default()
    }));
    let registry = ToolRegistry::new().register(file.clone()).unwrap();
    let policy = SecurityPolicy::new(dir.path()).with_restricted_path("vault");
    let uc = dispatcher(registry, policy, Arc::new(AutoApproveConfirmation));

    let result = uc.execute("删除文件 scratch.txt").await;
    assert!(result.is_success(), "{}", result.message);
    assert_eq!(file.calls(), 1);
    assert!(!scratch.exists());
}

#[tokio::test]
async fn test_declined_shutdown_never_reaches_the_os() {
    let control = Arc::new(RecordingControl::default());
    let system = Counting::new(system_tool(control.clone(), true));
    let registry = ToolRegistry::new().register(system.clone()).unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoDeclineConfirmation));

    let result = uc.execute("关机").await;
    assert!(result.is_failure());
    assert_eq!(result.failure, Some(FailureKind::ConfirmationDeclined));
    assert!(result.message.contains("取消"));
    assert_eq!(system.calls(), 0);
    assert_eq!(control.shutdowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_accepted_shutdown_runs_exactly_once() {
    let control = Arc::new(RecordingControl::default());
    let system = Counting::new(system_tool(control.clone(), true));
    let registry = ToolRegistry::new().register(system.clone()).unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoApproveConfirmation));

    let result = uc.execute("关机").await;
    assert!(result.is_success(), "{}", result.message);
    assert_eq!(system.calls(), 1);
    assert_eq!(control.shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_confirmation_timeout_is_a_decline() {
    let control = Arc::new(RecordingControl::default());
    let registry = ToolRegistry::new()
        .register_tool(system_tool(control.clone(), true))
        .unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(SlowConfirmation))
        .with_config(DispatchConfig::default().with_confirmation_timeout(Duration::from_millis(20)));

    let result = uc.execute("关机").await;
    assert_eq!(result.failure, Some(FailureKind::ConfirmationDeclined));
    assert!(result.message.contains("超时"));
    assert_eq!(control.shutdowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_gibberish_is_not_understood() {
    let registry = assemble_registry(&["assistant", "calculator"], &ToolSettings::default()).unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoDeclineConfirmation));

    let result = uc.execute("asdf qwer zxcv").await;
    assert!(result.is_failure());
    assert_eq!(result.failure, Some(FailureKind::NoMatch));
    assert!(result.message.contains("没有理解"));
}

#[tokio::test]
async fn test_unregistered_intent_is_unresolved() {
    let registry = ToolRegistry::new().register_tool(AssistantTool::new()).unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoApproveConfirmation));

    let result = uc.execute("设置音量到 30").await;
    assert_eq!(result.failure, Some(FailureKind::UnresolvedIntent));
    assert_eq!(result.data.unwrap()["intent"], "set_volume");
}

#[tokio::test]
async fn test_panicking_tool_does_not_take_down_the_engine() {
    let registry = ToolRegistry::new()
        .register(Arc::new(PanickingTool {
            descriptor: ToolDescriptor::new("calculator", "broken calculator")
                .with_intent(Intent::Calculate),
        }))
        .unwrap()
        .register_tool(AssistantTool::new())
        .unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoApproveConfirmation));

    let result = uc.execute("计算 3 + 5 * 2 等于多少").await;
    assert_eq!(result.failure, Some(FailureKind::ToolFault));
    assert!(result.cause.unwrap().contains("calculator blew up"));

    let next = uc.execute("你好").await;
    assert!(next.is_success());
}

#[tokio::test]
async fn test_deeply_nested_expression_is_a_tool_failure() {
    let registry = ToolRegistry::new()
        .register_tool(CalculatorTool::new())
        .unwrap()
        .register_tool(AssistantTool::new())
        .unwrap();
    let uc = dispatcher(registry, SecurityPolicy::new("/"), Arc::new(AutoApproveConfirmation));

    for command in [
        format!("计算 {}1", "(".repeat(100_000)),
        format!("计算 {}1{}", "(".repeat(300), ")".repeat(300)),
        format!("计算 {}1", "-".repeat(500)),
    ] {
        let result = uc.execute(&command).await;
        assert_eq!(result.failure, Some(FailureKind::ToolFailure), "{}", result.message);
        assert!(result.message.contains("计算表达式错误"));
    }

    let next = uc.execute("计算 1 + 1").await;
    assert!(next.is_success(), "{}", next.message);
}

#[test]
fn test_registration_round_trip() {
    let control = Arc::new(RecordingControl::default());
    let registry = ToolRegistry::new()
        .register_tool(system_tool(control, false))
        .unwrap()
        .register_tool(CalculatorTool::new())
        .unwrap();

    let set = registry.resolve(Intent::SetVolume).unwrap();
    let get = registry.resolve(Intent::GetVolume).unwrap();
    assert_eq!(set.name(), "system");
    assert_eq!(get.name(), "system");
    assert!(Arc::ptr_eq(&set, &get));
    assert_eq!(registry.resolve(Intent::Calculate).unwrap().name(), "calculator");
    assert!(registry.resolve(Intent::SendEmail).is_none());
}

#[test]
fn test_duplicate_registration_fails_at_startup() {
    let err = assemble_registry(&["calculator", "calculator"], &ToolSettings::default())
        .err()
        .unwrap();
    assert_eq!(
        err,
        AssemblyError::Registry(RegistryError::DuplicateTool("calculator".into()))
    );

    let impostor = Arc::new(PanickingTool {
        descriptor: ToolDescriptor::new("pocket_calc", "claims calculate")
            .with_intent(Intent::Calculate),
    });
    let err = ToolRegistry::new()
        .register_tool(CalculatorTool::new())
        .unwrap()
        .register(impostor)
        .err()
        .unwrap();
    assert!(matches!(
        err,
        RegistryError::ConflictingIntent {
            intent: Intent::Calculate,
            ..
        }
    ));
}

#[test]
fn test_unknown_enabled_tool_fails_assembly() {
    let err = assemble_registry(&["assistant", "holodeck"], &ToolSettings::default())
        .err()
        .unwrap();
    assert_eq!(err, AssemblyError::UnknownTool("holodeck".into()));
}

#[tokio::test]
async fn test_config_driven_assembly() {
    let dir = tempfile::tempdir().unwrap();
    let toml_str = format!(
        r#"
[security]
restricted_paths = ["private"]

[tools]
enabled = ["assistant", "file", "calculator"]

[tools.file]
base_dir = "{}"
"#,
        dir.path().display().to_string().replace('\\', "/")
    );
    let config: FileConfig = toml::from_str(&toml_str).unwrap();
    config.validate().unwrap();

    let registry = assemble_registry(&config.tools.enabled, &config.tool_settings()).unwrap();
    let uc = DispatchCommandUseCase::new(
        parser(),
        Arc::new(registry),
        Arc::new(config.policy()),
        Arc::new(AutoDeclineConfirmation),
    )
    .with_config(config.dispatch_config());

    let created = uc.execute("创建文件 notes.txt").await;
    assert!(created.is_success(), "{}", created.message);
    assert!(dir.path().join("notes.txt").exists());

    let denied = uc.execute("创建文件 private/key.pem").await;
    assert_eq!(denied.failure, Some(FailureKind::PolicyDenied));
    assert!(!dir.path().join("private").exists());

    let sum = uc.execute("计算 3 + 5 * 2 等于多少").await;
    assert!(sum.is_success());
    assert!(sum.message.contains("13"));

    let unresolved = uc.execute("设置音量到 20").await;
    assert_eq!(unresolved.failure, Some(FailureKind::UnresolvedIntent));

    let bye = uc.execute("再见").await;
    assert!(bye.requests_exit());
}
