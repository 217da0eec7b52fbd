//! `system` tool — processes, volume, power and application launching.
//!
//! Every OS call goes through [`SystemControl`], so the tool logic can be
//! tested with a fake. [`ShellSystemControl`] is the production backend and
//! shells out to the platform's standard commands (`ps`, `kill`, `pactl`,
//! `amixer`, `osascript`, `tasklist`, `taskkill`, `shutdown`, `loginctl`).
//!
//! Shutdown and restart are simulated unless
//! [`SystemToolConfig::allow_power_actions`] is set.

use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Canonical tool name.
pub const SYSTEM: &str = "system";

/// Processes shown in the spoken listing.
const PROCESS_PREVIEW: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemToolConfig {
    /// Actually power off / reboot instead of reporting what would happen.
    pub allow_power_actions: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub hostname: Option<String>,
    pub cpus: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
}

/// Operating-system operations used by [`SystemTool`].
#[async_trait]
pub trait SystemControl: Send + Sync {
    async fn system_info(&self) -> Result<SystemInfo, ToolError>;

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>, ToolError>;

    /// Terminate processes by PID or by (case-insensitive) name fragment.
    /// Returns how many processes were signalled.
    async fn kill_process(&self, target: &str) -> Result<usize, ToolError>;

    async fn shutdown(&self) -> Result<(), ToolError>;

    async fn restart(&self) -> Result<(), ToolError>;

    async fn lock_screen(&self) -> Result<(), ToolError>;

    async fn set_volume(&self, level: u8) -> Result<(), ToolError>;

    /// Current output volume, or `None` when the platform cannot report it.
    async fn get_volume(&self) -> Result<Option<u8>, ToolError>;

    async fn open_application(&self, app: &str) -> Result<(), ToolError>;
}

/// [`SystemControl`] backed by platform shell commands.
#[derive(Debug, Clone, Default)]
pub struct ShellSystemControl;

impl ShellSystemControl {
    pub fn new() -> Self {
        Self
    }

    fn available(program: &str) -> bool {
        which::which(program).is_ok()
    }

    /// Run a command to completion and return its stdout.
    async fn run(program: &str, args: &[&str]) -> Result<String, ToolError> {
        if !Self::available(program) {
            return Err(ToolError::unavailable(program));
        }
        tracing::debug!(program, ?args, "Running system command");

        let output = Command::new(program).args(args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ToolError::execution_failed(format!(
                "{} exited with {}: {}",
                program,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Start a program without waiting for it.
    fn launch(program: &str, args: &[&str]) -> Result<(), ToolError> {
        tracing::debug!(program, ?args, "Launching application");
        Command::new(program)
            .args(args)
            .spawn()
            .map(|_| ())
            .map_err(|e| ToolError::execution_failed(format!("Failed to launch {}: {}", program, e)))
    }

    async fn kill_pid(pid: u32) -> Result<(), ToolError> {
        let pid = pid.to_string();
        if cfg!(target_os = "windows") {
            Self::run("taskkill", &["/PID", &pid, "/F"]).await?;
        } else {
            Self::run("kill", &[&pid]).await?;
        }
        Ok(())
    }

    fn parse_ps(output: &str) -> Vec<ProcessEntry> {
        output
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let (pid, name) = line.split_once(char::is_whitespace)?;
                Some(ProcessEntry {
                    pid: pid.parse().ok()?,
                    name: name.trim().to_string(),
                })
            })
            .collect()
    }

    fn parse_tasklist(output: &str) -> Vec<ProcessEntry> {
        output
            .lines()
            .filter_map(|line| {
                let mut fields = line.split("\",\"").map(|f| f.trim_matches('"'));
                let name = fields.next()?.to_string();
                let pid = fields.next()?.parse().ok()?;
                Some(ProcessEntry { pid, name })
            })
            .collect()
    }

    /// Platform launcher for a canonical application name.
    fn launcher(app: &str) -> (&'static str, Vec<String>) {
        if cfg!(target_os = "windows") {
            let exe = match app {
                "notepad" => "notepad",
                "calculator" => "calc",
                "browser" | "edge" => "msedge",
                "word" => "winword",
                "excel" => "excel",
                "terminal" => "cmd",
                "file_manager" => "explorer",
                other => other,
            };
            ("cmd", vec!["/C".into(), "start".into(), "\"\"".into(), exe.into()])
        } else if cfg!(target_os = "macos") {
            let name = match app {
                "notepad" => "TextEdit",
                "calculator" => "Calculator",
                "browser" => "Safari",
                "chrome" => "Google Chrome",
                "edge" => "Microsoft Edge",
                "firefox" => "Firefox",
                "word" => "Microsoft Word",
                "excel" => "Microsoft Excel",
                "terminal" => "Terminal",
                "file_manager" => "Finder",
                other => other,
            };
            ("open", vec!["-a".into(), name.into()])
        } else {
            match app {
                "notepad" => ("gedit", vec![]),
                "calculator" => ("gnome-calculator", vec![]),
                "browser" => ("xdg-open", vec!["about:blank".into()]),
                "chrome" => ("google-chrome", vec![]),
                "edge" => ("microsoft-edge", vec![]),
                "firefox" => ("firefox", vec![]),
                "word" | "excel" => ("libreoffice", vec![]),
                "terminal" => ("x-terminal-emulator", vec![]),
                "file_manager" => ("xdg-open", vec![".".into()]),
                _ => ("", vec![]),
            }
        }
    }
}

/// First `NN%` in command output.
fn first_percentage(text: &str) -> Option<u8> {
    let bytes = text.as_bytes();
    let percent = text.find('%')?;
    let start = bytes[..percent]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map(|i| i + 1)
        .unwrap_or(0);
    text[start..percent].parse::<u8>().ok().filter(|v| *v <= 100)
}

#[async_trait]
impl SystemControl for ShellSystemControl {
    async fn system_info(&self) -> Result<SystemInfo, ToolError> {
        let hostname = Self::run("hostname", &[])
            .await
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        Ok(SystemInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname,
            cpus: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        })
    }

    async fn list_processes(&self) -> Result<Vec<ProcessEntry>, ToolError> {
        if cfg!(target_os = "windows") {
            let out = Self::run("tasklist", &["/FO", "CSV", "/NH"]).await?;
            Ok(Self::parse_tasklist(&out))
        } else {
            let out = Self::run("ps", &["-eo", "pid=,comm="]).await?;
            Ok(Self::parse_ps(&out))
        }
    }

    async fn kill_process(&self, target: &str) -> Result<usize, ToolError> {
        let pids: Vec<u32> = match target.parse::<u32>() {
            Ok(pid) => {
                let exists = self.list_processes().await?.iter().any(|p| p.pid == pid);
                if exists { vec![pid] } else { vec![] }
            }
            Err(_) => {
                let needle = target.to_lowercase();
                let own = std::process::id();
                self.list_processes()
                    .await?
                    .into_iter()
                    .filter(|p| p.pid != own && p.name.to_lowercase().contains(&needle))
                    .map(|p| p.pid)
                    .collect()
            }
        };

        let mut killed = 0;
        for pid in pids {
            match Self::kill_pid(pid).await {
                Ok(()) => killed += 1,
                Err(e) => tracing::warn!(pid, error = %e.message, "Failed to terminate process"),
            }
        }
        Ok(killed)
    }

    async fn shutdown(&self) -> Result<(), ToolError> {
        if cfg!(target_os = "windows") {
            Self::run("shutdown", &["/s", "/t", "0"]).await?;
        } else {
            Self::run("shutdown", &["-h", "now"]).await?;
        }
        Ok(())
    }

    async fn restart(&self) -> Result<(), ToolError> {
        if cfg!(target_os = "windows") {
            Self::run("shutdown", &["/r", "/t", "0"]).await?;
        } else {
            Self::run("shutdown", &["-r", "now"]).await?;
        }
        Ok(())
    }

    async fn lock_screen(&self) -> Result<(), ToolError> {
        if cfg!(target_os = "windows") {
            Self::run("rundll32.exe", &["user32.dll,LockWorkStation"]).await?;
        } else if cfg!(target_os = "macos") {
            Self::run("pmset", &["displaysleepnow"]).await?;
        } else if Self::available("loginctl") {
            Self::run("loginctl", &["lock-session"]).await?;
        } else {
            Self::run("xdg-screensaver", &["lock"]).await?;
        }
        Ok(())
    }

    async fn set_volume(&self, level: u8) -> Result<(), ToolError> {
        let percent = format!("{}%", level);
        if cfg!(target_os = "macos") {
            let script = format!("set volume output volume {}", level);
            Self::run("osascript", &["-e", &script]).await?;
        } else if Self::available("pactl") {
            Self::run("pactl", &["set-sink-volume", "@DEFAULT_SINK@", &percent]).await?;
        } else if Self::available("amixer") {
            Self::run("amixer", &["-q", "sset", "Master", &percent]).await?;
        } else {
            return Err(ToolError::unavailable("volume control"));
        }
        Ok(())
    }

    async fn get_volume(&self) -> Result<Option<u8>, ToolError> {
        let output = if cfg!(target_os = "macos") {
            let out = Self::run("osascript", &["-e", "output volume of (get volume settings)"]).await?;
            return Ok(out.trim().parse().ok());
        } else if Self::available("pactl") {
            Self::run("pactl", &["get-sink-volume", "@DEFAULT_SINK@"]).await?
        } else if Self::available("amixer") {
            Self::run("amixer", &["sget", "Master"]).await?
        } else {
            return Ok(None);
        };
        Ok(first_percentage(&output))
    }

    async fn open_application(&self, app: &str) -> Result<(), ToolError> {
        let (program, args) = Self::launcher(app);
        let program = if program.is_empty() { app } else { program };
        if !Self::available(program) {
            return Err(ToolError::unavailable(program));
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Self::launch(program, &args)
    }
}

pub struct SystemTool {
    descriptor: ToolDescriptor,
    config: SystemToolConfig,
    control: Arc<dyn SystemControl>,
    /// Last volume set through this tool; answers `get_volume` when the
    /// platform cannot report the real value.
    last_volume: Mutex<Option<u8>>,
}

impl SystemTool {
    pub fn new(config: SystemToolConfig) -> Self {
        Self::with_control(config, Arc::new(ShellSystemControl::new()))
    }

    pub fn with_control(config: SystemToolConfig, control: Arc<dyn SystemControl>) -> Self {
        Self {
            descriptor: ToolDescriptor::new(SYSTEM, "系统控制: 系统信息、进程、音量、关机重启、锁屏、打开应用")
                .with_intents([
                    Intent::GetSystemInfo,
                    Intent::ListProcesses,
                    Intent::KillProcess,
                    Intent::ShutdownSystem,
                    Intent::RestartSystem,
                    Intent::LockScreen,
                    Intent::SetVolume,
                    Intent::GetVolume,
                    Intent::OpenApplication,
                ]),
            config,
            control,
            last_volume: Mutex::new(None),
        }
    }

    async fn system_info(&self) -> Result<ExecutionResult, ToolError> {
        let info = self.control.system_info().await?;
        let mut message = format!("系统信息:\n操作系统: {}\n架构: {}", info.os, info.arch);
        if let Some(host) = &info.hostname {
            message.push_str(&format!("\n计算机名: {}", host));
        }
        message.push_str(&format!("\nCPU核心数: {}", info.cpus));
        Ok(ExecutionResult::success(message).with_data(json!(info)))
    }

    async fn list_processes(&self) -> Result<ExecutionResult, ToolError> {
        let processes = self.control.list_processes().await?;
        let mut message = format!(
            "进程列表 (共 {} 个，显示前 {} 个):",
            processes.len(),
            PROCESS_PREVIEW.min(processes.len())
        );
        for (i, p) in processes.iter().take(PROCESS_PREVIEW).enumerate() {
            message.push_str(&format!("\n{}. {} (PID: {})", i + 1, p.name, p.pid));
        }
        Ok(ExecutionResult::success(message).with_data(json!({ "processes": processes })))
    }

    async fn kill_process(&self, target: &str) -> Result<ExecutionResult, ToolError> {
        let killed = self.control.kill_process(target).await?;
        let by_pid = target.parse::<u32>().is_ok();
        let result = match (killed, by_pid) {
            (0, true) => ExecutionResult::rejected(format!("进程 {} 不存在", target)),
            (0, false) => ExecutionResult::rejected(format!("未找到名为 '{}' 的进程", target)),
            (_, true) => ExecutionResult::success(format!("进程 {} 已终止", target)),
            (n, false) => {
                ExecutionResult::success(format!("已终止 {} 个名为 '{}' 的进程", n, target))
            }
        };
        Ok(result.with_data(json!({ "target": target, "killed": killed })))
    }

    async fn power_action(&self, intent: Intent) -> Result<ExecutionResult, ToolError> {
        let label = if intent == Intent::ShutdownSystem { "关机" } else { "重启" };
        if !self.config.allow_power_actions {
            tracing::info!(intent = intent.as_str(), "Power action simulated");
            return Ok(ExecutionResult::success(format!(
                "已模拟{}（未启用电源操作）",
                label
            ))
            .with_data(json!({ "simulated": true })));
        }
        if intent == Intent::ShutdownSystem {
            self.control.shutdown().await?;
        } else {
            self.control.restart().await?;
        }
        Ok(ExecutionResult::success(format!("系统正在{}", label))
            .with_data(json!({ "simulated": false })))
    }

    async fn set_volume(&self, level: u8) -> Result<ExecutionResult, ToolError> {
        match self.control.set_volume(level).await {
            Ok(()) => {}
            Err(e) if e.code == "UNAVAILABLE" => {
                return Ok(ExecutionResult::rejected("此平台暂不支持音量控制"));
            }
            Err(e) => return Err(e),
        }
        *self.last_volume.lock().await = Some(level);
        Ok(ExecutionResult::success(format!("音量已设置为 {}%", level))
            .with_data(json!({ "volume": level })))
    }

    async fn get_volume(&self) -> Result<ExecutionResult, ToolError> {
        let current = match self.control.get_volume().await? {
            Some(v) => Some(v),
            None => *self.last_volume.lock().await,
        };
        Ok(match current {
            Some(v) => ExecutionResult::success(format!("当前音量: {}%", v))
                .with_data(json!({ "volume": v })),
            None => ExecutionResult::rejected("此平台暂不支持音量查询"),
        })
    }

    async fn open_application(&self, app: &str) -> Result<ExecutionResult, ToolError> {
        match self.control.open_application(app).await {
            Ok(()) => Ok(ExecutionResult::success(format!("已打开 {}", app))
                .with_data(json!({ "app": app }))),
            Err(e) if e.code == "UNAVAILABLE" => {
                Ok(ExecutionResult::rejected(format!("未找到应用程序: {}", app)))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Tool for SystemTool {
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
            Intent::GetSystemInfo => self.system_info().await,
            Intent::ListProcesses => self.list_processes().await,
            Intent::KillProcess => match entities.text("process") {
                Some(target) => self.kill_process(target.trim()).await,
                None => Ok(ExecutionResult::missing_parameters(&["process"])),
            },
            Intent::ShutdownSystem | Intent::RestartSystem => self.power_action(intent).await,
            Intent::LockScreen => {
                self.control.lock_screen().await?;
                Ok(ExecutionResult::success("屏幕已锁定"))
            }
            Intent::SetVolume => match entities.percentage("level") {
                Some(level) => self.set_volume(level).await,
                None if entities.contains("level") => {
                    Ok(ExecutionResult::rejected("音量必须在0到100之间"))
                }
                None => Ok(ExecutionResult::missing_parameters(&["level"])),
            },
            Intent::GetVolume => self.get_volume().await,
            Intent::OpenApplication => match entities.text("app") {
                Some(app) => self.open_application(&app).await,
                None => Ok(ExecutionResult::missing_parameters(&["app"])),
            },
            other => Ok(ExecutionResult::rejected(format!("不支持的系统操作: {}", other))),
        }
    }
}
