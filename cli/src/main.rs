//! CLI entrypoint for addy
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use addy_application::{
    AutoApproveConfirmation, AutoDeclineConfirmation, ConfirmationMode, ConfirmationPort,
    DispatchCommandUseCase, ToolRegistryPort,
};
use addy_domain::{IntentParser, PatternLibrary};
use addy_infrastructure::{ConfigLoader, FileConfig, JsonlCommandLogger, assemble_registry};
use addy_presentation::{
    Cli, CommandRepl, ConsoleFormatter, InteractiveConfirmation, JsonFormatter, OutputFormat,
    OutputFormatter, ReplConfig,
};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize logging based on verbosity level. `RUST_LOG` wins when set.
///
/// With a log file configured, a second layer writes plain text to it
/// through a daily-rotating non-blocking appender; the returned guard
/// flushes it on drop.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "addy.log".into());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn confirmation_for(mode: ConfirmationMode) -> Arc<dyn ConfirmationPort> {
    match mode {
        ConfirmationMode::AutoApprove => {
            warn!("Dangerous operations will run without confirmation");
            Arc::new(AutoApproveConfirmation)
        }
        ConfirmationMode::AutoDecline => Arc::new(AutoDeclineConfirmation),
        // Defer answers through execute_confirmed; the port is a fallback that
        // only touches stdin once asked
        ConfirmationMode::Interactive | ConfirmationMode::Defer => {
            Arc::new(InteractiveConfirmation::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    let _log_guard = init_tracing(cli.verbose, config.log_file_path().as_deref());
    info!("Starting addy");

    let library = Arc::new(PatternLibrary::builtin().context("invalid builtin pattern library")?);
    if cli.rules {
        println!("{}", ConsoleFormatter::format_rules(&library));
        return Ok(ExitCode::SUCCESS);
    }

    // === Dependency Injection ===
    let registry = assemble_registry(&config.tools.enabled, &config.tool_settings())
        .context("failed to assemble tool registry")?;
    let descriptors = registry.descriptors();
    if cli.tools.is_some() {
        let listed = match cli.tool_query() {
            Some(capability) => registry.search(capability),
            None => descriptors,
        };
        println!("{}", ConsoleFormatter::format_tools(&listed));
        return Ok(ExitCode::SUCCESS);
    }

    let mut dispatch = config.dispatch_config();
    let mode = cli.confirmation_mode(dispatch.confirmation_mode);
    dispatch = dispatch.with_confirmation_mode(mode);
    let confirmation = confirmation_for(dispatch.confirmation_mode);

    let mut use_case = DispatchCommandUseCase::new(
        Arc::new(IntentParser::new(library)),
        Arc::new(registry),
        Arc::new(config.policy()),
        confirmation,
    )
    .with_config(dispatch);

    if let Some(path) = config.audit_log_path() {
        match JsonlCommandLogger::new(&path) {
            Some(logger) => {
                info!(path = %path.display(), "Command audit log enabled");
                use_case = use_case.with_command_logger(Arc::new(logger));
            }
            None => warn!(path = %path.display(), "Command audit log disabled"),
        }
    }
    let use_case = Arc::new(use_case);

    let formatter: Box<dyn OutputFormatter> = match cli.output {
        OutputFormat::Text => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    };

    if cli.parse_only {
        let text = cli
            .utterance()
            .ok_or_else(|| anyhow!("--parse-only needs a command to parse"))?;
        let parsed = use_case.parse(&text);
        println!("{}", formatter.format_parsed(&parsed));
        return Ok(if parsed.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    // Interactive mode
    if cli.is_interactive() {
        let mut repl_config = ReplConfig::default().with_banner(!cli.quiet);
        if let Some(path) = config.history_file_path() {
            repl_config = repl_config.with_history_file(Some(path));
        }
        CommandRepl::new(use_case)
            .with_formatter(formatter)
            .with_tools(descriptors)
            .with_config(repl_config)
            .run()
            .await
            .context("interactive session failed")?;
        return Ok(ExitCode::SUCCESS);
    }

    // Single command mode
    let text = cli
        .utterance()
        .ok_or_else(|| anyhow!("a command is required outside interactive mode"))?;
    let result = use_case.execute(&text).await;
    println!("{}", formatter.format_result(&result));

    Ok(if result.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
