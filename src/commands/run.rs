//! Run command handler - bring the agent up in the foreground
//!
//! This creates a tokio runtime, installs the signal host and drives the
//! service controller until a stop request arrives.

use std::sync::Arc;

use crate::cli::RunArgs;
use crate::commands::CommandContext;
use crate::config::AgentConfig;
use crate::error::{FontError, Result};
use crate::fonts::registrar;
use crate::logging;
use crate::service::{ServiceController, SignalHost, StatusFileSink, StatusSink, TracingStatusSink};

/// Run the agent until stopped
pub fn run_agent(args: &RunArgs, ctx: &CommandContext) -> Result<String> {
    let mut config = ctx.load_config()?;
    apply_overrides(&mut config, args)?;

    logging::init(&config.logging.level, config.logging.json);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| FontError::ConfigError {
        message: format!("Failed to create tokio runtime: {}", e),
    })?;
    runtime.block_on(async { run_agent_async(&config).await })?;

    // Clean exit - nothing to print
    Ok(String::new())
}

async fn run_agent_async(config: &AgentConfig) -> Result<()> {
    let settings = config.service_settings()?;

    tracing::info!("Starting fontwarden v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Font directory: {}", settings.font_dir.display());

    let sink: Arc<dyn StatusSink> = match &config.status.file {
        Some(path) => Arc::new(StatusFileSink::new(path.clone())),
        None => Arc::new(TracingStatusSink),
    };
    let registrar = registrar::from_kind(config.registrar.kind);
    let control = SignalHost::spawn()?;

    ServiceController::new(settings, registrar, sink)
        .run(control)
        .await
}

/// Fold command-line flags into the loaded configuration
pub fn apply_overrides(config: &mut AgentConfig, args: &RunArgs) -> Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = &args.host {
        config.set("server.host", host)?;
    }
    if let Some(dir) = &args.font_dir {
        config.fonts.dir = Some(dir.clone());
    }
    if let Some(path) = &args.status_file {
        config.status.file = Some(path.clone());
    }
    if let Some(kind) = &args.registrar {
        config.set("registrar.kind", kind)?;
    }
    if let Some(level) = &args.log_level {
        config.set("logging.level", level)?;
    }
    if args.json_logs {
        config.logging.json = true;
    }
    Ok(())
}
