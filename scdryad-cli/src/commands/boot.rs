//! Boot command - run an sclang interpreter under a dryad player.

use anyhow::{Context, Result};
use scdryad_core::interpreter::SclangProperties;
use scdryad_core::logging::{BufferedCollector, LogLevel, LogSink};
use scdryad_core::player::{DryadNode, DryadPlayer};
use scdryad_nodes::sclang::{LauncherConfig, ProcessLauncher, SclangDryad};
use std::path::PathBuf;
use std::sync::Arc;

/// Options for the boot command.
#[derive(Debug, Default)]
pub struct BootOptions {
    /// Do not forward interpreter output.
    pub no_debug: bool,
    /// Log code sent to the interpreter.
    pub echo: bool,
    /// Let the interpreter read this terminal's stdin.
    pub stdin: bool,
    /// sclang executable, overriding `SCLANG_PATH`.
    pub sclang: Option<PathBuf>,
    /// Code to interpret once booted.
    pub eval: Vec<String>,
}

impl BootOptions {
    /// Only flags the user passed become properties; the rest use defaults.
    fn properties(&self) -> SclangProperties {
        SclangProperties {
            debug: self.no_debug.then_some(false),
            echo: self.echo.then_some(true),
            stdin: self.stdin.then_some(true),
        }
    }
}

/// Run the boot command.
pub async fn run(options: BootOptions) -> Result<()> {
    let mut config = LauncherConfig::from_env().context("Invalid sclang launcher environment")?;
    if let Some(path) = &options.sclang {
        config = LauncherConfig::builder()
            .executable(path)
            .quit_timeout(config.quit_timeout())
            .build();
    }

    let launcher = Arc::new(ProcessLauncher::new(config));
    let collector =
        Arc::new(BufferedCollector::with_default_capacity().with_min_level(LogLevel::Warn));
    let player = DryadPlayer::new().with_log_sink(LogSink::new(collector.clone()));

    let dryad = SclangDryad::new(launcher).with_properties(options.properties());
    let boot_options = dryad.options();
    player
        .play(DryadNode::new(dryad))
        .await
        .context("Failed to boot sclang")?;

    println!(
        "sclang booted (debug: {}, echo: {}, stdin: {}). Press Ctrl+C to quit.",
        boot_options.debug, boot_options.echo, boot_options.stdin
    );

    if !options.eval.is_empty() {
        let contexts = player.mounted_contexts();
        let handle = contexts
            .first()
            .and_then(|(_, ctx)| ctx.interpreter())
            .context("Interpreter handle missing from context")?;
        for code in &options.eval {
            if let Err(e) = handle.interpret(code).await {
                tracing::error!(error = %e, "Failed to send code to sclang");
            }
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    println!("Stopping...");
    player.stop().await.context("Failed to stop sclang")?;

    let problems = collector.all();
    if !problems.is_empty() {
        println!("{} warning(s) during the session:", problems.len());
        for event in problems {
            println!("  {}", event.format_line());
        }
    }

    Ok(())
}
