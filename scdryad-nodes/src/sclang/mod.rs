//! Interpreter lifecycle dryad.
//!
//! Boots a fresh sclang for its subtree and quits it on removal.

mod config;
mod process;

pub use config::{DEFAULT_EXECUTABLE, DEFAULT_QUIT_TIMEOUT, LauncherConfig, LauncherConfigBuilder};
pub use process::{COMMAND_DELIMITER, ProcessLauncher, SclangProcess};

use scdryad_core::context::{Context, ContextEntries, ContextFactory, ContextValue, keys};
use scdryad_core::error::{DryadError, Result};
use scdryad_core::interpreter::{InterpreterLauncher, SclangOptions, SclangProperties};
use scdryad_core::logging::{LogCategory, LogSink};
use scdryad_core::traits::{Dryad, DryadInfo, Hook, HookFuture};
use std::sync::Arc;

/// Boots an sclang interpreter and publishes it as `sclang` for all
/// descendants.
///
/// Always boots a new interpreter, shadowing any `sclang` an ancestor
/// published.
///
/// # Configuration
///
/// ```yaml
/// options:
///   debug: true
///   echo: false
///   stdin: false
/// ```
///
/// # Parameters
///
/// - `debug` - Forward interpreter output to the log (default: true)
/// - `echo` - Log each chunk of code sent to the interpreter (default: false)
/// - `stdin` - Let the interpreter read this process's stdin (default: false)
pub struct SclangDryad {
    launcher: Arc<dyn InterpreterLauncher>,
    properties: SclangProperties,
}

impl SclangDryad {
    /// Create a dryad booting through `launcher` with default options.
    pub fn new(launcher: Arc<dyn InterpreterLauncher>) -> Self {
        Self {
            launcher,
            properties: SclangProperties::default(),
        }
    }

    /// Create from YAML configuration.
    ///
    /// Accepts either the option map itself or a map with an `options` key.
    pub fn from_config(
        launcher: Arc<dyn InterpreterLauncher>,
        config: &serde_yaml::Value,
    ) -> Result<Self> {
        let options = match config.get("options") {
            Some(options) => options.clone(),
            None if config.is_null() => return Ok(Self::new(launcher)),
            None => config.clone(),
        };

        let properties: SclangProperties =
            serde_yaml::from_value(options).map_err(|e| DryadError::ConfigValue {
                field: "options".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::new(launcher).with_properties(properties))
    }

    /// Parse YAML text and build the dryad.
    pub fn from_yaml(launcher: Arc<dyn InterpreterLauncher>, yaml: &str) -> Result<Self> {
        let config: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| DryadError::YamlParse {
                cause: e.to_string(),
            })?;
        Self::from_config(launcher, &config)
    }

    /// Replace the caller-supplied options.
    pub fn with_properties(mut self, properties: SclangProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Set `debug`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.properties.debug = Some(debug);
        self
    }

    /// Set `echo`.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.properties.echo = Some(echo);
        self
    }

    /// Set `stdin`.
    pub fn with_stdin(mut self, stdin: bool) -> Self {
        self.properties.stdin = Some(stdin);
        self
    }

    /// Options the interpreter will be booted with.
    pub fn options(&self) -> SclangOptions {
        self.properties.merged_over_defaults()
    }
}

impl Dryad for SclangDryad {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("sc", "sclang")
            .with_description("Boots an sclang interpreter for its children")
            .with_hooks([Hook::PrepareForAdd, Hook::Remove])
    }

    fn prepare_for_add(&self, _ctx: &Context) -> Result<ContextEntries> {
        let launcher = Arc::clone(&self.launcher);
        let options = self.options();
        let name = self.info().name;

        let boot: ContextFactory =
            Arc::new(move |ctx: Context| -> HookFuture<'static, ContextValue> {
                let launcher = Arc::clone(&launcher);
                let log = ctx
                    .log_sink()
                    .cloned()
                    .unwrap_or_else(LogSink::tracing_only)
                    .for_dryad(name.clone());
                Box::pin(async move {
                    let handle = launcher.boot(options, log).await?;
                    Ok(ContextValue::Interpreter(handle))
                })
            });

        Ok(ContextEntries::new().with(keys::SCLANG, ContextValue::Deferred(boot)))
    }

    fn remove<'a>(&'a self, ctx: Context) -> HookFuture<'a, ()> {
        Box::pin(async move {
            let name = self.info().name;
            let log = ctx
                .log_sink()
                .cloned()
                .unwrap_or_else(LogSink::tracing_only)
                .for_dryad(name);

            let Some(handle) = ctx.interpreter() else {
                log.debug(LogCategory::Lifecycle, "No interpreter to quit");
                return Ok(());
            };

            if handle.quit().await? {
                log.info(LogCategory::Interpreter, "sclang quit");
            } else {
                log.debug(LogCategory::Interpreter, "sclang was already quit");
            }
            Ok(())
        })
    }
}
