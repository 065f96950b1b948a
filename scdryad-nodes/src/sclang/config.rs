//! Configuration for launching sclang processes.

use scdryad_core::error::{DryadError, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default executable looked up on `PATH`.
pub const DEFAULT_EXECUTABLE: &str = "sclang";

/// Default time to wait for the process to exit after a quit.
pub const DEFAULT_QUIT_TIMEOUT: Duration = Duration::from_millis(3000);

/// How to start an sclang process.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Path to the sclang executable.
    executable: PathBuf,
    /// Extra command line arguments.
    args: Vec<String>,
    /// Time to wait for exit after quitting before the process is killed.
    quit_timeout: Duration,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            args: Vec::new(),
            quit_timeout: DEFAULT_QUIT_TIMEOUT,
        }
    }
}

impl LauncherConfig {
    /// Create a new builder.
    pub fn builder() -> LauncherConfigBuilder {
        LauncherConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SCLANG_PATH`: path to the sclang executable
    /// - `SCLANG_QUIT_TIMEOUT_MS`: milliseconds to wait for exit after quit
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(path) = lookup("SCLANG_PATH").filter(|p| !p.is_empty()) {
            builder = builder.executable(path);
        }

        if let Some(raw) = lookup("SCLANG_QUIT_TIMEOUT_MS") {
            let millis = raw.trim().parse::<u64>().map_err(|e| DryadError::ConfigValue {
                field: "SCLANG_QUIT_TIMEOUT_MS".to_string(),
                cause: format!("expected milliseconds, got '{}': {}", raw, e),
            })?;
            builder = builder.quit_timeout(Duration::from_millis(millis));
        }

        Ok(builder.build())
    }

    /// Get the executable path.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Get the extra arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the quit timeout.
    pub fn quit_timeout(&self) -> Duration {
        self.quit_timeout
    }
}

/// Builder for LauncherConfig.
#[derive(Debug, Clone, Default)]
pub struct LauncherConfigBuilder {
    executable: Option<PathBuf>,
    args: Vec<String>,
    quit_timeout: Option<Duration>,
}

impl LauncherConfigBuilder {
    /// Set the executable path.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Append a command line argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the quit timeout.
    pub fn quit_timeout(mut self, timeout: Duration) -> Self {
        self.quit_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LauncherConfig {
        let defaults = LauncherConfig::default();
        LauncherConfig {
            executable: self.executable.unwrap_or(defaults.executable),
            args: self.args,
            quit_timeout: self.quit_timeout.unwrap_or(defaults.quit_timeout),
        }
    }
}
