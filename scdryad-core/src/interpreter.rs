//! Interpreter boot/quit contract.
//!
//! A launcher starts an interpreter process and returns an
//! [`InterpreterHandle`]. Descendant dryads may send code through the handle;
//! only the dryad that booted it quits it.

use crate::error::{DryadError, Result};
use crate::logging::LogSink;
use crate::traits::HookFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Options an interpreter is booted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SclangOptions {
    /// Forward interpreter output to the log sink.
    pub debug: bool,
    /// Log each chunk of code sent to the interpreter.
    pub echo: bool,
    /// Let the interpreter read the parent process's stdin.
    pub stdin: bool,
}

impl Default for SclangOptions {
    fn default() -> Self {
        Self {
            debug: true,
            echo: false,
            stdin: false,
        }
    }
}

/// Caller-supplied options; unset fields fall back to [`SclangOptions::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SclangProperties {
    /// See [`SclangOptions::debug`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    /// See [`SclangOptions::echo`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo: Option<bool>,
    /// See [`SclangOptions::stdin`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdin: Option<bool>,
}

impl SclangProperties {
    /// Resolve against the defaults. Supplied values always win.
    pub fn merged_over_defaults(&self) -> SclangOptions {
        self.merged_over(SclangOptions::default())
    }

    /// Resolve against `defaults`. Supplied values always win.
    pub fn merged_over(&self, defaults: SclangOptions) -> SclangOptions {
        SclangOptions {
            debug: self.debug.unwrap_or(defaults.debug),
            echo: self.echo.unwrap_or(defaults.echo),
            stdin: self.stdin.unwrap_or(defaults.stdin),
        }
    }
}

impl From<SclangOptions> for SclangProperties {
    fn from(options: SclangOptions) -> Self {
        Self {
            debug: Some(options.debug),
            echo: Some(options.echo),
            stdin: Some(options.stdin),
        }
    }
}

/// A running interpreter.
pub trait Interpreter: Send + Sync {
    /// OS process id, if the interpreter runs as a process.
    fn pid(&self) -> Option<u32>;

    /// Whether the interpreter is still running.
    fn is_running(&self) -> bool;

    /// Send code to the interpreter.
    fn interpret<'a>(&'a self, code: &'a str) -> HookFuture<'a, ()>;

    /// Stop the interpreter. Stopping one that already exited succeeds.
    fn quit<'a>(&'a self) -> HookFuture<'a, ()>;
}

/// Boots interpreters.
pub trait InterpreterLauncher: Send + Sync {
    /// Boot a fresh interpreter.
    fn boot<'a>(
        &'a self,
        options: SclangOptions,
        log: LogSink,
    ) -> HookFuture<'a, InterpreterHandle>;
}

/// Shared reference to a running interpreter.
///
/// Clones share quit state: whichever clone quits first stops the
/// interpreter, later quits are no-ops.
#[derive(Clone)]
pub struct InterpreterHandle {
    inner: Arc<dyn Interpreter>,
    options: SclangOptions,
    quit_issued: Arc<AtomicBool>,
}

impl InterpreterHandle {
    /// Wrap a running interpreter.
    pub fn new(inner: Arc<dyn Interpreter>, options: SclangOptions) -> Self {
        Self {
            inner,
            options,
            quit_issued: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Options the interpreter was booted with.
    pub fn options(&self) -> SclangOptions {
        self.options
    }

    /// OS process id, if any.
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid()
    }

    /// Whether the interpreter is running and has not been asked to quit.
    pub fn is_running(&self) -> bool {
        !self.quit_issued.load(Ordering::SeqCst) && self.inner.is_running()
    }

    /// Send code to the interpreter.
    pub async fn interpret(&self, code: &str) -> Result<()> {
        if self.quit_issued.load(Ordering::SeqCst) {
            return Err(DryadError::InterpreterUnavailable {
                cause: "interpreter has been quit".to_string(),
            });
        }
        self.inner.interpret(code).await
    }

    /// Quit the interpreter.
    ///
    /// Returns `Ok(true)` for the call that stopped it and `Ok(false)` when
    /// a quit was already issued.
    pub async fn quit(&self) -> Result<bool> {
        if self.quit_issued.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.quit().await?;
        Ok(true)
    }

    /// Whether a quit has been issued.
    pub fn is_quit(&self) -> bool {
        self.quit_issued.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for InterpreterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterHandle")
            .field("pid", &self.pid())
            .field("options", &self.options)
            .field("quit", &self.is_quit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = SclangOptions::default();
        assert!(options.debug);
        assert!(!options.echo);
        assert!(!options.stdin);
    }

    #[test]
    fn supplied_values_win() {
        let props = SclangProperties {
            debug: Some(false),
            echo: None,
            stdin: Some(true),
        };
        let options = props.merged_over_defaults();
        assert_eq!(
            options,
            SclangOptions {
                debug: false,
                echo: false,
                stdin: true,
            }
        );
    }

    #[test]
    fn properties_parse_from_yaml() {
        let props: SclangProperties = serde_yaml::from_str("echo: true").unwrap();
        assert_eq!(props.echo, Some(true));
        assert_eq!(props.debug, None);

        assert!(serde_yaml::from_str::<SclangProperties>("verbose: true").is_err());
    }
}
