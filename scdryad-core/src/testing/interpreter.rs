//! In-process interpreter doubles.

use crate::error::DryadError;
use crate::interpreter::{Interpreter, InterpreterHandle, InterpreterLauncher, SclangOptions};
use crate::logging::{LogCategory, LogSink};
use crate::traits::HookFuture;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// Interpreter that records what it was asked to do.
pub struct MockInterpreter {
    pid: u32,
    running: AtomicBool,
    interpreted: Mutex<Vec<String>>,
    quit_calls: AtomicUsize,
    log: LogSink,
}

impl MockInterpreter {
    /// Create a running interpreter with a fake pid.
    pub fn new(pid: u32, log: LogSink) -> Self {
        Self {
            pid,
            running: AtomicBool::new(true),
            interpreted: Mutex::new(Vec::new()),
            quit_calls: AtomicUsize::new(0),
            log,
        }
    }

    /// Simulate the process exiting on its own.
    pub fn exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Code sent so far, in order.
    pub fn interpreted(&self) -> Vec<String> {
        self.interpreted.lock().clone()
    }

    /// How many times `quit` reached the interpreter.
    pub fn quit_calls(&self) -> usize {
        self.quit_calls.load(Ordering::SeqCst)
    }
}

impl Interpreter for MockInterpreter {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn interpret<'a>(&'a self, code: &'a str) -> HookFuture<'a, ()> {
        Box::pin(async move {
            if !self.is_running() {
                return Err(DryadError::InterpreterUnavailable {
                    cause: "process has exited".to_string(),
                });
            }
            self.interpreted.lock().push(code.to_string());
            Ok(())
        })
    }

    fn quit<'a>(&'a self) -> HookFuture<'a, ()> {
        Box::pin(async move {
            self.quit_calls.fetch_add(1, Ordering::SeqCst);
            if self.running.swap(false, Ordering::SeqCst) {
                self.log.info(LogCategory::Interpreter, "Mock interpreter quit");
            }
            Ok(())
        })
    }
}

/// Launcher that boots [`MockInterpreter`]s.
pub struct MockLauncher {
    boots: Mutex<Vec<SclangOptions>>,
    interpreters: Mutex<Vec<Arc<MockInterpreter>>>,
    next_pid: AtomicU32,
    fail_boot: AtomicBool,
}

impl MockLauncher {
    /// Create a launcher that boots successfully.
    pub fn new() -> Self {
        Self {
            boots: Mutex::new(Vec::new()),
            interpreters: Mutex::new(Vec::new()),
            next_pid: AtomicU32::new(4000),
            fail_boot: AtomicBool::new(false),
        }
    }

    /// Make subsequent boots fail.
    pub fn fail_boots(&self, fail: bool) {
        self.fail_boot.store(fail, Ordering::SeqCst);
    }

    /// Options of every boot, in order.
    pub fn boots(&self) -> Vec<SclangOptions> {
        self.boots.lock().clone()
    }

    /// Number of successful boots.
    pub fn boot_count(&self) -> usize {
        self.interpreters.lock().len()
    }

    /// Interpreters booted so far.
    pub fn interpreters(&self) -> Vec<Arc<MockInterpreter>> {
        self.interpreters.lock().clone()
    }

    /// The most recently booted interpreter.
    pub fn last(&self) -> Option<Arc<MockInterpreter>> {
        self.interpreters.lock().last().cloned()
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterLauncher for MockLauncher {
    fn boot<'a>(
        &'a self,
        options: SclangOptions,
        log: LogSink,
    ) -> HookFuture<'a, InterpreterHandle> {
        Box::pin(async move {
            self.boots.lock().push(options);
            if self.fail_boot.load(Ordering::SeqCst) {
                return Err(DryadError::InterpreterBoot {
                    executable: PathBuf::from("mock-sclang"),
                    cause: "boot failure requested".to_string(),
                });
            }

            let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
            let interpreter = Arc::new(MockInterpreter::new(pid, log.clone()));
            self.interpreters.lock().push(Arc::clone(&interpreter));
            log.info(LogCategory::Interpreter, format!("Mock interpreter booted (pid {})", pid));

            Ok(InterpreterHandle::new(interpreter, options))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn boot_records_options() {
        let launcher = MockLauncher::new();
        let options = SclangOptions {
            echo: true,
            ..SclangOptions::default()
        };

        let handle = launcher.boot(options, LogSink::tracing_only()).await.unwrap();
        assert_eq!(launcher.boots(), vec![options]);
        assert_eq!(handle.options(), options);
        assert_eq!(handle.pid(), Some(4000));
        assert!(handle.is_running());
    }

    #[tokio::test]
    async fn handle_quits_once() {
        let launcher = MockLauncher::new();
        let handle = launcher
            .boot(SclangOptions::default(), LogSink::tracing_only())
            .await
            .unwrap();

        handle.interpret("1 + 1").await.unwrap();
        assert!(handle.quit().await.unwrap());
        assert!(!handle.clone().quit().await.unwrap());
        assert!(handle.interpret("2 + 2").await.is_err());

        let interpreter = launcher.last().unwrap();
        assert_eq!(interpreter.quit_calls(), 1);
        assert_eq!(interpreter.interpreted(), vec!["1 + 1"]);
    }

    #[tokio::test]
    async fn quitting_an_exited_interpreter_succeeds() {
        let launcher = MockLauncher::new();
        let handle = launcher
            .boot(SclangOptions::default(), LogSink::tracing_only())
            .await
            .unwrap();

        launcher.last().unwrap().exit();
        assert!(!handle.is_running());
        assert!(handle.quit().await.is_ok());
    }

    #[tokio::test]
    async fn failing_boot() {
        let launcher = MockLauncher::new();
        launcher.fail_boots(true);
        let err = launcher
            .boot(SclangOptions::default(), LogSink::tracing_only())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E301");
        assert_eq!(launcher.boot_count(), 0);
    }
}
