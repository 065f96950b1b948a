//! sclang as a child process.

use super::config::LauncherConfig;
use parking_lot::Mutex;
use scdryad_core::error::{DryadError, Result};
use scdryad_core::interpreter::{
    Interpreter, InterpreterHandle, InterpreterLauncher, SclangOptions,
};
use scdryad_core::logging::{LogCategory, LogSink};
use scdryad_core::traits::HookFuture;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

/// Terminates each chunk of code sent to sclang's stdin.
pub const COMMAND_DELIMITER: u8 = 0x0c;

/// Code sent to ask sclang to shut down on its own.
pub const QUIT_CODE: &str = "0.exit;";

/// Launches sclang processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    config: LauncherConfig,
}

impl ProcessLauncher {
    /// Create a launcher.
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// The launcher's configuration.
    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }
}

impl InterpreterLauncher for ProcessLauncher {
    fn boot<'a>(
        &'a self,
        options: SclangOptions,
        log: LogSink,
    ) -> HookFuture<'a, InterpreterHandle> {
        Box::pin(async move {
            let process = SclangProcess::spawn(&self.config, options, log)?;
            Ok(InterpreterHandle::new(Arc::new(process), options))
        })
    }
}

/// A running sclang process.
///
/// Output lines are forwarded to the log sink when `debug` is set. Code is
/// written to stdin unless the process inherited the parent's stdin.
///
/// Quitting first asks sclang to exit through stdin so it can shut down the
/// servers it booted. The process is killed only if it is still running
/// after the configured quit timeout. With an inherited stdin there is no
/// way to ask, so the process gets the timeout to exit before it is killed.
pub struct SclangProcess {
    pid: Option<u32>,
    child: tokio::sync::Mutex<Child>,
    stdin: tokio::sync::Mutex<Option<ChildStdin>>,
    running: Arc<AtomicBool>,
    options: SclangOptions,
    quit_timeout: Duration,
    log: LogSink,
    readers: Mutex<Vec<JoinHandle<()>>>,
}

impl SclangProcess {
    /// Start sclang in interactive mode.
    pub fn spawn(config: &LauncherConfig, options: SclangOptions, log: LogSink) -> Result<Self> {
        let mut command = Command::new(config.executable());
        command
            .arg("-i")
            .arg("scdryad")
            .args(config.args())
            .stdin(if options.stdin {
                Stdio::inherit()
            } else {
                Stdio::piped()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| DryadError::InterpreterBoot {
            executable: config.executable().to_path_buf(),
            cause: e.to_string(),
        })?;

        let pid = child.id();
        let running = Arc::new(AtomicBool::new(true));
        let mut readers = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(
                stdout,
                options.debug,
                LogCategory::Interpreter,
                log.clone(),
                Some(Arc::clone(&running)),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(
                stderr,
                options.debug,
                LogCategory::Interpreter,
                log.clone(),
                None,
            ));
        }

        let stdin = child.stdin.take();

        tracing::info!(
            executable = %config.executable().display(),
            pid = ?pid,
            debug = options.debug,
            echo = options.echo,
            stdin = options.stdin,
            "sclang started"
        );
        log.info(
            LogCategory::Interpreter,
            format!(
                "Booted sclang (pid {})",
                pid.map_or("?".to_string(), |p| p.to_string())
            ),
        );

        Ok(Self {
            pid,
            child: tokio::sync::Mutex::new(child),
            stdin: tokio::sync::Mutex::new(stdin),
            running,
            options,
            quit_timeout: config.quit_timeout(),
            log,
            readers: Mutex::new(readers),
        })
    }

    fn stop_readers(&self) {
        for reader in self.readers.lock().drain(..) {
            reader.abort();
        }
    }
}

/// Forward each output line to the sink (at info) or to trace only.
///
/// When `running` is given it is cleared at end of output.
fn forward_lines<R>(
    reader: R,
    debug: bool,
    category: LogCategory,
    log: LogSink,
    running: Option<Arc<AtomicBool>>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if debug {
                        log.info(category, line);
                    } else {
                        tracing::trace!(line = %line, "sclang output");
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read sclang output");
                    break;
                }
            }
        }
        if let Some(running) = running {
            running.store(false, Ordering::SeqCst);
        }
    })
}

impl Interpreter for SclangProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn interpret<'a>(&'a self, code: &'a str) -> HookFuture<'a, ()> {
        Box::pin(async move {
            if self.options.stdin {
                return Err(DryadError::InterpreterUnavailable {
                    cause: "sclang reads the parent's stdin".to_string(),
                });
            }
            if !self.is_running() {
                return Err(DryadError::InterpreterUnavailable {
                    cause: "sclang has exited".to_string(),
                });
            }

            let mut guard = self.stdin.lock().await;
            let stdin = guard.as_mut().ok_or_else(|| DryadError::InterpreterUnavailable {
                cause: "sclang stdin is closed".to_string(),
            })?;

            if self.options.echo {
                self.log.info(LogCategory::Interpreter, code);
            }

            let io = |e: std::io::Error| DryadError::InterpreterIo {
                cause: e.to_string(),
            };
            stdin.write_all(code.as_bytes()).await.map_err(io)?;
            stdin.write_all(&[COMMAND_DELIMITER]).await.map_err(io)?;
            stdin.flush().await.map_err(io)?;
            Ok(())
        })
    }

    fn quit<'a>(&'a self) -> HookFuture<'a, ()> {
        Box::pin(async move {
            let stdin = self.stdin.lock().await.take();

            let mut child = self.child.lock().await;
            if let Ok(Some(status)) = child.try_wait() {
                tracing::debug!(pid = ?self.pid, status = %status, "sclang already exited");
                self.running.store(false, Ordering::SeqCst);
                self.stop_readers();
                return Ok(());
            }

            if let Some(mut stdin) = stdin {
                // A broken pipe here means sclang is already on its way out.
                if let Err(e) = request_exit(&mut stdin).await {
                    tracing::debug!(pid = ?self.pid, error = %e, "Exit request not delivered");
                }
                // Closing stdin lets sclang see end of input.
                drop(stdin);
            }

            let exited = tokio::time::timeout(self.quit_timeout, child.wait()).await;
            let waited = match exited {
                Ok(waited) => waited,
                Err(_) => {
                    self.log.warn(
                        LogCategory::Interpreter,
                        format!(
                            "sclang did not exit within {:?}, killing it",
                            self.quit_timeout
                        ),
                    );
                    if let Err(e) = child.start_kill() {
                        tracing::debug!(pid = ?self.pid, error = %e, "Kill signal not delivered");
                    }
                    child.wait().await
                }
            };

            self.running.store(false, Ordering::SeqCst);
            self.stop_readers();

            let status = waited.map_err(|e| DryadError::InterpreterIo {
                cause: e.to_string(),
            })?;
            self.log
                .info(LogCategory::Interpreter, format!("sclang exited ({})", status));
            Ok(())
        })
    }
}

/// Ask sclang to exit on its own.
async fn request_exit(stdin: &mut ChildStdin) -> std::io::Result<()> {
    stdin.write_all(QUIT_CODE.as_bytes()).await?;
    stdin.write_all(&[COMMAND_DELIMITER]).await?;
    stdin.flush().await
}

impl Drop for SclangProcess {
    fn drop(&mut self) {
        self.stop_readers();
    }
}
