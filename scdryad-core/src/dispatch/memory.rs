//! In-memory transport that records commands.
//!
//! Useful for tests and for running trees without a server.

use super::command::Command;
use super::traits::{DispatchError, DispatchResult, Transport};
use crate::types::SynthNodeId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Default maximum number of recorded commands.
pub const DEFAULT_MAX_RECORDED: usize = 100_000;

/// A command as received by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SentCommand {
    /// Node id the command was addressed with.
    pub node_id: SynthNodeId,
    /// The command itself.
    pub command: Command,
}

/// Transport that keeps every command in memory.
pub struct MemoryTransport {
    sent: Mutex<Vec<SentCommand>>,
    max_recorded: usize,
    closed: AtomicBool,
    total_sent: AtomicUsize,
}

impl MemoryTransport {
    /// Create a transport holding at most `max_recorded` commands.
    pub fn new(max_recorded: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            max_recorded,
            closed: AtomicBool::new(false),
            total_sent: AtomicUsize::new(0),
        }
    }

    /// Create with default capacity.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_RECORDED)
    }

    /// Snapshot of recorded commands.
    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().clone()
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total commands accepted since creation (not reset by `clear`).
    pub fn total_sent(&self) -> usize {
        self.total_sent.load(Ordering::Relaxed)
    }

    /// Drop recorded commands.
    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Refuse every further command.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Transport for MemoryTransport {
    fn send(&self, node_id: SynthNodeId, command: Command) -> DispatchResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::Closed);
        }

        let mut sent = self.sent.lock();
        if sent.len() >= self.max_recorded {
            return Err(DispatchError::QueueFull {
                current: sent.len(),
                max: self.max_recorded,
            });
        }
        sent.push(SentCommand { node_id, command });
        self.total_sent.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(node_id = %node_id, "Recorded command");
        Ok(())
    }
}
