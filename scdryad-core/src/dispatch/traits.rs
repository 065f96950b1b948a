//! Core dispatch traits and error types.

use super::command::Command;
use crate::context::Context;
use crate::error::Result;
use crate::types::SynthNodeId;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The transport's outgoing queue is full.
    #[error("Queue full: {current}/{max} pending commands")]
    QueueFull {
        /// Current queue size.
        current: usize,
        /// Maximum queue size.
        max: usize,
    },

    /// The transport has been closed.
    #[error("Transport is closed")]
    Closed,

    /// Backend-specific error.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for transport operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// The network layer that delivers commands to the server.
///
/// Retries and backoff, if any, belong to implementations of this trait.
pub trait Transport: Send + Sync {
    /// Hand a command addressed to `node_id` to the network.
    fn send(&self, node_id: SynthNodeId, command: Command) -> DispatchResult<()>;
}

/// Submits commands on behalf of a node.
pub trait CommandDispatch: Send + Sync {
    /// Submit `command` addressed via the node id found in `ctx`.
    fn call_command(&self, ctx: &Context, command: Command) -> Result<()>;
}

/// Stateless forwarder from a node's context to a [`Transport`].
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    /// Create a dispatcher over a transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

impl CommandDispatch for Dispatcher {
    fn call_command(&self, ctx: &Context, command: Command) -> Result<()> {
        let node_id = ctx.require_node_id("dispatch")?;
        tracing::trace!(
            node_id = %node_id,
            packets = command.bundle.packets.len(),
            time = command.bundle.time(),
            "Dispatching command"
        );
        self.transport.send(node_id, command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        _assert_send_sync::<DispatchError>();
        _assert_send_sync::<Dispatcher>();
    }
}
