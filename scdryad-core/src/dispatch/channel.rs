//! Transport that hands commands to an async network task.

use super::command::Command;
use super::memory::SentCommand;
use super::traits::{DispatchError, DispatchResult, Transport};
use crate::types::SynthNodeId;
use tokio::sync::mpsc;

/// Forwards commands over a bounded channel.
///
/// The receiving half belongs to whatever task owns the socket to the
/// server. Sending never blocks: a full channel is reported as
/// [`DispatchError::QueueFull`].
pub struct ChannelTransport {
    tx: mpsc::Sender<SentCommand>,
    capacity: usize,
}

impl ChannelTransport {
    /// Create a transport and the receiver the network task drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SentCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, capacity }, rx)
    }
}

impl Transport for ChannelTransport {
    fn send(&self, node_id: SynthNodeId, command: Command) -> DispatchResult<()> {
        self.tx
            .try_send(SentCommand { node_id, command })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull {
                    current: self.capacity,
                    max: self.capacity,
                },
                mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
            })
    }
}
