//! Common test utilities for integration tests.

#![allow(dead_code)]

use scdryad_core::dispatch::{
    CommandDispatch, Dispatcher, MemoryTransport, SentCommand, WireMessage,
};
use scdryad_core::logging::{BufferedCollector, LogSink};
use scdryad_core::player::DryadPlayer;
use scdryad_core::types::SynthNodeId;
use std::sync::Arc;
use std::time::Duration;

/// Player, transport and log collector wired together.
pub struct Harness {
    pub transport: Arc<MemoryTransport>,
    pub dispatch: Arc<dyn CommandDispatch>,
    pub collector: Arc<BufferedCollector>,
    pub player: DryadPlayer,
}

impl Harness {
    pub fn new() -> Self {
        let transport = Arc::new(MemoryTransport::with_defaults());
        let dispatch: Arc<dyn CommandDispatch> = Arc::new(Dispatcher::new(transport.clone()));
        let collector = Arc::new(BufferedCollector::with_default_capacity());
        let player = DryadPlayer::new().with_log_sink(LogSink::new(collector.clone()));
        Self {
            transport,
            dispatch,
            collector,
            player,
        }
    }

    /// Every sent message, flattened.
    pub fn messages(&self) -> Vec<WireMessage> {
        self.transport
            .sent()
            .into_iter()
            .flat_map(|sent| sent.command.bundle.packets)
            .collect()
    }

    pub fn sent(&self) -> Vec<SentCommand> {
        self.transport.sent()
    }
}

/// Assert a command is a single `/n_set` to `node_id` at 30ms latency.
pub fn assert_node_set(sent: &SentCommand, node_id: SynthNodeId) {
    assert_eq!(sent.node_id, node_id);
    assert_eq!(sent.command.bundle.latency, Duration::from_millis(30));
    assert_eq!(sent.command.bundle.packets.len(), 1);
    let packet = &sent.command.bundle.packets[0];
    assert_eq!(packet.address, "/n_set");
    assert_eq!(packet.target_node(), Some(node_id));
}
