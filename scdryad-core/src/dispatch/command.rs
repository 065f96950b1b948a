//! Timed command bundles.

use super::message::WireMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Latency applied to streamed parameter changes.
///
/// Gives the transport headroom so bundles are not scheduled in the past.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(30);

/// A scheduled batch of wire messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBundle {
    /// Delay from now before the server executes the packets.
    pub latency: Duration,
    /// Messages in execution order.
    pub packets: Vec<WireMessage>,
}

impl CommandBundle {
    /// Create a bundle.
    pub fn new(latency: Duration, packets: Vec<WireMessage>) -> Self {
        Self { latency, packets }
    }

    /// Bundle with a single message at the default latency.
    pub fn single(packet: WireMessage) -> Self {
        Self::new(DEFAULT_LATENCY, vec![packet])
    }

    /// Latency in seconds, as the server's bundle time offset.
    pub fn time(&self) -> f64 {
        self.latency.as_secs_f64()
    }
}

/// System a command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSystem {
    /// The synthesis server.
    ScServer,
}

/// A command handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Destination system.
    pub target: TargetSystem,
    /// Timed payload.
    pub bundle: CommandBundle,
}

impl Command {
    /// Command for the synthesis server.
    pub fn scserver(bundle: CommandBundle) -> Self {
        Self {
            target: TargetSystem::ScServer,
            bundle,
        }
    }
}
