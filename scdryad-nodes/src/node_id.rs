//! Addressable target stand-in.

use scdryad_core::context::{Context, ContextEntries, keys};
use scdryad_core::error::Result;
use scdryad_core::traits::{Dryad, DryadInfo, Hook};
use scdryad_core::types::SynthNodeId;

/// Publishes a fixed `nodeID` for its descendants.
///
/// Stands in for a synth or group that has already been created on the
/// server, so controls below it know where to send.
#[derive(Debug, Clone, Copy)]
pub struct NodeIdDryad {
    node_id: SynthNodeId,
}

impl NodeIdDryad {
    /// Publish `node_id`.
    pub fn new(node_id: impl Into<SynthNodeId>) -> Self {
        Self {
            node_id: node_id.into(),
        }
    }

    /// The published id.
    pub fn node_id(&self) -> SynthNodeId {
        self.node_id
    }
}

impl Dryad for NodeIdDryad {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("sc", "node_id").with_hooks([Hook::PrepareForAdd])
    }

    fn prepare_for_add(&self, _ctx: &Context) -> Result<ContextEntries> {
        Ok(ContextEntries::new().with(keys::NODE_ID, self.node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publishes_node_id() {
        let entries = NodeIdDryad::new(1001).prepare_for_add(&Context::new()).unwrap();
        let ctx = Context::root(entries);
        assert_eq!(ctx.node_id(), Some(SynthNodeId::new(1001)));
    }
}
