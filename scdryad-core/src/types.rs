//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node on the synthesis server.
///
/// The server addresses synths and groups by signed 32-bit ids; negative ids
/// are reserved by the server for auto-generated nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynthNodeId(i32);

impl SynthNodeId {
    /// Create a node id from a raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for SynthNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

impl From<i32> for SynthNodeId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        assert_eq!(SynthNodeId::new(1000).to_string(), "node_1000");
        assert_eq!(SynthNodeId::from(-1).as_i32(), -1);
    }

    #[test]
    fn node_id_serializes_as_integer() {
        let json = serde_json::to_string(&SynthNodeId::new(1001)).unwrap();
        assert_eq!(json, "1001");
    }
}
