//! Wire messages addressed to the synthesis server.

use crate::types::SynthNodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter name to value mapping for `/n_set`.
///
/// Ordered so that identical mappings always produce identical messages.
pub type ParamMap = BTreeMap<String, f32>;

/// An argument of a wire message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum OscArg {
    /// 32-bit integer.
    Int(i32),
    /// 32-bit float.
    Float(f32),
    /// String.
    String(String),
}

impl From<i32> for OscArg {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for OscArg {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for OscArg {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for OscArg {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// A single server command: an address pattern plus arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Address pattern (e.g., "/n_set").
    pub address: String,
    /// Arguments in order.
    pub args: Vec<OscArg>,
}

impl WireMessage {
    /// Address of the node-set command.
    pub const NODE_SET: &'static str = "/n_set";

    /// Create a message with no arguments.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument.
    pub fn with_arg(mut self, arg: impl Into<OscArg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set control values of a running node.
    ///
    /// Produces `/n_set id name value [name value ...]`.
    pub fn node_set(node_id: SynthNodeId, params: &ParamMap) -> Self {
        let mut args = Vec::with_capacity(1 + params.len() * 2);
        args.push(OscArg::Int(node_id.as_i32()));
        for (name, value) in params {
            args.push(OscArg::String(name.clone()));
            args.push(OscArg::Float(*value));
        }
        Self {
            address: Self::NODE_SET.to_string(),
            args,
        }
    }

    /// The node id a node-targeted message addresses.
    pub fn target_node(&self) -> Option<SynthNodeId> {
        match self.args.first() {
            Some(OscArg::Int(id)) if self.address.starts_with("/n_") => Some(SynthNodeId::new(*id)),
            _ => None,
        }
    }
}
