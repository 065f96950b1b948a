//! Events delivered by value streams.

use serde_json::Value;

/// One delivery from a stream to its listener.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Current value of a property-like stream at subscribe time.
    Initial(Value),
    /// A new value.
    Next(Value),
    /// The source reported an error; the subscription stays open.
    Error(String),
    /// The source finished; nothing follows.
    End,
}

impl StreamEvent {
    /// The value payload, if this event carries one.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Initial(v) | Self::Next(v) => Some(v),
            Self::Error(_) | Self::End => None,
        }
    }

    /// Whether this is the end-of-stream marker.
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initial(_) => "initial",
            Self::Next(_) => "next",
            Self::Error(_) => "error",
            Self::End => "end",
        }
    }
}

impl From<Value> for StreamEvent {
    fn from(value: Value) -> Self {
        Self::Next(value)
    }
}
