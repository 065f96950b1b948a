//! Layered context threaded through a tree walk.
//!
//! A [`Context`] is an immutable chain of layers. Each node receives the
//! merged context of its ancestors and publishes its own entries by
//! extending it, which yields a new context sharing every ancestor layer.
//! Nothing is ever written into an existing layer, so sibling subtrees
//! cannot observe each other's entries.

use crate::error::{DryadError, Result};
use crate::interpreter::InterpreterHandle;
use crate::logging::LogSink;
use crate::stream::SubscriptionHandle;
use crate::traits::HookFuture;
use crate::types::SynthNodeId;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Well-known context keys.
pub mod keys {
    /// Id of the server node that descendants address.
    pub const NODE_ID: &str = "nodeID";
    /// Running interpreter handle.
    pub const SCLANG: &str = "sclang";
    /// Stream subscription owned by a stream-bridge dryad.
    pub const SUBSCRIPTION: &str = "subscription";
    /// Logging sink.
    pub const LOG: &str = "log";
}

/// Factory for a context value that is produced when the entry is resolved.
///
/// The factory receives the context of the publishing node (its inherited
/// entries plus any non-deferred entries it published alongside).
pub type ContextFactory = Arc<dyn Fn(Context) -> HookFuture<'static, ContextValue> + Send + Sync>;

/// A value stored in the context.
#[derive(Clone)]
pub enum ContextValue {
    /// Plain data.
    Value(serde_json::Value),
    /// Server node id.
    NodeId(SynthNodeId),
    /// Running interpreter.
    Interpreter(InterpreterHandle),
    /// Active stream subscription.
    Subscription(SubscriptionHandle),
    /// Logging sink.
    Log(LogSink),
    /// Not yet produced; resolved by the player before `add` runs.
    Deferred(ContextFactory),
}

impl ContextValue {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::NodeId(_) => "node_id",
            Self::Interpreter(_) => "interpreter",
            Self::Subscription(_) => "subscription",
            Self::Log(_) => "log",
            Self::Deferred(_) => "deferred",
        }
    }

    /// Whether this value still needs resolving.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::NodeId(id) => f.debug_tuple("NodeId").field(id).finish(),
            Self::Interpreter(h) => f.debug_tuple("Interpreter").field(h).finish(),
            Self::Subscription(s) => f.debug_tuple("Subscription").field(s).finish(),
            Self::Log(_) => f.write_str("Log(..)"),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<SynthNodeId> for ContextValue {
    fn from(id: SynthNodeId) -> Self {
        Self::NodeId(id)
    }
}

impl From<InterpreterHandle> for ContextValue {
    fn from(handle: InterpreterHandle) -> Self {
        Self::Interpreter(handle)
    }
}

impl From<SubscriptionHandle> for ContextValue {
    fn from(handle: SubscriptionHandle) -> Self {
        Self::Subscription(handle)
    }
}

impl From<LogSink> for ContextValue {
    fn from(sink: LogSink) -> Self {
        Self::Log(sink)
    }
}

/// A partial mapping a node publishes into the context.
#[derive(Debug, Clone, Default)]
pub struct ContextEntries {
    entries: HashMap<String, ContextValue>,
}

impl ContextEntries {
    /// Create an empty set of entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add an entry, replacing any previous one with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry still needs resolving.
    pub fn has_deferred(&self) -> bool {
        self.entries.values().any(ContextValue::is_deferred)
    }

    /// Resolve every deferred entry against `base`.
    ///
    /// Each factory runs once and receives `base` extended with the
    /// non-deferred entries of this set.
    pub async fn resolve(self, base: &Context) -> Result<ContextEntries> {
        if !self.has_deferred() {
            return Ok(self);
        }

        let (deferred, ready): (Vec<_>, Vec<_>) = self
            .entries
            .into_iter()
            .partition(|(_, value)| value.is_deferred());

        let ready = ContextEntries {
            entries: ready.into_iter().collect(),
        };
        let scope = base.extend(ready.clone());

        let mut resolved = ready;
        for (key, value) in deferred {
            if let ContextValue::Deferred(factory) = value {
                tracing::debug!(key = %key, "Resolving deferred context entry");
                let produced = factory(scope.clone()).await?;
                resolved.insert(key, produced);
            }
        }
        Ok(resolved)
    }
}

impl IntoIterator for ContextEntries {
    type Item = (String, ContextValue);
    type IntoIter = std::collections::hash_map::IntoIter<String, ContextValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<ContextValue>> FromIterator<(K, V)> for ContextEntries {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

struct Layer {
    parent: Option<Arc<Layer>>,
    entries: HashMap<String, ContextValue>,
}

/// Merged view of every layer published on the path from the root.
///
/// Cloning is cheap: it only bumps a reference count.
#[derive(Clone, Default)]
pub struct Context {
    top: Option<Arc<Layer>>,
}

impl Context {
    /// Create an empty root context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root context holding the given entries.
    pub fn root(entries: ContextEntries) -> Self {
        Self::new().extend(entries)
    }

    /// Layer `entries` over this context, returning the child context.
    ///
    /// Entries in the new layer shadow equally named entries of ancestors.
    /// Extending with an empty set returns a context equal to `self`.
    #[must_use]
    pub fn extend(&self, entries: ContextEntries) -> Self {
        if entries.is_empty() {
            return self.clone();
        }
        Self {
            top: Some(Arc::new(Layer {
                parent: self.top.clone(),
                entries: entries.entries,
            })),
        }
    }

    /// Look up a key, nearest layer first.
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        let mut layer = self.top.as_deref();
        while let Some(current) = layer {
            if let Some(value) = current.entries.get(key) {
                return Some(value);
            }
            layer = current.parent.as_deref();
        }
        None
    }

    /// Whether any layer defines `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of layers between this context and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut layer = self.top.as_deref();
        while let Some(current) = layer {
            depth += 1;
            layer = current.parent.as_deref();
        }
        depth
    }

    /// All visible keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut layer = self.top.as_deref();
        while let Some(current) = layer {
            seen.extend(current.entries.keys().cloned());
            layer = current.parent.as_deref();
        }
        let mut keys: Vec<String> = seen.into_iter().collect();
        keys.sort();
        keys
    }

    /// Plain data stored under `key`.
    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        match self.get(key) {
            Some(ContextValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// The server node id published by the nearest addressable ancestor.
    pub fn node_id(&self) -> Option<SynthNodeId> {
        match self.get(keys::NODE_ID) {
            Some(ContextValue::NodeId(id)) => Some(*id),
            Some(ContextValue::Value(v)) => v
                .as_i64()
                .and_then(|raw| i32::try_from(raw).ok())
                .map(SynthNodeId::new),
            _ => None,
        }
    }

    /// The server node id, or a configuration error naming `dryad`.
    pub fn require_node_id(&self, dryad: &str) -> Result<SynthNodeId> {
        match self.get(keys::NODE_ID) {
            None => Err(DryadError::MissingContext {
                dryad: dryad.to_string(),
                key: keys::NODE_ID.to_string(),
            }),
            Some(other) => self.node_id().ok_or_else(|| DryadError::ContextType {
                key: keys::NODE_ID.to_string(),
                expected: "node_id",
                found: other.kind(),
            }),
        }
    }

    /// The nearest interpreter handle.
    pub fn interpreter(&self) -> Option<&InterpreterHandle> {
        match self.get(keys::SCLANG) {
            Some(ContextValue::Interpreter(handle)) => Some(handle),
            _ => None,
        }
    }

    /// The subscription stored in this context, if any.
    pub fn subscription(&self) -> Option<&SubscriptionHandle> {
        match self.get(keys::SUBSCRIPTION) {
            Some(ContextValue::Subscription(handle)) => Some(handle),
            _ => None,
        }
    }

    /// The logging sink published by an ancestor.
    pub fn log_sink(&self) -> Option<&LogSink> {
        match self.get(keys::LOG) {
            Some(ContextValue::Log(sink)) => Some(sink),
            _ => None,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nearer_layer_shadows_ancestor() {
        let root = Context::root(ContextEntries::new().with("tempo", json!(120)));
        let child = root.extend(ContextEntries::new().with("tempo", json!(90)));

        assert_eq!(root.value("tempo"), Some(&json!(120)));
        assert_eq!(child.value("tempo"), Some(&json!(90)));
        assert_eq!(child.depth(), 2);
    }

    #[test]
    fn siblings_do_not_see_each_other() {
        let parent =
            Context::root(ContextEntries::new().with(keys::NODE_ID, SynthNodeId::new(1000)));
        let left = parent.extend(ContextEntries::new().with("left", json!(true)));
        let right = parent.extend(ContextEntries::new().with("right", json!(true)));

        assert!(left.contains("left"));
        assert!(!left.contains("right"));
        assert!(!right.contains("left"));
        assert!(!parent.contains("left"));
        assert_eq!(left.node_id(), Some(SynthNodeId::new(1000)));
        assert_eq!(right.node_id(), Some(SynthNodeId::new(1000)));
    }

    #[test]
    fn empty_extend_adds_no_layer() {
        let root = Context::root(ContextEntries::new().with("a", json!(1)));
        let same = root.extend(ContextEntries::new());
        assert_eq!(same.depth(), root.depth());
    }

    #[test]
    fn keys_are_merged_and_sorted() {
        let ctx = Context::root(ContextEntries::new().with("b", json!(1)))
            .extend(ContextEntries::new().with("a", json!(2)).with("b", json!(3)));
        assert_eq!(ctx.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn node_id_accepts_plain_integers() {
        let ctx = Context::root(ContextEntries::new().with(keys::NODE_ID, json!(1001)));
        assert_eq!(ctx.node_id(), Some(SynthNodeId::new(1001)));
    }

    #[test]
    fn require_node_id_reports_missing_and_mistyped() {
        let empty = Context::new();
        let err = empty.require_node_id("sc::synth_control").unwrap_err();
        assert_eq!(err.code(), "E101");

        let wrong = Context::root(ContextEntries::new().with(keys::NODE_ID, json!("synth")));
        let err = wrong.require_node_id("sc::synth_control").unwrap_err();
        assert_eq!(err.code(), "E102");
    }

    #[tokio::test]
    async fn deferred_entries_resolve_against_scope() {
        let base = Context::root(ContextEntries::new().with("greeting", json!("hello")));
        let factory: ContextFactory = Arc::new(|ctx: Context| -> HookFuture<'static, ContextValue> {
            Box::pin(async move {
                let greeting = ctx.value("greeting").cloned().unwrap_or_default();
                let name = ctx.value("name").cloned().unwrap_or_default();
                Ok(ContextValue::Value(json!([greeting, name])))
            })
        });

        let entries = ContextEntries::new()
            .with("name", json!("world"))
            .with("pair", ContextValue::Deferred(factory));
        assert!(entries.has_deferred());

        let resolved = entries.resolve(&base).await.unwrap();
        assert!(!resolved.has_deferred());

        let ctx = base.extend(resolved);
        assert_eq!(ctx.value("pair"), Some(&json!(["hello", "world"])));
    }
}
