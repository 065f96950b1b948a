//! Dryad trait and related types.

use crate::context::{Context, ContextEntries};
use crate::error::Result;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// A lifecycle hook a dryad may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Publishes context entries before children are added.
    PrepareForAdd,
    /// Runs side effects once the node's context is final.
    Add,
    /// Runs teardown side effects.
    Remove,
}

impl Hook {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrepareForAdd => "prepare_for_add",
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata about a dryad type.
#[derive(Debug, Clone)]
pub struct DryadInfo {
    /// Fully qualified name (e.g., "sc::sclang").
    pub name: String,
    /// Namespace (e.g., "sc").
    pub namespace: String,
    /// Short name (e.g., "sclang").
    pub short_name: String,
    /// Description of what the dryad does.
    pub description: String,
    /// Hooks this dryad implements. Undeclared hooks are no-ops.
    pub hooks: Vec<Hook>,
    /// Context keys an ancestor must publish.
    pub requires: Vec<&'static str>,
}

impl DryadInfo {
    /// Create new dryad info.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let short_name = name.into();
        let full_name = format!("{}::{}", namespace, short_name);

        Self {
            name: full_name,
            namespace,
            short_name,
            description: String::new(),
            hooks: Vec::new(),
            requires: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Declare the implemented hooks.
    pub fn with_hooks(mut self, hooks: impl IntoIterator<Item = Hook>) -> Self {
        self.hooks = hooks.into_iter().collect();
        self
    }

    /// Declare a context key that must be present in the inherited context.
    pub fn requires(mut self, key: &'static str) -> Self {
        self.requires.push(key);
        self
    }

    /// Whether the dryad declares `hook`.
    pub fn declares(&self, hook: Hook) -> bool {
        self.hooks.contains(&hook)
    }
}

/// A boxed future for async hooks.
pub type HookFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// The lifecycle contract every node in a tree obeys.
///
/// A player walks the tree depth-first. For each node it:
/// 1. calls [`prepare_for_add`](Dryad::prepare_for_add) with the inherited
///    context and layers the (resolved) result on top; children inherit
///    this context,
/// 2. awaits [`add`](Dryad::add) with that context; entries returned from
///    `add` are stored in the node's own slot only,
/// 3. on teardown, awaits [`remove`](Dryad::remove) with the node's own
///    context, children before parents.
///
/// Every hook defaults to a no-op.
///
/// # Example
///
/// ```ignore
/// use scdryad_core::prelude::*;
///
/// struct Tempo(f64);
///
/// impl Dryad for Tempo {
///     fn info(&self) -> DryadInfo {
///         DryadInfo::new("custom", "tempo").with_hooks([Hook::PrepareForAdd])
///     }
///
///     fn prepare_for_add(&self, _ctx: &Context) -> Result<ContextEntries> {
///         Ok(ContextEntries::new().with("tempo", serde_json::json!(self.0)))
///     }
/// }
/// ```
pub trait Dryad: Send + Sync {
    /// Get metadata about this dryad.
    fn info(&self) -> DryadInfo;

    /// Entries to publish for this node and its descendants.
    ///
    /// Values may be [`ContextValue::Deferred`](crate::context::ContextValue::Deferred);
    /// the player resolves them before `add` runs.
    fn prepare_for_add(&self, ctx: &Context) -> Result<ContextEntries> {
        let _ = ctx;
        Ok(ContextEntries::new())
    }

    /// Side effects to run once the context is final.
    fn add<'a>(&'a self, ctx: Context) -> HookFuture<'a, ContextEntries> {
        let _ = ctx;
        Box::pin(async { Ok(ContextEntries::new()) })
    }

    /// Teardown to run when the node is removed.
    fn remove<'a>(&'a self, ctx: Context) -> HookFuture<'a, ()> {
        let _ = ctx;
        Box::pin(async { Ok(()) })
    }
}
