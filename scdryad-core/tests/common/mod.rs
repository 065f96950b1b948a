//! Common test utilities for integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use scdryad_core::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Publishes fixed entries from `prepare_for_add`.
pub struct Publisher {
    name: &'static str,
    entries: Vec<(&'static str, Value)>,
}

impl Publisher {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: Value) -> Self {
        self.entries.push((key, value));
        self
    }
}

impl Dryad for Publisher {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("test", self.name).with_hooks([Hook::PrepareForAdd])
    }

    fn prepare_for_add(&self, _ctx: &Context) -> Result<ContextEntries> {
        Ok(self.entries.iter().cloned().collect())
    }
}

/// Records the context it was added with.
#[derive(Clone, Default)]
pub struct Observer {
    seen: Arc<Mutex<Option<Context>>>,
}

impl Observer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Option<Context> {
        self.seen.lock().clone()
    }
}

impl Dryad for Observer {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("test", "observer").with_hooks([Hook::Add])
    }

    fn add<'a>(&'a self, ctx: Context) -> HookFuture<'a, ContextEntries> {
        Box::pin(async move {
            *self.seen.lock() = Some(ctx);
            Ok(ContextEntries::new())
        })
    }
}

/// Publishes a deferred entry and counts how often it is produced.
pub struct Lazy {
    pub produced: Arc<AtomicUsize>,
}

impl Lazy {
    pub fn new() -> Self {
        Self {
            produced: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Dryad for Lazy {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("test", "lazy").with_hooks([Hook::PrepareForAdd])
    }

    fn prepare_for_add(&self, _ctx: &Context) -> Result<ContextEntries> {
        let produced = Arc::clone(&self.produced);
        let factory: ContextFactory =
            Arc::new(move |_ctx: Context| -> HookFuture<'static, ContextValue> {
                let produced = Arc::clone(&produced);
                Box::pin(async move {
                    let n = produced.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(ContextValue::Value(serde_json::json!(n)))
                })
            });
        Ok(ContextEntries::new().with("lazy", ContextValue::Deferred(factory)))
    }
}
