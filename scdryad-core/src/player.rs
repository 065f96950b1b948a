//! Minimal tree player.
//!
//! Walks a static tree of dryads depth-first, building context top-down,
//! and tears it down children-first. It does not diff trees or support
//! updates; a tree is played once and stopped once.

use crate::context::{Context, ContextEntries, keys};
use crate::error::{DryadError, Result};
use crate::logging::{LogCategory, LogSink};
use crate::traits::{Dryad, Hook};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A dryad and its children.
pub struct DryadNode {
    dryad: Arc<dyn Dryad>,
    children: Vec<DryadNode>,
}

impl DryadNode {
    /// Create a leaf node.
    pub fn new(dryad: impl Dryad + 'static) -> Self {
        Self::from_arc(Arc::new(dryad))
    }

    /// Create a leaf node from a shared dryad.
    pub fn from_arc(dryad: Arc<dyn Dryad>) -> Self {
        Self {
            dryad,
            children: Vec::new(),
        }
    }

    /// Append a child.
    pub fn with_child(mut self, child: DryadNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children, in order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = DryadNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// The node's dryad.
    pub fn dryad(&self) -> &Arc<dyn Dryad> {
        &self.dryad
    }

    /// The node's children.
    pub fn children(&self) -> &[DryadNode] {
        &self.children
    }

    /// Number of nodes in this subtree.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(DryadNode::len).sum::<usize>()
    }

    /// Always false; a node is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }
}

struct Mounted {
    name: String,
    dryad: Arc<dyn Dryad>,
    context: Context,
}

/// Plays a tree of dryads.
pub struct DryadPlayer {
    root_entries: ContextEntries,
    log: LogSink,
    playing: AtomicBool,
    mounted: Mutex<Vec<Mounted>>,
}

impl DryadPlayer {
    /// Create a player that logs through `tracing` only.
    pub fn new() -> Self {
        Self {
            root_entries: ContextEntries::new(),
            log: LogSink::tracing_only(),
            playing: AtomicBool::new(false),
            mounted: Mutex::new(Vec::new()),
        }
    }

    /// Entries every node inherits.
    pub fn with_root_entries(mut self, entries: ContextEntries) -> Self {
        self.root_entries = entries;
        self
    }

    /// Sink published under the `log` key unless the root entries set one.
    pub fn with_log_sink(mut self, log: LogSink) -> Self {
        self.log = log;
        self
    }

    /// Whether a tree is mounted.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Names of mounted dryads, in add order.
    pub fn mounted_names(&self) -> Vec<String> {
        self.mounted.lock().iter().map(|m| m.name.clone()).collect()
    }

    /// Own contexts of mounted dryads, in add order.
    pub fn mounted_contexts(&self) -> Vec<(String, Context)> {
        self.mounted
            .lock()
            .iter()
            .map(|m| (m.name.clone(), m.context.clone()))
            .collect()
    }

    fn root_context(&self) -> Context {
        let mut entries = self.root_entries.clone();
        if entries.get(keys::LOG).is_none() {
            entries.insert(keys::LOG, self.log.clone());
        }
        Context::root(entries)
    }

    /// Add every node of `tree`, parents before children.
    ///
    /// If any hook fails, nodes already added are removed in reverse order
    /// and the hook error is returned.
    pub async fn play(&self, tree: DryadNode) -> Result<()> {
        if self.playing.swap(true, Ordering::SeqCst) {
            return Err(DryadError::AlreadyPlaying);
        }

        let total = tree.len();
        tracing::info!(nodes = total, "Playing dryad tree");

        let mut mounted = Vec::with_capacity(total);
        let mut stack = vec![(tree, self.root_context())];

        while let Some((node, parent)) = stack.pop() {
            match self.mount(&node.dryad, &parent).await {
                Ok((context, own)) => {
                    mounted.push(own);
                    for child in node.children.into_iter().rev() {
                        stack.push((child, context.clone()));
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Dryad tree failed to play; unwinding");
                    let _ = Self::unmount(mounted, &self.log).await;
                    self.playing.store(false, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        *self.mounted.lock() = mounted;
        Ok(())
    }

    /// Run one node's add sequence. Returns the context its children
    /// inherit and the mounted record holding its own context.
    async fn mount(&self, dryad: &Arc<dyn Dryad>, parent: &Context) -> Result<(Context, Mounted)> {
        let info = dryad.info();
        let name = info.name.clone();

        for key in &info.requires {
            if !parent.contains(key) {
                return Err(DryadError::MissingContext {
                    dryad: name.clone(),
                    key: key.to_string(),
                }
                .in_hook(name, Hook::PrepareForAdd));
            }
        }

        let published = dryad
            .prepare_for_add(parent)
            .map_err(|e| e.in_hook(name.clone(), Hook::PrepareForAdd))?;
        let published = published
            .resolve(parent)
            .await
            .map_err(|e| e.in_hook(name.clone(), Hook::PrepareForAdd))?;

        let context = parent.extend(published);
        self.log
            .for_dryad(name.clone())
            .debug(LogCategory::Lifecycle, "Adding dryad");

        let own = match dryad.add(context.clone()).await {
            Ok(own) => own,
            Err(e) => {
                // Release whatever prepare_for_add resolved.
                if let Err(cleanup) = dryad.remove(context).await {
                    tracing::warn!(
                        dryad = %name,
                        error = %cleanup,
                        "Cleanup after failed add also failed"
                    );
                }
                return Err(e.in_hook(name, Hook::Add));
            }
        };

        let own_context = context.extend(own);
        Ok((
            context,
            Mounted {
                name,
                dryad: Arc::clone(dryad),
                context: own_context,
            },
        ))
    }

    /// Remove every mounted node, children before parents.
    ///
    /// Every node is removed even when one fails; the first failure is
    /// returned.
    pub async fn stop(&self) -> Result<()> {
        let mounted = std::mem::take(&mut *self.mounted.lock());
        let result = Self::unmount(mounted, &self.log).await;
        self.playing.store(false, Ordering::SeqCst);
        tracing::info!("Dryad tree stopped");
        result
    }

    async fn unmount(mounted: Vec<Mounted>, log: &LogSink) -> Result<()> {
        let mut first_error = None;
        for node in mounted.into_iter().rev() {
            let sink = log.for_dryad(node.name.clone());
            sink.debug(LogCategory::Lifecycle, "Removing dryad");
            if let Err(e) = node.dryad.remove(node.context).await {
                let e = e.in_hook(node.name, Hook::Remove);
                sink.error(LogCategory::Lifecycle, e.to_string());
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for DryadPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;
    use crate::traits::{DryadInfo, HookFuture};
    use serde_json::json;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        journal: Journal,
        fail_add: bool,
    }

    impl Recorder {
        fn new(name: &'static str, journal: &Journal) -> Self {
            Self {
                name,
                journal: Arc::clone(journal),
                fail_add: false,
            }
        }
    }

    impl Dryad for Recorder {
        fn info(&self) -> DryadInfo {
            DryadInfo::new("test", self.name)
        }

        fn prepare_for_add(&self, _ctx: &Context) -> Result<ContextEntries> {
            Ok(ContextEntries::new().with("owner", json!(self.name)))
        }

        fn add<'a>(&'a self, ctx: Context) -> HookFuture<'a, ContextEntries> {
            Box::pin(async move {
                let owner = ctx.value("owner").cloned().unwrap_or_default();
                self.journal.lock().push(format!("add {} saw {}", self.name, owner));
                if self.fail_add {
                    return Err(DryadError::ConfigValue {
                        field: "fail_add".to_string(),
                        cause: "requested".to_string(),
                    });
                }
                Ok(ContextEntries::new().with("mounted", json!(true)))
            })
        }

        fn remove<'a>(&'a self, ctx: Context) -> HookFuture<'a, ()> {
            Box::pin(async move {
                let mounted = ctx.contains("mounted");
                self.journal
                    .lock()
                    .push(format!("remove {} mounted={}", self.name, mounted));
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn adds_preorder_and_removes_in_reverse() {
        let journal: Journal = Arc::default();
        let tree = DryadNode::new(Recorder::new("a", &journal)).with_children([
            DryadNode::new(Recorder::new("b", &journal)),
            DryadNode::new(Recorder::new("c", &journal)),
        ]);

        let player = DryadPlayer::new();
        player.play(tree).await.unwrap();
        assert!(player.is_playing());
        assert_eq!(player.mounted_names(), vec!["test::a", "test::b", "test::c"]);

        player.stop().await.unwrap();
        assert!(!player.is_playing());

        let journal = journal.lock().clone();
        assert_eq!(
            journal,
            vec![
                "add a saw \"a\"",
                "add b saw \"b\"",
                "add c saw \"c\"",
                "remove c mounted=true",
                "remove b mounted=true",
                "remove a mounted=true",
            ]
        );
    }

    #[tokio::test]
    async fn add_entries_stay_in_own_slot() {
        let journal: Journal = Arc::default();
        let tree = DryadNode::new(Recorder::new("parent", &journal))
            .with_child(DryadNode::new(Recorder::new("child", &journal)));

        let player = DryadPlayer::new();
        player.play(tree).await.unwrap();

        let contexts = player.mounted_contexts();
        let (_, child) = &contexts[1];
        // The child's own slot holds its own `mounted`, layered over the
        // parent's prepared entries but not the parent's add output.
        assert_eq!(child.value("owner"), Some(&json!("child")));
        assert_eq!(child.depth(), 4);
    }

    #[tokio::test]
    async fn failed_add_unwinds_mounted_nodes() {
        let journal: Journal = Arc::default();
        let mut failing = Recorder::new("bad", &journal);
        failing.fail_add = true;
        let tree = DryadNode::new(Recorder::new("root", &journal))
            .with_child(DryadNode::new(failing));

        let player = DryadPlayer::new();
        let err = player.play(tree).await.unwrap_err();
        assert_eq!(err.code(), "E201");
        assert!(!player.is_playing());

        let journal = journal.lock().clone();
        assert_eq!(journal.last().map(String::as_str), Some("remove root mounted=true"));
    }

    #[tokio::test]
    async fn refuses_second_play() {
        let journal: Journal = Arc::default();
        let player = DryadPlayer::new();
        player
            .play(DryadNode::new(Recorder::new("a", &journal)))
            .await
            .unwrap();

        let err = player
            .play(DryadNode::new(Recorder::new("b", &journal)))
            .await
            .unwrap_err();
        assert!(matches!(err, DryadError::AlreadyPlaying));
    }

    #[tokio::test]
    async fn root_context_carries_log_sink() {
        struct NeedsLog;
        impl Dryad for NeedsLog {
            fn info(&self) -> DryadInfo {
                DryadInfo::new("test", "needs_log").requires(keys::LOG)
            }
        }

        let player = DryadPlayer::new();
        player.play(DryadNode::new(NeedsLog)).await.unwrap();
        let (_, ctx) = player.mounted_contexts().remove(0);
        assert!(matches!(ctx.get(keys::LOG), Some(ContextValue::Log(_))));
    }

    #[tokio::test]
    async fn missing_requirement_fails_before_hooks() {
        struct NeedsNode;
        impl Dryad for NeedsNode {
            fn info(&self) -> DryadInfo {
                DryadInfo::new("test", "needs_node").requires(keys::NODE_ID)
            }
        }

        let player = DryadPlayer::new();
        let err = player.play(DryadNode::new(NeedsNode)).await.unwrap_err();
        assert_eq!(err.root().code(), "E101");
        assert!(err.is_config_error());
    }
}
