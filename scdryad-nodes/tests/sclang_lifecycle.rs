//! Interpreter dryad lifecycle under a played tree.

mod common;

use common::Harness;
use parking_lot::Mutex;
use scdryad_core::context::{Context, ContextEntries};
use scdryad_core::interpreter::{SclangOptions, SclangProperties};
use scdryad_core::logging::LogCategory;
use scdryad_core::player::DryadNode;
use scdryad_core::testing::MockLauncher;
use scdryad_core::traits::{Dryad, DryadInfo, Hook, HookFuture};
use scdryad_nodes::SclangDryad;
use std::sync::Arc;

/// Sends code through the interpreter it inherits.
#[derive(Clone, Default)]
struct Evaluate {
    seen_pid: Arc<Mutex<Option<u32>>>,
}

impl Dryad for Evaluate {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("test", "evaluate").with_hooks([Hook::Add])
    }

    fn add<'a>(&'a self, ctx: Context) -> HookFuture<'a, ContextEntries> {
        Box::pin(async move {
            if let Some(sclang) = ctx.interpreter() {
                *self.seen_pid.lock() = sclang.pid();
                sclang.interpret("s.boot;").await?;
            }
            Ok(ContextEntries::new())
        })
    }
}

#[tokio::test]
async fn boots_with_defaults() {
    let harness = Harness::new();
    let launcher = Arc::new(MockLauncher::new());
    let tree = DryadNode::new(SclangDryad::new(launcher.clone()));

    harness.player.play(tree).await.unwrap();
    assert_eq!(launcher.boots(), vec![SclangOptions::default()]);
    harness.player.stop().await.unwrap();
}

#[tokio::test]
async fn supplied_options_are_never_overridden() {
    let cases = [
        SclangProperties {
            debug: Some(false),
            ..Default::default()
        },
        SclangProperties {
            echo: Some(true),
            stdin: Some(true),
            ..Default::default()
        },
        SclangProperties {
            debug: Some(true),
            echo: Some(false),
            stdin: Some(false),
        },
    ];

    for props in cases {
        let harness = Harness::new();
        let launcher = Arc::new(MockLauncher::new());
        let tree = DryadNode::new(SclangDryad::new(launcher.clone()).with_properties(props));
        harness.player.play(tree).await.unwrap();

        let booted = launcher.boots()[0];
        assert_eq!(booted.debug, props.debug.unwrap_or(true));
        assert_eq!(booted.echo, props.echo.unwrap_or(false));
        assert_eq!(booted.stdin, props.stdin.unwrap_or(false));
    }
}

#[tokio::test]
async fn descendants_use_the_handle_and_remove_quits_it() {
    let harness = Harness::new();
    let launcher = Arc::new(MockLauncher::new());
    let evaluate = Evaluate::default();
    let tree = DryadNode::new(SclangDryad::new(launcher.clone()))
        .with_child(DryadNode::new(evaluate.clone()));

    harness.player.play(tree).await.unwrap();
    let interpreter = launcher.last().unwrap();
    assert_eq!(*evaluate.seen_pid.lock(), Some(4000));
    assert_eq!(interpreter.interpreted(), vec!["s.boot;"]);

    harness.player.stop().await.unwrap();
    assert_eq!(interpreter.quit_calls(), 1);

    let quit_logged = harness
        .collector
        .by_dryad("sc::sclang")
        .iter()
        .any(|e| e.category == LogCategory::Interpreter && e.message == "sclang quit");
    assert!(quit_logged);
}

#[tokio::test]
async fn remove_twice_never_errors() {
    let launcher = Arc::new(MockLauncher::new());
    let dryad = SclangDryad::new(launcher.clone());

    let base = Context::new();
    let entries = dryad.prepare_for_add(&base).unwrap().resolve(&base).await.unwrap();
    let ctx = base.extend(entries);

    dryad.remove(ctx.clone()).await.unwrap();
    dryad.remove(ctx.clone()).await.unwrap();
    assert_eq!(launcher.last().unwrap().quit_calls(), 1);

    dryad.remove(Context::new()).await.unwrap();
}

#[tokio::test]
async fn quitting_an_exited_interpreter_is_fine() {
    let harness = Harness::new();
    let launcher = Arc::new(MockLauncher::new());
    harness
        .player
        .play(DryadNode::new(SclangDryad::new(launcher.clone())))
        .await
        .unwrap();

    launcher.last().unwrap().exit();
    harness.player.stop().await.unwrap();
}

#[tokio::test]
async fn nested_interpreters_shadow_the_outer_one() {
    let harness = Harness::new();
    let launcher = Arc::new(MockLauncher::new());
    let evaluate = Evaluate::default();
    let tree = DryadNode::new(SclangDryad::new(launcher.clone())).with_child(
        DryadNode::new(SclangDryad::new(launcher.clone()).with_echo(true))
            .with_child(DryadNode::new(evaluate.clone())),
    );

    harness.player.play(tree).await.unwrap();
    assert_eq!(launcher.boot_count(), 2);
    assert_eq!(*evaluate.seen_pid.lock(), Some(4001));

    let interpreters = launcher.interpreters();
    assert!(interpreters[0].interpreted().is_empty());
    assert_eq!(interpreters[1].interpreted(), vec!["s.boot;"]);

    harness.player.stop().await.unwrap();
    assert!(interpreters.iter().all(|i| i.quit_calls() == 1));
}

#[tokio::test]
async fn boot_failure_is_reported_with_the_dryad() {
    let harness = Harness::new();
    let launcher = Arc::new(MockLauncher::new());
    launcher.fail_boots(true);

    let err = harness
        .player
        .play(DryadNode::new(SclangDryad::new(launcher.clone())))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E201");
    assert_eq!(err.root().code(), "E301");
    assert!(err.to_string().contains("sc::sclang"));
    assert!(!harness.player.is_playing());
}
