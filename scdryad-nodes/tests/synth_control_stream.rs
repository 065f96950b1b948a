//! Stream-bridge behavior under a played tree.

mod common;

use common::{Harness, assert_node_set};
use scdryad_core::context::{Context, ContextEntries, keys};
use scdryad_core::dispatch::OscArg;
use scdryad_core::logging::{LogCategory, LogLevel};
use scdryad_core::player::DryadNode;
use scdryad_core::stream::{FuturesStream, StreamEvent, ValueBus};
use scdryad_core::testing::{CancelStyle, ManualStream};
use scdryad_core::traits::Dryad;
use scdryad_core::types::SynthNodeId;
use scdryad_nodes::{NodeIdDryad, SynthControl};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const SYNTH: SynthNodeId = SynthNodeId::new(1000);

fn tree(harness: &Harness, stream: &ManualStream) -> DryadNode {
    DryadNode::new(NodeIdDryad::new(SYNTH)).with_child(DryadNode::new(
        SynthControl::new(harness.dispatch.clone()).with_stream(Arc::new(stream.clone())),
    ))
}

#[tokio::test]
async fn without_stream_add_and_remove_do_nothing() {
    let harness = Harness::new();
    let control = SynthControl::new(harness.dispatch.clone());

    let own = control.add(Context::new()).await.unwrap();
    assert!(own.is_empty());

    control.remove(Context::new()).await.unwrap();
    assert!(harness.transport.is_empty());
}

#[tokio::test]
async fn each_item_becomes_one_bundle() {
    let harness = Harness::new();
    let stream = ManualStream::new(CancelStyle::Callable);
    harness.player.play(tree(&harness, &stream)).await.unwrap();

    for freq in [220, 330, 440] {
        stream.emit(json!({"freq": freq, "amp": 0.5}));
    }

    let sent = harness.sent();
    assert_eq!(sent.len(), 3);
    for command in &sent {
        assert_node_set(command, SYNTH);
    }
    assert_eq!(
        sent[2].command.bundle.packets[0].args,
        vec![
            OscArg::Int(1000),
            OscArg::String("amp".to_string()),
            OscArg::Float(0.5),
            OscArg::String("freq".to_string()),
            OscArg::Float(440.0),
        ]
    );

    harness.player.stop().await.unwrap();
}

#[tokio::test]
async fn nothing_is_sent_after_remove() {
    for style in [CancelStyle::Callable, CancelStyle::Disposable] {
        let harness = Harness::new();
        let stream = ManualStream::new(style).leaky();
        harness.player.play(tree(&harness, &stream)).await.unwrap();

        stream.emit(json!({"freq": 440}));
        harness.player.stop().await.unwrap();
        stream.emit(json!({"freq": 880}));
        stream.emit(json!({"freq": 990}));

        assert_eq!(harness.transport.len(), 1, "{:?}", style);
        assert_eq!(stream.cancel_count(), 1, "{:?}", style);
    }
}

#[tokio::test]
async fn callable_and_disposable_cancel_alike() {
    for style in [CancelStyle::Callable, CancelStyle::Disposable] {
        let harness = Harness::new();
        let stream = ManualStream::new(style);
        harness.player.play(tree(&harness, &stream)).await.unwrap();

        let (_, own) = harness.player.mounted_contexts().remove(1);
        let subscription = own.subscription().cloned().unwrap();
        let expected = match style {
            CancelStyle::Callable => "callable",
            CancelStyle::Disposable => "disposable",
        };
        assert_eq!(subscription.kind(), expected);
        assert_eq!(stream.active_listeners(), 1);

        harness.player.stop().await.unwrap();
        assert!(subscription.is_cancelled());
        assert_eq!(stream.active_listeners(), 0);
        assert_eq!(stream.cancel_count(), 1);
    }
}

#[tokio::test]
async fn remove_cancels_only_once() {
    let harness = Harness::new();
    let stream = ManualStream::new(CancelStyle::Disposable);
    let control = SynthControl::new(harness.dispatch.clone()).with_stream(Arc::new(stream.clone()));
    let ctx = Context::root(ContextEntries::new().with(keys::NODE_ID, SYNTH));

    let own = control.add(ctx.clone()).await.unwrap();
    let own_ctx = ctx.extend(own);

    control.remove(own_ctx.clone()).await.unwrap();
    control.remove(own_ctx).await.unwrap();
    assert_eq!(stream.cancel_count(), 1);
}

#[tokio::test]
async fn malformed_items_are_dropped_and_logged() {
    let harness = Harness::new();
    let stream = ManualStream::new(CancelStyle::Callable);
    harness.player.play(tree(&harness, &stream)).await.unwrap();

    stream.emit(json!("not an object"));
    stream.emit(json!({"freq": "high"}));
    stream.emit_event(StreamEvent::Error("upstream failed".to_string()));
    stream.emit(json!({"freq": 440}));

    let sent = harness.sent();
    assert_eq!(sent.len(), 1);
    assert_node_set(&sent[0], SYNTH);

    let warnings: Vec<_> = harness
        .collector
        .by_category(LogCategory::Stream)
        .into_iter()
        .filter(|e| e.level == LogLevel::Warn)
        .collect();
    assert_eq!(warnings.len(), 3);
    assert!(
        warnings
            .iter()
            .all(|e| e.dryad.as_deref() == Some("sc::synth_control"))
    );
}

#[tokio::test]
async fn stream_end_is_not_an_error() {
    let harness = Harness::new();
    let stream = ManualStream::new(CancelStyle::Callable);
    harness.player.play(tree(&harness, &stream)).await.unwrap();

    stream.emit_event(StreamEvent::End);
    assert!(harness.collector.by_level(LogLevel::Warn).is_empty());
    assert!(harness.transport.is_empty());
}

#[tokio::test]
async fn missing_node_id_fails_add() {
    let harness = Harness::new();
    let stream = ManualStream::new(CancelStyle::Callable);
    let control = SynthControl::new(harness.dispatch.clone()).with_stream(Arc::new(stream.clone()));

    let err = harness
        .player
        .play(DryadNode::new(control))
        .await
        .unwrap_err();
    assert_eq!(err.root().code(), "E101");
    assert_eq!(stream.subscribe_count(), 0);
}

#[tokio::test]
async fn custom_latency_is_applied() {
    let harness = Harness::new();
    let bus = ValueBus::new();
    let tree = DryadNode::new(NodeIdDryad::new(SYNTH)).with_child(DryadNode::new(
        SynthControl::new(harness.dispatch.clone())
            .with_stream(Arc::new(bus.clone()))
            .with_latency(Duration::from_millis(100)),
    ));
    harness.player.play(tree).await.unwrap();

    bus.emit(json!({"gate": 0}));
    let sent = harness.sent();
    assert_eq!(sent[0].command.bundle.latency, Duration::from_millis(100));

    harness.player.stop().await.unwrap();
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test]
async fn futures_stream_is_forwarded() {
    let harness = Harness::new();
    let (tx, rx) = futures::channel::mpsc::unbounded();
    let tree = DryadNode::new(NodeIdDryad::new(SYNTH)).with_child(DryadNode::new(
        SynthControl::new(harness.dispatch.clone()).with_stream(Arc::new(FuturesStream::new(rx))),
    ));
    harness.player.play(tree).await.unwrap();

    tx.unbounded_send(json!({"freq": 440})).unwrap();
    tx.unbounded_send(json!({"freq": 550})).unwrap();

    for _ in 0..100 {
        if harness.transport.len() == 2 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(harness.transport.len(), 2);

    harness.player.stop().await.unwrap();
    let _ = tx.unbounded_send(json!({"freq": 660}));
    tokio::task::yield_now().await;
    assert_eq!(harness.transport.len(), 2);
}
