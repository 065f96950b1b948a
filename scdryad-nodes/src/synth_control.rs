//! Stream-bridge dryad.
//!
//! Subscribes to a stream of `{param: value}` objects and sends each one to
//! the synth in the parent context as an `/n_set` bundle.

use scdryad_core::context::{Context, ContextEntries, keys};
use scdryad_core::dispatch::{
    Command, CommandBundle, CommandDispatch, DEFAULT_LATENCY, ParamMap, WireMessage,
};
use scdryad_core::error::{DryadError, Result};
use scdryad_core::logging::{LogCategory, LogEvent, LogSink};
use scdryad_core::stream::{
    BoxedValueStream, StreamEvent, StreamListener, SubscriptionGate, SubscriptionHandle,
};
use scdryad_core::traits::{Dryad, DryadInfo, Hook, HookFuture};
use scdryad_core::types::SynthNodeId;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Sends `/n_set` messages to the synth in the parent context.
///
/// Must sit below a dryad that publishes `nodeID` (a synth or group).
/// Items that are not objects of numeric values are dropped with a warning;
/// the subscription stays alive.
pub struct SynthControl {
    dispatch: Arc<dyn CommandDispatch>,
    stream: Option<BoxedValueStream>,
    latency: Duration,
}

impl SynthControl {
    /// Create a control with no stream bound.
    pub fn new(dispatch: Arc<dyn CommandDispatch>) -> Self {
        Self {
            dispatch,
            stream: None,
            latency: DEFAULT_LATENCY,
        }
    }

    /// Bind the stream to forward.
    pub fn with_stream(mut self, stream: BoxedValueStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Override the bundle latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Latency applied to every bundle.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Whether a stream is bound.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }
}

impl Dryad for SynthControl {
    fn info(&self) -> DryadInfo {
        DryadInfo::new("sc", "synth_control")
            .with_description("Forwards stream values to a synth as /n_set bundles")
            .with_hooks([Hook::Add, Hook::Remove])
    }

    fn add<'a>(&'a self, ctx: Context) -> HookFuture<'a, ContextEntries> {
        Box::pin(async move {
            let Some(stream) = &self.stream else {
                return Ok(ContextEntries::new());
            };

            let name = self.info().name;
            let node_id = ctx.require_node_id(&name)?;
            let log = ctx
                .log_sink()
                .cloned()
                .unwrap_or_else(LogSink::tracing_only)
                .for_dryad(name);

            let gate = SubscriptionGate::new();
            let forwarder = Arc::new(Forwarder {
                dispatch: Arc::clone(&self.dispatch),
                ctx: ctx.clone(),
                node_id,
                latency: self.latency,
                log: log.clone(),
            });

            let listener: StreamListener = {
                let gate = gate.clone();
                Arc::new(move |event: StreamEvent| {
                    gate.run(|| forwarder.forward(event));
                })
            };

            let subscription = SubscriptionHandle::new(gate, stream.subscribe(listener));
            log.debug(
                LogCategory::Stream,
                format!("Subscribed ({}) for {}", subscription.kind(), node_id),
            );

            Ok(ContextEntries::new().with(keys::SUBSCRIPTION, subscription))
        })
    }

    fn remove<'a>(&'a self, ctx: Context) -> HookFuture<'a, ()> {
        Box::pin(async move {
            if let Some(subscription) = ctx.subscription()
                && subscription.cancel()
            {
                tracing::debug!(kind = subscription.kind(), "Stream subscription cancelled");
            }
            Ok(())
        })
    }
}

/// Turns stream events into dispatched bundles.
struct Forwarder {
    dispatch: Arc<dyn CommandDispatch>,
    ctx: Context,
    node_id: SynthNodeId,
    latency: Duration,
    log: LogSink,
}

impl Forwarder {
    fn forward(&self, event: StreamEvent) {
        let value = match event {
            StreamEvent::Initial(value) | StreamEvent::Next(value) => value,
            StreamEvent::End => {
                self.log.debug(LogCategory::Stream, "Stream ended");
                return;
            }
            StreamEvent::Error(cause) => {
                self.drop_item(DryadError::InvalidStreamItem {
                    cause: format!("stream error event: {}", cause),
                });
                return;
            }
        };

        let params = match param_map(&value) {
            Ok(params) => params,
            Err(e) => {
                self.drop_item(e);
                return;
            }
        };

        let command = Command::scserver(CommandBundle::new(
            self.latency,
            vec![WireMessage::node_set(self.node_id, &params)],
        ));

        if let Err(e) = self.dispatch.call_command(&self.ctx, command) {
            self.log.log(
                LogEvent::warn(LogCategory::Dispatch, "Failed to send /n_set")
                    .with_field("node_id", self.node_id.to_string())
                    .with_field("error", e.to_string()),
            );
        }
    }

    fn drop_item(&self, error: DryadError) {
        self.log.log(
            LogEvent::warn(LogCategory::Stream, "Dropped stream item")
                .with_field("node_id", self.node_id.to_string())
                .with_field("error", error.to_string()),
        );
    }
}

/// Validate a stream payload as `{param: number, ...}`.
fn param_map(value: &Value) -> Result<ParamMap> {
    let object = value.as_object().ok_or_else(|| DryadError::InvalidStreamItem {
        cause: format!("expected an object of parameters, got {}", json_kind(value)),
    })?;

    if object.is_empty() {
        return Err(DryadError::InvalidStreamItem {
            cause: "object has no parameters".to_string(),
        });
    }

    object
        .iter()
        .map(|(name, v)| {
            v.as_f64()
                .map(|n| (name.clone(), n as f32))
                .ok_or_else(|| DryadError::InvalidStreamItem {
                    cause: format!("parameter '{}' is {}, not a number", name, json_kind(v)),
                })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
