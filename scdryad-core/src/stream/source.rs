//! Value stream sources.

use super::event::StreamEvent;
use super::subscription::{Cancellable, Disposable};
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback a stream delivers events to.
pub type StreamListener = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// A push-based source of values.
///
/// Subscribing returns the source's own cancellation protocol, already
/// tagged as callable or disposable.
pub trait ValueStream: Send + Sync {
    /// Start delivering events to `listener`.
    fn subscribe(&self, listener: StreamListener) -> Cancellable;
}

/// Shared, type-erased stream.
pub type BoxedValueStream = Arc<dyn ValueStream>;

/// Adapts a [`futures::Stream`] of values into a [`ValueStream`].
///
/// Subscribing spawns a task on the current tokio runtime that drives the
/// stream and delivers each item as [`StreamEvent::Next`], followed by
/// [`StreamEvent::End`]. Cancellation is a callable that aborts the task.
/// The underlying stream can be consumed once; later subscribers receive
/// an error event.
pub struct FuturesStream<S> {
    inner: Mutex<Option<S>>,
}

impl<S> FuturesStream<S>
where
    S: Stream<Item = Value> + Send + Unpin + 'static,
{
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        Self {
            inner: Mutex::new(Some(stream)),
        }
    }
}

impl<S> ValueStream for FuturesStream<S>
where
    S: Stream<Item = Value> + Send + Unpin + 'static,
{
    fn subscribe(&self, listener: StreamListener) -> Cancellable {
        let Some(mut stream) = self.inner.lock().take() else {
            listener(StreamEvent::Error("stream was already subscribed".to_string()));
            return Cancellable::noop();
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                listener(StreamEvent::Error(format!("no async runtime: {}", e)));
                return Cancellable::noop();
            }
        };

        let task = runtime.spawn(async move {
            while let Some(value) = stream.next().await {
                listener(StreamEvent::Next(value));
            }
            listener(StreamEvent::End);
        });

        Cancellable::callable(move || task.abort())
    }
}

type Listeners = Mutex<BTreeMap<u64, StreamListener>>;

struct BusShared {
    listeners: Listeners,
    next_id: AtomicU64,
}

/// Hot multicast stream fed by [`emit`](ValueBus::emit).
///
/// Each subscription is released by disposing it.
#[derive(Clone)]
pub struct ValueBus {
    shared: Arc<BusShared>,
}

impl ValueBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(BusShared {
                listeners: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Deliver `value` to every current subscriber.
    pub fn emit(&self, value: Value) {
        self.emit_event(StreamEvent::Next(value));
    }

    /// Deliver an arbitrary event to every current subscriber.
    pub fn emit_event(&self, event: StreamEvent) {
        // Listeners run outside the lock so they may unsubscribe.
        let listeners: Vec<StreamListener> =
            self.shared.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener(event.clone());
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }
}

impl Default for ValueBus {
    fn default() -> Self {
        Self::new()
    }
}

struct BusSubscription {
    id: u64,
    bus: Weak<BusShared>,
}

impl Disposable for BusSubscription {
    fn dispose(self: Box<Self>) {
        if let Some(bus) = self.bus.upgrade() {
            bus.listeners.lock().remove(&self.id);
        }
    }
}

impl ValueStream for ValueBus {
    fn subscribe(&self, listener: StreamListener) -> Cancellable {
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.listeners.lock().insert(id, listener);
        Cancellable::disposable(BusSubscription {
            id,
            bus: Arc::downgrade(&self.shared),
        })
    }
}
