//! Hand-driven value stream.

use crate::stream::{Cancellable, Disposable, StreamEvent, StreamListener, ValueStream};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Which cancellation protocol a [`ManualStream`] hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStyle {
    /// A function to call.
    Callable,
    /// An object to dispose.
    Disposable,
}

struct Listener {
    callback: StreamListener,
    active: Arc<AtomicBool>,
}

struct Shared {
    style: CancelStyle,
    leaky: AtomicBool,
    listeners: Mutex<Vec<Listener>>,
    subscribes: AtomicUsize,
    cancels: AtomicUsize,
}

impl Shared {
    fn cancel(&self, active: &AtomicBool) {
        active.store(false, Ordering::SeqCst);
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Push stream whose items are emitted by the test.
///
/// A leaky stream keeps calling listeners after they cancel, which models
/// a stream library that delivers in-flight items late.
#[derive(Clone)]
pub struct ManualStream {
    shared: Arc<Shared>,
}

impl ManualStream {
    /// Create a stream handing out `style` cancellations.
    pub fn new(style: CancelStyle) -> Self {
        Self {
            shared: Arc::new(Shared {
                style,
                leaky: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
                subscribes: AtomicUsize::new(0),
                cancels: AtomicUsize::new(0),
            }),
        }
    }

    /// Keep delivering to cancelled listeners.
    pub fn leaky(self) -> Self {
        self.shared.leaky.store(true, Ordering::SeqCst);
        self
    }

    /// Emit a value.
    pub fn emit(&self, value: Value) {
        self.emit_event(StreamEvent::Next(value));
    }

    /// Emit an arbitrary event.
    pub fn emit_event(&self, event: StreamEvent) {
        let leaky = self.shared.leaky.load(Ordering::SeqCst);
        let targets: Vec<StreamListener> = self
            .shared
            .listeners
            .lock()
            .iter()
            .filter(|l| leaky || l.active.load(Ordering::SeqCst))
            .map(|l| Arc::clone(&l.callback))
            .collect();
        for target in targets {
            target(event.clone());
        }
    }

    /// Number of subscribe calls.
    pub fn subscribe_count(&self) -> usize {
        self.shared.subscribes.load(Ordering::SeqCst)
    }

    /// Number of cancellations that reached the stream.
    pub fn cancel_count(&self) -> usize {
        self.shared.cancels.load(Ordering::SeqCst)
    }

    /// Number of listeners that have not cancelled.
    pub fn active_listeners(&self) -> usize {
        self.shared
            .listeners
            .lock()
            .iter()
            .filter(|l| l.active.load(Ordering::SeqCst))
            .count()
    }
}

struct ManualSubscription {
    shared: Arc<Shared>,
    active: Arc<AtomicBool>,
}

impl Disposable for ManualSubscription {
    fn dispose(self: Box<Self>) {
        self.shared.cancel(&self.active);
    }
}

impl ValueStream for ManualStream {
    fn subscribe(&self, listener: StreamListener) -> Cancellable {
        let active = Arc::new(AtomicBool::new(true));
        self.shared.subscribes.fetch_add(1, Ordering::SeqCst);
        self.shared.listeners.lock().push(Listener {
            callback: listener,
            active: Arc::clone(&active),
        });

        let shared = Arc::clone(&self.shared);
        match self.shared.style {
            CancelStyle::Callable => Cancellable::callable(move || shared.cancel(&active)),
            CancelStyle::Disposable => {
                Cancellable::disposable(ManualSubscription { shared, active })
            }
        }
    }
}
