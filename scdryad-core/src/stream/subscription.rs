//! Cancelable subscriptions.
//!
//! Stream libraries hand back one of two cancellation shapes: a plain
//! function to call, or an object with a `dispose` operation. Adapters tag
//! which one they produced when they subscribe ([`Cancellable`]), and the
//! owner cancels through a single [`SubscriptionHandle::cancel`] call.

use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

/// A subscription object that is released by disposing it.
pub trait Disposable: Send {
    /// Stop delivery and release the subscription.
    fn dispose(self: Box<Self>);
}

/// The cancellation protocol a stream adapter returned.
pub enum Cancellable {
    /// Cancel by calling the function.
    Callable(Box<dyn FnOnce() + Send>),
    /// Cancel by disposing the object.
    Disposable(Box<dyn Disposable>),
}

impl Cancellable {
    /// Wrap a cancel function.
    pub fn callable(f: impl FnOnce() + Send + 'static) -> Self {
        Self::Callable(Box::new(f))
    }

    /// Wrap a disposable subscription object.
    pub fn disposable(d: impl Disposable + 'static) -> Self {
        Self::Disposable(Box::new(d))
    }

    /// A cancellation that does nothing.
    pub fn noop() -> Self {
        Self::callable(|| {})
    }

    /// Short name of the protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Callable(_) => "callable",
            Self::Disposable(_) => "disposable",
        }
    }

    /// Run the cancellation.
    pub fn cancel(self) {
        match self {
            Self::Callable(f) => f(),
            Self::Disposable(d) => d.dispose(),
        }
    }
}

/// Conversion from a stream library's subscription object.
///
/// Adapters implement this once per subscription shape so the owner never
/// inspects the shape again at teardown.
pub trait IntoCancellable {
    /// Tag the subscription with its cancellation protocol.
    fn into_cancellable(self) -> Cancellable;
}

impl IntoCancellable for Cancellable {
    fn into_cancellable(self) -> Cancellable {
        self
    }
}

impl IntoCancellable for Box<dyn Disposable> {
    fn into_cancellable(self) -> Cancellable {
        Cancellable::Disposable(self)
    }
}

impl IntoCancellable for Box<dyn FnOnce() + Send> {
    fn into_cancellable(self) -> Cancellable {
        Cancellable::Callable(self)
    }
}

impl fmt::Debug for Cancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cancellable::{}", self.kind())
    }
}

/// Open/closed switch guarding delivery from a stream.
///
/// Forwarding runs while holding the gate's lock, and closing takes the
/// same lock, so once [`close`](SubscriptionGate::close) returns no
/// forwarding is in progress and none will start. The lock is reentrant:
/// closing from inside a forwarded callback on the same thread is allowed.
#[derive(Clone)]
pub struct SubscriptionGate {
    open: Arc<ReentrantMutex<Cell<bool>>>,
}

impl SubscriptionGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self {
            open: Arc::new(ReentrantMutex::new(Cell::new(true))),
        }
    }

    /// Run `f` if the gate is open. Returns whether it ran.
    pub fn run<F: FnOnce()>(&self, f: F) -> bool {
        let open = self.open.lock();
        if !open.get() {
            return false;
        }
        f();
        true
    }

    /// Close the gate, waiting for any in-flight forwarding to finish.
    pub fn close(&self) {
        let open = self.open.lock();
        open.set(false);
    }

    /// Whether the gate is still open.
    pub fn is_open(&self) -> bool {
        self.open.lock().get()
    }
}

impl Default for SubscriptionGate {
    fn default() -> Self {
        Self::new()
    }
}

struct SubscriptionInner {
    gate: SubscriptionGate,
    cancellable: Mutex<Option<Cancellable>>,
    kind: &'static str,
}

/// Handle to an active subscription.
///
/// Clones share state; cancellation happens at most once across all clones.
#[derive(Clone)]
pub struct SubscriptionHandle {
    inner: Arc<SubscriptionInner>,
}

impl SubscriptionHandle {
    /// Create a handle for a subscription whose delivery passes through `gate`.
    pub fn new(gate: SubscriptionGate, cancellable: impl IntoCancellable) -> Self {
        let cancellable = cancellable.into_cancellable();
        let kind = cancellable.kind();
        Self {
            inner: Arc::new(SubscriptionInner {
                gate,
                cancellable: Mutex::new(Some(cancellable)),
                kind,
            }),
        }
    }

    /// Cancel the subscription.
    ///
    /// Closes the gate first, so nothing is forwarded once this returns,
    /// then runs the stream's own cancellation. Returns `true` only for the
    /// call that actually cancelled; later calls are no-ops.
    pub fn cancel(&self) -> bool {
        self.inner.gate.close();
        let cancellable = self.inner.cancellable.lock().take();
        match cancellable {
            Some(c) => {
                c.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether `cancel` has run.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancellable.lock().is_none()
    }

    /// Cancellation protocol of the underlying subscription.
    pub fn kind(&self) -> &'static str {
        self.inner.kind
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("kind", &self.kind())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
