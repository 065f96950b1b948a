//! Reactive value streams and their subscriptions.
//!
//! ```text
//! ┌─────────────┐ subscribe(listener) ┌──────────────┐
//! │ ValueStream │────────────────────>│ Cancellable  │ callable | disposable
//! └─────────────┘                     └──────┬───────┘
//!        │ StreamEvent                       │
//!        v                                   v
//! ┌──────────────────┐   guards   ┌────────────────────┐
//! │ SubscriptionGate │<───────────│ SubscriptionHandle │ cancel() once
//! └──────────────────┘            └────────────────────┘
//! ```

mod event;
mod source;
mod subscription;

pub use event::StreamEvent;
pub use source::{BoxedValueStream, FuturesStream, StreamListener, ValueBus, ValueStream};
pub use subscription::{
    Cancellable, Disposable, IntoCancellable, SubscriptionGate, SubscriptionHandle,
};
