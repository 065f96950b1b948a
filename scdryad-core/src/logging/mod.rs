//! Structured logging for tree lifecycles.
//!
//! A [`LogSink`] is published into the root context under the `log` key.
//! Dryads scope it with [`LogSink::for_dryad`] and hand it to the things
//! they start (interpreter processes, stream forwarders), so diagnostics
//! reach both `tracing` and an inspectable [`LogCollector`].
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌───────────────┐
//! │ LogSink     │────>│ LogCollector │────>│ Subscribers   │
//! │ (per dryad) │     │ (buffer)     │     │ (callbacks)   │
//! └─────────────┘     └──────────────┘     └───────────────┘
//!        │
//!        v
//!   tracing events
//! ```

mod collector;
mod event;

pub use collector::{
    BufferedCollector, DEFAULT_BUFFER_CAPACITY, LogCollector, LogSink, NullCollector,
};
pub use event::{LogCategory, LogEvent, LogLevel};
