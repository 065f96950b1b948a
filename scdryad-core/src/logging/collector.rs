//! Log collectors and the context-threaded logging sink.

use super::event::{LogCategory, LogEvent, LogLevel};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum number of events to keep in the default buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Trait for log event collectors.
pub trait LogCollector: Send + Sync {
    /// Collect a log event.
    fn collect(&self, event: LogEvent);

    /// Get the number of collected events.
    fn len(&self) -> usize;

    /// Check if the collector is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Type alias for log event subscriber callbacks.
type LogSubscribers = RwLock<Vec<Arc<dyn Fn(&LogEvent) + Send + Sync>>>;

/// Thread-safe log collector with a bounded ring buffer.
pub struct BufferedCollector {
    /// Ring buffer of events.
    buffer: RwLock<VecDeque<LogEvent>>,
    /// Maximum buffer capacity.
    capacity: usize,
    /// Next event ID counter.
    next_id: AtomicU64,
    /// Minimum level accepted.
    min_level: LogLevel,
    /// Subscribers for real-time event notifications.
    subscribers: LogSubscribers,
}

impl BufferedCollector {
    /// Create a new collector with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            next_id: AtomicU64::new(1),
            min_level: LogLevel::Debug,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Create a collector with default capacity.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }

    /// Drop events below `level`.
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add a subscriber for real-time event notifications.
    pub fn subscribe(&self, callback: Arc<dyn Fn(&LogEvent) + Send + Sync>) {
        self.subscribers.write().push(callback);
    }

    /// Get events at or above a certain level.
    pub fn by_level(&self, min_level: LogLevel) -> Vec<LogEvent> {
        self.filtered(|e| e.level >= min_level)
    }

    /// Get events of one category.
    pub fn by_category(&self, category: LogCategory) -> Vec<LogEvent> {
        self.filtered(|e| e.category == category)
    }

    /// Get events produced by one dryad.
    pub fn by_dryad(&self, dryad: &str) -> Vec<LogEvent> {
        self.filtered(|e| e.dryad.as_deref() == Some(dryad))
    }

    /// Get the most recent N events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEvent> {
        let buffer = self.buffer.read();
        buffer.iter().rev().take(limit).cloned().collect()
    }

    /// Get all events (up to capacity).
    pub fn all(&self) -> Vec<LogEvent> {
        self.buffer.read().iter().cloned().collect()
    }

    /// Clear all events.
    pub fn clear(&self) {
        self.buffer.write().clear();
    }

    /// Get buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn filtered(&self, pred: impl Fn(&LogEvent) -> bool) -> Vec<LogEvent> {
        let buffer = self.buffer.read();
        buffer.iter().filter(|e| pred(e)).cloned().collect()
    }
}

impl LogCollector for BufferedCollector {
    fn collect(&self, mut event: LogEvent) {
        if event.level < self.min_level {
            return;
        }

        event.id = self.next_id.fetch_add(1, Ordering::SeqCst);

        {
            let subscribers = self.subscribers.read();
            for subscriber in subscribers.iter() {
                subscriber(&event);
            }
        }

        let mut buffer = self.buffer.write();
        if buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(event);
    }

    fn len(&self) -> usize {
        self.buffer.read().len()
    }
}

impl Default for BufferedCollector {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// A no-op collector that discards all events.
pub struct NullCollector;

impl LogCollector for NullCollector {
    fn collect(&self, _event: LogEvent) {}

    fn len(&self) -> usize {
        0
    }
}

/// Logging sink threaded through the context under the `log` key.
///
/// Every event goes to `tracing` and to the sink's collector, tagged with
/// the dryad the sink was scoped to.
#[derive(Clone)]
pub struct LogSink {
    collector: Arc<dyn LogCollector>,
    dryad: Option<String>,
}

impl LogSink {
    /// Create a sink over a collector.
    pub fn new(collector: Arc<dyn LogCollector>) -> Self {
        Self {
            collector,
            dryad: None,
        }
    }

    /// A sink that only emits to `tracing`.
    pub fn tracing_only() -> Self {
        Self::new(Arc::new(NullCollector))
    }

    /// Scope a copy of this sink to a dryad.
    pub fn for_dryad(&self, dryad: impl Into<String>) -> Self {
        Self {
            collector: Arc::clone(&self.collector),
            dryad: Some(dryad.into()),
        }
    }

    /// Dryad this sink is scoped to.
    pub fn dryad(&self) -> Option<&str> {
        self.dryad.as_deref()
    }

    /// Log an event with the sink's dryad applied.
    pub fn log(&self, mut event: LogEvent) {
        if event.dryad.is_none() {
            event.dryad = self.dryad.clone();
        }

        let dryad = event.dryad.as_deref().unwrap_or("-");
        match event.level {
            LogLevel::Debug => {
                tracing::debug!(dryad = %dryad, category = %event.category, "{}", event.message)
            }
            LogLevel::Info => {
                tracing::info!(dryad = %dryad, category = %event.category, "{}", event.message)
            }
            LogLevel::Warn => {
                tracing::warn!(dryad = %dryad, category = %event.category, "{}", event.message)
            }
            LogLevel::Error => {
                tracing::error!(dryad = %dryad, category = %event.category, "{}", event.message)
            }
        }

        self.collector.collect(event);
    }

    /// Log a debug-level message.
    pub fn debug(&self, category: LogCategory, message: impl Into<String>) {
        self.log(LogEvent::debug(category, message));
    }

    /// Log an info-level message.
    pub fn info(&self, category: LogCategory, message: impl Into<String>) {
        self.log(LogEvent::info(category, message));
    }

    /// Log a warn-level message.
    pub fn warn(&self, category: LogCategory, message: impl Into<String>) {
        self.log(LogEvent::warn(category, message));
    }

    /// Log an error-level message.
    pub fn error(&self, category: LogCategory, message: impl Into<String>) {
        self.log(LogEvent::error(category, message));
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink").field("dryad", &self.dryad).finish()
    }
}
