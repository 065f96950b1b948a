//! Prelude for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! # Example
//!
//! ```ignore
//! use scdryad_core::prelude::*;
//! ```

// Core types
pub use crate::types::SynthNodeId;

// Error handling
pub use crate::error::{DryadError, Result};

// Context
pub use crate::context::{Context, ContextEntries, ContextFactory, ContextValue, keys};

// Traits
pub use crate::traits::{Dryad, DryadInfo, Hook, HookFuture};

// Player
pub use crate::player::{DryadNode, DryadPlayer};

// Dispatch
pub use crate::dispatch::{
    Command, CommandBundle, CommandDispatch, DEFAULT_LATENCY, Dispatcher, DispatchError,
    OscArg, ParamMap, TargetSystem, Transport, WireMessage,
};

// Streams
pub use crate::stream::{
    BoxedValueStream, Cancellable, Disposable, FuturesStream, IntoCancellable, StreamEvent,
    StreamListener, SubscriptionGate, SubscriptionHandle, ValueBus, ValueStream,
};

// Interpreter
pub use crate::interpreter::{
    Interpreter, InterpreterHandle, InterpreterLauncher, SclangOptions, SclangProperties,
};

// Logging
pub use crate::logging::{BufferedCollector, LogCategory, LogCollector, LogEvent, LogLevel, LogSink};
