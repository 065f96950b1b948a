//! Test doubles for dryad trees.
//!
//! These stand in for the external collaborators a tree talks to: the
//! interpreter process, the stream library and the server transport.
//!
//! # Example
//!
//! ```ignore
//! use scdryad_core::testing::{CancelStyle, ManualStream, MockLauncher};
//! use scdryad_core::dispatch::{Dispatcher, MemoryTransport};
//!
//! let launcher = MockLauncher::new();
//! let stream = ManualStream::new(CancelStyle::Disposable).leaky();
//! let transport = std::sync::Arc::new(MemoryTransport::with_defaults());
//! let dispatch = Dispatcher::new(transport.clone());
//! ```

mod interpreter;
mod stream;

pub use crate::dispatch::MemoryTransport;
pub use interpreter::{MockInterpreter, MockLauncher};
pub use stream::{CancelStyle, ManualStream};
