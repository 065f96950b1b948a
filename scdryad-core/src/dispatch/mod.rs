//! Command dispatch from nodes to the synthesis server.
//!
//! A node builds [`WireMessage`]s, wraps them in a timed [`CommandBundle`]
//! and submits the resulting [`Command`] through a [`CommandDispatch`],
//! addressed with the node id found in its context. The [`Dispatcher`]
//! forwards to a pluggable [`Transport`]:
//!
//! - [`MemoryTransport`]: records commands (tests, offline runs)
//! - [`ChannelTransport`]: hands commands to the task that owns the socket
//!
//! # Example
//!
//! ```ignore
//! use scdryad_core::dispatch::*;
//!
//! let transport = Arc::new(MemoryTransport::with_defaults());
//! let dispatch = Dispatcher::new(transport.clone());
//!
//! let msg = WireMessage::node_set(node_id, &params);
//! dispatch.call_command(&ctx, Command::scserver(CommandBundle::single(msg)))?;
//! ```

mod channel;
mod command;
mod message;
mod traits;

pub mod memory;

pub use channel::ChannelTransport;
pub use command::{Command, CommandBundle, DEFAULT_LATENCY, TargetSystem};
pub use memory::{MemoryTransport, SentCommand};
pub use message::{OscArg, ParamMap, WireMessage};
pub use traits::{CommandDispatch, DispatchError, DispatchResult, Dispatcher, Transport};
