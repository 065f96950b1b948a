//! scdryad Core Library
//!
//! This crate provides the lifecycle and context-propagation protocol for
//! trees of synthesis nodes ("dryads") that are added to and removed from a
//! running SuperCollider server.
//!
//! # Key Components
//!
//! - **Context**: Layered key/value map threaded down the tree
//! - **Traits**: The [`Dryad`] lifecycle hooks
//! - **Dispatch**: Timed command bundles and the transport seam
//! - **Stream**: Value streams and exactly-once subscription handles
//! - **Interpreter**: Boot/quit contract for sclang
//! - **Player**: A minimal depth-first tree player
//!
//! # Example
//!
//! ```ignore
//! use scdryad_core::prelude::*;
//!
//! let player = DryadPlayer::new();
//! player.play(DryadNode::new(my_dryad)).await?;
//! // ...
//! player.stop().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod dispatch;
pub mod error;
pub mod interpreter;
pub mod logging;
pub mod player;
pub mod prelude;
pub mod stream;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use context::{Context, ContextEntries, ContextValue};
pub use error::{DryadError, Result};
pub use player::{DryadNode, DryadPlayer};
pub use traits::{Dryad, DryadInfo, Hook};
pub use types::SynthNodeId;
