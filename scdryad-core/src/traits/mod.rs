//! Core traits for scdryad components.
//!
//! - `Dryad`: a node in a composition tree with optional lifecycle hooks

mod dryad;

pub use dryad::{Dryad, DryadInfo, Hook, HookFuture};
