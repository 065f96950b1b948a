//! Standard dryads for scdryad.
//!
//! ## Interpreter (`sclang::*`)
//! - [`sclang::SclangDryad`] - Boots sclang for its subtree and quits it on removal
//! - [`sclang::ProcessLauncher`] - Launches sclang as a child process
//!
//! ## Server control
//! - [`synth_control::SynthControl`] - Forwards a value stream to a synth as `/n_set`
//! - [`node_id::NodeIdDryad`] - Publishes a fixed `nodeID` for its children

pub mod node_id;
pub mod sclang;
pub mod synth_control;

pub use node_id::NodeIdDryad;
pub use sclang::{LauncherConfig, ProcessLauncher, SclangDryad, SclangProcess};
pub use synth_control::SynthControl;

/// Prelude for commonly used types.
pub mod prelude {
    pub use crate::node_id::NodeIdDryad;
    pub use crate::sclang::{LauncherConfig, ProcessLauncher, SclangDryad};
    pub use crate::synth_control::SynthControl;
}
