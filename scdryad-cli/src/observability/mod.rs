//! Tracing setup for the CLI.
//!
//! Logging format is controlled via `SCDRYAD_LOG_FORMAT`:
//! - `json` - Structured JSON output
//! - `pretty` - Human-readable colored output (default for TTY)
//! - `compact` - Compact single-line format (default for non-TTY)
//!
//! The filter comes from `SCDRYAD_LOG_LEVEL`, then `RUST_LOG`.

mod config;
mod tracing_setup;

pub use config::TracingConfig;
pub use tracing_setup::init_tracing;
