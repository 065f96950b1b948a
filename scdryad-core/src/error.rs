//! Error types for scdryad.
//!
//! Errors carry the dryad name and context key involved so a failing tree
//! can be traced back to the node that misbehaved.

use crate::dispatch::DispatchError;
use crate::traits::Hook;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for scdryad operations.
#[derive(Error, Debug)]
pub enum DryadError {
    // =========================================================================
    // Context Errors (E100-E199)
    // =========================================================================
    /// A required context entry was not published by any ancestor.
    #[error("E101: Dryad '{dryad}' requires context entry '{key}' but no ancestor published it")]
    MissingContext {
        /// The dryad that needed the entry.
        dryad: String,
        /// The missing key.
        key: String,
    },

    /// A context entry holds a value of the wrong kind.
    #[error("E102: Context entry '{key}' has the wrong kind: expected {expected}, found {found}")]
    ContextType {
        /// The offending key.
        key: String,
        /// The kind the reader expected.
        expected: &'static str,
        /// The kind actually stored.
        found: &'static str,
    },

    // =========================================================================
    // Lifecycle Errors (E200-E299)
    // =========================================================================
    /// A lifecycle hook failed.
    #[error("E201: {hook} hook failed for dryad '{dryad}': {source}")]
    HookFailed {
        /// The dryad whose hook failed.
        dryad: String,
        /// Which hook failed.
        hook: Hook,
        /// The underlying error.
        #[source]
        source: Box<DryadError>,
    },

    /// The player already holds a mounted tree.
    #[error("E202: Player is already playing a tree; stop it first")]
    AlreadyPlaying,

    // =========================================================================
    // Interpreter Errors (E300-E399)
    // =========================================================================
    /// The interpreter process could not be started.
    #[error("E301: Failed to boot interpreter '{executable}': {cause}")]
    InterpreterBoot {
        /// The executable that was launched.
        executable: PathBuf,
        /// Reason for the failure.
        cause: String,
    },

    /// Reading from or writing to the interpreter failed.
    #[error("E302: Interpreter I/O failed: {cause}")]
    InterpreterIo {
        /// Description of the I/O failure.
        cause: String,
    },

    /// The interpreter cannot accept input.
    #[error("E303: Interpreter unavailable: {cause}")]
    InterpreterUnavailable {
        /// Why the interpreter cannot accept input.
        cause: String,
    },

    // =========================================================================
    // Stream Errors (E400-E499)
    // =========================================================================
    /// A stream emitted an item of the wrong shape.
    #[error("E401: Invalid stream item: {cause}")]
    InvalidStreamItem {
        /// What was wrong with the item.
        cause: String,
    },

    // =========================================================================
    // Dispatch Errors (E500-E599)
    // =========================================================================
    /// The transport refused a command.
    #[error("E501: Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    // =========================================================================
    // Configuration Errors (E800-E899)
    // =========================================================================
    /// Invalid configuration value.
    #[error("E801: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        cause: String,
    },

    /// YAML configuration could not be parsed.
    #[error("E802: Failed to parse YAML configuration: {cause}")]
    YamlParse {
        /// Reason for the parse failure.
        cause: String,
    },
}

impl DryadError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingContext { .. } => "E101",
            Self::ContextType { .. } => "E102",
            Self::HookFailed { .. } => "E201",
            Self::AlreadyPlaying => "E202",
            Self::InterpreterBoot { .. } => "E301",
            Self::InterpreterIo { .. } => "E302",
            Self::InterpreterUnavailable { .. } => "E303",
            Self::InvalidStreamItem { .. } => "E401",
            Self::Dispatch(_) => "E501",
            Self::ConfigValue { .. } => "E801",
            Self::YamlParse { .. } => "E802",
        }
    }

    /// Check if this is a configuration error (fatal to the subtree).
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::MissingContext { .. }
            | Self::ContextType { .. }
            | Self::ConfigValue { .. }
            | Self::YamlParse { .. } => true,
            Self::HookFailed { source, .. } => source.is_config_error(),
            _ => false,
        }
    }

    /// Wrap this error with the dryad and hook it came from.
    #[must_use]
    pub fn in_hook(self, dryad: impl Into<String>, hook: Hook) -> Self {
        Self::HookFailed {
            dryad: dryad.into(),
            hook,
            source: Box::new(self),
        }
    }

    /// The innermost error, unwrapping any hook wrappers.
    #[must_use]
    pub fn root(&self) -> &DryadError {
        match self {
            Self::HookFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for scdryad operations.
pub type Result<T> = std::result::Result<T, DryadError>;
