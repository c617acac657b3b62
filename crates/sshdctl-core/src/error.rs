// ── Core error types ──
//
// Two failure kinds matter to a reconciliation pass: bad input (raised
// while building `want`) and device failures (raised while talking to the
// appliance). Both are terminal for the pass. Transport detail is kept as
// the `source` so callers can still classify it.

use strum::Display;
use thiserror::Error;

/// Which device round-trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceOperation {
    Login,
    Read,
    Apply,
    Logout,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Device {operation} failed: {source}")]
    Device {
        operation: DeviceOperation,
        #[source]
        source: sshdctl_api::Error,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn device(operation: DeviceOperation, source: sshdctl_api::Error) -> Self {
        Self::Device { operation, source }
    }

    /// The wrapped transport error, for device failures.
    pub fn device_source(&self) -> Option<&sshdctl_api::Error> {
        match self {
            Self::Device { source, .. } => Some(source),
            _ => None,
        }
    }
}
