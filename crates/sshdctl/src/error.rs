//! CLI error types with miette diagnostics.
//!
//! Maps core and config failures into user-facing errors with actionable
//! help text and a stable exit code per failure class.

use miette::Diagnostic;
use thiserror::Error;

use sshdctl_config::ConfigError;
use sshdctl_core::{CoreError, DeviceOperation};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: u8 = 1;
    pub const USAGE: u8 = 2;
    pub const AUTH: u8 = 3;
    pub const NOT_FOUND: u8 = 4;
    pub const CONNECTION: u8 = 7;
    pub const TIMEOUT: u8 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to appliance at {url}")]
    #[diagnostic(
        code(sshdctl::connection_failed),
        help(
            "Check that the management interface is reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed for {url}: {reason}")]
    #[diagnostic(
        code(sshdctl::tls_error),
        help(
            "Self-signed management certificates need --insecure (-k),\n\
             or configure ca_cert in your profile."
        )
    )]
    TlsError { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(sshdctl::auth_failed),
        help(
            "Verify the username, password and login provider.\n\
             Run: sshdctl config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(sshdctl::no_credentials),
        help(
            "Configure credentials with: sshdctl config init\n\
             Or set SSHDCTL_USER and SSHDCTL_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Appliance ────────────────────────────────────────────────────
    #[error("SSHD settings not found at {url}")]
    #[diagnostic(
        code(sshdctl::not_found),
        help("The management URL must point at the appliance root, e.g. https://192.0.2.10")
    )]
    NotFound { url: String },

    #[error("Appliance rejected {operation} (HTTP {status}): {message}")]
    #[diagnostic(code(sshdctl::api_error))]
    ApiError {
        operation: DeviceOperation,
        status: u16,
        message: String,
    },

    #[error("Device {operation} failed")]
    #[diagnostic(code(sshdctl::device_error))]
    Device {
        operation: DeviceOperation,
        #[source]
        source: sshdctl_api::Error,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(sshdctl::timeout),
        help("Increase timeout with --timeout or check appliance responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sshdctl::validation))]
    Validation { field: String, reason: String },

    #[error("Could not read desired state from {path}: {reason}")]
    #[diagnostic(
        code(sshdctl::input_file),
        help("Supported formats: .toml, .yaml/.yml, .json (a flat table of settings).")
    )]
    InputFile { path: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sshdctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: sshdctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No appliance configured")]
    #[diagnostic(
        code(sshdctl::no_config),
        help(
            "Create a profile with: sshdctl config init\n\
             Or pass --server, --user and --password.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(sshdctl::config))]
    Config(ConfigError),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::InputFile { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            other => Self::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

/// Where a pass was headed, for error messages that need it.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl CliError {
    /// Classify a core failure, using the wrapped transport error to pick
    /// the exit code.
    pub fn from_core(err: CoreError, target: &Target) -> Self {
        match err {
            CoreError::Validation { field, reason } => Self::Validation { field, reason },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Device { operation, source } => Self::from_device(operation, source, target),
        }
    }

    fn from_device(operation: DeviceOperation, source: sshdctl_api::Error, target: &Target) -> Self {
        if source.is_auth_failure() {
            return Self::AuthFailed {
                profile: target.profile.clone(),
            };
        }
        if source.is_timeout() {
            return Self::Timeout {
                seconds: target.timeout_secs,
            };
        }
        if source.is_connect() {
            return Self::ConnectionFailed {
                url: target.url.clone(),
                source: Box::new(source),
            };
        }
        if source.is_not_found() {
            return Self::NotFound {
                url: target.url.clone(),
            };
        }
        match source {
            sshdctl_api::Error::Tls(reason) => Self::TlsError {
                url: target.url.clone(),
                reason,
            },
            sshdctl_api::Error::Api { status, message } => Self::ApiError {
                operation,
                status,
                message,
            },
            other => Self::Device {
                operation,
                source: other,
            },
        }
    }
}
