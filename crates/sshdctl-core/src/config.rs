// ── Runtime connection configuration ──
//
// These types describe *how* to reach an appliance. They carry credential
// data and connection tuning, but never touch disk. The CLI constructs an
// `ApplianceConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// How to authenticate with the appliance.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Login once, then send the issued token. The token is revoked when
    /// the session ends.
    Token {
        username: String,
        password: SecretString,
        login_provider: String,
    },
    /// HTTP basic auth on every request.
    Basic {
        username: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed management certificates).
    DangerAcceptInvalid,
}

/// Configuration for one appliance session.
///
/// Built by the config layer, passed to `Appliance` -- core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct ApplianceConfig {
    /// Management URL (e.g., `https://192.0.2.10` or `https://lb:8443`).
    pub url: Url,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}
