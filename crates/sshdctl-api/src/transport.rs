// HTTP transport for the management interface.
//
// The appliance serves iControl REST on its management address, usually
// behind a self-signed certificate; the trust choice is made here once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

/// How the management certificate is checked.
#[derive(Debug, Clone)]
pub enum TlsMode {
    System,
    /// Trust the PEM bundle at this path in addition to the system store.
    CustomCa(PathBuf),
    /// Skip verification (factory self-signed certificate).
    DangerAcceptInvalid,
}

/// Settings for the single `reqwest::Client` an `IControlClient` owns.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout, covering login, read, write and teardown alike.
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("sshdctl/", env!("CARGO_PKG_VERSION")));

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => builder.add_root_certificate(load_ca(path)?),
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

fn load_ca(path: &Path) -> Result<reqwest::Certificate, Error> {
    let pem = std::fs::read(path)
        .map_err(|e| Error::Tls(format!("failed to read CA cert {}: {e}", path.display())))?;
    reqwest::Certificate::from_pem(&pem).map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))
}
