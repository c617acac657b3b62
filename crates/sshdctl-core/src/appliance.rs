// ── Appliance session ──
//
// Owns the authenticated API client for one invocation. `oneshot` is the
// CLI entry point: connect, run the closure, then always tear the session
// down before handing back the closure's result.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use sshdctl_api::{Credentials, IControlClient, TlsMode, TransportConfig};

use crate::config::{ApplianceConfig, AuthCredentials, TlsVerification};
use crate::error::{CoreError, DeviceOperation};
use crate::gateway::IControlGateway;

/// A session with one appliance.
pub struct Appliance {
    config: ApplianceConfig,
    gateway: IControlGateway,
}

impl Appliance {
    /// Build the HTTP client. No request is sent yet.
    pub fn new(config: ApplianceConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = IControlClient::new(
            config.url.clone(),
            to_api_credentials(&config.auth),
            &transport,
        )
        .map_err(|e| CoreError::device(DeviceOperation::Login, e))?;

        Ok(Self {
            config,
            gateway: IControlGateway::new(Arc::new(client)),
        })
    }

    /// Authenticate. A no-op round-trip wise for basic auth.
    pub async fn connect(&self) -> Result<(), CoreError> {
        debug!(url = %self.config.url, "connecting");
        self.gateway
            .client()
            .login()
            .await
            .map_err(|e| CoreError::device(DeviceOperation::Login, e))
    }

    /// Gateway handle for reconciliation passes.
    pub fn gateway(&self) -> IControlGateway {
        self.gateway.clone()
    }

    /// Revoke the session. Never fails; problems are logged.
    pub async fn disconnect(&self) {
        self.gateway.disconnect().await;
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// Connect, run `f`, disconnect.
    ///
    /// Teardown runs whether `f` (or the login itself) succeeded or not,
    /// and never replaces the result that is returned.
    pub async fn oneshot<F, Fut, T>(config: ApplianceConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(IControlGateway) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let appliance = Self::new(config)?;
        let result = match appliance.connect().await {
            Ok(()) => f(appliance.gateway()).await,
            Err(e) => Err(e),
        };
        appliance.disconnect().await;
        result
    }
}

fn build_transport(config: &ApplianceConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

fn to_api_credentials(auth: &AuthCredentials) -> Credentials {
    match auth {
        AuthCredentials::Token {
            username,
            password,
            login_provider,
        } => Credentials::Token {
            username: username.clone(),
            password: password.clone(),
            login_provider: login_provider.clone(),
        },
        AuthCredentials::Basic { username, password } => Credentials::Basic {
            username: username.clone(),
            password: password.clone(),
        },
    }
}
