// ── Device gateway ──
//
// The two device round-trips a reconciliation pass needs. The reconciler
// only ever sees this trait; `IControlGateway` is the HTTP implementation
// and tests plug in an in-memory one.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use sshdctl_api::{IControlClient, WireMap};

/// Read and write access to one appliance's SSHD settings.
pub trait DeviceGateway {
    /// Fetch the current settings, keyed by wire name.
    fn read_current(&self) -> impl Future<Output = Result<WireMap, sshdctl_api::Error>> + Send;

    /// Apply the given wire-keyed changes in one write.
    fn apply_changes(
        &self,
        params: &WireMap,
    ) -> impl Future<Output = Result<(), sshdctl_api::Error>> + Send;
}

/// Gateway backed by an authenticated iControl REST client.
#[derive(Clone)]
pub struct IControlGateway {
    client: Arc<IControlClient>,
}

impl IControlGateway {
    pub fn new(client: Arc<IControlClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &IControlClient {
        &self.client
    }

    /// Revoke the session token, if any. Failures are logged, not returned.
    pub async fn disconnect(&self) {
        match self.client.logout().await {
            Ok(()) => debug!("session closed"),
            Err(e) => warn!(error = %e, "failed to revoke session token"),
        }
    }
}

impl DeviceGateway for IControlGateway {
    async fn read_current(&self) -> Result<WireMap, sshdctl_api::Error> {
        self.client.load_sshd().await
    }

    async fn apply_changes(&self, params: &WireMap) -> Result<(), sshdctl_api::Error> {
        self.client.update_sshd(params).await.map(|_| ())
    }
}
