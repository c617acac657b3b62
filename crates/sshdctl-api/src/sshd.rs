// SSHD resource endpoints
//
// The daemon settings are a singleton resource: one GET to read them,
// one PATCH carrying only the attributes to change.

use tracing::debug;

use crate::client::IControlClient;
use crate::error::Error;

/// Path of the SSHD settings resource.
pub const SSHD_PATH: &str = "/mgmt/tm/sys/sshd";

/// A wire-keyed attribute map, exactly as the appliance sends and accepts it.
pub type WireMap = serde_json::Map<String, serde_json::Value>;

impl IControlClient {
    /// Load the current SSHD settings.
    ///
    /// `GET /mgmt/tm/sys/sshd`
    ///
    /// Returns the raw attribute map, bookkeeping keys (`kind`, `selfLink`)
    /// included; callers pick out the attributes they understand.
    pub async fn load_sshd(&self) -> Result<WireMap, Error> {
        let url = self.mgmt_url(SSHD_PATH)?;
        debug!("loading sshd settings");
        self.get(url).await
    }

    /// Modify the given SSHD attributes, leaving all others untouched.
    ///
    /// `PATCH /mgmt/tm/sys/sshd`
    ///
    /// The appliance applies the whole body as one transaction and answers
    /// with the updated resource.
    pub async fn update_sshd(&self, attributes: &WireMap) -> Result<WireMap, Error> {
        let url = self.mgmt_url(SSHD_PATH)?;
        debug!(attributes = attributes.len(), "updating sshd settings");
        self.patch(url, attributes).await
    }
}
