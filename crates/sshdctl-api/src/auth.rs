// Management API authentication
//
// Token login/revocation against the appliance's shared auth endpoints.
// Token mode stores the issued token on the client; every later request
// carries it in the `X-F5-Auth-Token` header. Basic mode sends the
// credentials on every request and never holds server-side state.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::IControlClient;
use crate::error::Error;

/// Login endpoint for token authentication.
pub const LOGIN_PATH: &str = "/mgmt/shared/authn/login";

/// Token collection; individual tokens live at `{TOKENS_PATH}/{token}`.
pub const TOKENS_PATH: &str = "/mgmt/shared/authz/tokens";

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "X-F5-Auth-Token";

/// Login provider used when none is configured.
pub const DEFAULT_LOGIN_PROVIDER: &str = "tmos";

/// Credentials for authenticating with the appliance.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Token auth: one login round-trip, then `X-F5-Auth-Token` on each
    /// request. The token must be revoked when the session ends.
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

impl Credentials {
    pub fn username(&self) -> &str {
        match self {
            Self::Token { username, .. } | Self::Basic { username, .. } => username,
        }
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    token: LoginToken,
}

#[derive(Deserialize)]
struct LoginToken {
    token: String,
}

impl IControlClient {
    /// Open a session with the appliance.
    ///
    /// For token credentials this posts to the login endpoint and stores
    /// the issued token. Basic credentials need no round-trip.
    pub async fn login(&self) -> Result<(), Error> {
        let (username, password, login_provider) = match self.credentials() {
            Credentials::Basic { username, .. } => {
                debug!(username, "basic auth -- no login round-trip");
                return Ok(());
            }
            Credentials::Token {
                username,
                password,
                login_provider,
            } => (username, password, login_provider),
        };

        let url = self.mgmt_url(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "loginProviderName": login_provider,
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let login: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Authentication {
                message: format!("login response carried no token: {e}"),
            })?;

        self.set_token(SecretString::from(login.token.token));
        debug!("login successful");
        Ok(())
    }

    /// Revoke the session token, if one was issued.
    ///
    /// The stored token is cleared even when the revocation request fails,
    /// so a second call never re-sends a dead token.
    pub async fn logout(&self) -> Result<(), Error> {
        let Some(token) = self.take_token() else {
            debug!("no session token to revoke");
            return Ok(());
        };

        let url = self.mgmt_url(&format!("{TOKENS_PATH}/{}", token.expose_secret()))?;
        debug!("revoking session token");

        let resp = self
            .http()
            .delete(url)
            .header(TOKEN_HEADER, token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("token revocation failed: {}", preview(&body)),
            });
        }

        debug!("logout complete");
        Ok(())
    }
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
