// iControl REST HTTP client
//
// Wraps `reqwest::Client` with management URL construction, credential
// injection, and error-body parsing. Endpoint modules (auth, sshd) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credentials, TOKEN_HEADER, preview};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Error body returned by the appliance on failed requests:
/// `{"code": 400, "message": "...", "errorStack": [...]}`.
#[derive(serde::Deserialize)]
struct IControlErrorBody {
    code: Option<u16>,
    message: Option<String>,
}

/// Raw HTTP client for the appliance's management API.
///
/// Holds the credentials and, in token mode, the session token issued by
/// [`login`](Self::login). All request helpers inject the right auth
/// material and turn non-2xx responses into [`Error`] values.
pub struct IControlClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    /// Session token for token auth. Set by `login`, cleared by `logout`.
    token: RwLock<Option<SecretString>>,
}

impl IControlClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the appliance root (e.g. `https://192.0.2.10` or
    /// `https://lb.example.com:8443`). No request is sent until
    /// [`login`](Self::login) or an endpoint method is called.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            token: RwLock::new(None),
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The appliance base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The configured credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether a session token is currently held.
    pub fn has_token(&self) -> bool {
        self.token.read().expect("token lock poisoned").is_some()
    }

    // ── Token management ─────────────────────────────────────────────

    pub(crate) fn set_token(&self, token: SecretString) {
        debug!("storing session token");
        *self.token.write().expect("token lock poisoned") = Some(token);
    }

    pub(crate) fn take_token(&self) -> Option<SecretString> {
        self.token.write().expect("token lock poisoned").take()
    }

    /// Attach credentials (basic) or the session token (token mode).
    fn apply_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Credentials::Basic { username, password } = &self.credentials {
            return builder.basic_auth(username, Some(password.expose_secret()));
        }
        let guard = self.token.read().expect("token lock poisoned");
        match guard.as_ref() {
            Some(token) => builder.header(TOKEN_HEADER, token.expose_secret()),
            None => {
                trace!("no session token yet -- sending unauthenticated request");
                builder
            }
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an absolute management path (`/mgmt/...`).
    pub(crate) fn mgmt_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let builder = self.apply_auth(self.http.get(url));
        let resp = builder.send().await.map_err(Error::Transport)?;

        self.parse_response(resp).await
    }

    /// Send a PATCH request with a JSON body and decode the JSON reply.
    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PATCH {}", url);

        let builder = self.apply_auth(self.http.patch(url).json(body));
        let resp = builder.send().await.map_err(Error::Transport)?;

        self.parse_response(resp).await
    }

    /// Check the status, surface appliance errors, then decode `T`.
    async fn parse_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "token expired or invalid credentials".into(),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<IControlErrorBody>(&body) {
                Ok(IControlErrorBody {
                    message: Some(message),
                    code,
                }) => match code {
                    Some(code) if code != status.as_u16() => format!("{message} (code {code})"),
                    _ => message,
                },
                _ => preview(&body),
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}
