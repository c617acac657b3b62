// sshdctl-api: Async Rust client for the appliance management (iControl REST) API

pub mod auth;
pub mod client;
pub mod error;
pub mod sshd;
pub mod transport;

pub use auth::Credentials;
pub use client::IControlClient;
pub use error::Error;
pub use sshd::WireMap;
pub use transport::{TlsMode, TransportConfig};
