//! Profile configuration for sshdctl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `sshdctl_core::ApplianceConfig`. The CLI layers its
//! flag overrides on top of what this crate resolves.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sshdctl_core::{ApplianceConfig, AuthCredentials, TlsVerification};

/// Keyring service under which profile secrets are stored.
pub const KEYRING_SERVICE: &str = "sshdctl";

/// Environment variable consulted for the password before the keyring.
pub const PASSWORD_ENV: &str = "SSHDCTL_PASSWORD";

/// Environment variable consulted for the username when a profile has none.
pub const USER_ENV: &str = "SSHDCTL_USER";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// How a profile authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Login once for a session token, revoke it afterwards.
    #[default]
    Token,
    /// HTTP basic auth on every request.
    Basic,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Basic => "basic",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token" => Ok(Self::Token),
            "basic" => Ok(Self::Basic),
            other => Err(ConfigError::Validation {
                field: "auth_mode".into(),
                reason: format!("expected 'token' or 'basic', got '{other}'"),
            }),
        }
    }
}

/// A named appliance profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Management URL (e.g., "https://192.0.2.10").
    pub server: String,

    /// Username for either auth mode.
    pub user: Option<String>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Login provider for token auth.
    #[serde(default = "default_login_provider")]
    pub login_provider: String,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Profile {
    /// A profile pointing at `server` with every optional field unset.
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            user: None,
            auth_mode: AuthMode::default(),
            login_provider: default_login_provider(),
            password: None,
            password_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }
}

fn default_login_provider() -> String {
    "tmos".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sshdctl", "sshdctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sshdctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// A missing file is not an error; defaults and env still apply.
/// Nested keys use a double underscore: `SSHDCTL_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SSHDCTL_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_key(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .ok()?
        .get_password()
        .ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_key(profile_name))
        .map_err(|e| ConfigError::Keyring(format!("failed to access keyring: {e}")))?;
    entry
        .set_password(password)
        .map_err(|e| ConfigError::Keyring(format!("failed to store password: {e}")))
}

/// Resolve the password for a profile.
///
/// Order: the profile's `password_env` variable, `SSHDCTL_PASSWORD`, the
/// system keyring, then plaintext in the profile.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    password_chain(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        keyring_password,
    )
}

fn password_chain(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env -> env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Global env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve the username: profile value, then `SSHDCTL_USER`.
fn resolve_user(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    profile
        .user
        .clone()
        .or_else(|| std::env::var(USER_ENV).ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

fn build_auth(profile: &Profile, username: String, password: SecretString) -> AuthCredentials {
    match profile.auth_mode {
        AuthMode::Token => AuthCredentials::Token {
            username,
            password,
            login_provider: profile.login_provider.clone(),
        },
        AuthMode::Basic => AuthCredentials::Basic { username, password },
    }
}

/// Parse a management URL, rejecting anything that is not http(s).
pub fn parse_server(server: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected an http(s) URL, got '{server}'"),
        });
    }
    Ok(url)
}

/// TLS mode for a profile; `insecure` wins over `ca_cert`.
fn tls_for(profile: &Profile, insecure: bool) -> TlsVerification {
    if insecure || profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build an `ApplianceConfig` from a profile.
///
/// An explicit `password` skips the resolution chain (env, keyring,
/// plaintext). Callers with flag overrides apply them to a copy of the
/// profile first.
pub fn profile_to_appliance_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    password: Option<SecretString>,
) -> Result<ApplianceConfig, ConfigError> {
    let url = parse_server(&profile.server)?;
    let username = resolve_user(profile, profile_name)?;
    let password = match password {
        Some(pw) => pw,
        None => resolve_password(profile, profile_name)?,
    };

    Ok(ApplianceConfig {
        url,
        auth: build_auth(profile, username, password),
        tls: tls_for(profile, defaults.insecure),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn no_keyring(_: &str) -> Option<String> {
        None
    }

    fn lab_profile() -> Profile {
        Profile {
            user: Some("admin".into()),
            password: Some("plaintext".into()),
            ..Profile::new("https://192.0.2.10")
        }
    }

    // ── Loading / saving ────────────────────────────────────────────

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "lab"

[defaults]
timeout = 10

[profiles.lab]
server = "https://192.0.2.10"
user = "admin"
auth_mode = "basic"
insecure = true
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.output, "table");
        let lab = &cfg.profiles["lab"];
        assert_eq!(lab.auth_mode, AuthMode::Basic);
        assert_eq!(lab.login_provider, "tmos");
        assert_eq!(lab.insecure, Some(true));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn unknown_auth_mode_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[profiles.x]\nserver = \"https://a\"\nauth_mode = \"oauth\"\n")
            .unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert("lab".into(), lab_profile());

        save_config_to(&path, &cfg).unwrap();
        let loaded = load_config_from(&path).unwrap();

        let lab = &loaded.profiles["lab"];
        assert_eq!(lab.server, "https://192.0.2.10");
        assert_eq!(lab.user.as_deref(), Some("admin"));
        assert_eq!(lab.auth_mode, AuthMode::Token);
    }

    // ── Credentials ─────────────────────────────────────────────────

    #[test]
    fn profile_env_var_wins() {
        let profile = Profile {
            password_env: Some("LAB_PW".into()),
            ..lab_profile()
        };
        let env = |name: &str| match name {
            "LAB_PW" => Some("from-profile-env".to_string()),
            PASSWORD_ENV => Some("from-global-env".to_string()),
            _ => None,
        };

        let pw = password_chain(&profile, "lab", env, |_| Some("from-keyring".into())).unwrap();
        assert_eq!(pw.expose_secret(), "from-profile-env");
    }

    #[test]
    fn global_env_then_keyring_then_plaintext() {
        let profile = lab_profile();

        let env = |name: &str| (name == PASSWORD_ENV).then(|| "from-global-env".to_string());
        let pw = password_chain(&profile, "lab", env, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-global-env");

        let keyring = |name: &str| (name == "lab").then(|| "from-keyring".to_string());
        let pw = password_chain(&profile, "lab", no_env, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");

        let pw = password_chain(&profile, "lab", no_env, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "plaintext");
    }

    #[test]
    fn no_password_anywhere_is_an_error() {
        let profile = Profile::new("https://192.0.2.10");
        let err = password_chain(&profile, "lab", no_env, no_keyring).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "lab"));
    }

    #[test]
    fn auth_mode_selects_credentials_variant() {
        let token = build_auth(&lab_profile(), "admin".into(), "pw".to_string().into());
        assert!(matches!(token, AuthCredentials::Token { ref login_provider, .. } if login_provider == "tmos"));

        let basic_profile = Profile {
            auth_mode: AuthMode::Basic,
            ..lab_profile()
        };
        let basic = build_auth(&basic_profile, "admin".into(), "pw".to_string().into());
        assert!(matches!(basic, AuthCredentials::Basic { .. }));
    }

    // ── Conversion ──────────────────────────────────────────────────

    #[test]
    fn insecure_overrides_ca_cert() {
        let profile = Profile {
            ca_cert: Some("/etc/ssl/lab.pem".into()),
            ..lab_profile()
        };
        assert_eq!(
            tls_for(&profile, false),
            TlsVerification::CustomCa("/etc/ssl/lab.pem".into())
        );
        assert_eq!(tls_for(&profile, true), TlsVerification::DangerAcceptInvalid);
        assert_eq!(tls_for(&lab_profile(), false), TlsVerification::SystemDefaults);
    }

    #[test]
    fn server_must_be_http_url() {
        assert!(parse_server("https://192.0.2.10").is_ok());
        assert!(matches!(
            parse_server("192.0.2.10"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(matches!(
            parse_server("ftp://192.0.2.10"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn profile_becomes_appliance_config() {
        let profile = Profile {
            auth_mode: AuthMode::Basic,
            ca_cert: Some("/etc/ssl/lab.pem".into()),
            timeout: Some(12),
            ..lab_profile()
        };
        let cfg = profile_to_appliance_config(
            &profile,
            "lab",
            &Defaults::default(),
            Some("explicit".to_string().into()),
        )
        .unwrap();

        assert_eq!(cfg.url.as_str(), "https://192.0.2.10/");
        assert_eq!(cfg.tls, TlsVerification::CustomCa("/etc/ssl/lab.pem".into()));
        assert_eq!(cfg.timeout, Duration::from_secs(12));
        match cfg.auth {
            AuthCredentials::Basic { username, password } => {
                assert_eq!(username, "admin");
                assert_eq!(password.expose_secret(), "explicit");
            }
            other @ AuthCredentials::Token { .. } => panic!("expected basic auth, got {other:?}"),
        }
    }

    #[test]
    fn defaults_fill_timeout_and_insecure() {
        let defaults = Defaults {
            insecure: true,
            timeout: 45,
            ..Defaults::default()
        };
        let cfg = profile_to_appliance_config(
            &lab_profile(),
            "lab",
            &defaults,
            Some("pw".to_string().into()),
        )
        .unwrap();

        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(45));
        assert!(matches!(cfg.auth, AuthCredentials::Token { ref login_provider, .. } if login_provider == "tmos"));
    }

    #[test]
    fn invalid_server_fails_conversion() {
        let profile = Profile {
            server: "not a url".into(),
            ..lab_profile()
        };
        let err = profile_to_appliance_config(
            &profile,
            "lab",
            &Defaults::default(),
            Some("pw".to_string().into()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "server"));
    }

    #[test]
    fn auth_mode_parses_and_displays() {
        assert_eq!("basic".parse::<AuthMode>().unwrap(), AuthMode::Basic);
        assert_eq!(AuthMode::Token.to_string(), "token");
        assert!("hybrid".parse::<AuthMode>().is_err());
    }
}
