//! CLI configuration -- thin wrapper around `sshdctl_config`.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--server, --user, --password, ...).

use secrecy::SecretString;

use sshdctl_config::AuthMode;
use sshdctl_core::ApplianceConfig;

use crate::cli::{AuthModeArg, GlobalOpts};
use crate::error::{CliError, Target};

// ── Re-exports from shared crate ────────────────────────────────────

pub use sshdctl_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Resolve the appliance to talk to: the active profile with flag
/// overrides, or flags alone when no profile exists.
pub fn resolve_appliance(global: &GlobalOpts) -> Result<(ApplianceConfig, Target), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            let server = global.server.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile::new(server)
        }
    };

    let appliance = resolve_profile(&profile, &profile_name, &cfg.defaults, global)?;
    let target = Target {
        url: appliance.url.to_string(),
        profile: profile_name,
        timeout_secs: appliance.timeout.as_secs(),
    };
    Ok((appliance, target))
}

/// Translate a `Profile` + global flags into an `ApplianceConfig`.
///
/// Flags are applied to a copy of the profile, so they take priority over
/// profile values; `--password` bypasses the env/keyring chain entirely.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ApplianceConfig, CliError> {
    let profile = apply_overrides(profile.clone(), global);
    let password = global.password.clone().map(SecretString::from);
    sshdctl_config::profile_to_appliance_config(&profile, profile_name, defaults, password)
        .map_err(CliError::from)
}

fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(mode) = global.auth_mode {
        profile.auth_mode = match mode {
            AuthModeArg::Token => AuthMode::Token,
            AuthModeArg::Basic => AuthMode::Basic,
        };
    }
    if let Some(ref user) = global.user {
        profile.user = Some(user.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use secrecy::ExposeSecret;
    use sshdctl_core::{AuthCredentials, TlsVerification};

    use super::*;
    use crate::cli::Cli;

    fn global(argv: &[&str]) -> GlobalOpts {
        let cli = Cli::try_parse_from(
            ["sshdctl"]
                .into_iter()
                .chain(argv.iter().copied())
                .chain(["show"]),
        )
        .unwrap();
        cli.global
    }

    fn lab() -> Profile {
        Profile {
            user: Some("admin".into()),
            timeout: Some(20),
            ..Profile::new("https://192.0.2.10")
        }
    }

    #[test]
    fn flags_override_profile_values() {
        let opts = global(&[
            "--server",
            "https://198.51.100.7",
            "--user",
            "ops",
            "--password",
            "from-flag",
            "--auth-mode",
            "basic",
            "--insecure",
            "--timeout",
            "3",
        ]);
        let cfg = resolve_profile(&lab(), "lab", &Defaults::default(), &opts).unwrap();

        assert_eq!(cfg.url.as_str(), "https://198.51.100.7/");
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        let AuthCredentials::Basic { username, password } = cfg.auth else {
            panic!("expected basic credentials");
        };
        assert_eq!(username, "ops");
        assert_eq!(password.expose_secret(), "from-flag");
    }

    #[test]
    fn profile_values_survive_without_flags() {
        let opts = global(&["--password", "pw"]);
        let cfg = resolve_profile(&lab(), "lab", &Defaults::default(), &opts).unwrap();

        assert_eq!(cfg.url.as_str(), "https://192.0.2.10/");
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
        assert_eq!(cfg.timeout, Duration::from_secs(20));
        assert!(matches!(cfg.auth, AuthCredentials::Token { ref username, .. } if username == "admin"));
    }
}
