//! Clap derive structures for the `sshdctl` CLI.
//!
//! Defines the command tree, global flags, and shared types. Also compiled
//! by `build.rs` for man page generation, so it may only depend on clap
//! and strum.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use strum::IntoStaticStr;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// sshdctl -- declarative SSH daemon settings for network appliances
#[derive(Debug, Parser)]
#[command(
    name = "sshdctl",
    version,
    about = "Reconcile appliance SSH daemon settings from the command line",
    long_about = "Reads the appliance's SSHD settings over iControl REST, compares them\n\
        with the desired state, and sends a single update containing only\n\
        the settings that differ. Running the same apply twice changes\n\
        nothing the second time.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "SSHDCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Management URL (overrides profile)
    #[arg(long, short = 's', env = "SSHDCTL_SERVER", global = true)]
    pub server: Option<String>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "SSHDCTL_USER", global = true)]
    pub user: Option<String>,

    /// Password (prefer the keyring: sshdctl config set-password)
    #[arg(long, env = "SSHDCTL_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Authentication mode (overrides profile)
    #[arg(long, env = "SSHDCTL_AUTH_MODE", global = true)]
    pub auth_mode: Option<AuthModeArg>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SSHDCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SSHDCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "SSHDCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one name=value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthModeArg {
    /// Session token from /mgmt/shared/authn/login
    Token,
    /// HTTP basic auth on every request
    Basic,
}

/// On/off setting, in the appliance's spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Toggle {
    Enabled,
    Disabled,
}

/// SSHD log level, in the daemon's own spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Debug1,
    Debug2,
    Debug3,
    Error,
    Fatal,
    Info,
    Quiet,
    Verbose,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring the SSHD settings to the desired state
    Apply(ApplyArgs),

    /// Show the current SSHD settings
    Show,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  APPLY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Desired SSHD settings. Omitted settings are left as they are.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Addresses or networks allowed to connect ("all" for any)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub allow: Option<Vec<String>>,

    /// Show the login banner
    #[arg(long)]
    pub banner: Option<Toggle>,

    /// Login banner text
    #[arg(long, conflicts_with = "banner_text_file")]
    pub banner_text: Option<String>,

    /// Read the login banner text from a file
    #[arg(long, value_name = "PATH")]
    pub banner_text_file: Option<PathBuf>,

    /// Idle session timeout in seconds (0 disables)
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub inactivity_timeout: Option<i64>,

    /// SSHD log level
    #[arg(long)]
    pub log_level: Option<LogLevel>,

    /// Allow SSH logins
    #[arg(long)]
    pub login: Option<Toggle>,

    /// Listening port (1-65535)
    #[arg(long, allow_negative_numbers = true)]
    pub port: Option<i64>,

    /// Desired state file (.toml, .yaml/.yml, or .json); flags win
    #[arg(long, short = 'f', value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Report what would change without applying it
    #[arg(long, visible_alias = "dry-run")]
    pub check: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
