//! Apply command: validate the desired state and run one reconciliation pass.

use serde_json::Value;
use tracing::{debug, warn};

use sshdctl_core::{Appliance, FieldTable, RawInput, ReconcileMode, Reconciler, validate_input};

use crate::cli::{ApplyArgs, GlobalOpts};
use crate::config;
use crate::error::{CliError, Target};
use crate::output;

use super::util;

pub async fn handle(args: ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let desired = desired_state(&args)?;
    let table = FieldTable::sshd();

    // Input acceptance happens before any connection is made.
    validate_input(table, &desired).map_err(|e| CliError::from_core(e, &Target::default()))?;
    if desired.is_empty() {
        warn!("no settings requested; the device will only be read");
    }

    let (appliance, target) = config::resolve_appliance(global)?;
    let mode = if args.check {
        ReconcileMode::DryRun
    } else {
        ReconcileMode::Apply
    };
    debug!(url = %target.url, ?mode, settings = desired.len(), "reconciling");

    let report = Appliance::oneshot(appliance, |gateway| async move {
        Reconciler::new(table, gateway).reconcile(&desired, mode).await
    })
    .await
    .map_err(|e| CliError::from_core(e, &target))?;

    let out = output::render_report(
        &global.output,
        &report,
        output::should_color(&global.color),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Merge `--from-file` with the individual flags; flags win.
fn desired_state(args: &ApplyArgs) -> Result<RawInput, CliError> {
    let mut desired = match args.from_file {
        Some(ref path) => util::read_desired_state(path)?,
        None => RawInput::new(),
    };

    if let Some(ref allow) = args.allow {
        let items = allow.iter().map(|a| Value::String(a.clone())).collect();
        desired.insert("allow".into(), Value::Array(items));
    }
    if let Some(banner) = args.banner {
        desired.insert("banner".into(), <&str>::from(banner).into());
    }
    if let Some(ref text) = args.banner_text {
        desired.insert("banner_text".into(), Value::String(text.clone()));
    }
    if let Some(ref path) = args.banner_text_file {
        let text = util::read_text_file(path, "banner_text")?;
        desired.insert("banner_text".into(), Value::String(text));
    }
    if let Some(timeout) = args.inactivity_timeout {
        desired.insert("inactivity_timeout".into(), timeout.into());
    }
    if let Some(level) = args.log_level {
        desired.insert("log_level".into(), <&str>::from(level).into());
    }
    if let Some(login) = args.login {
        desired.insert("login".into(), <&str>::from(login).into());
    }
    if let Some(port) = args.port {
        desired.insert("port".into(), port.into());
    }

    Ok(desired)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use clap::{Parser, ValueEnum};
    use serde_json::json;
    use sshdctl_core::FieldId;

    use super::*;
    use crate::cli::{Cli, Command, LogLevel, Toggle};

    fn apply_args(argv: &[&str]) -> ApplyArgs {
        let cli = Cli::try_parse_from(std::iter::once("sshdctl").chain(argv.iter().copied()))
            .unwrap();
        match cli.command {
            Command::Apply(args) => args,
            other => panic!("expected apply, got {other:?}"),
        }
    }

    #[test]
    fn flags_become_internal_names() {
        let args = apply_args(&[
            "apply",
            "--allow",
            "10.0.0.1,10.0.0.2",
            "--log-level",
            "debug2",
            "--login",
            "disabled",
            "--port",
            "2222",
        ]);
        let desired = desired_state(&args).unwrap();
        assert_eq!(
            Value::Object(desired),
            json!({
                "allow": ["10.0.0.1", "10.0.0.2"],
                "log_level": "debug2",
                "login": "disabled",
                "port": 2222
            })
        );
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sshd.toml");
        std::fs::write(&path, "port = 22\nbanner = \"enabled\"\n").unwrap();

        let args = apply_args(&["apply", "--from-file", path.to_str().unwrap(), "--port", "2200"]);
        let desired = desired_state(&args).unwrap();

        assert_eq!(desired.get("port"), Some(&json!(2200)));
        assert_eq!(desired.get("banner"), Some(&json!("enabled")));
    }

    #[test]
    fn banner_text_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.txt");
        std::fs::write(&path, "Authorized use only.\n").unwrap();

        let args = apply_args(&["apply", "--banner-text-file", path.to_str().unwrap()]);
        let desired = desired_state(&args).unwrap();

        assert_eq!(desired.get("banner_text"), Some(&json!("Authorized use only.\n")));
    }

    #[test]
    fn banner_text_sources_conflict() {
        let result = Cli::try_parse_from([
            "sshdctl",
            "apply",
            "--banner-text",
            "x",
            "--banner-text-file",
            "y",
        ]);
        assert!(result.is_err());
    }

    fn choice_names<T: ValueEnum>() -> BTreeSet<String> {
        T::value_variants()
            .iter()
            .filter_map(ValueEnum::to_possible_value)
            .map(|v| v.get_name().to_owned())
            .collect()
    }

    fn table_choices(id: FieldId) -> BTreeSet<String> {
        let spec = FieldTable::sshd().get(id).unwrap();
        spec.allowed_values().iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn flag_choices_match_field_table() {
        assert_eq!(choice_names::<LogLevel>(), table_choices(FieldId::LogLevel));
        assert_eq!(choice_names::<Toggle>(), table_choices(FieldId::Login));
        assert_eq!(choice_names::<Toggle>(), table_choices(FieldId::Banner));
    }

    #[test]
    fn flag_values_use_table_spelling() {
        for level in LogLevel::value_variants() {
            let name: &str = (*level).into();
            assert!(table_choices(FieldId::LogLevel).contains(name), "{name}");
        }
        for toggle in Toggle::value_variants() {
            let name: &str = (*toggle).into();
            assert!(table_choices(FieldId::Login).contains(name), "{name}");
        }
    }

    #[test]
    fn no_flags_means_empty_desired_state() {
        let args = apply_args(&["apply", "--check"]);
        assert!(desired_state(&args).unwrap().is_empty());
        assert!(args.check);
    }
}
