//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use sshdctl_core::RawInput;

use crate::error::CliError;

fn input_file_error(path: &Path, reason: impl std::fmt::Display) -> CliError {
    CliError::InputFile {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Read a desired-state file for `--from-file`.
///
/// The format follows the extension: `.toml`, `.yaml`/`.yml`, anything
/// else is parsed as JSON. The document must be a flat table keyed by
/// setting name.
pub fn read_desired_state(path: &Path) -> Result<RawInput, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|e| input_file_error(path, e))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let value: Value = match extension.as_deref() {
        Some("toml") => {
            let table: toml::Table =
                toml::from_str(&contents).map_err(|e| input_file_error(path, e))?;
            serde_json::to_value(table).map_err(|e| input_file_error(path, e))?
        }
        Some("yaml" | "yml") => {
            serde_yaml::from_str(&contents).map_err(|e| input_file_error(path, e))?
        }
        _ => serde_json::from_str(&contents).map_err(|e| input_file_error(path, e))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(RawInput::new()),
        _ => Err(input_file_error(path, "expected a table of settings")),
    }
}

/// Read a text file verbatim (banner text).
pub fn read_text_file(path: &Path, field: &str) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("cannot read {}: {e}", path.display()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "sshd.toml", "port = 2222\nallow = [\"10.0.0.0/8\"]\n");
        let map = read_desired_state(&path).unwrap();
        assert_eq!(Value::Object(map), json!({ "port": 2222, "allow": ["10.0.0.0/8"] }));
    }

    #[test]
    fn reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "sshd.yml", "login: disabled\ninactivity_timeout: 300\n");
        let map = read_desired_state(&path).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({ "login": "disabled", "inactivity_timeout": 300 })
        );
    }

    #[test]
    fn reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "sshd.json", r#"{"banner": "enabled"}"#);
        let map = read_desired_state(&path).unwrap();
        assert_eq!(map.get("banner"), Some(&json!("enabled")));
    }

    #[test]
    fn rejects_non_table_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "sshd.json", "[1, 2]");
        assert!(matches!(
            read_desired_state(&path),
            Err(CliError::InputFile { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_desired_state(&dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }
}
