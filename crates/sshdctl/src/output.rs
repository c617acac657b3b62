//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one `name=value` per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use sshdctl_core::{ReconcileReport, ReportMap};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Table rows ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn setting_rows(fields: &ReportMap) -> Vec<SettingRow> {
    fields
        .iter()
        .map(|(id, value)| SettingRow {
            name: id.to_string(),
            value: value.to_string(),
        })
        .collect()
}

fn plain_lines(fields: &ReportMap) -> Vec<String> {
    fields
        .iter()
        .map(|(id, value)| format!("{id}={value}"))
        .collect()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Render current device settings.
pub fn render_settings(format: &OutputFormat, fields: &ReportMap) -> String {
    render_single(
        format,
        fields,
        |f| render_table(&setting_rows(f)),
        |f| plain_lines(f).join("\n"),
    )
}

/// Render a reconciliation report.
///
/// Table form is a status line followed by the changed settings; plain
/// form starts with `changed=<bool>`.
pub fn render_report(format: &OutputFormat, report: &ReconcileReport, color: bool) -> String {
    render_single(
        format,
        report,
        |r| {
            let status = status_line(r, color);
            if r.fields.is_empty() {
                status
            } else {
                format!("{status}\n{}", render_table(&setting_rows(&r.fields)))
            }
        },
        |r| {
            let mut lines = vec![format!("changed={}", r.changed)];
            lines.extend(plain_lines(&r.fields));
            lines.join("\n")
        },
    )
}

fn status_line(report: &ReconcileReport, color: bool) -> String {
    let text = match (report.changed, report.dry_run) {
        (false, _) => "No changes: device already matches desired state",
        (true, true) => "Would change (check mode, nothing applied):",
        (true, false) => "Changed:",
    };
    match (color, report.changed) {
        (false, _) => text.to_owned(),
        (true, true) => text.yellow().bold().to_string(),
        (true, false) => text.green().to_string(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("serialization should not fail")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}
