// ── Input acceptance ──
//
// Checks that run before a reconciliation pass is started: choice
// membership, integer ranges, and the shape of the `allow` list. The
// reconciler itself only coerces; it never calls into this module.

use serde_json::Value;

use crate::error::CoreError;
use crate::field::{FieldKind, FieldTable};
use crate::params::{FieldValue, RawInput};

/// Validate caller input against `table`.
///
/// Returns the first offending field. `null` values are treated as not
/// supplied and pass.
pub fn validate_input(table: &FieldTable, raw: &RawInput) -> Result<(), CoreError> {
    for (name, value) in raw {
        let Some(spec) = table.by_name(name) else {
            return Err(CoreError::validation(
                name.as_str(),
                format!("unknown field (expected one of: {})", table.names().join(", ")),
            ));
        };
        if value.is_null() {
            continue;
        }

        let coerced = FieldValue::coerce(&spec.kind, value)
            .map_err(|reason| CoreError::validation(spec.name(), reason))?;

        match (&spec.kind, coerced) {
            (FieldKind::Choice(allowed), Some(FieldValue::Text(text))) => {
                if !allowed.contains(&text.as_str()) {
                    return Err(CoreError::validation(
                        spec.name(),
                        format!("'{text}' is not one of: {}", allowed.join(", ")),
                    ));
                }
            }
            (FieldKind::Integer { min, max }, Some(FieldValue::Integer(n))) => {
                if n < *min || n > *max {
                    return Err(CoreError::validation(
                        spec.name(),
                        format!("{n} is out of range ({min}..={max})"),
                    ));
                }
            }
            (FieldKind::StringSet, Some(FieldValue::Set(items))) => {
                if items.is_empty() {
                    return Err(CoreError::validation(spec.name(), "must not be empty"));
                }
                if has_blank_entry(value) {
                    return Err(CoreError::validation(
                        spec.name(),
                        "entries must be non-empty tokens",
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn has_blank_entry(value: &Value) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|s| s.trim().is_empty())),
        _ => false,
    }
}
