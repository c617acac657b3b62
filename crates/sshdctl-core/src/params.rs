// ── Parameter model ──
//
// `ParameterSet` is the normalized view of one side of a reconciliation:
// `want` built from caller input, `have` built from the device's reply.
// Both go through the same coercion, so comparing them is plain value
// equality. A field missing from the map is absent, which is never the
// same thing as zero, "" or an empty set.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use sshdctl_api::WireMap;

use crate::error::{CoreError, DeviceOperation};
use crate::field::{FieldId, FieldKind, FieldSpec, FieldTable};

/// Caller-supplied desired state, keyed by internal field name.
pub type RawInput = serde_json::Map<String, Value>;

/// Report payload: internal name -> value, table order, absent omitted.
pub type ReportMap = IndexMap<FieldId, FieldValue>;

// ── FieldValue ──────────────────────────────────────────────────────

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    /// Deduplicated, order-insensitive token set.
    Set(BTreeSet<String>),
}

impl FieldValue {
    /// Coerce a raw JSON value according to `kind`.
    ///
    /// `null` coerces to `None` (absent). Errors carry a short reason;
    /// the caller decides whether that is bad input or a bad device reply.
    pub fn coerce(kind: &FieldKind, raw: &Value) -> Result<Option<Self>, String> {
        if raw.is_null() {
            return Ok(None);
        }
        let value = match kind {
            FieldKind::Text | FieldKind::Choice(_) => Self::Text(scalar_text(raw)?),
            FieldKind::Integer { .. } => Self::Integer(integer(raw)?),
            FieldKind::StringSet => Self::Set(string_set(raw)?),
        };
        Ok(Some(value))
    }

    /// JSON form used on the wire (sets as sorted arrays).
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(n) => Value::from(*n),
            Self::Set(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Set(items) => {
                let joined: Vec<&str> = items.iter().map(String::as_str).collect();
                write!(f, "{}", joined.join(", "))
            }
        }
    }
}

fn scalar_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string, got {}", json_type(other))),
    }
}

fn integer(raw: &Value) -> Result<i64, String> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("expected an integer, got {n}")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("expected an integer, got '{s}'")),
        other => Err(format!("expected an integer, got {}", json_type(other))),
    }
}

fn string_set(raw: &Value) -> Result<BTreeSet<String>, String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) | Value::Null => Err(format!(
                    "list items must be strings, got {}",
                    json_type(item)
                )),
                scalar => scalar_text(scalar),
            })
            .collect(),
        // Comma-separated shorthand: "10.0.0.1, 10.0.0.2"
        Value::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()),
        other => Err(format!("expected a list, got {}", json_type(other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

// ── ParameterSet ────────────────────────────────────────────────────

/// Field -> coerced value mapping bound to a field table.
///
/// Immutable once built. Entries are kept in table order so every derived
/// map (change set, wire payload, report) iterates deterministically.
#[derive(Debug, Clone)]
pub struct ParameterSet<'t> {
    table: &'t FieldTable,
    values: IndexMap<FieldId, FieldValue>,
}

impl PartialEq for ParameterSet<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<'t> ParameterSet<'t> {
    /// A set with every field absent.
    pub fn empty(table: &'t FieldTable) -> Self {
        Self {
            table,
            values: IndexMap::new(),
        }
    }

    /// Build `want` from caller input keyed by internal name.
    ///
    /// Unknown names and values that fail coercion are validation errors.
    /// Fields not supplied (or supplied as `null`) stay absent.
    pub fn from_user_input(table: &'t FieldTable, raw: &RawInput) -> Result<Self, CoreError> {
        if let Some(unknown) = raw.keys().find(|k| table.by_name(k).is_none()) {
            return Err(CoreError::validation(
                unknown.as_str(),
                format!("unknown field (expected one of: {})", table.names().join(", ")),
            ));
        }

        Self::build(table, |spec| {
            let Some(value) = raw.get(spec.name()) else {
                return Ok(None);
            };
            FieldValue::coerce(&spec.kind, value)
                .map_err(|reason| CoreError::validation(spec.name(), reason))
        })
    }

    /// Build `have` from the device's reply keyed by wire name.
    ///
    /// Keys the table does not declare are skipped; declared fields missing
    /// from the reply stay absent. A value that cannot be coerced means the
    /// reply is malformed and is reported as a device read failure.
    pub fn from_device_state(table: &'t FieldTable, raw: &WireMap) -> Result<Self, CoreError> {
        for key in raw.keys().filter(|k| table.by_wire_name(k).is_none()) {
            trace!(key = key.as_str(), "ignoring undeclared device attribute");
        }

        Self::build(table, |spec| {
            let Some(value) = raw.get(spec.wire_name) else {
                return Ok(None);
            };
            FieldValue::coerce(&spec.kind, value).map_err(|reason| {
                CoreError::device(
                    DeviceOperation::Read,
                    sshdctl_api::Error::Deserialization {
                        message: format!("malformed '{}' in device state: {reason}", spec.wire_name),
                        body: value.to_string(),
                    },
                )
            })
        })
    }

    fn build(
        table: &'t FieldTable,
        mut value_for: impl FnMut(&FieldSpec) -> Result<Option<FieldValue>, CoreError>,
    ) -> Result<Self, CoreError> {
        let mut values = IndexMap::new();
        for spec in table.specs() {
            if let Some(value) = value_for(spec)? {
                values.insert(spec.id, value);
            }
        }
        Ok(Self { table, values })
    }

    /// The value of `id`, or `None` when absent.
    pub fn get(&self, id: FieldId) -> Option<&FieldValue> {
        self.values.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Present fields, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &FieldValue)> {
        self.values.iter().map(|(id, value)| (*id, value))
    }

    /// Fields where `self` (want) is present, comparable, and differs from
    /// `have`. Values come from `self`.
    pub fn changed_fields(&self, have: &ParameterSet<'_>) -> ParameterSet<'t> {
        let mut values = IndexMap::new();
        for spec in self.table.specs().iter().filter(|s| s.comparable) {
            let Some(want) = self.get(spec.id) else {
                continue;
            };
            if have.get(spec.id) != Some(want) {
                values.insert(spec.id, want.clone());
            }
        }
        ParameterSet {
            table: self.table,
            values,
        }
    }

    /// Write payload: wire name -> value, transmissible fields only.
    pub fn to_wire_params(&self) -> WireMap {
        self.table
            .specs()
            .iter()
            .filter(|s| s.transmissible)
            .filter_map(|s| {
                self.get(s.id)
                    .map(|value| (s.wire_name.to_owned(), value.to_json()))
            })
            .collect()
    }

    /// Report payload: internal name -> value, returnable fields only.
    pub fn to_report_map(&self) -> ReportMap {
        self.table
            .specs()
            .iter()
            .filter(|s| s.returnable)
            .filter_map(|s| self.get(s.id).map(|value| (s.id, value.clone())))
            .collect()
    }
}
