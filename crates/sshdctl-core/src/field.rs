// ── Field table ──
//
// The closed set of SSHD attributes, their wire names, types, and the
// flags that decide which subsets take part in diffing, writing, and
// reporting. The table is built once and shared by reference.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::CoreError;

/// Values accepted by the on/off style fields.
pub const TOGGLE_VALUES: &[&str] = &["enabled", "disabled"];

/// Values accepted by `log_level`, in the daemon's own spelling.
pub const LOG_LEVELS: &[&str] = &[
    "debug", "debug1", "debug2", "debug3", "error", "fatal", "info", "quiet", "verbose",
];

/// Internal identifier of every known SSHD attribute.
///
/// Declaration order is table order; it drives report and payload order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldId {
    Allow,
    Banner,
    BannerText,
    InactivityTimeout,
    LogLevel,
    Login,
    Port,
}

/// Value type of a field, with the constraints checked at input acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, compared and sent verbatim.
    Text,
    /// One of a fixed set of strings.
    Choice(&'static [&'static str]),
    /// Integer within an inclusive range.
    Integer { min: i64, max: i64 },
    /// Unordered set of string tokens; duplicates collapse.
    StringSet,
}

/// Declaration of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub id: FieldId,
    /// Name used by the appliance's REST representation.
    pub wire_name: &'static str,
    pub kind: FieldKind,
    /// Participates in `want`/`have` diffing.
    pub comparable: bool,
    /// Sent in the write payload.
    pub transmissible: bool,
    /// Included in the result report.
    pub returnable: bool,
}

impl FieldSpec {
    /// A field that is comparable, transmissible, and returnable.
    pub const fn managed(id: FieldId, wire_name: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            wire_name,
            kind,
            comparable: true,
            transmissible: true,
            returnable: true,
        }
    }

    /// The internal name (`banner_text`, ...).
    pub fn name(&self) -> &'static str {
        self.id.into()
    }

    /// Allowed values for choice fields; empty for every other kind.
    pub fn allowed_values(&self) -> &'static [&'static str] {
        match self.kind {
            FieldKind::Choice(values) => values,
            _ => &[],
        }
    }
}

static SSHD_TABLE: LazyLock<FieldTable> = LazyLock::new(|| {
    FieldTable::new(vec![
        FieldSpec::managed(FieldId::Allow, "allow", FieldKind::StringSet),
        FieldSpec::managed(FieldId::Banner, "banner", FieldKind::Choice(TOGGLE_VALUES)),
        FieldSpec::managed(FieldId::BannerText, "bannerText", FieldKind::Text),
        FieldSpec::managed(
            FieldId::InactivityTimeout,
            "inactivityTimeout",
            FieldKind::Integer {
                min: 0,
                max: i64::from(u32::MAX),
            },
        ),
        FieldSpec::managed(FieldId::LogLevel, "logLevel", FieldKind::Choice(LOG_LEVELS)),
        FieldSpec::managed(FieldId::Login, "login", FieldKind::Choice(TOGGLE_VALUES)),
        FieldSpec::managed(
            FieldId::Port,
            "port",
            FieldKind::Integer {
                min: 1,
                max: i64::from(u16::MAX),
            },
        ),
    ])
    .expect("built-in sshd field table is consistent")
});

/// Immutable, ordered collection of field declarations.
#[derive(Debug, Clone)]
pub struct FieldTable {
    specs: Vec<FieldSpec>,
}

impl FieldTable {
    /// Build a table, rejecting duplicate ids and empty or duplicate wire
    /// names so the name <-> wire-name mapping stays total and one-to-one.
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self, CoreError> {
        let mut ids = HashSet::new();
        let mut wire_names = HashSet::new();

        for spec in &specs {
            if !ids.insert(spec.id) {
                return Err(CoreError::Config {
                    message: format!("field '{}' declared twice", spec.id),
                });
            }
            if spec.wire_name.is_empty() {
                return Err(CoreError::Config {
                    message: format!("field '{}' has an empty wire name", spec.id),
                });
            }
            if !wire_names.insert(spec.wire_name) {
                return Err(CoreError::Config {
                    message: format!("wire name '{}' mapped twice", spec.wire_name),
                });
            }
        }

        Ok(Self { specs })
    }

    /// The SSHD field table, built on first use.
    pub fn sshd() -> &'static FieldTable {
        &SSHD_TABLE
    }

    /// All declarations, in table order.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.specs
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.id == id)
    }

    /// Look up by internal name (`inactivity_timeout`).
    pub fn by_name(&self, name: &str) -> Option<&FieldSpec> {
        let id: FieldId = name.parse().ok()?;
        self.get(id)
    }

    /// Look up by wire name (`inactivityTimeout`).
    pub fn by_wire_name(&self, wire_name: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.wire_name == wire_name)
    }

    /// Internal names, in table order (for help text and error messages).
    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(FieldSpec::name).collect()
    }
}
