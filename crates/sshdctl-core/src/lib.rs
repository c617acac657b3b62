//! Reconciliation of an appliance's SSH daemon settings.
//!
//! A pass reads the device, diffs it against the desired state and writes
//! only what differs:
//!
//! - **[`FieldTable`]** declares the managed attributes once: internal
//!   name, wire name, value kind and the comparable / transmissible /
//!   returnable flags. [`FieldTable::sshd()`] is the built-in table.
//!
//! - **[`ParameterSet`]** is the normalized `want` or `have` view.
//!   [`changed_fields`](ParameterSet::changed_fields) yields the minimal
//!   change set, [`to_wire_params`](ParameterSet::to_wire_params) the write
//!   payload.
//!
//! - **[`Reconciler`]** runs read -> diff -> apply -> report against any
//!   [`DeviceGateway`]; [`ReconcileMode::DryRun`] stops before the write.
//!
//! - **[`Appliance`]** owns the HTTP session.
//!   [`Appliance::oneshot()`](Appliance::oneshot) connects, runs a closure
//!   and always tears the session down.
//!
//! Input acceptance checks (choice membership, ranges) live in
//! [`validate_input`] and are the caller's job; the reconciler only coerces.

pub mod appliance;
pub mod config;
pub mod error;
pub mod field;
pub mod gateway;
pub mod params;
pub mod reconcile;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use appliance::Appliance;
pub use config::{ApplianceConfig, AuthCredentials, TlsVerification};
pub use error::{CoreError, DeviceOperation};
pub use field::{FieldId, FieldKind, FieldSpec, FieldTable};
pub use gateway::{DeviceGateway, IControlGateway};
pub use params::{FieldValue, ParameterSet, RawInput, ReportMap};
pub use reconcile::{ReconcileMode, ReconcileReport, Reconciler};
pub use validate::validate_input;
