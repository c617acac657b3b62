// ── Reconciler ──
//
// One pass: INIT (build want) -> READ (build have) -> DECIDE (diff) ->
// APPLY or NOOP -> DONE (report). Steps are awaited strictly in order and
// any failure ends the pass; there is no retry and no rollback.

use serde::Serialize;
use strum::Display;
use tracing::{debug, info};

use crate::error::{CoreError, DeviceOperation};
use crate::field::FieldTable;
use crate::gateway::DeviceGateway;
use crate::params::{ParameterSet, RawInput, ReportMap};

/// Whether a pass may write to the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    #[default]
    Apply,
    /// Compute and report changes without writing (check mode).
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
enum Phase {
    Init,
    Read,
    Decide,
    Apply,
    Noop,
    Done,
}

/// Outcome of one pass.
///
/// Serializes flat: `{"changed": true, "port": 2222}`. `dry_run` appears
/// only when set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    #[serde(flatten)]
    pub fields: ReportMap,
}

/// Drives reconciliation passes against one gateway.
pub struct Reconciler<'t, G> {
    table: &'t FieldTable,
    gateway: G,
}

impl<'t, G: DeviceGateway> Reconciler<'t, G> {
    pub fn new(table: &'t FieldTable, gateway: G) -> Self {
        Self { table, gateway }
    }

    /// Read the device and normalize its reply.
    pub async fn current_state(&self) -> Result<ParameterSet<'t>, CoreError> {
        let raw = self
            .gateway
            .read_current()
            .await
            .map_err(|e| CoreError::device(DeviceOperation::Read, e))?;
        ParameterSet::from_device_state(self.table, &raw)
    }

    /// Run one pass for `raw` (internal-name keyed desired state).
    pub async fn reconcile(
        &self,
        raw: &RawInput,
        mode: ReconcileMode,
    ) -> Result<ReconcileReport, CoreError> {
        debug!(phase = %Phase::Init, fields = raw.len(), "building desired state");
        let want = ParameterSet::from_user_input(self.table, raw)?;

        debug!(phase = %Phase::Read, "reading current state");
        let have = self.current_state().await?;

        debug!(phase = %Phase::Decide, "computing changes");
        let changes = want.changed_fields(&have);

        if changes.is_empty() {
            debug!(phase = %Phase::Noop, "device already matches desired state");
        } else if mode == ReconcileMode::DryRun {
            info!(changes = changes.len(), "check mode, not applying changes");
        } else {
            let params = changes.to_wire_params();
            if params.is_empty() {
                debug!(phase = %Phase::Apply, "no transmissible changes, skipping write");
            } else {
                debug!(phase = %Phase::Apply, attributes = params.len(), "applying changes");
                self.gateway
                    .apply_changes(&params)
                    .await
                    .map_err(|e| CoreError::device(DeviceOperation::Apply, e))?;
                for (id, value) in changes.iter() {
                    info!(field = %id, value = %value, "applied");
                }
            }
        }

        let report = ReconcileReport {
            changed: !changes.is_empty(),
            dry_run: mode == ReconcileMode::DryRun,
            fields: changes.to_report_map(),
        };
        debug!(phase = %Phase::Done, changed = report.changed, "pass complete");
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use sshdctl_api::WireMap;

    use super::*;
    use crate::field::FieldId;
    use crate::params::FieldValue;

    // ── Recording gateway ───────────────────────────────────────────

    #[derive(Default)]
    struct DeviceState {
        settings: WireMap,
        reads: usize,
        writes: Vec<WireMap>,
        fail_read: bool,
        fail_write: bool,
    }

    #[derive(Clone, Default)]
    struct RecordingGateway {
        state: Arc<Mutex<DeviceState>>,
    }

    impl RecordingGateway {
        fn with_settings(settings: Value) -> Self {
            let gateway = Self::default();
            gateway.state.lock().unwrap().settings = object(settings);
            gateway
        }

        fn writes(&self) -> Vec<WireMap> {
            self.state.lock().unwrap().writes.clone()
        }

        fn reads(&self) -> usize {
            self.state.lock().unwrap().reads
        }
    }

    fn unavailable() -> sshdctl_api::Error {
        sshdctl_api::Error::Api {
            status: 503,
            message: "service unavailable".into(),
        }
    }

    impl DeviceGateway for RecordingGateway {
        async fn read_current(&self) -> Result<WireMap, sshdctl_api::Error> {
            let mut state = self.state.lock().unwrap();
            state.reads += 1;
            if state.fail_read {
                return Err(unavailable());
            }
            Ok(state.settings.clone())
        }

        async fn apply_changes(&self, params: &WireMap) -> Result<(), sshdctl_api::Error> {
            let mut state = self.state.lock().unwrap();
            if state.fail_write {
                return Err(unavailable());
            }
            state.writes.push(params.clone());
            for (key, value) in params {
                state.settings.insert(key.clone(), value.clone());
            }
            Ok(())
        }
    }

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn baseline() -> Value {
        json!({
            "kind": "tm:sys:sshd:sshdstate",
            "allow": ["all"],
            "banner": "disabled",
            "inactivityTimeout": 0,
            "logLevel": "info",
            "login": "enabled",
            "port": 22
        })
    }

    fn reconciler(gateway: &RecordingGateway) -> Reconciler<'static, RecordingGateway> {
        Reconciler::new(FieldTable::sshd(), gateway.clone())
    }

    // ── Properties ──────────────────────────────────────────────────

    #[tokio::test]
    async fn port_change_writes_only_the_port() {
        let gateway = RecordingGateway::with_settings(json!({
            "port": 22, "login": "enabled", "allow": ["all"]
        }));

        let report = reconciler(&gateway)
            .reconcile(&object(json!({ "port": 2222 })), ReconcileMode::Apply)
            .await
            .unwrap();

        assert_eq!(serde_json::to_value(&report).unwrap(), json!({ "changed": true, "port": 2222 }));
        assert_eq!(gateway.writes(), vec![object(json!({ "port": 2222 }))]);
    }

    #[tokio::test]
    async fn second_pass_is_a_noop() {
        let gateway = RecordingGateway::with_settings(baseline());
        let reconciler = reconciler(&gateway);
        let want = object(json!({ "port": 2222, "allow": ["10.0.0.1", "10.0.0.2"] }));

        let first = reconciler.reconcile(&want, ReconcileMode::Apply).await.unwrap();
        let second = reconciler.reconcile(&want, ReconcileMode::Apply).await.unwrap();

        assert!(first.changed);
        assert_eq!(first.fields.len(), 2);
        assert!(!second.changed);
        assert!(second.fields.is_empty());
        assert_eq!(gateway.writes().len(), 1);
    }

    #[tokio::test]
    async fn matching_state_skips_the_write() {
        let gateway = RecordingGateway::with_settings(baseline());

        let report = reconciler(&gateway)
            .reconcile(
                &object(json!({ "port": "22", "login": "enabled", "allow": ["all", "all"] })),
                ReconcileMode::Apply,
            )
            .await
            .unwrap();

        assert_eq!(serde_json::to_value(&report).unwrap(), json!({ "changed": false }));
        assert!(gateway.writes().is_empty());
        assert_eq!(gateway.reads(), 1);
    }

    #[tokio::test]
    async fn diff_never_includes_unrequested_or_equal_fields() {
        let gateway = RecordingGateway::with_settings(baseline());

        let report = reconciler(&gateway)
            .reconcile(
                &object(json!({ "log_level": "info", "banner": "enabled" })),
                ReconcileMode::Apply,
            )
            .await
            .unwrap();

        assert_eq!(
            report.fields.keys().copied().collect::<Vec<_>>(),
            vec![FieldId::Banner]
        );
        assert_eq!(gateway.writes(), vec![object(json!({ "banner": "enabled" }))]);
    }

    #[tokio::test]
    async fn check_mode_reports_without_writing() {
        let want = object(json!({ "port": 2200, "log_level": "verbose" }));

        let dry_gateway = RecordingGateway::with_settings(baseline());
        let dry = reconciler(&dry_gateway)
            .reconcile(&want, ReconcileMode::DryRun)
            .await
            .unwrap();

        let live_gateway = RecordingGateway::with_settings(baseline());
        let live = reconciler(&live_gateway)
            .reconcile(&want, ReconcileMode::Apply)
            .await
            .unwrap();

        assert!(dry_gateway.writes().is_empty());
        assert_eq!(dry.changed, live.changed);
        assert_eq!(dry.fields, live.fields);
        assert!(dry.dry_run);
        assert_eq!(
            serde_json::to_value(&dry).unwrap(),
            json!({ "changed": true, "dry_run": true, "log_level": "verbose", "port": 2200 })
        );
    }

    #[tokio::test]
    async fn new_banner_text_is_reported_verbatim() {
        let gateway = RecordingGateway::with_settings(baseline());
        let text = "Authorized access only.\n  Disconnect now if you are not.\n";

        let report = reconciler(&gateway)
            .reconcile(&object(json!({ "banner_text": text })), ReconcileMode::Apply)
            .await
            .unwrap();

        assert_eq!(report.fields.get(&FieldId::BannerText), Some(&FieldValue::Text(text.into())));
        assert_eq!(gateway.writes(), vec![object(json!({ "bannerText": text }))]);
    }

    #[tokio::test]
    async fn empty_input_reads_but_never_writes() {
        let gateway = RecordingGateway::with_settings(baseline());

        let report = reconciler(&gateway)
            .reconcile(&serde_json::Map::new(), ReconcileMode::Apply)
            .await
            .unwrap();

        assert!(!report.changed);
        assert_eq!(gateway.reads(), 1);
        assert!(gateway.writes().is_empty());
    }

    // ── Failures ────────────────────────────────────────────────────

    #[tokio::test]
    async fn invalid_input_fails_before_reading() {
        let gateway = RecordingGateway::with_settings(baseline());

        let err = reconciler(&gateway)
            .reconcile(&object(json!({ "port": "twenty-two" })), ReconcileMode::Apply)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(gateway.reads(), 0);
    }

    #[tokio::test]
    async fn read_failure_is_a_device_error() {
        let gateway = RecordingGateway::with_settings(baseline());
        gateway.state.lock().unwrap().fail_read = true;

        let err = reconciler(&gateway)
            .reconcile(&object(json!({ "port": 2222 })), ReconcileMode::Apply)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Device {
                operation: DeviceOperation::Read,
                ..
            }
        ));
        assert!(gateway.writes().is_empty());
    }

    #[tokio::test]
    async fn write_failure_is_a_device_error() {
        let gateway = RecordingGateway::with_settings(baseline());
        gateway.state.lock().unwrap().fail_write = true;

        let err = reconciler(&gateway)
            .reconcile(&object(json!({ "port": 2222 })), ReconcileMode::Apply)
            .await
            .unwrap_err();

        match err {
            CoreError::Device { operation, source } => {
                assert_eq!(operation, DeviceOperation::Apply);
                assert_eq!(source.status(), Some(503));
            }
            other => panic!("expected Device error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn current_state_ignores_bookkeeping_keys() {
        let gateway = RecordingGateway::with_settings(baseline());

        let have = reconciler(&gateway).current_state().await.unwrap();

        assert_eq!(have.len(), 6);
        assert_eq!(have.get(FieldId::Port), Some(&FieldValue::Integer(22)));
    }
}
