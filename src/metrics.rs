use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const SUCCESS_EQUIPMENT_STATUS_COUNTER: &str = "eir_success_equipment_status_total";
pub const FAIL_EQUIPMENT_STATUS_COUNTER: &str = "eir_fail_equipment_status_total";

pub const SEVERITY_ERROR: &str = "error";
pub const SEVERITY_WARN: &str = "warn";

pub const CAUSE_PEI_MISSING: &str = "pei missing";
pub const CAUSE_PEI_NOT_FOUND: &str = "pei not found";
pub const CAUSE_DB_SYSTEM_FAILURE: &str = "system failure";
pub const CAUSE_DB_UNSPECIFIED: &str = "unspecified";

/// Installs the Prometheus recorder; the handle renders `/metrics`.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

pub fn incr_equipment_status_success() {
    counter!(SUCCESS_EQUIPMENT_STATUS_COUNTER).increment(1);
}

pub fn incr_equipment_status_fail(severity: &'static str, cause: &'static str) {
    counter!(
        FAIL_EQUIPMENT_STATUS_COUNTER,
        "status" => severity,
        "type" => cause,
    )
    .increment(1);
}
