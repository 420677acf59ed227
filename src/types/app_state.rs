use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::context::EirContext;
use crate::resolver::EquipmentStatusResolver;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<EirContext>,
    pub resolver: Arc<EquipmentStatusResolver>,
    pub metrics_handle: Option<PrometheusHandle>,
}
