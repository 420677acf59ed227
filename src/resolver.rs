use std::sync::Arc;

use crate::db::{EquipmentFilter, EquipmentStore};
use crate::metrics;
use crate::types::EquipmentStatus;

/// Equipment status query as received on the SBI. Only the PEI is
/// mandatory; SUPI and GPSI narrow the match when present.
#[derive(Clone, Debug, Default)]
pub struct StatusQuery {
    pub pei: String,
    pub supi: Option<String>,
    pub gpsi: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub status: EquipmentStatus,
    /// True when no record matched and the configured default was
    /// substituted. Still a success, but operators want to see it.
    pub fallback_used: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("the PEI is missing")]
    MissingPei,

    #[error("the equipment status wasn't found")]
    EquipmentUnknown,

    #[error("database failure: {0}")]
    SystemFailure(String),

    #[error("unspecified storage failure: {0}")]
    Unspecified(String),
}

impl ResolveError {
    pub fn cause(&self) -> &'static str {
        match self {
            ResolveError::MissingPei => "MANDATORY_IE_MISSING",
            ResolveError::EquipmentUnknown => "ERROR_EQUIPMENT_UNKNOWN",
            ResolveError::SystemFailure(_) => "SYSTEM_FAILURE",
            ResolveError::Unspecified(_) => "INSUFFICIENT_RESOURCES",
        }
    }
}

/// Resolves a status query against the equipment store, applying the
/// configured default status when nothing matches. Knows nothing about
/// HTTP; the handler layer maps `ResolveError` onto problem details.
pub struct EquipmentStatusResolver {
    store: Arc<dyn EquipmentStore>,
    default_status: Option<EquipmentStatus>,
}

impl EquipmentStatusResolver {
    pub fn new(store: Arc<dyn EquipmentStore>, default_status: Option<EquipmentStatus>) -> Self {
        Self {
            store,
            default_status,
        }
    }

    pub async fn resolve(&self, query: &StatusQuery) -> Result<Resolution, ResolveError> {
        if query.pei.is_empty() {
            metrics::incr_equipment_status_fail(
                metrics::SEVERITY_ERROR,
                metrics::CAUSE_PEI_MISSING,
            );
            return Err(ResolveError::MissingPei);
        }

        let filter = EquipmentFilter {
            pei: query.pei.clone(),
            supi: query.supi.clone().filter(|s| !s.is_empty()),
            gpsi: query.gpsi.clone().filter(|s| !s.is_empty()),
        };

        match self.store.get(&filter).await {
            Ok(record) => {
                metrics::incr_equipment_status_success();
                Ok(Resolution {
                    status: record.equipment_status,
                    fallback_used: false,
                })
            }
            Err(crate::db::DbError::NotFound) => match self.default_status {
                Some(status) => {
                    tracing::warn!(
                        pei = %query.pei,
                        "Equipment status not found, returning the default {status}"
                    );
                    metrics::incr_equipment_status_fail(
                        metrics::SEVERITY_WARN,
                        metrics::CAUSE_PEI_NOT_FOUND,
                    );
                    Ok(Resolution {
                        status,
                        fallback_used: true,
                    })
                }
                None => {
                    tracing::error!(pei = %query.pei, "Equipment status not found");
                    metrics::incr_equipment_status_fail(
                        metrics::SEVERITY_ERROR,
                        metrics::CAUSE_PEI_NOT_FOUND,
                    );
                    Err(ResolveError::EquipmentUnknown)
                }
            },
            Err(crate::db::DbError::SystemFailure(detail)) => {
                tracing::error!("The database has failed with [{detail}]");
                metrics::incr_equipment_status_fail(
                    metrics::SEVERITY_ERROR,
                    metrics::CAUSE_DB_SYSTEM_FAILURE,
                );
                Err(ResolveError::SystemFailure(detail))
            }
            Err(crate::db::DbError::Unspecified(detail)) => {
                tracing::error!("The storage reported an unspecified failure [{detail}]");
                metrics::incr_equipment_status_fail(
                    metrics::SEVERITY_ERROR,
                    metrics::CAUSE_DB_UNSPECIFIED,
                );
                Err(ResolveError::Unspecified(detail))
            }
        }
    }
}
