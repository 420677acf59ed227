use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::resolver::{ResolveError, StatusQuery};
use crate::types::{AppState, EquipmentStatusResponse, ProblemDetails};

const TITLE: &str = "Equipment identity check failed";

#[derive(Debug, Deserialize)]
pub struct EquipmentStatusParams {
    pub pei: Option<String>,
    pub supi: Option<String>,
    pub gpsi: Option<String>,
}

pub async fn equipment_status(
    State(state): State<AppState>,
    Query(params): Query<EquipmentStatusParams>,
) -> Response {
    let query = StatusQuery {
        pei: params.pei.unwrap_or_default(),
        supi: params.supi,
        gpsi: params.gpsi,
    };

    match state.resolver.resolve(&query).await {
        Ok(resolution) => (
            StatusCode::OK,
            Json(EquipmentStatusResponse {
                status: resolution.status,
            }),
        )
            .into_response(),
        Err(err) => problem_from(err).into_response(),
    }
}

fn problem_from(err: ResolveError) -> ProblemDetails {
    let cause = err.cause();
    match err {
        ResolveError::MissingPei => {
            ProblemDetails::new(400, TITLE, "The PEI is missing")
                .with_cause(cause)
                .with_invalid_param("pei", "The PEI is missing")
        }
        ResolveError::EquipmentUnknown => {
            ProblemDetails::new(404, TITLE, "The equipment status wasn't found")
                .with_cause(cause)
        }
        ResolveError::SystemFailure(detail) | ResolveError::Unspecified(detail) => {
            ProblemDetails::new(500, TITLE, &detail).with_cause(cause)
        }
    }
}
