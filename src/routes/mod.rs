use axum::{routing::get, Router};

use crate::{handlers, middleware, types::AppState};

pub const EIR_EIC_URI_PREFIX: &str = "/n5g-eir-eic/v1";

pub fn create_routes(app_state: AppState) -> Router {
    let eic = Router::new()
        .route("/equipment-status", get(handlers::equipment_status))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::authorization_check,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::render_metrics))
        .nest(EIR_EIC_URI_PREFIX, eic)
        .layer(axum::middleware::from_fn(middleware::uri_length_limit))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, TlsConfig};
    use crate::context::EirContext;
    use crate::db::{DbError, EquipmentFilter, EquipmentRecord, EquipmentStore};
    use crate::resolver::EquipmentStatusResolver;
    use crate::types::EquipmentStatus;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct StubStore {
        record: Option<EquipmentRecord>,
    }

    #[async_trait]
    impl EquipmentStore for StubStore {
        async fn get(&self, _filter: &EquipmentFilter) -> Result<EquipmentRecord, DbError> {
            self.record.clone().ok_or(DbError::NotFound)
        }
    }

    fn test_state(record: Option<EquipmentRecord>) -> AppState {
        let config = Config {
            binding_ip: "127.0.0.7".to_string(),
            register_ip: "127.0.0.7".to_string(),
            port: 8000,
            scheme: "http".to_string(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_name: "free5gc".to_string(),
            nrf_uri: "http://127.0.0.10:8000".to_string(),
            nrf_cert_pem: None,
            nf_instance_id: "8bdb96a2-94a1-4b27-a73d-335f39957bf0".to_string(),
            default_status: None,
            tls: TlsConfig {
                cert_path: None,
                key_path: None,
            },
        };
        AppState {
            ctx: Arc::new(EirContext::from_config(&config).unwrap()),
            resolver: Arc::new(EquipmentStatusResolver::new(
                Arc::new(StubStore { record }),
                None,
            )),
            metrics_handle: None,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn equipment_status_returns_matched_record() {
        let app = create_routes(test_state(Some(EquipmentRecord {
            pei: "imei-012345678901234".to_string(),
            supi: None,
            gpsi: None,
            equipment_status: EquipmentStatus::Whitelisted,
        })));

        let response = app
            .oneshot(
                Request::get("/n5g-eir-eic/v1/equipment-status?pei=imei-012345678901234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "WHITELISTED");
    }

    #[tokio::test]
    async fn missing_pei_yields_mandatory_ie_missing() {
        let app = create_routes(test_state(None));

        let response = app
            .oneshot(
                Request::get("/n5g-eir-eic/v1/equipment-status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["cause"], "MANDATORY_IE_MISSING");
        assert_eq!(body["invalidParams"][0]["param"], "pei");
    }

    #[tokio::test]
    async fn unknown_equipment_yields_404() {
        let app = create_routes(test_state(None));

        let response = app
            .oneshot(
                Request::get("/n5g-eir-eic/v1/equipment-status?pei=imei-012345678901234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["cause"], "ERROR_EQUIPMENT_UNKNOWN");
    }

    #[tokio::test]
    async fn oversized_uri_is_rejected_before_the_handler() {
        // A valid PEI padded past the limit must still be rejected.
        let app = create_routes(test_state(Some(EquipmentRecord {
            pei: "imei-012345678901234".to_string(),
            supi: None,
            gpsi: None,
            equipment_status: EquipmentStatus::Whitelisted,
        })));

        let uri = format!(
            "/n5g-eir-eic/v1/equipment-status?pei=imei-012345678901234&supi={}",
            "x".repeat(1024)
        );
        let response = app
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::URI_TOO_LONG);
        let body = body_json(response).await;
        assert_eq!(body["cause"], "INCORRECT_URI_LENGTH");
    }

    #[tokio::test]
    async fn oauth2_required_refuses_requests_without_a_token() {
        let state = test_state(None);
        state.ctx.set_oauth2_required(true);
        let app = create_routes(state);

        let response = app
            .oneshot(
                Request::get("/n5g-eir-eic/v1/equipment-status?pei=imei-012345678901234")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_endpoints_respond() {
        let app = create_routes(test_state(None));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
