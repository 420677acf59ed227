use std::future::IntoFuture;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::clients::nrf::NrfClient;
use crate::config::Config;
use crate::context::EirContext;
use crate::db::MongoStore;
use crate::resolver::EquipmentStatusResolver;
use crate::routes;
use crate::types::AppState;

/// How long in-flight requests get to finish once shutdown starts.
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Owns startup and shutdown ordering: storage connect, NRF
/// registration, the SBI accept loop, then drain and deregister.
pub struct EirApp {
    ctx: Arc<EirContext>,
    nrf_client: Arc<NrfClient>,
    resolver: Arc<EquipmentStatusResolver>,
    metrics_handle: Option<PrometheusHandle>,
}

impl EirApp {
    /// Connects storage. Failing here aborts startup entirely; nothing
    /// is served without a database.
    pub async fn new(
        config: Config,
        metrics_handle: Option<PrometheusHandle>,
    ) -> anyhow::Result<Self> {
        let ctx = Arc::new(EirContext::from_config(&config)?);
        let store = Arc::new(MongoStore::connect(&config).await?);
        let resolver = Arc::new(EquipmentStatusResolver::new(store, config.default_status));
        let nrf_client = Arc::new(NrfClient::new(ctx.clone()));

        Ok(Self {
            ctx,
            nrf_client,
            resolver,
            metrics_handle,
        })
    }

    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        // Registration runs to completion (success or cancellation)
        // before the SBI starts accepting. A failure leaves this NF
        // invisible to peer discovery but lookups stay available.
        match self.nrf_client.register(&cancel, &self.ctx.nrf_uri).await {
            Ok(registration) => {
                tracing::info!(
                    "Registered with NRF as instance {}",
                    registration.nf_instance_id
                );
            }
            Err(e) => tracing::error!("Register to NRF failed: {e:#}"),
        }

        // A panic while serving must still reach the cleanup below; it
        // is re-surfaced as an error once deregistration ran.
        let served = AssertUnwindSafe(self.serve(cancel.clone()))
            .catch_unwind()
            .await;

        let outcome = match served {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!("SBI server failed: {e:#}");
                Err(e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("panic while serving: {message}");
                Err(anyhow::anyhow!("terminated after panic: {message}"))
            }
        };

        // Best-effort: a deregistration failure never blocks exit.
        match self.nrf_client.deregister().await {
            Ok(()) => tracing::info!("Deregistered from NRF"),
            Err(e) => tracing::error!("Deregister NF instance failed: {e:#}"),
        }

        tracing::info!("EIR terminated");
        outcome
    }

    async fn serve(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let state = AppState {
            ctx: self.ctx.clone(),
            resolver: self.resolver.clone(),
            metrics_handle: self.metrics_handle.clone(),
        };

        let app = routes::create_routes(state)
            .layer(TraceLayer::new_for_http())
            .layer(tower_http::cors::CorsLayer::permissive());

        let addr = SocketAddr::new(self.ctx.binding_ip, self.ctx.sbi_port);
        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("EIR SBI server listening on {addr}");

        let shutdown = cancel.clone();
        let graceful = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .into_future();

        tokio::select! {
            result = graceful => result?,
            _ = drain_deadline(cancel) => {
                tracing::warn!(
                    "Shutdown grace period expired, closing remaining connections"
                );
            }
        }

        tracing::info!("SBI server stopped");
        Ok(())
    }
}

async fn drain_deadline(cancel: CancellationToken) {
    cancel.cancelled().await;
    tokio::time::sleep(SHUTDOWN_GRACE_PERIOD).await;
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
