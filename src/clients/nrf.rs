use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::context::EirContext;
use crate::types::{
    NfProfile, NfService, NfServiceVersion, SearchResult, SERVICE_NAME_N5G_EIR_EIC,
};

/// Fixed pause between registration attempts.
pub const REGISTER_RETRY_INTERVAL: Duration = Duration::from_secs(2);

const NF_MANAGEMENT_PATH: &str = "/nnrf-nfm/";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NfDiscoveryParams {
    pub target_nf_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_nf_type: Option<String>,
}

/// Outcome of a successful registration: where the NF instance resource
/// lives, used later for deregistration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub nrf_uri: String,
    pub nf_instance_id: String,
}

pub struct NrfClient {
    ctx: Arc<EirContext>,
    retry_interval: Duration,
    // One HTTP client per NRF base URI, built on first use and kept for
    // the process lifetime. Reads vastly outnumber inserts.
    clients: RwLock<HashMap<String, Client>>,
    registration: RwLock<Option<Registration>>,
}

impl NrfClient {
    pub fn new(ctx: Arc<EirContext>) -> Self {
        Self {
            ctx,
            retry_interval: REGISTER_RETRY_INTERVAL,
            clients: RwLock::new(HashMap::new()),
            registration: RwLock::new(None),
        }
    }

    #[cfg(test)]
    fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    fn get_client(&self, uri: &str) -> Result<Client> {
        {
            let clients = self.clients.read().unwrap_or_else(|e| e.into_inner());
            if let Some(client) = clients.get(uri) {
                return Ok(client.clone());
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut clients = self.clients.write().unwrap_or_else(|e| e.into_inner());
        Ok(clients.entry(uri.to_string()).or_insert(client).clone())
    }

    fn build_nf_profile(&self) -> NfProfile {
        let ctx = &self.ctx;
        let version = env!("CARGO_PKG_VERSION");
        let version_in_uri = format!("v{}", version.split('.').next().unwrap_or("1"));

        let (ipv4_addresses, ipv6_addresses) = if ctx.register_ip.is_ipv4() {
            (Some(vec![ctx.register_ip.to_string()]), None)
        } else {
            (None, Some(vec![ctx.register_ip.to_string()]))
        };

        NfProfile {
            nf_instance_id: ctx.nf_instance_id.clone(),
            nf_type: ctx.nf_type.to_string(),
            nf_status: "REGISTERED".to_string(),
            ipv4_addresses,
            ipv6_addresses,
            nf_services: Some(vec![NfService {
                service_instance_id: "0".to_string(),
                service_name: SERVICE_NAME_N5G_EIR_EIC.to_string(),
                versions: vec![NfServiceVersion {
                    api_full_version: version.to_string(),
                    api_version_in_uri: version_in_uri,
                }],
                scheme: ctx.scheme.clone(),
                nf_service_status: "REGISTERED".to_string(),
                api_prefix: Some(ctx.sbi_uri()),
                ip_end_points: Some(ctx.ip_end_points()),
            }]),
            custom_info: None,
        }
    }

    /// Registers this NF with the NRF, retrying on any failure until it
    /// succeeds or `cancel` fires. Returns an error only when cancelled.
    pub async fn register(
        &self,
        cancel: &CancellationToken,
        nrf_uri: &str,
    ) -> Result<Registration> {
        let client = self.get_client(nrf_uri)?;

        loop {
            if cancel.is_cancelled() {
                anyhow::bail!("registration cancelled before completion");
            }

            // The profile is rebuilt every attempt so it always reflects
            // the current identity.
            let profile = self.build_nf_profile();

            match self.try_register(&client, nrf_uri, &profile).await {
                Ok(registration) => {
                    tracing::info!(
                        nf_instance_id = %registration.nf_instance_id,
                        "Registered with NRF at {}",
                        registration.nrf_uri
                    );
                    *self
                        .registration
                        .write()
                        .unwrap_or_else(|e| e.into_inner()) = Some(registration.clone());
                    return Ok(registration);
                }
                Err(e) => {
                    tracing::error!("EIR register to NRF error [{e:#}]");
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            anyhow::bail!("registration cancelled before completion");
                        }
                        _ = tokio::time::sleep(self.retry_interval) => {}
                    }
                }
            }
        }
    }

    async fn try_register(
        &self,
        client: &Client,
        nrf_uri: &str,
        profile: &NfProfile,
    ) -> Result<Registration> {
        let url = format!(
            "{}/nnrf-nfm/v1/nf-instances/{}",
            nrf_uri, profile.nf_instance_id
        );

        let response = client
            .put(&url)
            .json(profile)
            .send()
            .await
            .context("Failed to send registration request to NRF")?;

        let status = response.status();
        if status != StatusCode::CREATED && status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("NRF registration failed with status {status}: {body}");
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let registered: NfProfile = response
            .json()
            .await
            .context("Failed to parse NRF registration response")?;

        self.apply_oauth2_setting(&registered);

        match location {
            // Created: the resource location carries the resolved NRF base
            // URI and the instance id the NRF filed us under.
            Some(location) => {
                let resolved_uri = location
                    .split(NF_MANAGEMENT_PATH)
                    .next()
                    .unwrap_or(nrf_uri)
                    .to_string();
                let nf_instance_id = location
                    .rsplit('/')
                    .next()
                    .unwrap_or(&profile.nf_instance_id)
                    .to_string();
                Ok(Registration {
                    nrf_uri: resolved_uri,
                    nf_instance_id,
                })
            }
            // Updated: an existing registration was refreshed, ids stand.
            None => Ok(Registration {
                nrf_uri: nrf_uri.to_string(),
                nf_instance_id: profile.nf_instance_id.clone(),
            }),
        }
    }

    fn apply_oauth2_setting(&self, registered: &NfProfile) {
        let Some(info) = &registered.custom_info else {
            return;
        };
        let Some(oauth2) = info.get("oauth2").and_then(|v| v.as_bool()) else {
            return;
        };

        tracing::info!("OAuth2 setting received from NRF: {oauth2}");
        self.ctx.set_oauth2_required(oauth2);

        if oauth2 && self.ctx.nrf_cert_pem.is_none() {
            tracing::warn!(
                "OAuth2 enabled but no NRF certificate configured, \
                 peer requests will fail authorization until one is provided"
            );
        }
    }

    /// Best-effort deregistration, issued once during shutdown. A no-op
    /// when registration never succeeded.
    pub async fn deregister(&self) -> Result<()> {
        let registration = self
            .registration
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        let Some(registration) = registration else {
            tracing::warn!("The EIR was never registered, nothing to deregister");
            return Ok(());
        };

        let client = self.get_client(&registration.nrf_uri)?;
        let url = format!(
            "{}/nnrf-nfm/v1/nf-instances/{}",
            registration.nrf_uri, registration.nf_instance_id
        );

        let response = client
            .delete(&url)
            .send()
            .await
            .context("Failed to send deregistration request to NRF")?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                tracing::info!(
                    "Deregistered NF instance {} from NRF",
                    registration.nf_instance_id
                );
                Ok(())
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow::anyhow!(
                    "NRF deregistration failed with status {status}: {body}"
                ))
            }
        }
    }

    /// Single-shot discovery query on behalf of this NF; errors surface
    /// directly to the caller.
    pub async fn search_instances(
        &self,
        nrf_uri: &str,
        params: &NfDiscoveryParams,
    ) -> Result<SearchResult> {
        let client = self.get_client(nrf_uri)?;
        let url = format!("{}/nnrf-disc/v1/nf-instances", nrf_uri);

        let mut request = client
            .get(&url)
            .query(&[("target-nf-type", &params.target_nf_type)]);
        if let Some(requester) = &params.requester_nf_type {
            request = request.query(&[("requester-nf-type", requester)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to send discovery request to NRF")?;

        match response.status() {
            StatusCode::OK => {
                let result: SearchResult = response
                    .json()
                    .await
                    .context("Failed to parse NRF discovery response")?;
                Ok(result)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow::anyhow!(
                    "NRF discovery failed with status {status}: {body}"
                ))
            }
        }
    }
}
