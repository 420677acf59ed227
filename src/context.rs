use std::net::IpAddr;
use std::sync::RwLock;

use crate::config::Config;
use crate::types::{IpEndPoint, NF_TYPE_5G_EIR};

/// Identity of this EIR instance.
///
/// Everything except `oauth2_required` is written once here, before any
/// other task exists, and read-only afterwards.
pub struct EirContext {
    pub nf_instance_id: String,
    pub nf_type: &'static str,
    pub register_ip: IpAddr,
    pub binding_ip: IpAddr,
    pub sbi_port: u16,
    pub scheme: String,
    pub nrf_uri: String,
    pub nrf_cert_pem: Option<String>,
    oauth2_required: RwLock<bool>,
}

impl EirContext {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let binding_ip: IpAddr = config.binding_ip.parse()?;
        let register_ip: IpAddr = config.register_ip.parse()?;

        Ok(Self {
            nf_instance_id: config.nf_instance_id.clone(),
            nf_type: NF_TYPE_5G_EIR,
            register_ip,
            binding_ip,
            sbi_port: config.port,
            scheme: config.scheme.clone(),
            nrf_uri: config.nrf_uri.clone(),
            nrf_cert_pem: config.nrf_cert_pem.clone(),
            oauth2_required: RwLock::new(false),
        })
    }

    /// Whether the NRF told us peers must present bearer tokens.
    /// Read on the per-request path, written only from the registration
    /// response handler.
    pub fn oauth2_required(&self) -> bool {
        *self.oauth2_required.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_oauth2_required(&self, required: bool) {
        *self
            .oauth2_required
            .write()
            .unwrap_or_else(|e| e.into_inner()) = required;
    }

    /// URI peers reach this NF at, as advertised in the profile.
    pub fn sbi_uri(&self) -> String {
        match self.register_ip {
            IpAddr::V4(ip) => format!("{}://{}:{}", self.scheme, ip, self.sbi_port),
            IpAddr::V6(ip) => format!("{}://[{}]:{}", self.scheme, ip, self.sbi_port),
        }
    }

    pub fn ip_end_points(&self) -> Vec<IpEndPoint> {
        let (ipv4_address, ipv6_address) = match self.register_ip {
            IpAddr::V4(ip) => (Some(ip.to_string()), None),
            IpAddr::V6(ip) => (None, Some(ip.to_string())),
        };
        vec![IpEndPoint {
            ipv4_address,
            ipv6_address,
            transport: "TCP".to_string(),
            port: self.sbi_port,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsConfig;

    fn test_config() -> Config {
        Config {
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
        }
    }

    #[test]
    fn builds_ipv4_identity() {
        let ctx = EirContext::from_config(&test_config()).unwrap();
        assert_eq!(ctx.nf_type, "5G_EIR");
        assert_eq!(ctx.sbi_uri(), "http://127.0.0.7:8000");
        let endpoints = ctx.ip_end_points();
        assert_eq!(endpoints[0].ipv4_address.as_deref(), Some("127.0.0.7"));
        assert!(endpoints[0].ipv6_address.is_none());
    }

    #[test]
    fn builds_ipv6_identity() {
        let mut config = test_config();
        config.binding_ip = "2001:db8::1:0:0:19".to_string();
        config.register_ip = "2001:db8::1:0:0:19".to_string();
        let ctx = EirContext::from_config(&config).unwrap();
        assert_eq!(ctx.sbi_uri(), "http://[2001:db8::1:0:0:19]:8000");
        assert!(ctx.ip_end_points()[0].ipv6_address.is_some());
    }

    #[test]
    fn oauth2_flag_starts_unset_and_is_mutable() {
        let ctx = EirContext::from_config(&test_config()).unwrap();
        assert!(!ctx.oauth2_required());
        ctx.set_oauth2_required(true);
        assert!(ctx.oauth2_required());
    }

    #[test]
    fn rejects_invalid_binding_ip() {
        let mut config = test_config();
        config.binding_ip = "not-an-ip".to_string();
        assert!(EirContext::from_config(&config).is_err());
    }
}
