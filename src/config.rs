use std::env;

use crate::types::EquipmentStatus;

pub const EIR_DEFAULT_BINDING_IP: &str = "127.0.0.7";
pub const EIR_DEFAULT_PORT: u16 = 8000;
pub const EIR_DEFAULT_NRF_URI: &str = "http://127.0.0.10:8000";
pub const EIR_DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";
pub const EIR_DEFAULT_MONGODB_NAME: &str = "free5gc";

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub binding_ip: String,
    pub register_ip: String,
    pub port: u16,
    pub scheme: String,
    pub mongodb_uri: String,
    pub mongodb_name: String,
    pub nrf_uri: String,
    pub nrf_cert_pem: Option<String>,
    pub nf_instance_id: String,
    pub default_status: Option<EquipmentStatus>,
    pub tls: TlsConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let binding_ip = env::var("EIR_BINDING_IP")
            .unwrap_or_else(|_| EIR_DEFAULT_BINDING_IP.to_string());

        // An NF behind NAT registers a different address than it binds.
        let register_ip = env::var("EIR_REGISTER_IP")
            .unwrap_or_else(|_| binding_ip.clone());

        let port = env::var("EIR_PORT")
            .unwrap_or_else(|_| EIR_DEFAULT_PORT.to_string())
            .parse()?;

        let scheme = env::var("EIR_SCHEME")
            .unwrap_or_else(|_| "http".to_string());
        parse_scheme(&scheme)?;

        let mongodb_uri = env::var("MONGODB_URI")
            .unwrap_or_else(|_| EIR_DEFAULT_MONGODB_URI.to_string());

        let mongodb_name = env::var("MONGODB_NAME")
            .unwrap_or_else(|_| EIR_DEFAULT_MONGODB_NAME.to_string());

        let nrf_uri = env::var("NRF_URI")
            .unwrap_or_else(|_| EIR_DEFAULT_NRF_URI.to_string());

        let nrf_cert_pem = env::var("NRF_CERT_PEM").ok();

        let nf_instance_id = env::var("NF_INSTANCE_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let default_status = match env::var("EIR_DEFAULT_STATUS") {
            Ok(value) => Some(parse_default_status(&value)?),
            Err(_) => None,
        };

        let tls = TlsConfig {
            cert_path: env::var("TLS_CERT_PATH").ok(),
            key_path: env::var("TLS_KEY_PATH").ok(),
        };

        Ok(Self {
            binding_ip,
            register_ip,
            port,
            scheme,
            mongodb_uri,
            mongodb_name,
            nrf_uri,
            nrf_cert_pem,
            nf_instance_id,
            default_status,
            tls,
        })
    }
}

fn parse_scheme(scheme: &str) -> anyhow::Result<()> {
    match scheme {
        "http" | "https" => Ok(()),
        other => Err(anyhow::anyhow!("invalid SBI scheme: {other}")),
    }
}

// The original configuration only admits WHITELISTED or BLACKLISTED as a
// fallback; a GREYLISTED default would silently degrade every unknown device.
fn parse_default_status(value: &str) -> anyhow::Result<EquipmentStatus> {
    match value {
        "WHITELISTED" => Ok(EquipmentStatus::Whitelisted),
        "BLACKLISTED" => Ok(EquipmentStatus::Blacklisted),
        other => Err(anyhow::anyhow!(
            "invalid EIR_DEFAULT_STATUS: {other} (expected WHITELISTED or BLACKLISTED)"
        )),
    }
}
