use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::types::EquipmentStatus;

pub const EQUIPMENT_COLLECTION: &str = "policyData.ues.eirData";

/// Equality filter for the single-document equipment lookup.
/// `supi`/`gpsi` left unset means unconstrained, not "match empty string".
#[derive(Clone, Debug, Default)]
pub struct EquipmentFilter {
    pub pei: String,
    pub supi: Option<String>,
    pub gpsi: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub pei: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpsi: Option<String>,
    pub equipment_status: EquipmentStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("equipment data not found")]
    NotFound,

    #[error("database failure: {0}")]
    SystemFailure(String),

    #[error("{0}")]
    Unspecified(String),
}

/// Narrow storage capability the resolver depends on. Anything that can
/// answer a point lookup by equality filter substitutes for MongoDB.
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    async fn get(&self, filter: &EquipmentFilter) -> Result<EquipmentRecord, DbError>;
}

pub struct MongoStore {
    collection: Collection<EquipmentRecord>,
}

impl MongoStore {
    /// Opens the connection. A failure here is fatal to startup.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(&config.mongodb_uri).await?;
        let db = client.database(&config.mongodb_name);

        tracing::info!("Connected to MongoDB [{}]", config.mongodb_name);

        Ok(Self {
            collection: db.collection(EQUIPMENT_COLLECTION),
        })
    }

    fn to_document(filter: &EquipmentFilter) -> Document {
        let mut doc = doc! { "pei": &filter.pei };
        if let Some(supi) = &filter.supi {
            doc.insert("supi", supi);
        }
        if let Some(gpsi) = &filter.gpsi {
            doc.insert("gpsi", gpsi);
        }
        doc
    }
}

#[async_trait]
impl EquipmentStore for MongoStore {
    async fn get(&self, filter: &EquipmentFilter) -> Result<EquipmentRecord, DbError> {
        // Several records may share a PEI when the query carries no
        // supi/gpsi refinement; the most recently written one wins.
        let result = self
            .collection
            .find_one(Self::to_document(filter))
            .sort(doc! { "_id": -1 })
            .await;

        match result {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(DbError::NotFound),
            Err(e) => Err(DbError::SystemFailure(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_with_pei_only_has_single_key() {
        let doc = MongoStore::to_document(&EquipmentFilter {
            pei: "imei-012345678901234".to_string(),
            supi: None,
            gpsi: None,
        });
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get_str("pei").unwrap(), "imei-012345678901234");
    }

    #[test]
    fn filter_includes_refinements_when_present() {
        let doc = MongoStore::to_document(&EquipmentFilter {
            pei: "imei-012345678901234".to_string(),
            supi: Some("imsi-208930000000001".to_string()),
            gpsi: Some("msisdn-0900000000".to_string()),
        });
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get_str("supi").unwrap(), "imsi-208930000000001");
        assert_eq!(doc.get_str("gpsi").unwrap(), "msisdn-0900000000");
    }
}
