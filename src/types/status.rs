use serde::{Deserialize, Serialize};

/// Equipment status as stored and as returned on the SBI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentStatus {
    Whitelisted,
    Blacklisted,
    Greylisted,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Whitelisted => "WHITELISTED",
            EquipmentStatus::Blacklisted => "BLACKLISTED",
            EquipmentStatus::Greylisted => "GREYLISTED",
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EquipmentStatusResponse {
    pub status: EquipmentStatus,
}
