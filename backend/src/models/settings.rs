//! The singleton system settings record.

use serde::{Deserialize, Serialize};

use super::record::RecordId;

/// Fixed key of the only settings record.
pub const SETTINGS_KEY: &str = "global";

pub fn settings_id() -> RecordId {
    RecordId::new(SETTINGS_KEY)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    #[serde(default)]
    pub central_phone: String,
    #[serde(default)]
    pub use_central_phone: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_central_phone: Option<bool>,
}

impl SettingsUpdate {
    pub fn normalized(self) -> Self {
        Self {
            central_phone: self.central_phone.map(|p| p.trim().to_string()),
            ..self
        }
    }
}
