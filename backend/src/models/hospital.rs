//! Hospitals listed in the public directory.

use serde::{Deserialize, Serialize};

use super::common::{require_non_blank, require_non_blank_opt, trimmed, ValidationError};
use super::record::{Collection, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl Record for Hospital {
    const COLLECTION: Collection = Collection::Hospitals;
    const LABEL: &'static str = "Hospital";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Trim service tags and drop blank ones, keeping their order.
pub fn clean_services(services: Vec<String>) -> Vec<String> {
    services
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHospital {
    pub name: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl NewHospital {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("address", &self.address)?;
        require_non_blank("phone", &self.phone)
    }

    pub fn into_hospital(self, id: RecordId) -> Hospital {
        Hospital {
            id,
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: self.phone.trim().to_string(),
            image: self.image.filter(|url| !url.trim().is_empty()),
            services: clean_services(self.services),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
}

impl HospitalUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank_opt("name", self.name.as_ref())?;
        require_non_blank_opt("address", self.address.as_ref())?;
        require_non_blank_opt("phone", self.phone.as_ref())
    }

    pub fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            address: trimmed(self.address),
            phone: trimmed(self.phone),
            services: self.services.map(clean_services),
            ..self
        }
    }
}
