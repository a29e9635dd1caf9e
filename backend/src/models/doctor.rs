//! Doctors listed in the public directory.

use serde::{Deserialize, Serialize};

use super::common::{require_non_blank, require_non_blank_opt, trimmed, ValidationError};
use super::record::{Collection, Record, RecordId};
use super::settings::SystemSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: RecordId,
    pub name: String,
    pub specialist: String,
    pub hospital: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Route calls through the central contact number instead of `phone`.
    #[serde(default)]
    pub use_central_contact: bool,
}

impl Record for Doctor {
    const COLLECTION: Collection = Collection::Doctors;
    const LABEL: &'static str = "Doctor";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Doctor {
    /// Number the public should dial for this doctor.
    pub fn contact_phone<'a>(&'a self, settings: &'a SystemSettings) -> &'a str {
        let central = settings.central_phone.trim();
        if self.use_central_contact && !central.is_empty() {
            central
        } else {
            &self.phone
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: String,
    pub specialist: String,
    pub hospital: String,
    pub phone: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub use_central_contact: bool,
}

impl NewDoctor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("specialist", &self.specialist)?;
        require_non_blank("hospital", &self.hospital)?;
        require_non_blank("phone", &self.phone)
    }

    pub fn into_doctor(self, id: RecordId) -> Doctor {
        Doctor {
            id,
            name: self.name.trim().to_string(),
            specialist: self.specialist.trim().to_string(),
            hospital: self.hospital.trim().to_string(),
            phone: self.phone.trim().to_string(),
            image: self.image.filter(|url| !url.trim().is_empty()),
            use_central_contact: self.use_central_contact,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_central_contact: Option<bool>,
}

impl DoctorUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank_opt("name", self.name.as_ref())?;
        require_non_blank_opt("specialist", self.specialist.as_ref())?;
        require_non_blank_opt("hospital", self.hospital.as_ref())?;
        require_non_blank_opt("phone", self.phone.as_ref())
    }

    pub fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            specialist: trimmed(self.specialist),
            hospital: trimmed(self.hospital),
            phone: trimmed(self.phone),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(use_central_contact: bool) -> Doctor {
        Doctor {
            id: RecordId::new("doc-1"),
            name: "Dr. Sarah Ahmed".into(),
            specialist: "Cardiologist".into(),
            hospital: "Dhaka Medical College".into(),
            phone: "+880 1711-000000".into(),
            image: None,
            use_central_contact,
        }
    }

    #[test]
    fn test_contact_phone_uses_central_number_when_opted_in() {
        let settings = SystemSettings {
            central_phone: "10666".into(),
            use_central_phone: true,
        };
        assert_eq!(doctor(true).contact_phone(&settings), "10666");
        assert_eq!(doctor(false).contact_phone(&settings), "+880 1711-000000");
    }

    #[test]
    fn test_contact_phone_falls_back_when_central_blank() {
        let settings = SystemSettings::default();
        assert_eq!(doctor(true).contact_phone(&settings), "+880 1711-000000");
    }

    #[test]
    fn test_new_doctor_requires_specialist() {
        let form = NewDoctor {
            name: "Dr. X".into(),
            specialist: "".into(),
            hospital: "Square Hospital".into(),
            phone: "123".into(),
            image: None,
            use_central_contact: false,
        };
        assert_eq!(form.validate().unwrap_err().field, "specialist");
    }
}
