//! Blood donors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::approval::{Approvable, ApprovalState};
use super::common::{
    optional_date, patch_date, require_non_blank, require_non_blank_opt, trimmed, BloodGroup,
    Gender, ValidationError,
};
use super::record::{Collection, Record, RecordId};

pub const MIN_DONOR_AGE: u32 = 18;
pub const MAX_DONOR_AGE: u32 = 65;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: RecordId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    pub blood_group: BloodGroup,
    pub phone: String,
    pub address: String,
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub last_donation_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_available_for_emergency: bool,
    #[serde(default)]
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for Donor {
    const COLLECTION: Collection = Collection::Donors;
    const LABEL: &'static str = "Donor";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Approvable for Donor {
    fn approval(&self) -> ApprovalState {
        ApprovalState::from_flag(self.is_approved)
    }
}

/// Public registration form. Registrations always start pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonor {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    pub blood_group: BloodGroup,
    pub phone: String,
    pub address: String,
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub last_donation_date: Option<NaiveDate>,
    #[serde(default = "default_available")]
    pub is_available_for_emergency: bool,
}

fn default_available() -> bool {
    true
}

fn check_age(age: u32) -> Result<(), ValidationError> {
    if !(MIN_DONOR_AGE..=MAX_DONOR_AGE).contains(&age) {
        return Err(ValidationError::new(
            "age",
            format!("must be between {} and {}", MIN_DONOR_AGE, MAX_DONOR_AGE),
        ));
    }
    Ok(())
}

impl NewDonor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("phone", &self.phone)?;
        require_non_blank("address", &self.address)?;
        check_age(self.age)
    }

    pub fn into_donor(self, id: RecordId, created_at: DateTime<Utc>) -> Donor {
        Donor {
            id,
            name: self.name.trim().to_string(),
            age: self.age,
            gender: self.gender,
            blood_group: self.blood_group,
            phone: self.phone.trim().to_string(),
            address: self.address.trim().to_string(),
            last_donation_date: self.last_donation_date,
            is_available_for_emergency: self.is_available_for_emergency,
            is_approved: false,
            created_at,
        }
    }
}

/// Admin edit of a donor. Only these keys ever reach the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(
        default,
        deserialize_with = "patch_date::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_donation_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available_for_emergency: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
}

impl DonorUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank_opt("name", self.name.as_ref())?;
        require_non_blank_opt("phone", self.phone.as_ref())?;
        require_non_blank_opt("address", self.address.as_ref())?;
        if let Some(age) = self.age {
            check_age(age)?;
        }
        Ok(())
    }

    /// Trim text fields before they are merged into the stored record.
    pub fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            phone: trimmed(self.phone),
            address: trimmed(self.address),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration() -> NewDonor {
        serde_json::from_value(json!({
            "name": "  Rahim Uddin ",
            "age": 30,
            "gender": "Male",
            "bloodGroup": "O-",
            "phone": "01700000000",
            "address": "Mirpur, Dhaka",
            "lastDonationDate": ""
        }))
        .unwrap()
    }

    #[test]
    fn test_registration_starts_pending_and_available() {
        let donor = registration().into_donor(RecordId::new("d1"), Utc::now());
        assert!(!donor.is_approved);
        assert!(donor.is_available_for_emergency);
        assert_eq!(donor.name, "Rahim Uddin");
        assert_eq!(donor.last_donation_date, None);
    }

    #[test]
    fn test_registration_age_bounds() {
        let mut form = registration();
        form.age = 17;
        assert_eq!(form.validate().unwrap_err().field, "age");
        form.age = 65;
        assert!(form.validate().is_ok());
        form.age = 66;
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_registration_requires_phone() {
        let mut form = registration();
        form.phone = "   ".into();
        assert_eq!(form.validate().unwrap_err().field, "phone");
    }

    #[test]
    fn test_update_ignores_unknown_keys() {
        let update: DonorUpdate = serde_json::from_value(json!({
            "phone": "01811111111",
            "role": "superuser",
            "id": "other"
        }))
        .unwrap();
        let patch = serde_json::to_value(&update).unwrap();
        assert_eq!(patch, json!({ "phone": "01811111111" }));
    }

    #[test]
    fn test_update_can_clear_last_donation_date() {
        let update: DonorUpdate =
            serde_json::from_value(json!({ "lastDonationDate": "" })).unwrap();
        assert_eq!(update.last_donation_date, Some(None));
        let patch = serde_json::to_value(&update).unwrap();
        assert_eq!(patch, json!({ "lastDonationDate": null }));

        let untouched: DonorUpdate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.last_donation_date, None);
    }
}
