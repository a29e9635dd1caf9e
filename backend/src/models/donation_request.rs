//! Requests for blood submitted by the public.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::approval::{Approvable, ApprovalState};
use super::common::{require_non_blank, require_non_blank_opt, trimmed, ValidationError};
use super::record::{Collection, Record, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequest {
    pub id: RecordId,
    pub full_name: String,
    pub mobile_number: String,
    pub description: String,
    #[serde(default)]
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Record for DonationRequest {
    const COLLECTION: Collection = Collection::DonationRequests;
    const LABEL: &'static str = "Donation request";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Approvable for DonationRequest {
    fn approval(&self) -> ApprovalState {
        ApprovalState::from_flag(self.is_approved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonationRequest {
    pub full_name: String,
    pub mobile_number: String,
    pub description: String,
}

impl NewDonationRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank("fullName", &self.full_name)?;
        require_non_blank("mobileNumber", &self.mobile_number)?;
        require_non_blank("description", &self.description)
    }

    pub fn into_request(self, id: RecordId, created_at: DateTime<Utc>) -> DonationRequest {
        DonationRequest {
            id,
            full_name: self.full_name.trim().to_string(),
            mobile_number: self.mobile_number.trim().to_string(),
            description: self.description.trim().to_string(),
            is_approved: false,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationRequestUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_approved: Option<bool>,
}

impl DonationRequestUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_blank_opt("fullName", self.full_name.as_ref())?;
        require_non_blank_opt("mobileNumber", self.mobile_number.as_ref())?;
        require_non_blank_opt("description", self.description.as_ref())
    }

    pub fn normalized(self) -> Self {
        Self {
            full_name: trimmed(self.full_name),
            mobile_number: trimmed(self.mobile_number),
            description: trimmed(self.description),
            ..self
        }
    }
}

/// Which side of the approval gate to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    #[default]
    Pending,
    Approved,
}

impl QueueStatus {
    pub fn admits(self, state: ApprovalState) -> bool {
        match self {
            QueueStatus::Pending => state == ApprovalState::Pending,
            QueueStatus::Approved => state == ApprovalState::Approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_starts_pending() {
        let request = NewDonationRequest {
            full_name: "Karim".into(),
            mobile_number: " 01900000000 ".into(),
            description: "Need 2 bags of B+ at DMCH".into(),
        }
        .into_request(RecordId::new("r1"), Utc::now());
        assert!(!request.is_approved);
        assert_eq!(request.mobile_number, "01900000000");
    }

    #[test]
    fn test_queue_status_is_exclusive() {
        for state in [ApprovalState::Pending, ApprovalState::Approved] {
            let hits = [QueueStatus::Pending, QueueStatus::Approved]
                .iter()
                .filter(|q| q.admits(state))
                .count();
            assert_eq!(hits, 1);
        }
    }
}
