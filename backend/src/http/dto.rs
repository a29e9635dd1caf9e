//! Data Transfer Objects for the HTTP API.
//!
//! Record DTOs live in [`crate::api`]; this module holds the query strings and
//! small request/response bodies that only the HTTP layer needs.

use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::models::QueueStatus;
use crate::services::directory::{BloodGroupFilter, DirectoryFilter};

pub use crate::api::{
    DashboardStats, DoctorListing, DonationRequestExportRow, DonorExportRow, ExportSheet,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Store status: "connected", "disconnected" or "error: ..."
    pub database: String,
}

/// Confirmation body for deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `GET /donors?bloodGroup=&search=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorQuery {
    pub blood_group: Option<String>,
    pub search: Option<String>,
}

impl DonorQuery {
    pub fn filter(&self) -> Result<DirectoryFilter, AppError> {
        let group = BloodGroupFilter::parse_opt(self.blood_group.as_deref())?;
        Ok(DirectoryFilter::new(group, self.search.as_deref()))
    }
}

/// `?bloodGroup=` on the admin donor lists and export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupQuery {
    pub blood_group: Option<String>,
}

impl GroupQuery {
    pub fn group(&self) -> Result<BloodGroupFilter, AppError> {
        Ok(BloodGroupFilter::parse_opt(self.blood_group.as_deref())?)
    }
}

/// `GET /donation-requests?status=pending|approved`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueQuery {
    pub status: Option<String>,
}

impl QueueQuery {
    pub fn status(&self) -> Result<QueueStatus, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(QueueStatus::default()),
            Some(s) if s.eq_ignore_ascii_case("pending") => Ok(QueueStatus::Pending),
            Some(s) if s.eq_ignore_ascii_case("approved") => Ok(QueueStatus::Approved),
            Some(other) => Err(AppError::BadRequest(format!(
                "status must be 'pending' or 'approved', got '{}'",
                other
            ))),
        }
    }
}

/// `PUT /donors/{id}/availability`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub is_available_for_emergency: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BloodGroup;

    #[test]
    fn test_queue_status_defaults_to_pending() {
        assert_eq!(QueueQuery::default().status().unwrap(), QueueStatus::Pending);
        let approved = QueueQuery {
            status: Some("Approved".into()),
        };
        assert_eq!(approved.status().unwrap(), QueueStatus::Approved);
        let bad = QueueQuery {
            status: Some("rejected".into()),
        };
        assert!(matches!(bad.status(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_group_query_reads_form_decoded_plus() {
        let query = GroupQuery {
            blood_group: Some("AB ".into()),
        };
        assert_eq!(
            query.group().unwrap(),
            BloodGroupFilter::Group(BloodGroup::AbPositive)
        );
        let bad = GroupQuery {
            blood_group: Some("Z".into()),
        };
        assert!(matches!(bad.group(), Err(AppError::BadRequest(_))));
    }
}
