//! Public API surface for the HemoCare backend.
//!
//! This file consolidates the record and DTO types shared by the store, the
//! service layer and the HTTP API. All types derive Serialize/Deserialize
//! with camelCase field names.

pub use crate::models::approval::{Approvable, ApprovalState, ApprovalTransitionError};
pub use crate::models::common::{BloodGroup, Gender, ValidationError};
pub use crate::models::doctor::{Doctor, DoctorUpdate, NewDoctor};
pub use crate::models::donation_request::{
    DonationRequest, DonationRequestUpdate, NewDonationRequest, QueueStatus,
};
pub use crate::models::donor::{Donor, DonorUpdate, NewDonor, MAX_DONOR_AGE, MIN_DONOR_AGE};
pub use crate::models::hospital::{Hospital, HospitalUpdate, NewHospital};
pub use crate::models::record::{Collection, Record, RecordId};
pub use crate::models::settings::{SettingsUpdate, SystemSettings, SETTINGS_KEY};
pub use crate::services::directory::{BloodGroupFilter, DirectoryFilter, DoctorListing};
pub use crate::services::export::{DonationRequestExportRow, DonorExportRow, ExportSheet};

use serde::{Deserialize, Serialize};

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Every donor, approved or not
    pub donors: usize,
    pub doctors: usize,
    pub hospitals: usize,
    pub approved_donations: usize,
    pub pending_donors: usize,
    pub pending_donations: usize,
}
