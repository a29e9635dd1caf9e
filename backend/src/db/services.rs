//! High-level database service layer.
//!
//! Repository-agnostic operations used by the HTTP handlers. Each function
//! validates its input, applies the approval rules where they matter, and
//! performs the store calls through the typed helpers in [`super::records`].
//!
//! # Usage
//!
//! ```no_run
//! use hemocare::db::{services, repositories::LocalRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let doctors = services::list_doctors(&repo).await?;
//!     println!("Found {} doctors", doctors.len());
//!     Ok(())
//! }
//! ```

use chrono::{NaiveDate, Utc};
use log::debug;
use serde::Serialize;

use super::records;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::api::DashboardStats;
use crate::models::{
    settings_id, Approvable, ApprovalState, Collection, DonationRequest, DonationRequestUpdate,
    Doctor, DoctorUpdate, Donor, DonorUpdate, Hospital, HospitalUpdate, NewDonationRequest,
    NewDoctor, NewDonor, NewHospital, QueueStatus, Record, RecordId, SettingsUpdate,
    SystemSettings,
};
use crate::services::directory::{BloodGroupFilter, DirectoryFilter, DoctorListing};
use crate::services::export::{self, DonationRequestExportRow, DonorExportRow, ExportSheet};

// ==================== Health & Connection ====================

pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}

// ==================== Approval ====================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApprovalPatch {
    is_approved: bool,
}

/// Resolve a requested `isApproved` value against the stored record.
///
/// Returns `Some(true)` when the update approves the record and `None`
/// otherwise. `false` is never written, so an approval that lands between
/// this read and the merge cannot be undone.
async fn resolve_approval<T, R>(
    repo: &R,
    id: &RecordId,
    requested: Option<bool>,
) -> RepositoryResult<Option<bool>>
where
    T: Record + Approvable,
    R: FullRepository + ?Sized,
{
    let Some(requested) = requested else {
        return Ok(None);
    };
    let current: T = records::require(repo, id).await?;
    let next = current
        .approval()
        .transition(requested)
        .map_err(|e| RepositoryError::from(e).with_record(T::COLLECTION, id))?;
    Ok(next.is_approved().then_some(true))
}

/// Move a record to approved. Approving twice leaves it unchanged.
async fn approve<T, R>(repo: &R, id: &RecordId) -> RepositoryResult<T>
where
    T: Record + Approvable,
    R: FullRepository + ?Sized,
{
    let current: T = records::require(repo, id).await?;
    if current.approval() == ApprovalState::Approved {
        return Ok(current);
    }
    debug!("Approving {} {}", T::LABEL, id);
    records::merge(repo, id, &ApprovalPatch { is_approved: true }).await
}

// ==================== Doctors ====================

pub async fn list_doctors<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<Vec<Doctor>> {
    records::list(repo).await
}

/// Doctors with their public contact number resolved against the settings.
pub async fn list_doctor_listings<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<DoctorListing>> {
    let (doctors, settings) = futures::try_join!(list_doctors(repo), get_settings(repo))?;
    Ok(doctors
        .into_iter()
        .map(|d| DoctorListing::new(d, &settings))
        .collect())
}

pub async fn create_doctor<R: FullRepository + ?Sized>(
    repo: &R,
    form: NewDoctor,
) -> RepositoryResult<Doctor> {
    form.validate()?;
    let doctor = form.into_doctor(RecordId::generate());
    records::insert(repo, &doctor).await?;
    Ok(doctor)
}

pub async fn update_doctor<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
    update: DoctorUpdate,
) -> RepositoryResult<Doctor> {
    update.validate()?;
    records::merge(repo, id, &update.normalized()).await
}

pub async fn delete_doctor<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
) -> RepositoryResult<bool> {
    records::delete::<Doctor, _>(repo, id).await
}

// ==================== Hospitals ====================

pub async fn list_hospitals<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Hospital>> {
    records::list(repo).await
}

pub async fn create_hospital<R: FullRepository + ?Sized>(
    repo: &R,
    form: NewHospital,
) -> RepositoryResult<Hospital> {
    form.validate()?;
    let hospital = form.into_hospital(RecordId::generate());
    records::insert(repo, &hospital).await?;
    Ok(hospital)
}

pub async fn update_hospital<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
    update: HospitalUpdate,
) -> RepositoryResult<Hospital> {
    update.validate()?;
    records::merge(repo, id, &update.normalized()).await
}

pub async fn delete_hospital<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
) -> RepositoryResult<bool> {
    records::delete::<Hospital, _>(repo, id).await
}

// ==================== Donors ====================

/// Public registration. The donor starts pending.
pub async fn register_donor<R: FullRepository + ?Sized>(
    repo: &R,
    form: NewDonor,
) -> RepositoryResult<Donor> {
    form.validate()?;
    let donor = form.into_donor(RecordId::generate(), Utc::now());
    records::insert(repo, &donor).await?;
    Ok(donor)
}

/// The public directory: approved donors matching `filter`.
pub async fn list_public_donors<R: FullRepository + ?Sized>(
    repo: &R,
    filter: &DirectoryFilter,
) -> RepositoryResult<Vec<Donor>> {
    let donors: Vec<Donor> = records::list(repo).await?;
    Ok(filter.apply(donors))
}

pub async fn list_pending_donors<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<Vec<Donor>> {
    let donors: Vec<Donor> = records::list(repo).await?;
    Ok(donors
        .into_iter()
        .filter(|d| d.approval() == ApprovalState::Pending)
        .collect())
}

pub async fn list_approved_donors<R: FullRepository + ?Sized>(
    repo: &R,
    group: BloodGroupFilter,
) -> RepositoryResult<Vec<Donor>> {
    list_public_donors(repo, &DirectoryFilter::new(group, None)).await
}

pub async fn update_donor<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
    update: DonorUpdate,
) -> RepositoryResult<Donor> {
    update.validate()?;
    let mut update = update.normalized();
    update.is_approved = resolve_approval::<Donor, _>(repo, id, update.is_approved).await?;
    records::merge(repo, id, &update).await
}

pub async fn set_donor_availability<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
    available: bool,
) -> RepositoryResult<Donor> {
    let update = DonorUpdate {
        is_available_for_emergency: Some(available),
        ..Default::default()
    };
    records::merge(repo, id, &update).await
}

pub async fn approve_donor<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
) -> RepositoryResult<Donor> {
    approve(repo, id).await
}

/// Delete a donor. Rejecting a registration is the same operation.
pub async fn delete_donor<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
) -> RepositoryResult<bool> {
    records::delete::<Donor, _>(repo, id).await
}

pub async fn export_donors<R: FullRepository + ?Sized>(
    repo: &R,
    group: BloodGroupFilter,
) -> RepositoryResult<ExportSheet<DonorExportRow>> {
    let approved = list_approved_donors(repo, group).await?;
    Ok(export::donor_sheet(approved, group))
}

// ==================== Donation Requests ====================

pub async fn submit_donation_request<R: FullRepository + ?Sized>(
    repo: &R,
    form: NewDonationRequest,
) -> RepositoryResult<DonationRequest> {
    form.validate()?;
    let request = form.into_request(RecordId::generate(), Utc::now());
    records::insert(repo, &request).await?;
    Ok(request)
}

pub async fn list_donation_requests<R: FullRepository + ?Sized>(
    repo: &R,
    status: QueueStatus,
) -> RepositoryResult<Vec<DonationRequest>> {
    let requests: Vec<DonationRequest> = records::list(repo).await?;
    Ok(requests
        .into_iter()
        .filter(|r| status.admits(r.approval()))
        .collect())
}

pub async fn update_donation_request<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
    update: DonationRequestUpdate,
) -> RepositoryResult<DonationRequest> {
    update.validate()?;
    let mut update = update.normalized();
    update.is_approved =
        resolve_approval::<DonationRequest, _>(repo, id, update.is_approved).await?;
    records::merge(repo, id, &update).await
}

pub async fn approve_donation_request<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
) -> RepositoryResult<DonationRequest> {
    approve(repo, id).await
}

pub async fn delete_donation_request<R: FullRepository + ?Sized>(
    repo: &R,
    id: &RecordId,
) -> RepositoryResult<bool> {
    records::delete::<DonationRequest, _>(repo, id).await
}

pub async fn export_donation_requests<R: FullRepository + ?Sized>(
    repo: &R,
    today: NaiveDate,
) -> RepositoryResult<ExportSheet<DonationRequestExportRow>> {
    let approved = list_donation_requests(repo, QueueStatus::Approved).await?;
    Ok(export::donation_request_sheet(approved, today))
}

// ==================== Settings ====================

/// The settings singleton, or the defaults when it was never written.
pub async fn get_settings<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<SystemSettings> {
    match repo
        .get_document(Collection::Settings, &settings_id())
        .await?
    {
        Some(doc) => records::from_document(Collection::Settings, doc),
        None => Ok(SystemSettings::default()),
    }
}

/// Upsert the settings singleton under its fixed key.
pub async fn update_settings<R: FullRepository + ?Sized>(
    repo: &R,
    update: SettingsUpdate,
) -> RepositoryResult<SystemSettings> {
    let patch = records::to_document(&update.normalized())?;
    let stored = repo
        .upsert_document(Collection::Settings, &settings_id(), patch)
        .await?;
    records::from_document(Collection::Settings, stored)
}

// ==================== Dashboard ====================

pub async fn dashboard_stats<R: FullRepository + ?Sized>(
    repo: &R,
) -> RepositoryResult<DashboardStats> {
    let (donors, doctors, hospitals, requests) = futures::try_join!(
        records::list::<Donor, _>(repo),
        records::count::<Doctor, _>(repo),
        records::count::<Hospital, _>(repo),
        records::list::<DonationRequest, _>(repo),
    )?;

    let pending_donors = donors.iter().filter(|d| !d.is_approved).count();
    let approved_donations = requests.iter().filter(|r| r.is_approved).count();

    Ok(DashboardStats {
        donors: donors.len(),
        doctors,
        hospitals,
        approved_donations,
        pending_donors,
        pending_donations: requests.len() - approved_donations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{Document, RecordRepository, SeedRepository};
    use crate::models::{BloodGroup, Gender};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn registration(group: BloodGroup) -> NewDonor {
        NewDonor {
            name: "Tania".into(),
            age: 29,
            gender: Gender::Female,
            blood_group: group,
            phone: "01700000001".into(),
            address: "Sylhet".into(),
            last_donation_date: None,
            is_available_for_emergency: true,
        }
    }

    #[tokio::test]
    async fn test_registered_donor_hidden_until_approved() {
        let repo = LocalRepository::new();
        let donor = register_donor(&repo, registration(BloodGroup::ONegative))
            .await
            .unwrap();
        let filter = DirectoryFilter::default();
        assert!(list_public_donors(&repo, &filter).await.unwrap().is_empty());

        approve_donor(&repo, &donor.id).await.unwrap();
        let listed = list_public_donors(&repo, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, donor.id);
    }

    #[tokio::test]
    async fn test_update_cannot_unapprove() {
        let repo = LocalRepository::new();
        let donor = register_donor(&repo, registration(BloodGroup::APositive))
            .await
            .unwrap();
        approve_donor(&repo, &donor.id).await.unwrap();

        let err = update_donor(
            &repo,
            &donor.id,
            DonorUpdate {
                is_approved: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
    }

    /// Store that approves `donor` right before the first merge, as a
    /// concurrent admin would.
    struct ApproveBeforeMerge {
        inner: LocalRepository,
        donor: RecordId,
        fired: AtomicBool,
    }

    #[async_trait]
    impl RecordRepository for ApproveBeforeMerge {
        async fn health_check(&self) -> RepositoryResult<bool> {
            self.inner.health_check().await
        }

        async fn insert_document(
            &self,
            collection: Collection,
            id: &RecordId,
            document: Document,
        ) -> RepositoryResult<()> {
            self.inner.insert_document(collection, id, document).await
        }

        async fn get_document(
            &self,
            collection: Collection,
            id: &RecordId,
        ) -> RepositoryResult<Option<Document>> {
            self.inner.get_document(collection, id).await
        }

        async fn list_documents(&self, collection: Collection) -> RepositoryResult<Vec<Document>> {
            self.inner.list_documents(collection).await
        }

        async fn merge_document(
            &self,
            collection: Collection,
            id: &RecordId,
            patch: Document,
        ) -> RepositoryResult<Document> {
            if !self.fired.swap(true, Ordering::SeqCst) {
                approve_donor(&self.inner, &self.donor).await?;
            }
            self.inner.merge_document(collection, id, patch).await
        }

        async fn upsert_document(
            &self,
            collection: Collection,
            id: &RecordId,
            patch: Document,
        ) -> RepositoryResult<Document> {
            self.inner.upsert_document(collection, id, patch).await
        }

        async fn delete_document(
            &self,
            collection: Collection,
            id: &RecordId,
        ) -> RepositoryResult<bool> {
            self.inner.delete_document(collection, id).await
        }

        async fn count_documents(&self, collection: Collection) -> RepositoryResult<usize> {
            self.inner.count_documents(collection).await
        }
    }

    #[async_trait]
    impl SeedRepository for ApproveBeforeMerge {
        async fn insert_documents_if_empty(
            &self,
            collection: Collection,
            documents: Vec<(RecordId, Document)>,
        ) -> RepositoryResult<usize> {
            self.inner.insert_documents_if_empty(collection, documents).await
        }
    }

    #[tokio::test]
    async fn test_pending_flag_in_update_never_reaches_the_store() {
        let inner = LocalRepository::new();
        let donor = register_donor(&inner, registration(BloodGroup::AbNegative))
            .await
            .unwrap();
        let repo = ApproveBeforeMerge {
            inner: inner.clone(),
            donor: donor.id.clone(),
            fired: AtomicBool::new(false),
        };

        let updated = update_donor(
            &repo,
            &donor.id,
            DonorUpdate {
                phone: Some("01700000002".into()),
                is_approved: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.is_approved);
        assert_eq!(updated.phone, "01700000002");

        let stored: Donor = records::require(&inner, &donor.id).await.unwrap();
        assert!(stored.is_approved);
    }

    #[tokio::test]
    async fn test_settings_default_then_single_upserted_record() {
        let repo = LocalRepository::new();
        assert_eq!(get_settings(&repo).await.unwrap(), SystemSettings::default());

        for phone in ["111", "222"] {
            update_settings(
                &repo,
                SettingsUpdate {
                    central_phone: Some(phone.into()),
                    use_central_phone: Some(true),
                },
            )
            .await
            .unwrap();
        }
        let settings = get_settings(&repo).await.unwrap();
        assert_eq!(settings.central_phone, "222");
        assert_eq!(repo.document_count(Collection::Settings), 1);
    }

    #[tokio::test]
    async fn test_stats_count_queues() {
        let repo = LocalRepository::new();
        register_donor(&repo, registration(BloodGroup::BPositive))
            .await
            .unwrap();
        let form = NewDonationRequest {
            full_name: "Karim".into(),
            mobile_number: "019".into(),
            description: "Need blood".into(),
        };
        let request = submit_donation_request(&repo, form.clone()).await.unwrap();
        submit_donation_request(&repo, form).await.unwrap();
        approve_donation_request(&repo, &request.id).await.unwrap();

        let stats = dashboard_stats(&repo).await.unwrap();
        assert_eq!(stats.donors, 1);
        assert_eq!(stats.pending_donors, 1);
        assert_eq!(stats.approved_donations, 1);
        assert_eq!(stats.pending_donations, 1);
    }
}
