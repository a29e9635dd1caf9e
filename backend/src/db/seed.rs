//! One-time population of the public directory.
//!
//! Run once at startup, before the server accepts requests. Each collection is
//! only seeded when empty, so running it again inserts nothing.

use log::info;

use super::records::to_document;
use super::repository::{Document, FullRepository, RepositoryResult};
use crate::models::{Doctor, Hospital, NewDoctor, NewHospital, Record, RecordId};

/// How many records each collection received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub doctors: usize,
    pub hospitals: usize,
}

fn doctor(name: &str, specialist: &str, hospital: &str, phone: &str, image: u32) -> NewDoctor {
    NewDoctor {
        name: name.into(),
        specialist: specialist.into(),
        hospital: hospital.into(),
        phone: phone.into(),
        image: Some(format!("https://picsum.photos/100/100?random={}", image)),
        use_central_contact: false,
    }
}

fn hospital(name: &str, address: &str, services: &[&str], phone: &str, image: u32) -> NewHospital {
    NewHospital {
        name: name.into(),
        address: address.into(),
        phone: phone.into(),
        image: Some(format!("https://picsum.photos/200/150?random={}", image)),
        services: services.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn seed_doctors() -> Vec<NewDoctor> {
    vec![
        doctor("Dr. Sarah Ahmed", "Cardiologist", "Dhaka Medical College", "+880 1711-000000", 1),
        doctor("Dr. Rafiqul Islam", "Neurologist", "Square Hospital", "+880 1711-111111", 2),
        doctor("Dr. Anika Tabassum", "Hematologist", "Evercare Hospital", "+880 1711-222222", 3),
        doctor("Dr. Kamal Hossain", "Pediatrician", "Bangladesh Shishu Hospital", "+880 1711-333333", 4),
    ]
}

pub fn seed_hospitals() -> Vec<NewHospital> {
    vec![
        hospital(
            "Square Hospital",
            "18/F, Bir Uttam Qazi Nuruzzaman Sarak, Dhaka",
            &["ICU", "Emergency", "Blood Bank"],
            "10616",
            5,
        ),
        hospital(
            "Dhaka Medical College",
            "Secretariat Rd, Dhaka 1000",
            &["General Medicine", "Surgery", "Burn Unit"],
            "02-55165088",
            6,
        ),
        hospital(
            "Evercare Hospital",
            "Plot 81, Block E, Bashundhara R/A, Dhaka",
            &["Cardiology", "Neurosurgery", "Oncology"],
            "10678",
            7,
        ),
    ]
}

fn batch<T: Record>(records: Vec<T>) -> RepositoryResult<Vec<(RecordId, Document)>> {
    records
        .into_iter()
        .map(|r| Ok((r.id().clone(), to_document(&r)?)))
        .collect()
}

/// Seed empty `doctors` and `hospitals` collections with example records.
pub async fn seed_directory<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<SeedReport> {
    let doctors: Vec<Doctor> = seed_doctors()
        .into_iter()
        .map(|d| d.into_doctor(RecordId::generate()))
        .collect();
    let hospitals: Vec<Hospital> = seed_hospitals()
        .into_iter()
        .map(|h| h.into_hospital(RecordId::generate()))
        .collect();

    let report = SeedReport {
        doctors: repo
            .insert_documents_if_empty(Doctor::COLLECTION, batch(doctors)?)
            .await?,
        hospitals: repo
            .insert_documents_if_empty(Hospital::COLLECTION, batch(hospitals)?)
            .await?,
    };

    if report == SeedReport::default() {
        info!("Directory already populated, nothing seeded");
    } else {
        info!(
            "Seeded {} doctors and {} hospitals",
            report.doctors, report.hospitals
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::services;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let repo = LocalRepository::new();
        let first = seed_directory(&repo).await.unwrap();
        assert_eq!(first, SeedReport { doctors: 4, hospitals: 3 });

        let second = seed_directory(&repo).await.unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(services::list_doctors(&repo).await.unwrap().len(), 4);
        assert_eq!(services::list_hospitals(&repo).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_seed_skips_populated_collection_only() {
        let repo = LocalRepository::new();
        services::create_hospital(&repo, seed_hospitals().remove(0))
            .await
            .unwrap();
        let report = seed_directory(&repo).await.unwrap();
        assert_eq!(report, SeedReport { doctors: 4, hospitals: 0 });
    }

    #[test]
    fn test_seed_records_are_valid() {
        assert!(seed_doctors().iter().all(|d| d.validate().is_ok()));
        assert!(seed_hospitals().iter().all(|h| h.validate().is_ok()));
    }
}
