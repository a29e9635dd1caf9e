//! Record store, seeding and factory tests against the in-memory backend.

mod support;

use std::str::FromStr;
use std::sync::Arc;

use serde_json::json;

use hemocare::db::factory::{RepositoryFactory, RepositoryType};
use hemocare::db::repositories::LocalRepository;
use hemocare::db::repository::{Document, RecordRepository, RepositoryError, SeedRepository};
use hemocare::db::{seed_directory, services, FullRepository, SeedReport};
use hemocare::models::{Collection, RecordId};

fn doc(value: serde_json::Value) -> Document {
    value.as_object().unwrap().clone()
}

// =========================================================
// Document operations
// =========================================================

#[tokio::test]
async fn test_list_keeps_insertion_order() {
    let repo = LocalRepository::new();
    for id in ["c", "a", "b"] {
        repo.insert_document(Collection::Hospitals, &RecordId::new(id), doc(json!({ "id": id })))
            .await
            .unwrap();
    }
    let listed = repo.list_documents(Collection::Hospitals).await.unwrap();
    let order: Vec<_> = listed.iter().map(|d| d["id"].as_str().unwrap()).collect();
    assert_eq!(order, vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_merge_applies_present_fields_and_is_idempotent() {
    let repo = LocalRepository::new();
    let id = RecordId::new("d1");
    repo.insert_document(
        Collection::Doctors,
        &id,
        doc(json!({ "id": "d1", "name": "Dr. A", "phone": "1" })),
    )
    .await
    .unwrap();

    let patch = doc(json!({ "phone": "2" }));
    let once = repo
        .merge_document(Collection::Doctors, &id, patch.clone())
        .await
        .unwrap();
    let twice = repo
        .merge_document(Collection::Doctors, &id, patch)
        .await
        .unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice["name"], "Dr. A");
    assert_eq!(twice["phone"], "2");
}

#[tokio::test]
async fn test_merge_missing_record_is_not_found() {
    let repo = LocalRepository::new();
    let err = repo
        .merge_document(Collection::Donors, &RecordId::new("nope"), Document::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
    assert_eq!(repo.document_count(Collection::Donors), 0);
}

#[tokio::test]
async fn test_delete_reports_whether_record_existed() {
    let repo = LocalRepository::new();
    let id = RecordId::new("r1");
    repo.insert_document(Collection::DonationRequests, &id, doc(json!({ "id": "r1" })))
        .await
        .unwrap();
    assert!(repo
        .delete_document(Collection::DonationRequests, &id)
        .await
        .unwrap());
    assert!(!repo
        .delete_document(Collection::DonationRequests, &id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unhealthy_store_fails_with_retryable_error() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);
    let err = repo.list_documents(Collection::Doctors).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    assert!(err.is_retryable());
    assert!(!repo.health_check().await.unwrap());
}

// =========================================================
// Seeding
// =========================================================

#[tokio::test]
async fn test_seeding_twice_keeps_one_copy() {
    let repo = LocalRepository::new();
    let first = seed_directory(&repo).await.unwrap();
    assert_eq!(
        first,
        SeedReport {
            doctors: 4,
            hospitals: 3
        }
    );

    let second = seed_directory(&repo).await.unwrap();
    assert_eq!(second, SeedReport::default());
    assert_eq!(repo.document_count(Collection::Doctors), 4);
    assert_eq!(repo.document_count(Collection::Hospitals), 3);
}

#[tokio::test]
async fn test_concurrent_seeding_does_not_duplicate() {
    let repo: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { seed_directory(repo.as_ref()).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(repo.count_documents(Collection::Doctors).await.unwrap(), 4);
    assert_eq!(repo.count_documents(Collection::Hospitals).await.unwrap(), 3);
}

#[tokio::test]
async fn test_seed_skips_collection_with_existing_records() {
    let repo = LocalRepository::new();
    let inserted = repo
        .insert_documents_if_empty(
            Collection::Hospitals,
            vec![(RecordId::new("h0"), doc(json!({ "id": "h0" })))],
        )
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let report = seed_directory(&repo).await.unwrap();
    assert_eq!(report.doctors, 4);
    assert_eq!(report.hospitals, 0);
    assert_eq!(repo.document_count(Collection::Hospitals), 1);
}

#[tokio::test]
async fn test_seeded_directory_is_publicly_listed() {
    let repo = LocalRepository::new();
    seed_directory(&repo).await.unwrap();
    let doctors = services::list_doctor_listings(&repo).await.unwrap();
    assert_eq!(doctors.len(), 4);
    assert!(doctors.iter().all(|d| !d.contact_phone.is_empty()));
    assert_eq!(services::list_hospitals(&repo).await.unwrap().len(), 3);
}

// =========================================================
// Factory
// =========================================================

#[test]
fn test_repository_type_from_str() {
    assert_eq!(
        RepositoryType::from_str("POSTGRES").unwrap(),
        RepositoryType::Postgres
    );
    assert_eq!(
        RepositoryType::from_str("local").unwrap(),
        RepositoryType::Local
    );
    let err = RepositoryType::from_str("invalid").unwrap_err();
    assert!(err.contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Local),
    );
}

#[test]
fn test_repository_type_from_env_with_database_url() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/hemocare")),
        ],
        || assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres),
    );
}

#[test]
fn test_invalid_repository_type_falls_back_to_local() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("firestore"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local)
    });
}

#[test]
fn test_factory_from_env_builds_local_store() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("memory")),
            ("DATABASE_URL", None),
        ],
        || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let repo = rt.block_on(RepositoryFactory::from_env()).unwrap();
            assert!(rt.block_on(repo.health_check()).unwrap());
        },
    );
}
