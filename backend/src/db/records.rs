//! Typed access to the document store.
//!
//! Records are serialized to JSON objects on the way in and decoded back into
//! their model types on the way out. A stored document that no longer decodes
//! is surfaced as an internal error naming the collection and id.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::repository::{Document, ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::models::{Collection, Record, RecordId};

/// Serialize a value that must encode to a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> RepositoryResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(RepositoryError::internal(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

/// Decode a stored document into a model type.
pub fn from_document<T: DeserializeOwned>(
    collection: Collection,
    document: Document,
) -> RepositoryResult<T> {
    let id = document
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_string();
    serde_json::from_value(Value::Object(document)).map_err(|e| {
        RepositoryError::internal_with_context(
            format!("Malformed stored record: {}", e),
            ErrorContext::new("decode_document")
                .with_collection(collection)
                .with_entity_id(id),
        )
    })
}

pub async fn list<T, R>(repo: &R) -> RepositoryResult<Vec<T>>
where
    T: Record,
    R: FullRepository + ?Sized,
{
    repo.list_documents(T::COLLECTION)
        .await?
        .into_iter()
        .map(|doc| from_document(T::COLLECTION, doc))
        .collect()
}

pub async fn get<T, R>(repo: &R, id: &RecordId) -> RepositoryResult<Option<T>>
where
    T: Record,
    R: FullRepository + ?Sized,
{
    repo.get_document(T::COLLECTION, id)
        .await?
        .map(|doc| from_document(T::COLLECTION, doc))
        .transpose()
}

/// Fetch a record or fail with `NotFound` ("Donor abc not found").
pub async fn require<T, R>(repo: &R, id: &RecordId) -> RepositoryResult<T>
where
    T: Record,
    R: FullRepository + ?Sized,
{
    get(repo, id).await?.ok_or_else(|| not_found::<T>(id))
}

pub async fn insert<T, R>(repo: &R, record: &T) -> RepositoryResult<()>
where
    T: Record,
    R: FullRepository + ?Sized,
{
    repo.insert_document(T::COLLECTION, record.id(), to_document(record)?)
        .await
}

/// Apply a merge patch to an existing record and return the merged record.
pub async fn merge<T, R, P>(repo: &R, id: &RecordId, patch: &P) -> RepositoryResult<T>
where
    T: Record,
    R: FullRepository + ?Sized,
    P: Serialize,
{
    let patch = to_document(patch)?;
    let merged = repo
        .merge_document(T::COLLECTION, id, patch)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound { .. } => not_found::<T>(id),
            other => other,
        })?;
    from_document(T::COLLECTION, merged)
}

/// Delete a record. Deleting an absent record is not an error.
pub async fn delete<T, R>(repo: &R, id: &RecordId) -> RepositoryResult<bool>
where
    T: Record,
    R: FullRepository + ?Sized,
{
    repo.delete_document(T::COLLECTION, id).await
}

pub async fn count<T, R>(repo: &R) -> RepositoryResult<usize>
where
    T: Record,
    R: FullRepository + ?Sized,
{
    repo.count_documents(T::COLLECTION).await
}

pub fn not_found<T: Record>(id: &RecordId) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} {} not found", T::LABEL, id),
        ErrorContext::default()
            .with_collection(T::COLLECTION)
            .with_entity_id(id),
    )
}
