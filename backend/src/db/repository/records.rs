//! Record repository trait: JSON documents grouped into named collections.
//!
//! Each record is stored as a JSON object keyed by `(collection, id)`.
//! Listing returns documents in insertion order. Updates are merges: the keys
//! of a patch overwrite the stored keys, all other keys are left untouched.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::RepositoryResult;
use crate::models::{Collection, RecordId};

/// A stored JSON object.
pub type Document = Map<String, Value>;

/// Repository trait for document CRUD.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so one instance can be shared by all
/// request handlers.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Check if the underlying store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a new document.
    ///
    /// # Errors
    /// * `RepositoryError::ConflictError` if a document with this id already
    ///   exists in the collection
    async fn insert_document(
        &self,
        collection: Collection,
        id: &RecordId,
        document: Document,
    ) -> RepositoryResult<()>;

    /// Fetch one document, `Ok(None)` when absent.
    async fn get_document(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> RepositoryResult<Option<Document>>;

    /// All documents of a collection in insertion order.
    async fn list_documents(&self, collection: Collection) -> RepositoryResult<Vec<Document>>;

    /// Merge `patch` into an existing document and return the result.
    ///
    /// # Errors
    /// * `RepositoryError::NotFound` if the document does not exist
    async fn merge_document(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> RepositoryResult<Document>;

    /// Merge `patch` into the document, creating it from `patch` when absent.
    async fn upsert_document(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> RepositoryResult<Document>;

    /// Delete a document. Returns whether it existed.
    async fn delete_document(&self, collection: Collection, id: &RecordId)
        -> RepositoryResult<bool>;

    /// Number of documents in a collection.
    async fn count_documents(&self, collection: Collection) -> RepositoryResult<usize>;
}

/// Apply a merge patch to a stored document in place.
pub fn merge_into(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overwrites_only_patch_keys() {
        let mut doc = json!({ "name": "A", "phone": "1", "isApproved": false })
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({ "phone": "2", "isApproved": true })
            .as_object()
            .cloned()
            .unwrap();
        merge_into(&mut doc, patch);
        assert_eq!(
            Value::Object(doc),
            json!({ "name": "A", "phone": "2", "isApproved": true })
        );
    }
}
