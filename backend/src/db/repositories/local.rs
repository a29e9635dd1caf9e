//! In-memory local repository implementation.
//!
//! This module provides a local implementation of the repository traits
//! suitable for unit testing and local development. Documents live in
//! per-collection maps with a separate insertion-order index, so listings come
//! back in the order records were created.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::{
    merge_into, Document, ErrorContext, RecordRepository, RepositoryError, RepositoryResult,
    SeedRepository,
};
use crate::models::{Collection, RecordId};

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same data, which lets tests keep a
/// handle on the store after handing it to the HTTP state.
///
/// # Example
/// ```
/// use hemocare::db::repositories::LocalRepository;
/// use hemocare::db::repository::RecordRepository;
/// use hemocare::models::Collection;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// rt.block_on(async {
///     let repo = LocalRepository::new();
///     assert_eq!(repo.count_documents(Collection::Donors).await.unwrap(), 0);
/// });
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

#[derive(Default)]
struct CollectionData {
    order: Vec<RecordId>,
    documents: HashMap<RecordId, Document>,
}

impl CollectionData {
    fn insert(&mut self, id: RecordId, document: Document) {
        self.order.push(id.clone());
        self.documents.insert(id, document);
    }

    fn remove(&mut self, id: &RecordId) -> bool {
        if self.documents.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }

    fn ordered(&self) -> Vec<Document> {
        self.order
            .iter()
            .filter_map(|id| self.documents.get(id).cloned())
            .collect()
    }
}

struct LocalData {
    collections: HashMap<Collection, CollectionData>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            collections: HashMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn collection_mut(&mut self, collection: Collection) -> &mut CollectionData {
        self.collections.entry(collection).or_default()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Simulate a store outage.
    ///
    /// While unhealthy, `health_check` returns `Ok(false)` and every other
    /// operation fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Number of documents stored in `collection`.
    pub fn document_count(&self, collection: Collection) -> usize {
        self.data
            .read()
            .collections
            .get(&collection)
            .map(|c| c.documents.len())
            .unwrap_or(0)
    }

    /// Check if a document exists.
    pub fn has_document(&self, collection: Collection, id: &RecordId) -> bool {
        self.data
            .read()
            .collections
            .get(&collection)
            .map(|c| c.documents.contains_key(id))
            .unwrap_or(false)
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Store is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_document(
        &self,
        collection: Collection,
        id: &RecordId,
        document: Document,
    ) -> RepositoryResult<()> {
        self.check_health("insert_document")?;

        let mut data = self.data.write();
        let target = data.collection_mut(collection);
        if target.documents.contains_key(id) {
            return Err(RepositoryError::conflict("Record already exists")
                .with_operation("insert_document")
                .with_record(collection, id));
        }
        target.insert(id.clone(), document);
        Ok(())
    }

    async fn get_document(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> RepositoryResult<Option<Document>> {
        self.check_health("get_document")?;

        let data = self.data.read();
        Ok(data
            .collections
            .get(&collection)
            .and_then(|c| c.documents.get(id))
            .cloned())
    }

    async fn list_documents(&self, collection: Collection) -> RepositoryResult<Vec<Document>> {
        self.check_health("list_documents")?;

        let data = self.data.read();
        Ok(data
            .collections
            .get(&collection)
            .map(CollectionData::ordered)
            .unwrap_or_default())
    }

    async fn merge_document(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> RepositoryResult<Document> {
        self.check_health("merge_document")?;

        let mut data = self.data.write();
        let stored = data
            .collection_mut(collection)
            .documents
            .get_mut(id)
            .ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    format!("{} {} not found", collection, id),
                    ErrorContext::new("merge_document")
                        .with_collection(collection)
                        .with_entity_id(id),
                )
            })?;
        merge_into(stored, patch);
        Ok(stored.clone())
    }

    async fn upsert_document(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> RepositoryResult<Document> {
        self.check_health("upsert_document")?;

        let mut data = self.data.write();
        let target = data.collection_mut(collection);
        match target.documents.get_mut(id) {
            Some(stored) => {
                merge_into(stored, patch);
                Ok(stored.clone())
            }
            None => {
                target.insert(id.clone(), patch.clone());
                Ok(patch)
            }
        }
    }

    async fn delete_document(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> RepositoryResult<bool> {
        self.check_health("delete_document")?;

        let mut data = self.data.write();
        Ok(data.collection_mut(collection).remove(id))
    }

    async fn count_documents(&self, collection: Collection) -> RepositoryResult<usize> {
        self.check_health("count_documents")?;
        Ok(self.document_count(collection))
    }
}

#[async_trait]
impl SeedRepository for LocalRepository {
    async fn insert_documents_if_empty(
        &self,
        collection: Collection,
        documents: Vec<(RecordId, Document)>,
    ) -> RepositoryResult<usize> {
        self.check_health("insert_documents_if_empty")?;

        // Held across the check and the inserts
        let mut data = self.data.write();
        let target = data.collection_mut(collection);
        if !target.documents.is_empty() {
            return Ok(0);
        }

        let inserted = documents.len();
        for (id, document) in documents {
            target.insert(id, document);
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let repo = LocalRepository::new();
        for name in ["c", "a", "b"] {
            repo.insert_document(
                Collection::Doctors,
                &RecordId::new(name),
                doc(json!({ "name": name })),
            )
            .await
            .unwrap();
        }

        let names: Vec<String> = repo
            .list_documents(Collection::Doctors)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let repo = LocalRepository::new();
        let id = RecordId::new("x");
        repo.insert_document(Collection::Donors, &id, doc(json!({})))
            .await
            .unwrap();
        let err = repo
            .insert_document(Collection::Donors, &id, doc(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
    }

    #[tokio::test]
    async fn test_merge_missing_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .merge_document(Collection::Donors, &RecordId::new("nope"), doc(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_missing_reports_false() {
        let repo = LocalRepository::new();
        let existed = repo
            .delete_document(Collection::Doctors, &RecordId::new("ghost"))
            .await
            .unwrap();
        assert!(!existed);
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_document() {
        let repo = LocalRepository::new();
        let id = RecordId::new("global");
        repo.upsert_document(Collection::Settings, &id, doc(json!({ "a": 1 })))
            .await
            .unwrap();
        let merged = repo
            .upsert_document(Collection::Settings, &id, doc(json!({ "b": 2 })))
            .await
            .unwrap();
        assert_eq!(serde_json::Value::Object(merged), json!({ "a": 1, "b": 2 }));
        assert_eq!(repo.document_count(Collection::Settings), 1);
    }

    #[tokio::test]
    async fn test_unhealthy_store_fails_operations() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_documents(Collection::Donors).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_seed_only_into_empty_collection() {
        let repo = LocalRepository::new();
        let batch = || vec![(RecordId::generate(), doc(json!({ "n": 1 })))];
        assert_eq!(
            repo.insert_documents_if_empty(Collection::Hospitals, batch())
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.insert_documents_if_empty(Collection::Hospitals, batch())
                .await
                .unwrap(),
            0
        );
        assert_eq!(repo.document_count(Collection::Hospitals), 1);
    }
}
