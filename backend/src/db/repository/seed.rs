//! Repository trait for one-time collection initialization.

use async_trait::async_trait;

use super::error::RepositoryResult;
use super::records::Document;
use crate::models::{Collection, RecordId};

#[async_trait]
pub trait SeedRepository: Send + Sync {
    /// Insert `documents` only if `collection` is currently empty.
    ///
    /// The emptiness check and the inserts happen atomically with respect to
    /// other seeders, so concurrent callers never duplicate seed rows.
    ///
    /// # Returns
    /// * `Ok(n)` - number of documents inserted (0 when the collection was
    ///   not empty)
    async fn insert_documents_if_empty(
        &self,
        collection: Collection,
        documents: Vec<(RecordId, Document)>,
    ) -> RepositoryResult<usize>;
}
