//! Repository traits for abstracting the record store.
//!
//! These traits define the interface for all store operations, allowing the
//! in-memory and Postgres implementations to be swapped via dependency
//! injection.

pub mod error;
pub mod records;
pub mod seed;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use records::{merge_into, Document, RecordRepository};
pub use seed::SeedRepository;

/// Everything the application needs from a store.
pub trait FullRepository: RecordRepository + SeedRepository {}

impl<T> FullRepository for T where T: RecordRepository + SeedRepository + ?Sized {}
