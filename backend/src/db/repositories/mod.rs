//! Repository implementations module.
//!
//! This module contains the implementations of the record store traits:
//! - `postgres`: PostgreSQL implementation with Diesel ORM over a JSONB table
//! - `local`: In-memory implementation for unit testing and local development
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PoolStats, PostgresConfig, PostgresRepository};
