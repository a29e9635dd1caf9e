//! Postgres repository implementation using Diesel.
//!
//! Every collection lives in a single `records` table keyed by
//! `(collection, record_id)`. Record bodies are stored as JSONB and a
//! `BIGSERIAL` column preserves insertion order for listings.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::sql_types::Text;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task;

use crate::db::repository::{
    merge_into, Document, ErrorContext, RecordRepository, RepositoryError, RepositoryResult,
    SeedRepository,
};
use crate::models::{Collection, RecordId};

mod models;
mod schema;

use models::*;
use schema::records;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// `DATABASE_URL` (or `PG_DATABASE_URL`) is required; the pool settings
    /// fall back to [`PostgresConfig::default`].
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed record store for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// Retries up to `max_retries` times with exponential backoff when the
    /// error is retryable (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        log::debug!("Retrying store operation after: {}", e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn value_to_document(value: Value) -> RepositoryResult<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RepositoryError::internal(format!(
            "Stored record is not a JSON object: {}",
            other
        ))),
    }
}

fn select_for_update(
    tx: &mut PgConnection,
    collection: Collection,
    id: &RecordId,
) -> RepositoryResult<Option<Document>> {
    records::table
        .filter(records::collection.eq(collection.name()))
        .filter(records::record_id.eq(id.as_str()))
        .select(records::data)
        .for_update()
        .first::<Value>(tx)
        .optional()
        .map_err(map_diesel_error)?
        .map(value_to_document)
        .transpose()
}

fn write_document(
    tx: &mut PgConnection,
    collection: Collection,
    id: &RecordId,
    document: &Document,
) -> RepositoryResult<()> {
    diesel::update(
        records::table
            .filter(records::collection.eq(collection.name()))
            .filter(records::record_id.eq(id.as_str())),
    )
    .set((
        records::data.eq(Value::Object(document.clone())),
        records::updated_at.eq(Utc::now()),
    ))
    .execute(tx)
    .map_err(map_diesel_error)?;
    Ok(())
}

fn new_row(collection: Collection, id: &RecordId, document: Document) -> NewRecordRow {
    NewRecordRow {
        collection: collection.name().to_string(),
        record_id: id.as_str().to_string(),
        data: Value::Object(document),
    }
}

#[async_trait]
impl RecordRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_document(
        &self,
        collection: Collection,
        id: &RecordId,
        document: Document,
    ) -> RepositoryResult<()> {
        let row = new_row(collection, id, document);
        let id = id.clone();
        self.with_conn(move |conn| {
            diesel::insert_into(records::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| {
                    map_diesel_error(e)
                        .with_operation("insert_document")
                        .with_record(collection, &id)
                })
        })
        .await
    }

    async fn get_document(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> RepositoryResult<Option<Document>> {
        let id = id.clone();
        self.with_conn(move |conn| {
            records::table
                .filter(records::collection.eq(collection.name()))
                .filter(records::record_id.eq(id.as_str()))
                .select(records::data)
                .first::<Value>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(value_to_document)
                .transpose()
        })
        .await
    }

    async fn list_documents(&self, collection: Collection) -> RepositoryResult<Vec<Document>> {
        self.with_conn(move |conn| {
            let rows = records::table
                .filter(records::collection.eq(collection.name()))
                .order(records::seq.asc())
                .select(RecordRow::as_select())
                .load::<RecordRow>(conn)
                .map_err(map_diesel_error)?;

            rows.into_iter()
                .map(|row| value_to_document(row.data))
                .collect()
        })
        .await
    }

    async fn merge_document(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> RepositoryResult<Document> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let mut stored = select_for_update(tx, collection, &id)?.ok_or_else(|| {
                    RepositoryError::not_found_with_context(
                        format!("{} {} not found", collection, id),
                        ErrorContext::new("merge_document")
                            .with_collection(collection)
                            .with_entity_id(&id),
                    )
                })?;
                merge_into(&mut stored, patch.clone());
                write_document(tx, collection, &id, &stored)?;
                Ok(stored)
            })
        })
        .await
    }

    async fn upsert_document(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> RepositoryResult<Document> {
        let id = id.clone();
        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let inserted = diesel::insert_into(records::table)
                    .values(&new_row(collection, &id, patch.clone()))
                    .on_conflict_do_nothing()
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                if inserted > 0 {
                    return Ok(patch.clone());
                }

                let mut stored = select_for_update(tx, collection, &id)?.unwrap_or_default();
                merge_into(&mut stored, patch.clone());
                write_document(tx, collection, &id, &stored)?;
                Ok(stored)
            })
        })
        .await
    }

    async fn delete_document(
        &self,
        collection: Collection,
        id: &RecordId,
    ) -> RepositoryResult<bool> {
        let id = id.clone();
        self.with_conn(move |conn| {
            diesel::delete(
                records::table
                    .filter(records::collection.eq(collection.name()))
                    .filter(records::record_id.eq(id.as_str())),
            )
            .execute(conn)
            .map(|deleted| deleted > 0)
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn count_documents(&self, collection: Collection) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            records::table
                .filter(records::collection.eq(collection.name()))
                .count()
                .get_result::<i64>(conn)
                .map(|n| n as usize)
                .map_err(map_diesel_error)
        })
        .await
    }
}

#[async_trait]
impl SeedRepository for PostgresRepository {
    async fn insert_documents_if_empty(
        &self,
        collection: Collection,
        documents: Vec<(RecordId, Document)>,
    ) -> RepositoryResult<usize> {
        let rows: Vec<NewRecordRow> = documents
            .into_iter()
            .map(|(id, document)| new_row(collection, &id, document))
            .collect();

        self.with_conn(move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                // Serializes concurrent seeders of the same collection
                sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                    .bind::<Text, _>(collection.name())
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                let existing = records::table
                    .filter(records::collection.eq(collection.name()))
                    .count()
                    .get_result::<i64>(tx)
                    .map_err(map_diesel_error)?;
                if existing > 0 || rows.is_empty() {
                    return Ok(0);
                }

                diesel::insert_into(records::table)
                    .values(&rows)
                    .execute(tx)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }
}
