//! Document store abstraction
//!
//! `UserStore` is the find / insert / update-by-filter surface the Reader and
//! Merger are written against. `PgUserStore` backs it with PostgreSQL; tests
//! swap in the in-memory store from `memory_store`.

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::db;
use crate::db::repository::{custom_info, user_images};
use crate::models::user::{CustomInfo, ImageEntry, UserRecord};
use crate::services::metrics;

/// Errors raised by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("no record matched user {0} on update")]
    NoMatch(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("failed to decode stored record: {0}")]
    Decode(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(err.to_string())
            }
            sqlx::Error::PoolTimedOut => StoreError::Database("connection pool timed out".into()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Store primitives for user image documents
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Lazily stream records matching `user_name`, at most `limit` of them.
    /// A decode failure is yielded as an `Err` item and ends the stream.
    fn stream_user<'a>(
        &'a self,
        user_name: &'a str,
        limit: i64,
    ) -> BoxStream<'a, Result<UserRecord, StoreError>>;

    /// Fetch the record for `user_name`, or `StoreError::NotFound`
    async fn find_user(&self, user_name: &str) -> Result<UserRecord, StoreError>;

    /// Insert a brand new record
    async fn insert_user(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Replace the image list of an existing record; returns the matched count
    async fn replace_images(
        &self,
        user_name: &str,
        images: &[ImageEntry],
    ) -> Result<u64, StoreError>;

    /// Insert or replace a user's custom info
    async fn save_custom_info(&self, info: &CustomInfo) -> Result<CustomInfo, StoreError>;

    /// Whether the store is reachable
    async fn ping(&self) -> bool;
}

/// Run a store operation under a deadline, recording its latency
pub async fn bounded<T, F>(operation: &'static str, limit: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let started = Instant::now();
    let result = match tokio::time::timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    };

    metrics::STORE_OP_SECONDS
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());

    result
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    fn stream_user<'a>(
        &'a self,
        user_name: &'a str,
        limit: i64,
    ) -> BoxStream<'a, Result<UserRecord, StoreError>> {
        user_images::stream_by_user_name(&self.pool, user_name, limit)
            .map(|row| row.map(UserRecord::from).map_err(StoreError::from))
            .boxed()
    }

    async fn find_user(&self, user_name: &str) -> Result<UserRecord, StoreError> {
        user_images::find_by_user_name(&self.pool, user_name)
            .await?
            .map(UserRecord::from)
            .ok_or(StoreError::NotFound)
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        user_images::insert(&self.pool, record).await?;
        Ok(())
    }

    async fn replace_images(
        &self,
        user_name: &str,
        images: &[ImageEntry],
    ) -> Result<u64, StoreError> {
        Ok(user_images::replace_images(&self.pool, user_name, images).await?)
    }

    async fn save_custom_info(&self, info: &CustomInfo) -> Result<CustomInfo, StoreError> {
        let row = custom_info::upsert(&self.pool, info).await?;
        Ok(row.into())
    }

    async fn ping(&self) -> bool {
        db::health_check(&self.pool).await
    }
}
