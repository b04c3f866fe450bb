//! Reader: fetch a user's image records
//!
//! Records are pulled from the store one at a time. A decode failure ends the
//! stream with an error item; `fetch` reports it instead of returning the
//! records read so far.

use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::errors::AppError;
use crate::models::user::UserRecord;
use crate::services::store::{self, StoreError, UserStore};

#[derive(Clone)]
pub struct Reader {
    store: Arc<dyn UserStore>,
    limit: i64,
    timeout: Duration,
}

impl Reader {
    pub fn new(store: Arc<dyn UserStore>, limit: i64, timeout: Duration) -> Self {
        Self {
            store,
            limit,
            timeout,
        }
    }

    /// Lazily stream the records stored for `user_name`
    pub fn stream<'a>(&'a self, user_name: &'a str) -> BoxStream<'a, Result<UserRecord, StoreError>> {
        self.store.stream_user(user_name, self.limit)
    }

    /// Collect every record for `user_name`.
    ///
    /// An empty result is `NotFound`; the whole read, cursor included, shares
    /// one store deadline.
    pub async fn fetch(&self, user_name: &str) -> Result<Vec<UserRecord>, AppError> {
        if user_name.is_empty() {
            return Err(AppError::InvalidInput(
                "userName is required in the query parameters".to_string(),
            ));
        }

        let records = store::bounded("fetch", self.timeout, self.collect(user_name)).await?;

        if records.is_empty() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(records)
    }

    async fn collect(&self, user_name: &str) -> Result<Vec<UserRecord>, StoreError> {
        let mut stream = self.stream(user_name);
        let mut records = Vec::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        user_name,
                        decoded = records.len(),
                        "Aborting read after store error: {}",
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ImageEntry;
    use crate::services::memory_store::{Fault, MemoryStore};

    fn record(user_name: &str, images: &[&str]) -> UserRecord {
        UserRecord {
            user_name: user_name.to_string(),
            images: images
                .iter()
                .map(|image| ImageEntry {
                    image: Some(image.to_string()),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn reader(store: Arc<MemoryStore>) -> Reader {
        Reader::new(store, 10, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_fetch_returns_matching_records() {
        let store = Arc::new(MemoryStore::new());
        store.seed(record("alice", &["img1", "img2"]));
        store.seed(record("bob", &["img3"]));

        let records = reader(store).fetch("alice").await.unwrap();

        assert_eq!(records, vec![record("alice", &["img1", "img2"])]);
    }

    #[tokio::test]
    async fn test_fetch_empty_user_name_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let err = reader(store).fetch("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_fetch_unknown_user_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        store.seed(record("alice", &["img1"]));

        let err = reader(store).fetch("carol").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_is_capped() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..15 {
            store.seed(record("alice", &[&format!("img{i}")]));
        }

        let records = reader(store).fetch("alice").await.unwrap();
        assert_eq!(records.len(), 10);
    }

    #[tokio::test]
    async fn test_decode_failure_is_reported_not_truncated() {
        let store = Arc::new(MemoryStore::with_fault(Fault::CorruptAfter(1)));
        store.seed(record("alice", &["img1"]));
        store.seed(record("alice", &["img2"]));

        let err = reader(store).fetch("alice").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_stream_yields_terminal_error_item() {
        let store = Arc::new(MemoryStore::with_fault(Fault::CorruptAfter(1)));
        store.seed(record("alice", &["img1"]));
        store.seed(record("alice", &["img2"]));
        let reader = reader(store);

        let items: Vec<_> = reader.stream("alice").collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(StoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let store = Arc::new(MemoryStore::with_fault(Fault::Unavailable));
        let err = reader(store).fetch("alice").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_times_out() {
        let store = Arc::new(MemoryStore::with_fault(Fault::Stall));
        let err = reader(store).fetch("alice").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(msg) if msg.contains("timed out")));
    }
}
