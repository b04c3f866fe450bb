//! In-memory `UserStore` used by tests
//!
//! Records live in a plain `Vec` so duplicates can be seeded. A single
//! `Fault` can be armed to make the store misbehave the way a real database
//! occasionally does.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::models::user::{CustomInfo, ImageEntry, UserRecord};
use crate::services::store::{StoreError, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every call fails as if the database were down
    Unavailable,
    /// The record disappears between lookup and update
    VanishBeforeUpdate,
    /// Streaming yields this many records, then a decode error
    CorruptAfter(usize),
    /// Calls never complete
    Stall,
    /// Another writer creates the record just before our insert (fires once)
    LoseInsertRace,
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<Vec<UserRecord>>,
    custom: Mutex<HashMap<String, CustomInfo>>,
    fault: Mutex<Option<Fault>>,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(fault: Fault) -> Self {
        let store = Self::new();
        store.set_fault(Some(fault));
        store
    }

    pub fn set_fault(&self, fault: Option<Fault>) {
        *guard(&self.fault) = fault;
    }

    pub fn seed(&self, record: UserRecord) {
        guard(&self.users).push(record);
    }

    pub fn records(&self) -> Vec<UserRecord> {
        guard(&self.users).clone()
    }

    pub fn custom_info(&self, user_name: &str) -> Option<CustomInfo> {
        guard(&self.custom).get(user_name).cloned()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    fn fault(&self) -> Option<Fault> {
        *guard(&self.fault)
    }

    async fn check(&self) -> Result<(), StoreError> {
        match self.fault() {
            Some(Fault::Unavailable) => Err(StoreError::Database("connection refused".into())),
            Some(Fault::Stall) => {
                stall().await;
                Err(StoreError::Database("stalled".into()))
            }
            _ => Ok(()),
        }
    }
}

async fn stall() {
    tokio::time::sleep(Duration::from_secs(3600)).await;
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl UserStore for MemoryStore {
    fn stream_user<'a>(
        &'a self,
        user_name: &'a str,
        limit: i64,
    ) -> BoxStream<'a, Result<UserRecord, StoreError>> {
        match self.fault() {
            Some(Fault::Unavailable) => {
                return stream::once(async {
                    Err(StoreError::Database("connection refused".into()))
                })
                .boxed()
            }
            Some(Fault::Stall) => {
                return stream::once(async {
                    stall().await;
                    Err(StoreError::Database("stalled".into()))
                })
                .boxed()
            }
            _ => {}
        }

        let mut items: Vec<Result<UserRecord, StoreError>> = guard(&self.users)
            .iter()
            .filter(|record| record.user_name == user_name)
            .take(limit.max(0) as usize)
            .cloned()
            .map(Ok)
            .collect();

        if let Some(Fault::CorruptAfter(n)) = self.fault() {
            items.truncate(n);
            items.push(Err(StoreError::Decode("imageData is not an array".into())));
        }

        stream::iter(items).boxed()
    }

    async fn find_user(&self, user_name: &str) -> Result<UserRecord, StoreError> {
        self.check().await?;
        // Let concurrent callers interleave between lookup and write
        tokio::task::yield_now().await;

        guard(&self.users)
            .iter()
            .find(|record| record.user_name == user_name)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.check().await?;

        if self.fault() == Some(Fault::LoseInsertRace) {
            self.set_fault(None);
            guard(&self.users).push(UserRecord {
                user_name: record.user_name.clone(),
                images: vec![ImageEntry {
                    image: Some("racer".to_string()),
                    ..Default::default()
                }],
            });
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint for {}",
                record.user_name
            )));
        }

        let mut users = guard(&self.users);
        if users.iter().any(|existing| existing.user_name == record.user_name) {
            return Err(StoreError::Conflict(record.user_name.clone()));
        }
        users.push(record.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn replace_images(
        &self,
        user_name: &str,
        images: &[ImageEntry],
    ) -> Result<u64, StoreError> {
        self.check().await?;
        tokio::task::yield_now().await;

        if self.fault() == Some(Fault::VanishBeforeUpdate) {
            guard(&self.users).retain(|record| record.user_name != user_name);
            return Ok(0);
        }

        let mut users = guard(&self.users);
        match users.iter_mut().find(|record| record.user_name == user_name) {
            Some(record) => {
                record.images = images.to_vec();
                self.updates.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn save_custom_info(&self, info: &CustomInfo) -> Result<CustomInfo, StoreError> {
        self.check().await?;
        guard(&self.custom).insert(info.user_name.clone(), info.clone());
        Ok(info.clone())
    }

    async fn ping(&self) -> bool {
        !matches!(self.fault(), Some(Fault::Unavailable))
    }
}
