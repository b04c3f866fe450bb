//! Merger: create-or-merge a user's image list
//!
//! Identity is the `image` reference alone. Incoming entries that match an
//! existing one overwrite it in place; the rest are appended in order. The
//! merged list replaces the stored list wholesale.
//!
//! Lookup and write for one user name run under a per-key lock, so two
//! merges for the same user inside this process cannot lose each other's
//! entries. If another process creates the record between our lookup and
//! insert, the unique key rejects the insert and the merge is retried once
//! as an update.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::user::{ImageEntry, MergeOutcome, UserRecord};
use crate::services::key_lock::KeyedLocks;
use crate::services::metrics;
use crate::services::store::{self, StoreError, UserStore};

/// Attempts at lookup-then-write when an insert loses a creation race
const MAX_ATTEMPTS: usize = 2;

/// What a merge did to the stored list
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub updated: usize,
    pub appended: usize,
}

/// Merge `incoming` into `existing` by `image` reference.
///
/// Matching entries keep their position and `image_name`; new ones go to the
/// end. Entries already duplicated in `existing` are left alone; only the
/// first match is updated.
pub fn merge_images(existing: &mut Vec<ImageEntry>, incoming: &[ImageEntry]) -> MergeStats {
    let mut stats = MergeStats::default();

    for entry in incoming {
        match existing.iter_mut().find(|current| current.same_image(entry)) {
            Some(current) => {
                current.overwrite_from(entry);
                stats.updated += 1;
                debug!(image = ?entry.image, "Updated image entry");
            }
            None => {
                existing.push(entry.clone());
                stats.appended += 1;
                debug!(image = ?entry.image, "Appended new image entry");
            }
        }
    }

    stats
}

#[derive(Clone)]
pub struct Merger {
    store: Arc<dyn UserStore>,
    locks: KeyedLocks,
    timeout: Duration,
}

impl Merger {
    pub fn new(store: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            timeout,
        }
    }

    /// Create the user's record, or merge `incoming` into the stored one
    #[tracing::instrument(skip_all, fields(user_name = %incoming.user_name))]
    pub async fn merge(&self, incoming: UserRecord) -> Result<MergeOutcome, AppError> {
        if incoming.user_name.is_empty() {
            return Err(AppError::InvalidInput("userName is required".to_string()));
        }

        let _guard = self.locks.lock(&incoming.user_name).await;

        match self.merge_locked(&incoming).await {
            Ok(outcome) => {
                metrics::record_request("merge", &outcome.to_string());
                Ok(outcome)
            }
            Err(e) => {
                metrics::record_request("merge", "error");
                Err(match e {
                    // A lookup miss is handled above; anything still NotFound here is a store fault
                    StoreError::NotFound => AppError::Internal(e.to_string()),
                    other => other.into(),
                })
            }
        }
    }

    async fn merge_locked(&self, incoming: &UserRecord) -> Result<MergeOutcome, StoreError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let lookup = store::bounded(
                "find_user",
                self.timeout,
                self.store.find_user(&incoming.user_name),
            )
            .await;

            match lookup {
                Ok(existing) => return self.update(existing, incoming).await,
                Err(StoreError::NotFound) => match self.create(incoming).await {
                    Err(StoreError::Conflict(reason)) if attempt < MAX_ATTEMPTS => {
                        warn!("Insert lost a creation race, retrying as update: {}", reason);
                    }
                    result => return result,
                },
                Err(e) => return Err(e),
            }
        }
    }

    async fn create(&self, incoming: &UserRecord) -> Result<MergeOutcome, StoreError> {
        store::bounded("insert_user", self.timeout, self.store.insert_user(incoming)).await?;

        info!(images = incoming.images.len(), "New user entry created");
        Ok(MergeOutcome::Created)
    }

    async fn update(
        &self,
        mut existing: UserRecord,
        incoming: &UserRecord,
    ) -> Result<MergeOutcome, StoreError> {
        let stats = merge_images(&mut existing.images, &incoming.images);

        let matched = store::bounded(
            "replace_images",
            self.timeout,
            self.store
                .replace_images(&incoming.user_name, &existing.images),
        )
        .await?;

        if matched == 0 {
            return Err(StoreError::NoMatch(incoming.user_name.clone()));
        }

        info!(
            updated = stats.updated,
            appended = stats.appended,
            total = existing.images.len(),
            "User entry updated"
        );
        Ok(MergeOutcome::Updated)
    }
}
