//! In-memory `ObjectStore` for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ListedObject, ObjectMetadata, ObjectStore, StoreError};
use crate::config::RestoreTier;

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Vec<(String, ObjectMetadata)>,
    head_failures: HashMap<String, StoreError>,
    /// Remaining failures per key; each failed submission consumes one.
    restore_failures: Mutex<HashMap<String, (StoreError, usize)>>,
    submissions: Mutex<Vec<(String, RestoreTier)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: &str, metadata: ObjectMetadata) -> Self {
        self.objects.push((key.to_string(), metadata));
        self
    }

    /// Intelligent-Tiering object sitting in an archive tier, no restore yet.
    pub fn with_archived(self, key: &str) -> Self {
        self.with_object(key, archived(None))
    }

    pub fn with_head_failure(mut self, key: &str, error: StoreError) -> Self {
        self.head_failures.insert(key.to_string(), error);
        self
    }

    pub fn with_restore_failure(self, key: &str, error: StoreError, times: usize) -> Self {
        if let Ok(mut failures) = self.restore_failures.lock() {
            failures.insert(key.to_string(), (error, times));
        }
        self
    }

    pub fn submissions(&self) -> Vec<(String, RestoreTier)> {
        self.submissions.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

pub fn archived(restore: Option<&str>) -> ObjectMetadata {
    ObjectMetadata {
        storage_class: Some("INTELLIGENT_TIERING".to_string()),
        archive_status: Some("ARCHIVE_ACCESS".to_string()),
        restore: restore.map(str::to_string),
        ..Default::default()
    }
}

pub fn plain(storage_class: &str) -> ObjectMetadata {
    ObjectMetadata {
        storage_class: Some(storage_class.to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, _bucket: &str, prefix: &str) -> Result<Vec<ListedObject>, StoreError> {
        Ok(self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, meta)| ListedObject {
                key: key.clone(),
                storage_class: meta.storage_class.clone(),
            })
            .collect())
    }

    async fn head(&self, _bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        if let Some(err) = self.head_failures.get(key) {
            return Err(err.clone());
        }
        self.objects
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, meta)| meta.clone())
            .ok_or_else(|| StoreError::Rejected("NoSuchKey".to_string()))
    }

    async fn restore(&self, _bucket: &str, key: &str, tier: RestoreTier) -> Result<(), StoreError> {
        if let Ok(mut submissions) = self.submissions.lock() {
            submissions.push((key.to_string(), tier));
        }
        let mut failures = self
            .restore_failures
            .lock()
            .map_err(|_| StoreError::Transport("poisoned".to_string()))?;
        if let Some((err, remaining)) = failures.get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(err.clone());
            }
        }
        Ok(())
    }
}
