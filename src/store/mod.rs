//! Object store access used by the restore engine.
//!
//! The engine only needs three calls against the store: list a prefix, read
//! an object's headers, and submit a restore request. Implementations must be
//! safe to call concurrently for different keys.

pub(crate) mod s3;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use thiserror::Error;

use crate::config::RestoreTier;

/// Storage classes that need a restore before they can be read, independent
/// of any archive-status header.
const GLACIER_CLASSES: &[&str] = &["GLACIER", "DEEP_ARCHIVE"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The service answered with an error code (AccessDenied, NoSuchKey, ...).
    #[error("{0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid request: {0}")]
    Request(String),
}

/// One entry of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub storage_class: Option<String>,
}

/// The parts of a head response the classifier and the ledger care about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Restore progress as reported by the `x-amz-restore` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreState {
    NotRequested,
    Ongoing,
    /// A temporary copy exists. `expiry` is `None` when the date did not parse.
    Completed { expiry: Option<DateTime<FixedOffset>> },
}

impl ObjectMetadata {
    /// Whether the object sits in an archive tier at all.
    pub fn is_archived(&self) -> bool {
        self.archive_status.is_some()
            || self
                .storage_class
                .as_deref()
                .is_some_and(|class| GLACIER_CLASSES.contains(&class))
    }

    /// Interprets a header like `ongoing-request="false", expiry-date="Fri, 21 Dec 2012 00:00:00 GMT"`.
    pub fn restore_state(&self) -> RestoreState {
        let Some(header) = self.restore.as_deref() else {
            return RestoreState::NotRequested;
        };

        if let Some(raw_expiry) = header_value(header, "expiry-date") {
            let expiry = DateTime::parse_from_rfc2822(raw_expiry).ok();
            return RestoreState::Completed { expiry };
        }

        match header_value(header, "ongoing-request") {
            Some("true") => RestoreState::Ongoing,
            _ => RestoreState::NotRequested,
        }
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// Pulls `name="value"` out of a restore header.
fn header_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    let start = header.find(&format!("{}=\"", name))? + name.len() + 2;
    let rest = &header[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists every object under `prefix`, following pagination to the end.
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ListedObject>, StoreError>;

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError>;

    /// Submits a restore request; success means the request was accepted.
    async fn restore(&self, bucket: &str, key: &str, tier: RestoreTier) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_restore(header: &str) -> ObjectMetadata {
        ObjectMetadata {
            archive_status: Some("ARCHIVE_ACCESS".to_string()),
            restore: Some(header.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_archive_indicator() {
        assert!(!ObjectMetadata::default().is_archived());

        let tiered = ObjectMetadata {
            storage_class: Some("INTELLIGENT_TIERING".to_string()),
            archive_status: Some("DEEP_ARCHIVE_ACCESS".to_string()),
            ..Default::default()
        };
        assert!(tiered.is_archived());

        let glacier = ObjectMetadata {
            storage_class: Some("GLACIER".to_string()),
            ..Default::default()
        };
        assert!(glacier.is_archived());

        let frequent = ObjectMetadata {
            storage_class: Some("INTELLIGENT_TIERING".to_string()),
            ..Default::default()
        };
        assert!(!frequent.is_archived());
    }

    #[test]
    fn test_restore_state_parsing() {
        assert_eq!(ObjectMetadata::default().restore_state(), RestoreState::NotRequested);
        assert_eq!(
            with_restore(r#"ongoing-request="true""#).restore_state(),
            RestoreState::Ongoing
        );

        match with_restore(r#"ongoing-request="false", expiry-date="Fri, 21 Dec 2012 00:00:00 GMT""#)
            .restore_state()
        {
            RestoreState::Completed { expiry } => {
                let expiry = expiry.expect("expiry should parse");
                assert_eq!(expiry.timestamp(), 1_356_048_000);
            }
            other => panic!("unexpected state {:?}", other),
        }

        assert_eq!(
            with_restore(r#"ongoing-request="false", expiry-date="garbage""#).restore_state(),
            RestoreState::Completed { expiry: None }
        );
    }

    #[test]
    fn test_metadata_json_skips_missing_fields() {
        let meta = ObjectMetadata {
            storage_class: Some("INTELLIGENT_TIERING".to_string()),
            archive_status: Some("ARCHIVE_ACCESS".to_string()),
            ..Default::default()
        };
        let json = meta.to_json().expect("metadata serializes");
        assert_eq!(
            json,
            r#"{"storage_class":"INTELLIGENT_TIERING","archive_status":"ARCHIVE_ACCESS"}"#
        );
    }
}
