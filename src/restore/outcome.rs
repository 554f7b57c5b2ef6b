// bulkrestore/src/restore/outcome.rs
use serde::Serialize;
use std::fmt;

use crate::store::ObjectMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestoreStatus {
    /// Readable now: never archived, or a restored copy exists.
    Restored,
    InProgress,
    /// A restore request was accepted during this run.
    Requested,
    Error,
}

impl RestoreStatus {
    /// Report order for the summary table.
    pub const ALL: [RestoreStatus; 4] = [
        RestoreStatus::Requested,
        RestoreStatus::InProgress,
        RestoreStatus::Restored,
        RestoreStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreStatus::Restored => "RESTORED",
            RestoreStatus::InProgress => "IN_PROGRESS",
            RestoreStatus::Requested => "REQUESTED",
            RestoreStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for RestoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one key. `message` and `metadata` are only set for errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub key: String,
    pub status: RestoreStatus,
    pub message: Option<String>,
    pub metadata: Option<ObjectMetadata>,
}

impl RestoreOutcome {
    pub fn restored(key: impl Into<String>) -> Self {
        Self::ok(key, RestoreStatus::Restored)
    }

    pub fn in_progress(key: impl Into<String>) -> Self {
        Self::ok(key, RestoreStatus::InProgress)
    }

    pub fn requested(key: impl Into<String>) -> Self {
        Self::ok(key, RestoreStatus::Requested)
    }

    pub fn error(
        key: impl Into<String>,
        message: impl Into<String>,
        metadata: Option<ObjectMetadata>,
    ) -> Self {
        RestoreOutcome {
            key: key.into(),
            status: RestoreStatus::Error,
            message: Some(message.into()),
            metadata,
        }
    }

    fn ok(key: impl Into<String>, status: RestoreStatus) -> Self {
        RestoreOutcome {
            key: key.into(),
            status,
            message: None,
            metadata: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == RestoreStatus::Error
    }
}
