// bulkrestore/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::AppError;

pub const DEFAULT_MAX_WORKERS: usize = 8;
/// Upper bound on concurrent store calls; beyond this the API throttles anyway.
pub const MAX_WORKERS_LIMIT: usize = 256;
pub const DEFAULT_LOG_PATH: &str = "output.csv";
pub const DEFAULT_ARCHIVE_STORAGE_CLASS: &str = "INTELLIGENT_TIERING";

/// Retrieval priority for a restore request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreTier {
    /// Slow and cheap. Use this for anything large.
    #[default]
    Standard,
    /// Fast and expensive. Small batches or emergencies only.
    Expedited,
}

impl RestoreTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreTier::Standard => "Standard",
            RestoreTier::Expedited => "Expedited",
        }
    }
}

impl fmt::Display for RestoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RestoreTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(RestoreTier::Standard),
            "expedited" => Ok(RestoreTier::Expedited),
            other => Err(format!(
                "unknown restore tier '{}', expected Standard or Expedited",
                other
            )),
        }
    }
}

/// Include/exclude substrings, normalized into sets before they reach the filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub include: BTreeSet<String>,
    pub exclude: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        FilterSpec {
            include: normalize(include),
            exclude: normalize(exclude),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

fn normalize<T>(values: T) -> BTreeSet<String>
where
    T: IntoIterator,
    T::Item: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Where the candidate keys for a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// List everything under this prefix.
    Prefix(String),
    /// Replay the ERROR rows of an earlier restore log.
    Log(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub bucket: String,
    pub source: CandidateSource,
    pub filters: FilterSpec,
    pub tier: RestoreTier,
    pub max_workers: usize,
    pub log_path: PathBuf,
    pub retry_once: bool,
    pub archive_storage_class: String,
}

impl RunConfig {
    pub fn new(bucket: impl Into<String>, source: CandidateSource) -> Self {
        RunConfig {
            bucket: bucket.into(),
            source,
            filters: FilterSpec::default(),
            tier: RestoreTier::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            retry_once: false,
            archive_storage_class: DEFAULT_ARCHIVE_STORAGE_CLASS.to_string(),
        }
    }

    /// Rejects settings the run cannot sensibly start with.
    pub fn validate(&self) -> std::result::Result<(), AppError> {
        if self.bucket.trim().is_empty() {
            return Err(AppError::Config("bucket name cannot be empty".to_string()));
        }
        if !(1..=MAX_WORKERS_LIMIT).contains(&self.max_workers) {
            return Err(AppError::Config(format!(
                "worker count must be between 1 and {}, got {}",
                MAX_WORKERS_LIMIT, self.max_workers
            )));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(AppError::Config("log path cannot be empty".to_string()));
        }
        if self.archive_storage_class.trim().is_empty() {
            return Err(AppError::Config(
                "archive storage class cannot be empty".to_string(),
            ));
        }
        if let CandidateSource::Log(path) = &self.source {
            if path == &self.log_path {
                return Err(AppError::Config(format!(
                    "replay log {} would be overwritten by the new restore log; pass a different --log",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

// Structs for deserializing the optional store settings file
#[derive(Debug, Clone, Deserialize)]
pub struct JsonS3StorageConfig {
    pub endpoint_url: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    pub s3_storage: Option<JsonS3StorageConfig>,
}

/// Explicit connection to an S3-compatible endpoint. Without one the default
/// AWS credential and region chain is used.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub endpoint_url: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub force_path_style: bool,
}

impl StoreSettings {
    pub fn load_from_json(config_path: &Path) -> Result<Option<Self>> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        Self::from_json_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }

    fn from_json_str(content: &str) -> Result<Option<Self>> {
        let raw: RawJsonConfig = serde_json::from_str(content)?;
        let Some(s3_raw) = raw.s3_storage else {
            return Ok(None);
        };

        if let (Some(endpoint), Some(region), Some(key_id), Some(secret)) = (
            s3_raw.endpoint_url.as_ref().filter(|s| !s.is_empty()),
            s3_raw.region.as_ref().filter(|s| !s.is_empty()),
            s3_raw.access_key_id.as_ref().filter(|s| !s.is_empty()),
            s3_raw.secret_access_key.as_ref().filter(|s| !s.is_empty()),
        ) {
            url::Url::parse(endpoint)
                .with_context(|| format!("Invalid endpoint_url in s3_storage: {}", endpoint))?;
            Ok(Some(StoreSettings {
                endpoint_url: endpoint.clone(),
                region: region.clone(),
                access_key_id: key_id.clone(),
                secret_access_key: secret.clone(),
                force_path_style: s3_raw.force_path_style,
            }))
        } else {
            println!(
                "⚠️ s3_storage is present in the config file but some required fields (endpoint_url, region, access_key_id, secret_access_key) are missing or empty. Falling back to the default AWS credential chain."
            );
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig::new("bucket", CandidateSource::Prefix("plates/".to_string()))
    }

    #[test]
    fn test_tier_parses_case_insensitively() {
        assert_eq!("Standard".parse::<RestoreTier>(), Ok(RestoreTier::Standard));
        assert_eq!("expedited".parse::<RestoreTier>(), Ok(RestoreTier::Expedited));
        assert_eq!(" EXPEDITED ".parse::<RestoreTier>(), Ok(RestoreTier::Expedited));
        assert!("Bulk-ish".parse::<RestoreTier>().is_err());
        assert_eq!(RestoreTier::default(), RestoreTier::Standard);
    }

    #[test]
    fn test_filter_spec_normalizes_values() {
        let spec = FilterSpec::new(["ch1", "ch2", "ch1", ""], Vec::<String>::new());
        assert_eq!(spec.include.len(), 2);
        assert!(spec.exclude.is_empty());
        assert!(!spec.is_empty());
        assert!(FilterSpec::new(Vec::<&str>::new(), [""]).is_empty());
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = config();
        assert_eq!(cfg.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(cfg.log_path, PathBuf::from("output.csv"));
        assert_eq!(cfg.archive_storage_class, "INTELLIGENT_TIERING");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_worker_count_bounds() {
        let mut cfg = config();
        cfg.max_workers = 0;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        cfg.max_workers = MAX_WORKERS_LIMIT + 1;
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        cfg.max_workers = 1;
        assert!(cfg.validate().is_ok());
        cfg.max_workers = MAX_WORKERS_LIMIT;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_replay_log_cannot_be_output_log() {
        let mut cfg = RunConfig::new("bucket", CandidateSource::Log(PathBuf::from("output.csv")));
        assert!(matches!(cfg.validate(), Err(AppError::Config(_))));

        cfg.log_path = PathBuf::from("second.csv");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_store_settings_complete() -> anyhow::Result<()> {
        let json = r#"{
            "s3_storage": {
                "endpoint_url": "https://minio.internal:9000",
                "region": "us-east-1",
                "access_key_id": "key",
                "secret_access_key": "secret",
                "force_path_style": true
            }
        }"#;
        let settings = StoreSettings::from_json_str(json)?.expect("settings should load");
        assert_eq!(settings.endpoint_url, "https://minio.internal:9000");
        assert!(settings.force_path_style);
        Ok(())
    }

    #[test]
    fn test_store_settings_incomplete_or_missing() -> anyhow::Result<()> {
        assert!(StoreSettings::from_json_str("{}")?.is_none());
        let partial = r#"{ "s3_storage": { "region": "us-east-1" } }"#;
        assert!(StoreSettings::from_json_str(partial)?.is_none());
        Ok(())
    }

    #[test]
    fn test_store_settings_rejects_bad_endpoint() {
        let json = r#"{
            "s3_storage": {
                "endpoint_url": "not a url",
                "region": "us-east-1",
                "access_key_id": "key",
                "secret_access_key": "secret"
            }
        }"#;
        assert!(StoreSettings::from_json_str(json).is_err());
    }
}
