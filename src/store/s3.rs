// bulkrestore/src/store/s3.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use s3::primitives::DateTimeFormat;
use s3::types::{GlacierJobParameters, RestoreRequest, Tier};
use tracing::debug;

use super::{ListedObject, ObjectMetadata, ObjectStore, StoreError};
use crate::config::{RestoreTier, StoreSettings};

/// `ObjectStore` backed by the AWS SDK. The client pools connections
/// internally and is shared by every worker.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: s3::Client,
}

impl S3Store {
    /// Builds a client either from explicit endpoint settings or from the
    /// default AWS environment (profile, env vars, instance metadata).
    pub async fn connect(settings: Option<&StoreSettings>) -> Self {
        let client = match settings {
            Some(settings) => {
                println!("Using S3 endpoint: {}", settings.endpoint_url);
                let sdk_config = aws_config::defaults(s3::config::BehaviorVersion::latest())
                    .endpoint_url(&settings.endpoint_url)
                    .region(Region::new(settings.region.clone()))
                    .credentials_provider(s3::config::Credentials::new(
                        &settings.access_key_id,
                        &settings.secret_access_key,
                        None,     // session_token
                        None,     // expiry
                        "Static", // provider_name
                    ))
                    .load()
                    .await;
                let s3_config = s3::config::Builder::from(&sdk_config)
                    .force_path_style(settings.force_path_style)
                    .build();
                s3::Client::from_conf(s3_config)
            }
            None => {
                let sdk_config = aws_config::defaults(s3::config::BehaviorVersion::latest())
                    .load()
                    .await;
                s3::Client::new(&sdk_config)
            }
        };
        S3Store { client }
    }
}

fn to_tier(tier: RestoreTier) -> Tier {
    match tier {
        RestoreTier::Standard => Tier::Standard,
        RestoreTier::Expedited => Tier::Expedited,
    }
}

/// Service errors keep their code (e.g. `AccessDenied`) so the ledger stays
/// readable; anything else keeps the full error chain.
fn store_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code().map(str::to_string) {
        Some(code) => StoreError::Rejected(code),
        None => StoreError::Transport(DisplayErrorContext(err).to_string()),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<ListedObject>, StoreError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        let mut page_count = 0usize;
        while let Some(page) = pages.next().await {
            let page = page.map_err(store_error)?;
            page_count += 1;
            objects.extend(page.contents().iter().filter_map(|object| {
                object.key().map(|key| ListedObject {
                    key: key.to_string(),
                    storage_class: object.storage_class().map(|c| c.as_str().to_string()),
                })
            }));
        }
        debug!(bucket, prefix, pages = page_count, objects = objects.len(), "Listed prefix");
        Ok(objects)
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMetadata, StoreError> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(store_error)?;

        Ok(ObjectMetadata {
            storage_class: output.storage_class().map(|c| c.as_str().to_string()),
            archive_status: output.archive_status().map(|s| s.as_str().to_string()),
            restore: output.restore().map(str::to_string),
            content_length: output.content_length(),
            e_tag: output.e_tag().map(str::to_string),
            last_modified: output
                .last_modified()
                .and_then(|t| t.fmt(DateTimeFormat::DateTime).ok()),
        })
    }

    async fn restore(&self, bucket: &str, key: &str, tier: RestoreTier) -> Result<(), StoreError> {
        let job = GlacierJobParameters::builder()
            .tier(to_tier(tier))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let request = RestoreRequest::builder().glacier_job_parameters(job).build();

        self.client
            .restore_object()
            .bucket(bucket)
            .key(key)
            .restore_request(request)
            .send()
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_mapping() {
        assert_eq!(to_tier(RestoreTier::Standard), Tier::Standard);
        assert_eq!(to_tier(RestoreTier::Expedited), Tier::Expedited);
    }
}
