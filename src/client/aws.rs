//! AWS SDK implementation of the object store client
//!
//! Thin adapter over `aws_sdk_s3::Client::list_objects_v2`. All retry and
//! pagination logic lives in the engine; this module only translates one
//! request/response pair.

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::Region;
use tracing::debug;

use crate::client::types::{ObjectOwner, ObjectPage, ObjectRecord, PageRequest};
use crate::client::ObjectStoreClient;
use crate::config::CredentialSource;
use crate::error::{ClientError, ClientResult};

/// Object store client backed by the AWS SDK for S3.
pub struct AwsObjectStore {
    client: aws_sdk_s3::Client,
}

impl AwsObjectStore {
    /// Wrap an already-configured SDK client.
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Build a client from a credential source plus optional region and
    /// endpoint overrides. The endpoint override enables path-style
    /// addressing, which S3-compatible stores generally require.
    pub async fn connect(
        source: &CredentialSource,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        let region_provider = RegionProviderChain::first_try(region.map(Region::new))
            .or_default_provider()
            .or_else("us-east-1");

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region_provider);

        if let CredentialSource::Profile(name) = source {
            debug!(profile = %name, "loading credentials from profile");
            loader = loader.profile_name(name);
        }

        if let Some(url) = &endpoint_url {
            loader = loader.endpoint_url(url);
        }

        let shared = loader.load().await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(endpoint_url.is_some())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(config),
        }
    }
}

#[async_trait]
impl ObjectStoreClient for AwsObjectStore {
    async fn list_page(&self, request: &PageRequest) -> ClientResult<ObjectPage> {
        let mut call = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix);

        if let Some(delimiter) = &request.delimiter {
            call = call.delimiter(delimiter);
        }
        if let Some(token) = &request.continuation_token {
            call = call.continuation_token(token);
        }

        let output = call.send().await.map_err(|e| {
            // The service error carries the useful detail; DisplayErrorContext
            // flattens the whole chain into one line.
            ClientError::transport(format!(
                "{}",
                aws_sdk_s3::error::DisplayErrorContext(&e)
            ))
        })?;

        Ok(ObjectPage {
            contents: output.contents().iter().map(record_from_sdk).collect(),
            common_prefixes: output
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_string))
                .collect(),
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }
}

fn record_from_sdk(object: &aws_sdk_s3::types::Object) -> ObjectRecord {
    ObjectRecord {
        key: object.key().unwrap_or_default().to_string(),
        e_tag: object.e_tag().map(str::to_string),
        last_modified: object
            .last_modified()
            .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
        size: object.size(),
        storage_class: object.storage_class().map(|c| c.as_str().to_string()),
        owner: object.owner().map(|o| ObjectOwner {
            display_name: o.display_name().map(str::to_string),
            id: o.id().map(str::to_string),
        }),
        checksum_algorithms: object
            .checksum_algorithm()
            .iter()
            .map(|a| a.as_str().to_string())
            .collect(),
    }
}
