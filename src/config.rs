//! Configuration types for s3-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration for the enumeration engine, with validation
//! - The credential source handed to the AWS client

use crate::error::ConfigError;
use clap::Parser;
use std::time::Duration;

/// Default number of listing workers
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Minimum number of listing workers
pub const MIN_CONCURRENCY: usize = 1;

/// Default capacity of the record and output channels
pub const DEFAULT_RECORD_BUFFER: usize = 1_000;

/// Parallel S3 bucket enumerator
#[derive(Parser, Debug, Clone)]
#[command(
    name = "s3-walker",
    version,
    about = "Parallel S3 bucket enumerator",
    long_about = "Enumerates the objects in an S3-compatible bucket and prints their keys.\n\n\
                  The bucket is treated as a directory tree: a pool of workers explores\n\
                  common prefixes concurrently, so wide buckets list much faster than a\n\
                  single paginated scan.",
    after_help = "EXAMPLES:\n    \
        s3-walker my-bucket\n    \
        s3-walker my-bucket -p logs/2024/ -c 16\n    \
        s3-walker my-bucket --flat --profile staging\n    \
        s3-walker my-bucket --endpoint-url http://127.0.0.1:9000"
)]
pub struct CliArgs {
    /// Bucket to enumerate
    #[arg(value_name = "BUCKET")]
    pub bucket: String,

    /// Start prefix within the bucket
    #[arg(short = 'p', long, default_value = "", value_name = "PREFIX")]
    pub prefix: String,

    /// Number of concurrent listing workers
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY, value_name = "NUM")]
    pub concurrency: usize,

    /// Scan the prefix flat (no delimiter, single pagination loop)
    #[arg(long)]
    pub flat: bool,

    /// AWS profile to load credentials from
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// AWS region
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Custom endpoint for S3-compatible object stores
    #[arg(long, value_name = "URL")]
    pub endpoint_url: Option<String>,

    /// Bound transport retries per page instead of retrying forever
    #[arg(long, value_name = "NUM")]
    pub max_retries: Option<u32>,

    /// Quiet mode - suppress the run summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-prefix progress)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Credential source for the AWS client
    pub fn credential_source(&self) -> CredentialSource {
        match &self.profile {
            Some(name) => CredentialSource::Profile(name.clone()),
            None => CredentialSource::Environment,
        }
    }

    /// Engine configuration from the parsed arguments
    pub fn list_config(&self) -> ListConfig {
        let mut config = ListConfig::new(&self.bucket)
            .with_prefix(&self.prefix)
            .with_concurrency(self.concurrency);

        if let Some(attempts) = self.max_retries {
            config = config.with_retry_policy(RetryPolicy::Limited {
                attempts,
                backoff: Duration::from_millis(100),
            });
        }

        config
    }
}

/// Where the AWS client obtains credentials.
///
/// Passed opaquely to [`AwsObjectStore`](crate::client::AwsObjectStore);
/// the enumeration engine never inspects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Ambient environment: env vars, instance metadata, default profile
    #[default]
    Environment,

    /// A named profile from the shared AWS config files
    Profile(String),
}

/// Retry policy for fetching a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Retry transport errors forever. This is the historical behavior;
    /// a failure is never surfaced to the consumer.
    Unbounded,

    /// Retry up to `attempts` times with exponential backoff starting at
    /// `backoff`, then surface the transport error as a terminal sentinel.
    Limited { attempts: u32, backoff: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::Unbounded
    }
}

/// Validated configuration for one enumeration run
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Bucket to enumerate (required, non-empty)
    pub bucket: String,

    /// Start prefix; a leading '/' is stripped before use
    pub prefix: String,

    /// Number of listing workers
    pub concurrency: usize,

    /// Transport retry policy for single-page fetches
    pub retry_policy: RetryPolicy,

    /// Capacity of the record and output channels
    pub record_buffer: usize,
}

impl ListConfig {
    /// Create a configuration with defaults for everything but the bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: String::new(),
            concurrency: DEFAULT_CONCURRENCY,
            retry_policy: RetryPolicy::default(),
            record_buffer: DEFAULT_RECORD_BUFFER,
        }
    }

    /// Set the start prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the worker count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the transport retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set the record/output channel capacity.
    pub fn with_record_buffer(mut self, capacity: usize) -> Self {
        self.record_buffer = capacity;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::EmptyBucket);
        }

        if self.concurrency < MIN_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency {
                given: self.concurrency,
                min: MIN_CONCURRENCY,
            });
        }

        if self.record_buffer == 0 {
            return Err(ConfigError::InvalidCapacity {
                given: self.record_buffer,
                min: 1,
            });
        }

        Ok(())
    }

    /// The prefix the walk actually starts from, with any leading '/'
    /// stripped. S3 keys do not start with the delimiter.
    pub fn start_prefix(&self) -> String {
        self.prefix.trim_start_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ListConfig::new("my-bucket");
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.retry_policy, RetryPolicy::Unbounded);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let config = ListConfig::new("");
        assert_eq!(config.validate(), Err(ConfigError::EmptyBucket));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = ListConfig::new("my-bucket").with_concurrency(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency { given: 0, min: 1 })
        );
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = ListConfig::new("my-bucket").with_record_buffer(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCapacity { given: 0, .. })
        ));
    }

    #[test]
    fn test_leading_slash_stripped() {
        let config = ListConfig::new("my-bucket").with_prefix("/logs/2024/");
        assert_eq!(config.start_prefix(), "logs/2024/");

        let config = ListConfig::new("my-bucket").with_prefix("//double");
        assert_eq!(config.start_prefix(), "double");

        let config = ListConfig::new("my-bucket");
        assert_eq!(config.start_prefix(), "");
    }

    #[test]
    fn test_cli_to_config() {
        let args = CliArgs::parse_from(["s3-walker", "my-bucket", "-p", "/data/", "-c", "8"]);
        let config = args.list_config();
        assert_eq!(config.bucket, "my-bucket");
        assert_eq!(config.start_prefix(), "data/");
        assert_eq!(config.concurrency, 8);
        assert_eq!(args.credential_source(), CredentialSource::Environment);
    }

    #[test]
    fn test_cli_bounded_retries() {
        let args = CliArgs::parse_from(["s3-walker", "b", "--max-retries", "4"]);
        let config = args.list_config();
        assert!(matches!(
            config.retry_policy,
            RetryPolicy::Limited { attempts: 4, .. }
        ));
    }
}
