//! s3-walker - Parallel S3 Bucket Enumerator
//!
//! A library (and small CLI) for enumerating the objects in an
//! S3-compatible bucket and streaming them to a consumer as a lazy
//! sequence.
//!
//! # Features
//!
//! - **Parallel Hierarchical Walk**: the bucket is treated as a directory
//!   tree via delimited listings; a pool of workers explores common
//!   prefixes concurrently, so wide buckets enumerate far faster than a
//!   single paginated scan.
//!
//! - **Streaming Output**: results are delivered as a finite stream of
//!   `Result<ObjectRecord, WalkerError>`; the consumer reads at its own
//!   pace and backpressure propagates to the workers.
//!
//! - **Clean Termination**: outstanding work is tracked by a pair of
//!   counters incremented before hand-off and decremented after delivery;
//!   the stream closes exactly once, when both reach zero.
//!
//! - **Pluggable Object Store**: the engine consumes a single-page listing
//!   trait, implemented for the AWS SDK and for an in-memory mock.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use s3_walker::client::AwsObjectStore;
//! use s3_walker::config::{CredentialSource, ListConfig};
//! use s3_walker::walker::BucketWalker;
//! use tokio_stream::StreamExt;
//!
//! # async fn run() {
//! let store = Arc::new(
//!     AwsObjectStore::connect(&CredentialSource::Environment, None, None).await,
//! );
//! let config = ListConfig::new("my-bucket").with_prefix("logs/").with_concurrency(16);
//!
//! let mut stream = BucketWalker::new(store, config).start();
//! while let Some(event) = stream.next().await {
//!     match event {
//!         Ok(record) => println!("{}", record.key),
//!         Err(error) => eprintln!("walk failed: {error}"),
//!     }
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod walker;

pub use client::{AwsObjectStore, MockObjectStore, ObjectOwner, ObjectPage, ObjectRecord,
    ObjectStoreClient, PageRequest};
pub use config::{CredentialSource, ListConfig, RetryPolicy};
pub use error::{ClientError, ConfigError, Result, WalkerError};
pub use walker::{list_flat, BucketWalker, ListEvent, ObjectStream, WalkStats};
