//! Object store client abstraction
//!
//! The enumeration engine only needs one capability from the object store:
//! fetch a single listing page. [`ObjectStoreClient`] captures that
//! capability behind a trait so the engine can run against the real AWS SDK
//! ([`AwsObjectStore`]) or an in-memory synthetic tree ([`MockObjectStore`])
//! in tests.

use async_trait::async_trait;

use crate::error::ClientResult;

pub mod aws;
pub mod mock;
pub mod types;

pub use aws::AwsObjectStore;
pub use mock::MockObjectStore;
pub use types::{ObjectOwner, ObjectPage, ObjectRecord, PageRequest};

/// Single-page listing capability consumed by the engine.
///
/// Implementations must be safe for concurrent use: every worker calls
/// `list_page` in parallel through one shared instance.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Fetch one listing page for the given request.
    ///
    /// Transport failures are reported as
    /// [`ClientError::Transport`](crate::error::ClientError::Transport) and
    /// retried by the caller according to its retry policy.
    async fn list_page(&self, request: &PageRequest) -> ClientResult<ObjectPage>;
}
