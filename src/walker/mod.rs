//! Parallel bucket enumeration engine
//!
//! This module implements breadth-first exploration of the pseudo-directory
//! tree an S3 bucket exposes through delimited listings.
//!
//! # Architecture
//!
//! ```text
//!                  ┌────────────────────────────┐
//!                  │        BucketWalker        │
//!                  │  - seeds the start prefix  │
//!                  │  - watches the counters    │
//!                  └─────────────┬──────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!  ┌─────▼─────┐           ┌─────▼─────┐           ┌─────▼─────┐
//!  │  Worker 1 │           │  Worker 2 │           │  Worker N │
//!  │  fetcher  │           │  fetcher  │           │  fetcher  │
//!  └─────┬─────┘           └─────┬─────┘           └─────┬─────┘
//!        │ child prefixes        │                       │
//!        └───────────────────────┼───────────────────────┘
//!                                ▼
//!                  ┌────────────────────────────┐
//!                  │       PendingQueue         │
//!                  │  unbounded ingress, pump,  │
//!                  │  bounded dispatch egress   │
//!                  └────────────────────────────┘
//!
//!  records: workers ──▶ forwarder ──▶ ObjectStream (consumer)
//! ```
//!
//! Termination is driven by two counters (outstanding prefixes, in-flight
//! objects) that are incremented before work is handed off and decremented
//! after it is fully processed; the walk is done when both read zero.

pub mod coordinator;
pub mod counters;
pub mod fetcher;
pub mod flat;
pub mod queue;
pub mod worker;

use tokio_stream::wrappers::ReceiverStream;

use crate::client::ObjectRecord;
use crate::error::WalkerError;

pub use coordinator::{BucketWalker, WalkStats};
pub use flat::list_flat;

/// One element of the output stream: a discovered object or a terminal
/// error sentinel.
pub type ListEvent = Result<ObjectRecord, WalkerError>;

/// Lazy, finite stream of listing results. Closed exactly once, after the
/// last record (or the terminal sentinel) has been delivered.
pub type ObjectStream = ReceiverStream<ListEvent>;
