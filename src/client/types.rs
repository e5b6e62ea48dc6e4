//! Wire types exchanged with an object store
//!
//! These mirror the subset of the ListObjectsV2 response the enumeration
//! engine consumes: object descriptors, common prefixes, and the
//! truncation/continuation pair.

use chrono::{DateTime, Utc};

/// Owner of an object, when the store returns one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectOwner {
    pub display_name: Option<String>,
    pub id: Option<String>,
}

/// One discovered object, as delivered to the consumer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRecord {
    /// Object key (required, non-empty)
    pub key: String,

    /// Entity tag, a hash of the object contents
    pub e_tag: Option<String>,

    /// Creation/modification time of the object
    pub last_modified: Option<DateTime<Utc>>,

    /// Size in bytes
    pub size: Option<i64>,

    /// Storage class tag (STANDARD, GLACIER, ...)
    pub storage_class: Option<String>,

    /// Object owner, if the store returned one
    pub owner: Option<ObjectOwner>,

    /// Checksum algorithms used when the object was created
    pub checksum_algorithms: Vec<String>,
}

impl ObjectRecord {
    /// A record carrying only a key. Metadata defaults to absent.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }
}

/// One response page for a (prefix, delimiter, continuation-token) request.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects at this level
    pub contents: Vec<ObjectRecord>,

    /// Child pseudo-directories one level down
    pub common_prefixes: Vec<String>,

    /// Whether more results remain for this request
    pub is_truncated: bool,

    /// Cursor for the next page; present whenever `is_truncated` is true
    pub next_continuation_token: Option<String>,
}

/// A single-page listing request.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub bucket: String,
    pub prefix: String,

    /// `Some("/")` for hierarchical listing, `None` for a flat scan
    pub delimiter: Option<String>,

    pub continuation_token: Option<String>,
}

impl PageRequest {
    /// Request the first page of a delimited listing.
    pub fn delimited(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            delimiter: Some("/".to_string()),
            continuation_token: None,
        }
    }
}
