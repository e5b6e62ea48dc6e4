//! Mock object store for testing
//!
//! Serves listing pages from a fixed set of keys, simulating the
//! delimiter/common-prefix semantics of ListObjectsV2. Supports injecting
//! transport failures and malformed pages so the engine's retry and
//! protocol-error paths can be exercised without a real bucket.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::client::types::{ObjectPage, ObjectRecord, PageRequest};
use crate::client::ObjectStoreClient;
use crate::error::{ClientError, ClientResult};

/// One element of a delimited listing, in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Entry {
    Key(String),
    CommonPrefix(String),
}

impl Entry {
    fn name(&self) -> &str {
        match self {
            Entry::Key(key) => key,
            Entry::CommonPrefix(prefix) => prefix,
        }
    }
}

/// In-memory object store serving a synthetic key tree.
pub struct MockObjectStore {
    /// All object keys in the bucket, sorted
    keys: Vec<String>,

    /// Entries per page; small values force pagination
    page_size: usize,

    /// Inject a transport error on this many leading calls
    fail_first: AtomicU32,

    /// Emit truncated pages without a continuation token
    malformed: bool,

    /// Total `list_page` calls observed
    calls: AtomicU64,
}

impl MockObjectStore {
    /// Build a store over the given keys with the S3 default page size.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        keys.sort();
        keys.dedup();

        Self {
            keys,
            page_size: 1_000,
            fail_first: AtomicU32::new(0),
            malformed: false,
            calls: AtomicU64::new(0),
        }
    }

    /// Use a smaller page size to force pagination.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        self.page_size = page_size;
        self
    }

    /// Fail the first `n` calls with a transport error, then recover.
    pub fn fail_first(self, n: u32) -> Self {
        self.fail_first.store(n, Ordering::SeqCst);
        self
    }

    /// Serve truncated pages with no continuation token.
    pub fn malformed_pages(mut self) -> Self {
        self.malformed = true;
        self
    }

    /// Number of `list_page` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// All entries for a (prefix, delimiter) pair, in listing order.
    fn entries_for(&self, prefix: &str, delimiter: Option<&str>) -> Vec<Entry> {
        let mut entries = Vec::new();

        for key in &self.keys {
            let Some(remainder) = key.strip_prefix(prefix) else {
                continue;
            };

            match delimiter.and_then(|d| remainder.find(d).map(|i| i + d.len())) {
                Some(end) => {
                    let child = format!("{}{}", prefix, &remainder[..end]);
                    // keys are sorted, so duplicates of a child prefix are adjacent
                    if entries.last() != Some(&Entry::CommonPrefix(child.clone())) {
                        entries.push(Entry::CommonPrefix(child));
                    }
                }
                None => entries.push(Entry::Key(key.clone())),
            }
        }

        entries.sort_by(|a, b| a.name().cmp(b.name()));
        entries
    }
}

#[async_trait]
impl ObjectStoreClient for MockObjectStore {
    async fn list_page(&self, request: &PageRequest) -> ClientResult<ObjectPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .fail_first
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(ClientError::transport("injected transport failure"));
        }

        let entries = self.entries_for(&request.prefix, request.delimiter.as_deref());

        let start = request
            .continuation_token
            .as_deref()
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);
        let end = (start + self.page_size).min(entries.len());

        let mut page = ObjectPage::default();
        for entry in &entries[start..end] {
            match entry {
                Entry::Key(key) => page.contents.push(ObjectRecord::with_key(key)),
                Entry::CommonPrefix(prefix) => page.common_prefixes.push(prefix.clone()),
            }
        }

        page.is_truncated = end < entries.len();
        if page.is_truncated && !self.malformed {
            page.next_continuation_token = Some(end.to_string());
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prefix: &str) -> PageRequest {
        PageRequest::delimited("test-bucket", prefix)
    }

    #[tokio::test]
    async fn test_root_listing_splits_keys_and_prefixes() {
        let store = MockObjectStore::new(["top.txt", "sub/x.txt", "sub/y.txt"]);

        let page = store.list_page(&request("")).await.unwrap();
        assert_eq!(page.contents.len(), 1);
        assert_eq!(page.contents[0].key, "top.txt");
        assert_eq!(page.common_prefixes, vec!["sub/"]);
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn test_child_prefix_listing() {
        let store = MockObjectStore::new(["top.txt", "sub/x.txt", "sub/y.txt"]);

        let page = store.list_page(&request("sub/")).await.unwrap();
        let keys: Vec<_> = page.contents.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["sub/x.txt", "sub/y.txt"]);
        assert!(page.common_prefixes.is_empty());
    }

    #[tokio::test]
    async fn test_pagination_unions_pages() {
        let store =
            MockObjectStore::new(["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]).with_page_size(2);

        let mut token = None;
        let mut keys = Vec::new();
        let mut pages = 0;
        loop {
            let mut req = request("");
            req.continuation_token = token.clone();
            let page = store.list_page(&req).await.unwrap();
            pages += 1;
            keys.extend(page.contents.iter().map(|r| r.key.clone()));
            if !page.is_truncated {
                break;
            }
            token = page.next_continuation_token;
            assert!(token.is_some());
        }

        assert_eq!(pages, 3);
        assert_eq!(keys, vec!["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
    }

    #[tokio::test]
    async fn test_flat_listing_ignores_hierarchy() {
        let store = MockObjectStore::new(["top.txt", "sub/x.txt", "sub/deep/z.txt"]);

        let mut req = request("");
        req.delimiter = None;
        let page = store.list_page(&req).await.unwrap();
        assert_eq!(page.contents.len(), 3);
        assert!(page.common_prefixes.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures_recover() {
        let store = MockObjectStore::new(["a.txt"]).fail_first(2);

        assert!(store.list_page(&request("")).await.is_err());
        assert!(store.list_page(&request("")).await.is_err());
        assert!(store.list_page(&request("")).await.is_ok());
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test]
    async fn test_malformed_page_has_no_token() {
        let store = MockObjectStore::new(["a.txt", "b.txt", "c.txt"])
            .with_page_size(1)
            .malformed_pages();

        let page = store.list_page(&request("")).await.unwrap();
        assert!(page.is_truncated);
        assert!(page.next_continuation_token.is_none());
    }
}
