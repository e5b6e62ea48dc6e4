//! Single-prefix page fetcher with retry
//!
//! Wraps the object store client's one-page capability with the configured
//! retry policy and response validation. Transport errors are treated as
//! transient; a malformed page (truncated but no continuation token) is
//! fatal because pagination cannot continue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::client::types::{ObjectPage, PageRequest};
use crate::client::ObjectStoreClient;
use crate::config::RetryPolicy;
use crate::error::{Result, WalkerError};
use crate::walker::coordinator::WalkStats;

/// Cap on the exponential backoff multiplier (2^10 steps).
const MAX_BACKOFF_SHIFT: u32 = 10;

/// Fetches listing pages for one bucket, retrying per policy.
pub struct PageFetcher {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    delimiter: Option<String>,
    retry_policy: RetryPolicy,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WalkStats>,
}

impl PageFetcher {
    pub fn new(
        client: Arc<dyn ObjectStoreClient>,
        bucket: String,
        delimiter: Option<String>,
        retry_policy: RetryPolicy,
        shutdown: Arc<AtomicBool>,
        stats: Arc<WalkStats>,
    ) -> Self {
        Self {
            client,
            bucket,
            delimiter,
            retry_policy,
            shutdown,
            stats,
        }
    }

    /// Fetch one page for `prefix`, resuming at `continuation_token`.
    ///
    /// Retries transport errors according to the retry policy, checking the
    /// shutdown flag between attempts. Non-transient client errors, retry
    /// exhaustion, and malformed pages are returned to the caller.
    pub async fn fetch_page(
        &self,
        prefix: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage> {
        let request = PageRequest {
            bucket: self.bucket.clone(),
            prefix: prefix.to_string(),
            delimiter: self.delimiter.clone(),
            continuation_token: continuation_token.map(str::to_string),
        };

        let mut attempt: u32 = 0;
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(WalkerError::Cancelled);
            }

            match self.client.list_page(&request).await {
                Ok(page) => {
                    self.stats.record_page();
                    return validate_page(page, prefix);
                }
                Err(error) if error.is_transient() => {
                    attempt += 1;
                    self.stats.record_retry();
                    warn!(
                        prefix = %prefix,
                        attempt = attempt,
                        error = %error,
                        "page fetch failed, retrying"
                    );

                    match self.retry_policy {
                        // Retry immediately, but let other tasks run between
                        // attempts so a spinning fetcher cannot starve them.
                        RetryPolicy::Unbounded => tokio::task::yield_now().await,
                        RetryPolicy::Limited { attempts, backoff } => {
                            if attempt >= attempts {
                                return Err(WalkerError::Client(error));
                            }
                            tokio::time::sleep(backoff_delay(backoff, attempt)).await;
                        }
                    }
                }
                Err(error) => return Err(WalkerError::Client(error)),
            }
        }
    }
}

/// Exponential backoff: `backoff * 2^(attempt - 1)`, shift-capped.
fn backoff_delay(backoff: Duration, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    backoff.saturating_mul(1u32 << shift)
}

/// A truncated page without a continuation token cannot be resumed.
fn validate_page(page: ObjectPage, prefix: &str) -> Result<ObjectPage> {
    if page.is_truncated && page.next_continuation_token.is_none() {
        return Err(WalkerError::Protocol {
            prefix: prefix.to_string(),
            reason: "page marked truncated but no continuation token returned".into(),
        });
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockObjectStore;

    fn fetcher_over(store: MockObjectStore, policy: RetryPolicy) -> PageFetcher {
        PageFetcher::new(
            Arc::new(store),
            "test-bucket".into(),
            Some("/".into()),
            policy,
            Arc::new(AtomicBool::new(false)),
            Arc::new(WalkStats::default()),
        )
    }

    #[tokio::test]
    async fn test_unbounded_retries_until_success() {
        let store = MockObjectStore::new(["a.txt"]).fail_first(3);
        let fetcher = fetcher_over(store, RetryPolicy::Unbounded);

        let page = fetcher.fetch_page("", None).await.unwrap();
        assert_eq!(page.contents.len(), 1);
        assert_eq!(fetcher.stats.retries(), 3);
    }

    #[tokio::test]
    async fn test_limited_policy_surfaces_exhaustion() {
        let store = MockObjectStore::new(["a.txt"]).fail_first(10);
        let fetcher = fetcher_over(
            store,
            RetryPolicy::Limited {
                attempts: 2,
                backoff: Duration::from_millis(1),
            },
        );

        let error = fetcher.fetch_page("", None).await.unwrap_err();
        assert!(matches!(error, WalkerError::Client(_)));
    }

    #[tokio::test]
    async fn test_malformed_page_is_protocol_error() {
        let store = MockObjectStore::new(["a.txt", "b.txt"])
            .with_page_size(1)
            .malformed_pages();
        let fetcher = fetcher_over(store, RetryPolicy::Unbounded);

        let error = fetcher.fetch_page("", None).await.unwrap_err();
        assert!(matches!(error, WalkerError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_stops_retry_loop() {
        let store = MockObjectStore::new(["a.txt"]).fail_first(u32::MAX);
        let mut fetcher = fetcher_over(store, RetryPolicy::Unbounded);
        let shutdown = Arc::new(AtomicBool::new(false));
        fetcher.shutdown = Arc::clone(&shutdown);

        let handle = tokio::spawn(async move { fetcher.fetch_page("", None).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.store(true, Ordering::SeqCst);

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("fetcher did not observe shutdown")
            .unwrap();
        assert!(matches!(result, Err(WalkerError::Cancelled)));
    }

    #[test]
    fn test_backoff_growth_is_capped() {
        let base = Duration::from_millis(10);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(10));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(40));
        assert_eq!(backoff_delay(base, 60), base * 1024);
    }
}
