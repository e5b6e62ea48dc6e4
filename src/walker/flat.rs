//! Flat single-prefix lister
//!
//! The degenerate variant of the walk: no delimiter, one pagination loop,
//! no worker pool. The object store returns every key under the prefix
//! directly, so there is no tree to explore and no termination problem to
//! solve. Shares the fetcher (and therefore the retry policy) with the
//! parallel engine.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::client::ObjectStoreClient;
use crate::config::ListConfig;
use crate::error::WalkerError;
use crate::walker::coordinator::WalkStats;
use crate::walker::fetcher::PageFetcher;
use crate::walker::ObjectStream;

/// List every object under the configured prefix, page by page.
///
/// Returns the same lazy stream as [`BucketWalker::start`], including the
/// validation-error-as-first-element behavior.
///
/// [`BucketWalker::start`]: crate::walker::BucketWalker::start
pub fn list_flat(client: Arc<dyn ObjectStoreClient>, config: ListConfig) -> ObjectStream {
    let (output_tx, output_rx) = mpsc::channel(config.record_buffer.max(1));

    if let Err(error) = config.validate() {
        let _ = output_tx.try_send(Err(WalkerError::Config(error)));
        return ReceiverStream::new(output_rx);
    }

    tokio::spawn(async move {
        let prefix = config.start_prefix();
        let stats = Arc::new(WalkStats::default());
        let fetcher = PageFetcher::new(
            client,
            config.bucket.clone(),
            None, // no delimiter: the store flattens the hierarchy for us
            config.retry_policy.clone(),
            Arc::new(AtomicBool::new(false)),
            Arc::clone(&stats),
        );

        info!(bucket = %config.bucket, prefix = %prefix, "starting flat listing");

        let mut token: Option<String> = None;
        loop {
            let page = match fetcher.fetch_page(&prefix, token.as_deref()).await {
                Ok(page) => page,
                Err(error) => {
                    let _ = output_tx.send(Err(error)).await;
                    return;
                }
            };

            for record in page.contents {
                if record.key.is_empty() {
                    continue;
                }
                stats.record_object();
                if output_tx.send(Ok(record)).await.is_err() {
                    return; // consumer dropped the stream
                }
            }

            if !page.is_truncated {
                break;
            }
            token = page.next_continuation_token;
        }

        info!(
            objects = stats.objects_emitted(),
            pages = stats.pages_fetched(),
            "flat listing finished"
        );
    });

    ReceiverStream::new(output_rx)
}
