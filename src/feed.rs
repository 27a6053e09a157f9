//! Incremental notification-fetch with deduplication and a time-window
//! stop condition.
//!
//! The loop is strictly sequential: one page request at a time, never
//! overlapping. Concurrent calls from the same caller are not serialized
//! here; exclusivity, if wanted, is the caller's job.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::types::InAppNotification;

/// Supplies one page of history strictly older than a cursor.
///
/// Implemented by the authenticated transport; tests script it.
#[async_trait]
pub trait PageSource {
    async fn page_before(&self, before: &str, count: usize) -> Result<Vec<InAppNotification>>;
}

/// Result of one pagination call.
#[derive(Debug, Clone)]
pub struct FeedPage {
    /// Accepted records in arrival order, each `id` exactly once.
    pub items: Vec<InAppNotification>,
    /// Whether the final round still produced new records.
    pub has_more: bool,
    /// Final cursor: the oldest `date` seen, never later than the
    /// starting cursor.
    pub oldest_received: String,
}

/// Accumulates records older than `before` until one of the stop
/// conditions hits.
///
/// Per round: fetch a page, drop records whose `id` was already collected
/// (first-seen wins), fold the cursor down to the minimum accepted `date`,
/// append in arrival order. Stops when a round accepts nothing, when
/// `max_count` records are collected, or when the cursor crosses
/// `oldest_cutoff`. A page of pure duplicates counts as accepting nothing,
/// so a server replaying a stable page cannot loop us forever.
///
/// Timestamps compare lexicographically; the wire format is fixed-width,
/// zero-padded UTC, so that is chronological order.
pub async fn collect_older_than<S>(
    source: &S,
    before: &str,
    max_count: usize,
    oldest_cutoff: &str,
) -> Result<FeedPage>
where
    S: PageSource + ?Sized,
{
    let mut items: Vec<InAppNotification> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut cursor = before.to_string();
    let has_more;

    loop {
        let page = source.page_before(&cursor, max_count).await?;
        let mut accepted = 0usize;
        for record in page {
            if !seen.insert(record.id.clone()) {
                continue;
            }
            if record.date.as_str() < cursor.as_str() {
                cursor = record.date.clone();
            }
            items.push(record);
            accepted += 1;
        }
        debug!(
            target: "inapp.feed",
            accepted,
            collected = items.len(),
            cursor = %cursor,
            "page folded"
        );

        if accepted == 0 {
            has_more = false;
            break;
        }
        if items.len() >= max_count || cursor.as_str() < oldest_cutoff {
            has_more = true;
            break;
        }
    }

    Ok(FeedPage {
        items,
        has_more,
        oldest_received: cursor,
    })
}
