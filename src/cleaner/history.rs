//! Per-hostname history removal.
//!
//! The host's history search matches on text, so a search for `example.com`
//! also returns `notexample.com`. Every hit is re-checked against the hostname
//! (exact match or subdomain) before it is deleted.

use log::{debug, warn};
use url::Url;

use crate::cleaner::config::CleanerConfig;
use crate::cleaner::host::{HistoryQuery, HistoryStore};

/// True when `candidate` is `hostname` or one of its subdomains.
pub(crate) fn host_matches(candidate: &str, hostname: &str) -> bool {
    candidate == hostname || candidate.ends_with(&format!(".{}", hostname))
}

/// Deletes the history entries of every hostname and returns how many were deleted.
pub(crate) async fn clear_history_for_hostnames(
    store: &dyn HistoryStore,
    hostnames: &[String],
    config: &CleanerConfig,
) -> u64 {
    let mut deleted = 0;

    for hostname in hostnames {
        let query = HistoryQuery {
            text: hostname.clone(),
            start_time: config.history_start_time,
            max_results: config.history_max_results,
        };

        let items = match store.search(&query).await {
            Ok(items) => items,
            Err(e) => {
                warn!("History: search for {} failed: {}", hostname, e);
                continue;
            }
        };

        for item in items {
            let matches = Url::parse(&item.url)
                .ok()
                .and_then(|u| u.host_str().map(|h| host_matches(h, hostname)))
                .unwrap_or(false);
            if !matches {
                continue;
            }

            match store.delete_url(&item.url).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!("History: cannot delete {}: {}", item.url, e),
            }
        }

        debug!("History: {} entries deleted so far after {}", deleted, hostname);
    }

    deleted
}
