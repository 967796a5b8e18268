//! In-page work: clearing sessionStorage and estimating storage usage per tab.

use futures::future::join_all;
use log::{debug, warn};
use std::collections::BTreeSet;

use crate::cleaner::host::{PageScript, TabBridge, TabId};

async fn run_and_sum(bridge: &dyn TabBridge, tab_id: TabId, script: PageScript) -> Option<u64> {
    match bridge.run_in_tab(tab_id, script).await {
        Ok(frames) => {
            let values: Vec<u64> = frames.into_iter().flatten().collect();
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum())
            }
        }
        Err(e) => {
            warn!("Tab[{}]: {:?} failed: {}", tab_id, script, e);
            None
        }
    }
}

/// Clears sessionStorage in each tab and returns the number of entries removed.
///
/// Tabs are handled concurrently. Tabs that are gone or restricted count 0.
pub(crate) async fn clear_session_storage_for_tabs(bridge: &dyn TabBridge, tab_ids: &[TabId]) -> u64 {
    let counts = join_all(
        tab_ids
            .iter()
            .map(|id| run_and_sum(bridge, *id, PageScript::ClearSessionStorage)),
    )
    .await;

    let total: u64 = counts.into_iter().flatten().sum();
    debug!("Session storage: {} entries cleared across {} tabs", total, tab_ids.len());
    total
}

/// Sums the storage usage estimates (bytes) of the distinct tabs in `tab_ids`.
pub(crate) async fn measure_usage_for_tabs(bridge: &dyn TabBridge, tab_ids: &[TabId]) -> u64 {
    let distinct: BTreeSet<TabId> = tab_ids.iter().copied().collect();
    let usages = join_all(
        distinct
            .iter()
            .map(|id| run_and_sum(bridge, *id, PageScript::EstimateStorageUsage)),
    )
    .await;

    usages.into_iter().flatten().sum()
}
