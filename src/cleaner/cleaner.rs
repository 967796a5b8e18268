//! The clearing orchestrator.
//!
//! [`Cleaner::clear_selected_data`] fans a selection of [`ApiKey`]s out over the
//! host capabilities and folds the outcome into a [`ClearResult`]:
//!
//! | key class           | how it is erased                                   | count reported        |
//! |---------------------|----------------------------------------------------|-----------------------|
//! | `cookies`           | enumerate candidate domains, remove one by one     | cookies removed       |
//! | origin-filterable   | one bulk erase restricted to the scope's origins   | number of origins     |
//! | `history`           | search per hostname, delete matching URLs          | entries deleted       |
//! | global-only         | one profile-wide bulk erase                        | 1 (presence only)     |
//! | `sessionStorage`    | cleared from inside each tab                       | entries cleared       |
//!
//! The bulk eraser reports no counts, so the origin-filterable and global-only
//! numbers are approximations. They say "this was erased", not "this many items".
//!
//! Every host call is guarded on its own. A failure is logged and counts as no
//! effect; it never aborts the rest of the operation.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::cleaner::config::CleanerConfig;
use crate::cleaner::cookies::{collect_cookies_for_hostnames, remove_cookies};
use crate::cleaner::errors::CleanerError;
use crate::cleaner::events::CleanerEvent;
use crate::cleaner::generation::{Generation, RequestGeneration};
use crate::cleaner::history::clear_history_for_hostnames;
use crate::cleaner::host::{EraseFilter, HostServices, TabId};
use crate::cleaner::keys::{ApiKey, CategoryKey, KeyClass};
use crate::cleaner::scope::{Scope, TabLocation};
use crate::cleaner::session::clear_session_storage_for_tabs;

/// What to clear, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearRequest {
    pub selected_keys: Vec<ApiKey>,
    pub scope: Scope,
}

/// Outcome of one clearing operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    /// One entry per selected key. Keys without effect report 0.
    pub per_key_counts: BTreeMap<ApiKey, u64>,
    pub cookies_removed: u64,
    pub session_entries_cleared: u64,
}

impl ClearResult {
    fn for_keys(keys: &[ApiKey]) -> Self {
        Self {
            per_key_counts: keys.iter().map(|k| (*k, 0)).collect(),
            ..Default::default()
        }
    }

    pub fn count(&self, key: ApiKey) -> u64 {
        self.per_key_counts.get(&key).copied().unwrap_or(0)
    }

    /// Sum of the counts of the api keys `category` stands for.
    pub fn category_total(&self, category: CategoryKey) -> u64 {
        category.api_keys().iter().map(|k| self.count(*k)).sum()
    }

    pub fn total(&self) -> u64 {
        self.per_key_counts.values().sum()
    }
}

/// Entry point for clearing operations against a host.
///
/// Cheap to clone; clones share the host services, the generation counters and
/// the event bus.
#[derive(Clone, Debug)]
pub struct Cleaner {
    pub(crate) config: Arc<CleanerConfig>,
    pub(crate) services: HostServices,
    clear_generations: Arc<RequestGeneration>,
    pub(crate) preview_generations: Arc<RequestGeneration>,
    event_tx: broadcast::Sender<CleanerEvent>,
}

impl Cleaner {
    pub fn new(config: CleanerConfig, services: HostServices) -> Self {
        let (event_tx, _rx) = broadcast::channel(config.event_channel_capacity.max(1));

        Self {
            config: Arc::new(config),
            services,
            clear_generations: Arc::new(RequestGeneration::new()),
            preview_generations: Arc::new(RequestGeneration::new()),
            event_tx,
        }
    }

    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    /// Receives events for clearing tasks spawned from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CleanerEvent> {
        self.event_tx.subscribe()
    }

    fn publish(&self, event: CleanerEvent) {
        // Sending only fails without receivers, which is fine.
        let _ = self.event_tx.send(event);
    }

    /// Resolves the scope of the host's active tab.
    pub async fn active_scope(&self) -> Result<(Scope, TabLocation), CleanerError> {
        let tab = self.services.tabs.active_tab().await?;
        Scope::from_active_tab(tab)
    }

    /// Clears the selected data within `request.scope`.
    ///
    /// Fails only for an empty selection. Host failures reduce the counts but
    /// never fail the operation.
    pub async fn clear_selected_data(&self, request: &ClearRequest) -> Result<ClearResult, CleanerError> {
        if request.selected_keys.is_empty() {
            return Err(CleanerError::EmptySelection);
        }

        let selected = &request.selected_keys;
        let scope = &request.scope;
        let mut result = ClearResult::for_keys(selected);

        let api_keys: BTreeSet<ApiKey> = selected.iter().copied().filter(|k| *k != ApiKey::SessionStorage).collect();

        if api_keys.contains(&ApiKey::Cookies) {
            let map = collect_cookies_for_hostnames(self.services.cookies.as_ref(), &scope.hostnames).await;
            result.cookies_removed = remove_cookies(self.services.cookies.as_ref(), &map).await;
            result.per_key_counts.insert(ApiKey::Cookies, result.cookies_removed);
        }

        let origin_keys: BTreeSet<ApiKey> =
            api_keys.iter().copied().filter(|k| k.class() == KeyClass::OriginFilterable).collect();
        let global_keys: BTreeSet<ApiKey> =
            api_keys.iter().copied().filter(|k| k.class() == KeyClass::GlobalOnly).collect();

        if !origin_keys.is_empty() {
            if scope.origins.is_empty() {
                debug!("Cleaner: no origins in scope, skipping origin-filtered erase");
            } else {
                let filter = EraseFilter {
                    origins: Some(scope.origins.clone()),
                    since: self.config.erase_since,
                };
                match self.services.eraser.erase(&filter, &origin_keys).await {
                    Ok(()) => {
                        for key in origin_keys.iter().filter(|k| **k != ApiKey::Cookies) {
                            result.per_key_counts.insert(*key, scope.origins.len() as u64);
                        }
                    }
                    Err(e) => warn!("Cleaner: origin-filtered erase of {:?} failed: {}", origin_keys, e),
                }
            }
        }

        if selected.contains(&ApiKey::History) {
            let deleted =
                clear_history_for_hostnames(self.services.history.as_ref(), &scope.hostnames, &self.config).await;
            result.per_key_counts.insert(ApiKey::History, deleted);
        }

        if !global_keys.is_empty() {
            let filter = EraseFilter {
                origins: None,
                since: self.config.erase_since,
            };
            match self.services.eraser.erase(&filter, &global_keys).await {
                Ok(()) => {
                    for key in &global_keys {
                        result.per_key_counts.insert(*key, 1);
                    }
                }
                Err(e) => warn!("Cleaner: profile-wide erase of {:?} failed: {}", global_keys, e),
            }
        }

        if selected.contains(&ApiKey::SessionStorage) {
            result.session_entries_cleared =
                clear_session_storage_for_tabs(self.services.bridge.as_ref(), &scope.tab_ids).await;
            result.per_key_counts.insert(ApiKey::SessionStorage, result.session_entries_cleared);
        }

        info!(
            "Cleaner: cleared {:?} for {:?} ({} cookies, {} session entries)",
            selected, scope.hostnames, result.cookies_removed, result.session_entries_cleared
        );
        Ok(result)
    }

    /// Runs [`clear_selected_data`](Self::clear_selected_data) on a separate task.
    ///
    /// The returned [`Generation`] identifies this run in the published
    /// [`CleanerEvent`]s; use [`is_current`](Self::is_current) to drop results of
    /// runs superseded by a newer one.
    pub fn spawn_clear(&self, request: ClearRequest) -> (Generation, JoinHandle<Result<ClearResult, CleanerError>>) {
        let generation = self.clear_generations.next();
        self.publish(CleanerEvent::ClearStarted { generation });

        let cleaner = self.clone();
        let handle = tokio::spawn(async move {
            let outcome = cleaner.clear_selected_data(&request).await;
            match &outcome {
                Ok(result) => cleaner.publish(CleanerEvent::ClearFinished {
                    generation,
                    result: result.clone(),
                }),
                Err(e) => cleaner.publish(CleanerEvent::ClearFailed {
                    generation,
                    reason: e.to_string(),
                }),
            }
            outcome
        });

        (generation, handle)
    }

    /// True when no clearing task was spawned after the one identified by `generation`.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.clear_generations.is_current(generation)
    }

    /// Reloads each tab, ignoring tabs that are gone.
    pub async fn reload_tabs(&self, tab_ids: &[TabId]) {
        for tab_id in tab_ids {
            if let Err(e) = self.services.tabs.reload(*tab_id, self.config.reload_bypass_cache).await {
                debug!("Tab[{}]: reload skipped: {}", tab_id, e);
            }
        }
    }
}
