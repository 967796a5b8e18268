//! Host capabilities the cleaner depends on.
//!
//! The cleaner never touches browser state directly. Everything goes through the
//! traits in this module, which a host (extension runtime, test harness) implements:
//!
//! - [`BrowsingDataEraser`]: bulk erase of data types, optionally restricted to origins.
//! - [`CookieStore`]: cookie enumeration by domain and single-cookie removal.
//! - [`HistoryStore`]: text search over history and per-URL deletion.
//! - [`TabBridge`]: runs a [`PageScript`] inside a tab's page context.
//! - [`TabControl`]: active tab lookup, reloads and opening tabs or incognito windows.
//!
//! All traits are object safe (via `async_trait`) and implementations must be
//! `Send + Sync`; they are shared as `Arc<dyn Trait>` inside [`HostServices`].
//!
//! Every call may fail with a [`HostError`]. The cleaner treats such failures as
//! "no effect for this item" and carries on with the rest.

mod in_memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::Arc;

use crate::cleaner::cookies::CookieRecord;
use crate::cleaner::keys::ApiKey;

pub use in_memory::InMemoryBrowser;

/// Identifier of a browser tab as assigned by the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure of a single host api call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("tab {0} is not available")]
    TabUnavailable(TabId),

    #[error("access to this page is restricted")]
    Restricted,

    #[error("host api call failed: {0}")]
    Call(String),
}

/// Restriction passed to [`BrowsingDataEraser::erase`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseFilter {
    /// Origins to restrict erasure to. `None` erases profile-wide.
    pub origins: Option<Vec<String>>,
    /// Only data newer than this timestamp (ms since epoch) is erased.
    pub since: u64,
}

/// Parameters of a history text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub text: String,
    pub start_time: u64,
    pub max_results: usize,
}

/// A single history search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub url: String,
    pub title: Option<String>,
    pub visit_count: u32,
}

/// The active tab as reported by [`TabControl::active_tab`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: Option<TabId>,
    pub url: Option<String>,
}

/// Display state of a browser window.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowState {
    #[default]
    Normal,
    Minimized,
    Maximized,
    Fullscreen,
}

/// The current browser window as reported by [`TabControl::current_window`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct WindowInfo {
    pub state: WindowState,
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Where a new window goes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WindowPlacement {
    State(WindowState),
    Bounds { left: i32, top: i32, width: u32, height: u32 },
}

impl WindowPlacement {
    /// Mirrors `window`: maximized and fullscreen windows keep their state, any
    /// other window its geometry.
    pub fn mirroring(window: &WindowInfo) -> Self {
        match window.state {
            WindowState::Maximized | WindowState::Fullscreen => WindowPlacement::State(window.state),
            WindowState::Normal | WindowState::Minimized => WindowPlacement::Bounds {
                left: window.left,
                top: window.top,
                width: window.width,
                height: window.height,
            },
        }
    }
}

/// Scripts the cleaner can ask a host to run inside a page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PageScript {
    /// Reads the number of sessionStorage entries, then clears them.
    ClearSessionStorage,
    /// Reads `navigator.storage.estimate().usage` in bytes, when available.
    EstimateStorageUsage,
}

#[async_trait]
pub trait BrowsingDataEraser: Send + Sync {
    /// Erases the given data types. Reports no counts.
    async fn erase(&self, filter: &EraseFilter, types: &BTreeSet<ApiKey>) -> Result<(), HostError>;
}

#[async_trait]
pub trait CookieStore: Send + Sync {
    /// Returns all cookies whose domain matches `domain` (domain-match semantics
    /// of the host, i.e. the domain itself and its subdomains).
    async fn query_cookies(&self, domain: &str) -> Result<Vec<CookieRecord>, HostError>;

    /// Removes the cookie `name` that would be sent to `url` in store `store_id`.
    ///
    /// Returns `false` when the host reports nothing was removed.
    async fn remove_cookie(&self, url: &str, name: &str, store_id: &str) -> Result<bool, HostError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Searches history entries whose URL or title contains the query text.
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, HostError>;

    /// Deletes every visit of `url`.
    async fn delete_url(&self, url: &str) -> Result<(), HostError>;
}

#[async_trait]
pub trait TabBridge: Send + Sync {
    /// Runs `script` in every frame of the tab and returns the per-frame results.
    ///
    /// A frame may return no value (`None`), e.g. when the page denies access.
    async fn run_in_tab(&self, tab_id: TabId, script: PageScript) -> Result<Vec<Option<u64>>, HostError>;
}

#[async_trait]
pub trait TabControl: Send + Sync {
    /// The active tab of the current window, if any.
    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError>;

    async fn reload(&self, tab_id: TabId, bypass_cache: bool) -> Result<(), HostError>;

    async fn current_window(&self) -> Result<WindowInfo, HostError>;

    /// Opens `url` in a new incognito window.
    async fn open_incognito(&self, url: &str, placement: WindowPlacement) -> Result<(), HostError>;

    /// Opens `url` in a new tab of the current window.
    async fn create_tab(&self, url: &str) -> Result<(), HostError>;
}

/// The set of host capabilities a [`Cleaner`](crate::Cleaner) works with.
#[derive(Clone)]
pub struct HostServices {
    pub eraser: Arc<dyn BrowsingDataEraser>,
    pub cookies: Arc<dyn CookieStore>,
    pub history: Arc<dyn HistoryStore>,
    pub bridge: Arc<dyn TabBridge>,
    pub tabs: Arc<dyn TabControl>,
}

impl HostServices {
    /// Uses a single object implementing every capability.
    pub fn from_browser<B>(browser: Arc<B>) -> Self
    where
        B: BrowsingDataEraser + CookieStore + HistoryStore + TabBridge + TabControl + 'static,
    {
        Self {
            eraser: browser.clone(),
            cookies: browser.clone(),
            history: browser.clone(),
            bridge: browser.clone(),
            tabs: browser,
        }
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximized_and_fullscreen_windows_keep_their_state() {
        for state in [WindowState::Maximized, WindowState::Fullscreen] {
            let window = WindowInfo { state, ..Default::default() };
            assert_eq!(WindowPlacement::mirroring(&window), WindowPlacement::State(state));
        }
    }

    #[test]
    fn normal_windows_keep_their_geometry() {
        let window = WindowInfo {
            state: WindowState::Normal,
            left: 10,
            top: 20,
            width: 800,
            height: 600,
        };
        assert_eq!(
            WindowPlacement::mirroring(&window),
            WindowPlacement::Bounds { left: 10, top: 20, width: 800, height: 600 }
        );
    }
}
