use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

use crate::cleaner::cookies::CookieRecord;
use crate::cleaner::host::{
    BrowsingDataEraser, CookieStore, EraseFilter, HistoryItem, HistoryQuery, HistoryStore, HostError, PageScript,
    TabBridge, TabControl, TabId, TabInfo, WindowInfo, WindowPlacement,
};
use crate::cleaner::keys::ApiKey;

#[derive(Debug, Clone, Default)]
struct PageState {
    url: String,
    /// sessionStorage entry count per frame
    session_entries: Vec<u64>,
    usage_bytes: Option<u64>,
    restricted: bool,
}

#[derive(Debug, Default)]
struct BrowserState {
    cookies: Vec<CookieRecord>,
    history: Vec<HistoryItem>,
    pages: HashMap<TabId, PageState>,
    active: Option<TabId>,
    window: WindowInfo,
    incognito_windows: Vec<(String, WindowPlacement)>,
    created_tabs: Vec<String>,
    erase_calls: Vec<(EraseFilter, BTreeSet<ApiKey>)>,
    reloads: Vec<(TabId, bool)>,
    failing_cookie_queries: HashSet<String>,
    failing_cookie_names: HashSet<String>,
    failing_history_urls: HashSet<String>,
    failing_history_search: bool,
    failing_eraser: bool,
    failing_reloads: HashSet<TabId>,
    failing_tab_control: bool,
}

/// A browser held entirely in memory.
///
/// Implements every host capability, which makes it suitable for tests and
/// demos. Failures can be injected per cookie domain or name, history URL and
/// tab, or for the eraser and tab control as a whole.
#[derive(Debug, Default)]
pub struct InMemoryBrowser {
    state: Mutex<BrowserState>,
}

fn cookie_domain_matches(cookie_domain: &str, domain: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
    let domain = domain.strip_prefix('.').unwrap_or(domain);
    cookie_domain == domain || cookie_domain.ends_with(&format!(".{}", domain))
}

impl InMemoryBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_cookie(&self, cookie: CookieRecord) {
        self.state().cookies.push(cookie);
    }

    pub fn cookie_count(&self) -> usize {
        self.state().cookies.len()
    }

    pub fn add_history(&self, url: &str) {
        self.state().history.push(HistoryItem {
            url: url.to_string(),
            title: None,
            visit_count: 1,
        });
    }

    pub fn history_urls(&self) -> Vec<String> {
        self.state().history.iter().map(|h| h.url.clone()).collect()
    }

    /// Opens a page in tab `tab_id`, replacing whatever was there.
    pub fn open_tab(&self, tab_id: TabId, url: &str) {
        self.state().pages.insert(
            tab_id,
            PageState {
                url: url.to_string(),
                session_entries: vec![0],
                ..Default::default()
            },
        );
    }

    pub fn close_tab(&self, tab_id: TabId) {
        let mut state = self.state();
        state.pages.remove(&tab_id);
        if state.active == Some(tab_id) {
            state.active = None;
        }
    }

    pub fn activate(&self, tab_id: TabId) {
        self.state().active = Some(tab_id);
    }

    /// Sets the sessionStorage entry count for each frame of the tab.
    pub fn set_session_entries(&self, tab_id: TabId, per_frame: Vec<u64>) {
        if let Some(page) = self.state().pages.get_mut(&tab_id) {
            page.session_entries = per_frame;
        }
    }

    pub fn session_entries(&self, tab_id: TabId) -> u64 {
        self.state().pages.get(&tab_id).map(|p| p.session_entries.iter().sum()).unwrap_or(0)
    }

    pub fn set_storage_usage(&self, tab_id: TabId, bytes: Option<u64>) {
        if let Some(page) = self.state().pages.get_mut(&tab_id) {
            page.usage_bytes = bytes;
        }
    }

    /// Makes every script execution in the tab fail, like an internal or store page.
    pub fn restrict_tab(&self, tab_id: TabId) {
        if let Some(page) = self.state().pages.get_mut(&tab_id) {
            page.restricted = true;
        }
    }

    /// Makes cookie queries for exactly `domain` fail.
    pub fn fail_cookie_query(&self, domain: &str) {
        self.state().failing_cookie_queries.insert(domain.to_string());
    }

    pub fn fail_cookie_removal(&self, name: &str) {
        self.state().failing_cookie_names.insert(name.to_string());
    }

    pub fn fail_history_delete(&self, url: &str) {
        self.state().failing_history_urls.insert(url.to_string());
    }

    pub fn fail_history_search(&self) {
        self.state().failing_history_search = true;
    }

    pub fn fail_eraser(&self) {
        self.state().failing_eraser = true;
    }

    pub fn fail_reload(&self, tab_id: TabId) {
        self.state().failing_reloads.insert(tab_id);
    }

    /// Makes every [`TabControl`] call fail.
    pub fn fail_tab_control(&self) {
        self.state().failing_tab_control = true;
    }

    pub fn set_window(&self, window: WindowInfo) {
        self.state().window = window;
    }

    pub fn incognito_windows(&self) -> Vec<(String, WindowPlacement)> {
        self.state().incognito_windows.clone()
    }

    pub fn created_tabs(&self) -> Vec<String> {
        self.state().created_tabs.clone()
    }

    pub fn erase_calls(&self) -> Vec<(EraseFilter, BTreeSet<ApiKey>)> {
        self.state().erase_calls.clone()
    }

    pub fn reloads(&self) -> Vec<(TabId, bool)> {
        self.state().reloads.clone()
    }
}

#[async_trait]
impl BrowsingDataEraser for InMemoryBrowser {
    async fn erase(&self, filter: &EraseFilter, types: &BTreeSet<ApiKey>) -> Result<(), HostError> {
        let mut state = self.state();
        if state.failing_eraser {
            return Err(HostError::Call("browsingData.remove rejected".into()));
        }
        state.erase_calls.push((filter.clone(), types.clone()));
        Ok(())
    }
}

#[async_trait]
impl CookieStore for InMemoryBrowser {
    async fn query_cookies(&self, domain: &str) -> Result<Vec<CookieRecord>, HostError> {
        let state = self.state();
        if state.failing_cookie_queries.contains(domain) {
            return Err(HostError::Call(format!("cookies.getAll rejected for {}", domain)));
        }
        Ok(state
            .cookies
            .iter()
            .filter(|c| cookie_domain_matches(&c.domain, domain))
            .cloned()
            .collect())
    }

    async fn remove_cookie(&self, url: &str, name: &str, store_id: &str) -> Result<bool, HostError> {
        let url = Url::parse(url).map_err(|e| HostError::Call(e.to_string()))?;
        let host = url.host_str().unwrap_or_default().to_string();
        let path = url.path().to_string();

        let mut state = self.state();
        if state.failing_cookie_names.contains(name) {
            return Err(HostError::Call(format!("cannot remove cookie {}", name)));
        }

        let before = state.cookies.len();
        state.cookies.retain(|c| {
            let domain = c.domain.strip_prefix('.').unwrap_or(&c.domain);
            !(c.name == name && c.store_id == store_id && domain == host && c.path == path)
        });
        Ok(state.cookies.len() < before)
    }
}

#[async_trait]
impl HistoryStore for InMemoryBrowser {
    async fn search(&self, query: &HistoryQuery) -> Result<Vec<HistoryItem>, HostError> {
        let state = self.state();
        if state.failing_history_search {
            return Err(HostError::Call("history.search rejected".into()));
        }
        Ok(state
            .history
            .iter()
            .filter(|h| h.url.contains(&query.text))
            .take(query.max_results)
            .cloned()
            .collect())
    }

    async fn delete_url(&self, url: &str) -> Result<(), HostError> {
        let mut state = self.state();
        if state.failing_history_urls.contains(url) {
            return Err(HostError::Call(format!("cannot delete {}", url)));
        }
        state.history.retain(|h| h.url != url);
        Ok(())
    }
}

#[async_trait]
impl TabBridge for InMemoryBrowser {
    async fn run_in_tab(&self, tab_id: TabId, script: PageScript) -> Result<Vec<Option<u64>>, HostError> {
        let mut state = self.state();
        let page = state.pages.get_mut(&tab_id).ok_or(HostError::TabUnavailable(tab_id))?;
        if page.restricted {
            return Err(HostError::Restricted);
        }

        match script {
            PageScript::ClearSessionStorage => {
                let counts = page.session_entries.iter().map(|n| Some(*n)).collect();
                page.session_entries.iter_mut().for_each(|n| *n = 0);
                Ok(counts)
            }
            PageScript::EstimateStorageUsage => Ok(vec![page.usage_bytes]),
        }
    }
}

#[async_trait]
impl TabControl for InMemoryBrowser {
    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError> {
        let state = self.state();
        if state.failing_tab_control {
            return Err(HostError::Call("tabs.query rejected".into()));
        }
        Ok(state.active.map(|id| TabInfo {
            id: Some(id),
            url: state.pages.get(&id).map(|p| p.url.clone()),
        }))
    }

    async fn reload(&self, tab_id: TabId, bypass_cache: bool) -> Result<(), HostError> {
        let mut state = self.state();
        if !state.pages.contains_key(&tab_id) || state.failing_reloads.contains(&tab_id) {
            return Err(HostError::TabUnavailable(tab_id));
        }
        state.reloads.push((tab_id, bypass_cache));
        Ok(())
    }

    async fn current_window(&self) -> Result<WindowInfo, HostError> {
        let state = self.state();
        if state.failing_tab_control {
            return Err(HostError::Call("windows.getCurrent rejected".into()));
        }
        Ok(state.window)
    }

    async fn open_incognito(&self, url: &str, placement: WindowPlacement) -> Result<(), HostError> {
        let mut state = self.state();
        if state.failing_tab_control {
            return Err(HostError::Call("windows.create rejected".into()));
        }
        state.incognito_windows.push((url.to_string(), placement));
        Ok(())
    }

    async fn create_tab(&self, url: &str) -> Result<(), HostError> {
        let mut state = self.state();
        if state.failing_tab_control {
            return Err(HostError::Call("tabs.create rejected".into()));
        }
        let id = state.pages.keys().map(|t| t.0 + 1).max().unwrap_or(1);
        state.pages.insert(
            TabId(id),
            PageState {
                url: url.to_string(),
                session_entries: vec![0],
                ..Default::default()
            },
        );
        state.created_tabs.push(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_domain_match_includes_subdomains_only() {
        assert!(cookie_domain_matches(".example.com", "example.com"));
        assert!(cookie_domain_matches("www.example.com", "example.com"));
        assert!(!cookie_domain_matches("notexample.com", "example.com"));
        assert!(!cookie_domain_matches("example.com", "www.example.com"));
    }

    #[tokio::test]
    async fn session_clear_reports_then_resets_frames() {
        let browser = InMemoryBrowser::new();
        let tab = TabId(7);
        browser.open_tab(tab, "https://example.com/");
        browser.set_session_entries(tab, vec![2, 3]);

        let first = browser.run_in_tab(tab, PageScript::ClearSessionStorage).await.unwrap();
        assert_eq!(first, vec![Some(2), Some(3)]);
        assert_eq!(browser.session_entries(tab), 0);
    }

    #[tokio::test]
    async fn injected_cookie_query_failure_hits_one_domain_only() {
        let browser = InMemoryBrowser::new();
        browser.add_cookie(crate::cleaner::cookies::tests::cookie("a", "www.example.com", "/"));
        browser.fail_cookie_query("example.com");

        assert!(browser.query_cookies("example.com").await.is_err());
        assert_eq!(browser.query_cookies("www.example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn created_tabs_get_fresh_ids() {
        let browser = InMemoryBrowser::new();
        browser.open_tab(TabId(4), "https://example.com/");
        browser.create_tab("chrome://net-internals/#hsts").await.unwrap();

        assert_eq!(browser.created_tabs(), vec!["chrome://net-internals/#hsts".to_string()]);
        browser.activate(TabId(5));
        let active = browser.active_tab().await.unwrap().unwrap();
        assert_eq!(active.url.as_deref(), Some("chrome://net-internals/#hsts"));
    }

    #[tokio::test]
    async fn closed_tab_is_unavailable() {
        let browser = InMemoryBrowser::new();
        let tab = TabId(1);
        browser.open_tab(tab, "https://example.com/");
        browser.activate(tab);
        browser.close_tab(tab);

        assert!(browser.active_tab().await.unwrap().is_none());
        assert_eq!(
            browser.run_in_tab(tab, PageScript::EstimateStorageUsage).await,
            Err(HostError::TabUnavailable(tab))
        );
    }
}
