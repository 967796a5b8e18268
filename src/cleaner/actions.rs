//! One-shot actions triggered from keyboard shortcuts, the context menu and the popup.
//!
//! Each action resolves the active tab, then clears and optionally reloads it or
//! reopens it in an incognito window. It hands back a [`Notice`] for the
//! notification layer to render.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cleaner::cleaner::{Cleaner, ClearRequest, ClearResult};
use crate::cleaner::domain::get_base_domain;
use crate::cleaner::errors::CleanerError;
use crate::cleaner::host::{TabId, WindowPlacement};
use crate::cleaner::keys::{expand_keys, ApiKey, CategoryKey, Preset, UI_OPTION_KEYS};
use crate::cleaner::scope::TabLocation;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanAction {
    /// Cache and cookies of the active tab's domain, then reload.
    CacheCookiesClean,
    /// Every category plus the technical keys, then reload.
    DeepClean,
    /// History entries of the active tab's domain only. No reload.
    ClearDomainHistory,
    /// Reopens the active page in an incognito window. Clears nothing.
    OpenInIncognito,
}

impl CleanAction {
    fn selected_keys(&self) -> Vec<ApiKey> {
        match self {
            CleanAction::CacheCookiesClean => expand_keys(Preset::CacheCookies.keys().iter().copied(), false),
            CleanAction::DeepClean => expand_keys(UI_OPTION_KEYS, true),
            CleanAction::ClearDomainHistory => vec![ApiKey::History],
            CleanAction::OpenInIncognito => Vec::new(),
        }
    }

    fn reloads(&self) -> bool {
        matches!(self, CleanAction::CacheCookiesClean | CleanAction::DeepClean)
    }
}

/// Message for the notification layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notice {
    Cleaned { domain: String },
    HistoryCleared { domain: String },
    IncognitoOpened { domain: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: CleanAction,
    pub tab_id: TabId,
    pub location: TabLocation,
    pub result: ClearResult,
    pub notice: Notice,
}

impl Cleaner {
    /// Runs `action` against the active tab.
    pub async fn run_action(&self, action: CleanAction) -> Result<ActionOutcome, CleanerError> {
        let (scope, location) = self.active_scope().await?;
        let tab_id = scope.tab_ids.first().copied().ok_or(CleanerError::NoActiveTab)?;

        debug!("Tab[{}]: running {:?} on {}", tab_id, action, location.hostname);

        let domain = location.hostname.clone();
        if action == CleanAction::OpenInIncognito {
            let window = self.services.tabs.current_window().await?;
            self.services
                .tabs
                .open_incognito(&location.url, WindowPlacement::mirroring(&window))
                .await?;

            return Ok(ActionOutcome {
                action,
                tab_id,
                location,
                result: ClearResult::default(),
                notice: Notice::IncognitoOpened { domain },
            });
        }

        let request = ClearRequest {
            selected_keys: action.selected_keys(),
            scope,
        };
        let result = self.clear_selected_data(&request).await?;

        if action.reloads() {
            self.reload_tabs(&request.scope.tab_ids).await;
        }

        let notice = match action {
            CleanAction::ClearDomainHistory => Notice::HistoryCleared { domain },
            _ => Notice::Cleaned { domain },
        };

        Ok(ActionOutcome {
            action,
            tab_id,
            location,
            result,
            notice,
        })
    }

    /// Clears the user's category selection on the active tab.
    ///
    /// Technical keys are never included here; only a deep clean selects them.
    pub async fn reset(&self, categories: &[CategoryKey], reload_after: bool) -> Result<ClearResult, CleanerError> {
        if categories.is_empty() {
            return Err(CleanerError::EmptySelection);
        }

        let (scope, _) = self.active_scope().await?;
        let request = ClearRequest {
            selected_keys: expand_keys(categories.iter().copied(), false),
            scope,
        };
        let result = self.clear_selected_data(&request).await?;

        if reload_after {
            self.reload_tabs(&request.scope.tab_ids).await;
        }
        Ok(result)
    }

    /// Opens the browser's HSTS settings page in a new tab.
    ///
    /// Returns the base domain of the active tab, which the user pastes into the
    /// page's delete form.
    pub async fn open_hsts_settings(&self) -> Result<String, CleanerError> {
        let (_, location) = self.active_scope().await?;
        let base_domain = get_base_domain(&location.hostname);

        self.services.tabs.create_tab(&self.config.hsts_settings_url).await?;
        debug!("HSTS: opened {} for {}", self.config.hsts_settings_url, base_domain);
        Ok(base_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::config::CleanerConfig;
    use crate::cleaner::cookies::tests::cookie;
    use crate::cleaner::host::{HostError, HostServices, InMemoryBrowser, WindowInfo, WindowState};
    use std::sync::Arc;

    fn setup(url: &str) -> (Arc<InMemoryBrowser>, Cleaner) {
        let browser = Arc::new(InMemoryBrowser::new());
        browser.open_tab(TabId(5), url);
        browser.activate(TabId(5));
        let cleaner = Cleaner::new(CleanerConfig::default(), HostServices::from_browser(browser.clone()));
        (browser, cleaner)
    }

    #[tokio::test]
    async fn cache_cookies_clean_reloads_and_notifies() {
        let (browser, cleaner) = setup("https://www.example.com/page");
        browser.add_cookie(cookie("sid", ".example.com", "/"));

        let outcome = cleaner.run_action(CleanAction::CacheCookiesClean).await.unwrap();

        assert_eq!(outcome.notice, Notice::Cleaned { domain: "www.example.com".into() });
        assert_eq!(outcome.result.cookies_removed, 1);
        assert_eq!(outcome.result.category_total(CategoryKey::Cache), 2);
        assert_eq!(browser.reloads(), vec![(TabId(5), true)]);
    }

    #[tokio::test]
    async fn deep_clean_includes_technical_keys() {
        let (_browser, cleaner) = setup("https://example.com/");
        let outcome = cleaner.run_action(CleanAction::DeepClean).await.unwrap();

        for key in [ApiKey::ServiceWorkers, ApiKey::FileSystems, ApiKey::WebSql, ApiKey::Appcache] {
            assert_eq!(outcome.result.count(key), 1, "{}", key);
        }
        assert!(outcome.result.per_key_counts.contains_key(&ApiKey::SessionStorage));
    }

    #[tokio::test]
    async fn domain_history_clear_does_not_reload_or_erase() {
        let (browser, cleaner) = setup("https://example.com/");
        browser.add_history("https://example.com/a");

        let outcome = cleaner.run_action(CleanAction::ClearDomainHistory).await.unwrap();

        assert_eq!(outcome.notice, Notice::HistoryCleared { domain: "example.com".into() });
        assert_eq!(outcome.result.count(ApiKey::History), 1);
        assert!(browser.reloads().is_empty());
        assert!(browser.erase_calls().is_empty());
    }

    #[tokio::test]
    async fn failed_reload_still_reports_the_clean() {
        let (browser, cleaner) = setup("https://example.com/");
        browser.add_cookie(cookie("sid", "example.com", "/"));
        browser.fail_reload(TabId(5));

        let outcome = cleaner.run_action(CleanAction::CacheCookiesClean).await.unwrap();

        assert_eq!(outcome.result.cookies_removed, 1);
        assert_eq!(outcome.notice, Notice::Cleaned { domain: "example.com".into() });
        assert!(browser.reloads().is_empty());
    }

    #[tokio::test]
    async fn failing_tab_lookup_surfaces_as_host_error() {
        let (browser, cleaner) = setup("https://example.com/");
        browser.fail_tab_control();

        let err = cleaner.run_action(CleanAction::DeepClean).await.unwrap_err();
        assert!(matches!(err, CleanerError::Host(HostError::Call(_))));
        assert!(browser.erase_calls().is_empty());
    }

    #[tokio::test]
    async fn incognito_reopens_the_page_with_the_window_geometry() {
        let (browser, cleaner) = setup("https://shop.example.com/cart?id=3");
        browser.set_window(WindowInfo {
            state: WindowState::Normal,
            left: 40,
            top: 30,
            width: 1280,
            height: 720,
        });

        let outcome = cleaner.run_action(CleanAction::OpenInIncognito).await.unwrap();

        assert_eq!(outcome.notice, Notice::IncognitoOpened { domain: "shop.example.com".into() });
        assert_eq!(outcome.result.total(), 0);
        assert_eq!(
            browser.incognito_windows(),
            vec![(
                "https://shop.example.com/cart?id=3".to_string(),
                WindowPlacement::Bounds { left: 40, top: 30, width: 1280, height: 720 }
            )]
        );
        assert!(browser.erase_calls().is_empty());
        assert!(browser.reloads().is_empty());
    }

    #[tokio::test]
    async fn incognito_keeps_a_maximized_window_maximized() {
        let (browser, cleaner) = setup("https://example.com/");
        browser.set_window(WindowInfo {
            state: WindowState::Maximized,
            ..Default::default()
        });

        cleaner.run_action(CleanAction::OpenInIncognito).await.unwrap();
        assert_eq!(browser.incognito_windows()[0].1, WindowPlacement::State(WindowState::Maximized));
    }

    #[tokio::test]
    async fn incognito_rejects_internal_pages() {
        let (browser, cleaner) = setup("chrome://extensions/");
        let err = cleaner.run_action(CleanAction::OpenInIncognito).await.unwrap_err();

        assert!(matches!(err, CleanerError::UnsupportedScheme(_)));
        assert!(browser.incognito_windows().is_empty());
    }

    #[tokio::test]
    async fn hsts_settings_open_with_the_base_domain() {
        let (browser, cleaner) = setup("https://shop.example.co.uk/basket");

        let base_domain = cleaner.open_hsts_settings().await.unwrap();

        assert_eq!(base_domain, "example.co.uk");
        assert_eq!(browser.created_tabs(), vec!["chrome://net-internals/#hsts".to_string()]);
    }

    #[tokio::test]
    async fn hsts_settings_need_a_web_page() {
        let (browser, cleaner) = setup("about:blank");
        assert!(matches!(
            cleaner.open_hsts_settings().await,
            Err(CleanerError::UnsupportedScheme(_))
        ));
        assert!(browser.created_tabs().is_empty());
    }

    #[tokio::test]
    async fn internal_pages_are_rejected_without_side_effects() {
        let (browser, cleaner) = setup("chrome://settings/");
        let err = cleaner.run_action(CleanAction::DeepClean).await.unwrap_err();

        assert!(matches!(err, CleanerError::UnsupportedScheme(s) if s == "chrome"));
        assert!(browser.erase_calls().is_empty());
        assert!(browser.reloads().is_empty());
    }

    #[tokio::test]
    async fn no_active_tab_is_reported() {
        let browser = Arc::new(InMemoryBrowser::new());
        let cleaner = Cleaner::new(CleanerConfig::default(), HostServices::from_browser(browser));
        assert!(matches!(
            cleaner.run_action(CleanAction::CacheCookiesClean).await,
            Err(CleanerError::NoActiveTab)
        ));
    }

    #[tokio::test]
    async fn reset_requires_a_selection_and_honors_reload_flag() {
        let (browser, cleaner) = setup("https://example.com/");
        assert!(matches!(cleaner.reset(&[], true).await, Err(CleanerError::EmptySelection)));

        let result = cleaner.reset(&[CategoryKey::Cache], false).await.unwrap();
        assert_eq!(result.count(ApiKey::Cache), 1);
        assert!(!result.per_key_counts.contains_key(&ApiKey::ServiceWorkers));
        assert!(browser.reloads().is_empty());

        cleaner.reset(&[CategoryKey::Cookies], true).await.unwrap();
        assert_eq!(browser.reloads().len(), 1);
    }
}
