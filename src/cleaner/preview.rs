//! Usage preview shown before the user clears anything.

use serde::{Deserialize, Serialize};

use crate::cleaner::cleaner::Cleaner;
use crate::cleaner::cookies::collect_cookies_for_hostnames;
use crate::cleaner::scope::Scope;
use crate::cleaner::session::measure_usage_for_tabs;

/// Cookie count and storage usage for a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePreview {
    pub cookie_count: usize,
    pub usage_bytes: u64,
}

impl UsagePreview {
    pub fn usage_megabytes(&self) -> u64 {
        format_megabytes(self.usage_bytes)
    }
}

/// Bytes rounded to whole megabytes (MiB), half up.
pub fn format_megabytes(bytes: u64) -> u64 {
    const MB: u64 = 1024 * 1024;
    bytes.saturating_add(MB / 2) / MB
}

impl Cleaner {
    /// Counts the cookies and estimates the storage used within `scope`.
    pub async fn preview(&self, scope: &Scope) -> UsagePreview {
        let (usage_bytes, cookies) = futures::join!(
            measure_usage_for_tabs(self.services.bridge.as_ref(), &scope.tab_ids),
            collect_cookies_for_hostnames(self.services.cookies.as_ref(), &scope.hostnames)
        );

        UsagePreview {
            cookie_count: cookies.len(),
            usage_bytes,
        }
    }

    /// Like [`preview`](Self::preview), but returns `None` when another preview
    /// was requested while this one was running.
    pub async fn refresh_preview(&self, scope: &Scope) -> Option<UsagePreview> {
        let generation = self.preview_generations.next();
        let preview = self.preview(scope).await;
        self.preview_generations.is_current(generation).then_some(preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::config::CleanerConfig;
    use crate::cleaner::cookies::tests::cookie;
    use crate::cleaner::host::{HostServices, InMemoryBrowser, TabId};
    use std::sync::Arc;

    #[test]
    fn megabytes_round_to_nearest() {
        assert_eq!(format_megabytes(0), 0);
        assert_eq!(format_megabytes(524_287), 0);
        assert_eq!(format_megabytes(524_288), 1);
        assert_eq!(format_megabytes(5 * 1024 * 1024), 5);
    }

    #[tokio::test]
    async fn preview_counts_deduplicated_cookies_and_usage() {
        let browser = Arc::new(InMemoryBrowser::new());
        browser.open_tab(TabId(1), "https://www.example.com/");
        browser.set_storage_usage(TabId(1), Some(3 * 1024 * 1024));
        browser.add_cookie(cookie("a", ".example.com", "/"));
        browser.add_cookie(cookie("b", "www.example.com", "/"));
        browser.add_cookie(cookie("c", "elsewhere.net", "/"));

        let cleaner = Cleaner::new(CleanerConfig::default(), HostServices::from_browser(browser.clone()));
        let scope = Scope {
            origins: vec!["https://www.example.com".into()],
            hostnames: vec!["www.example.com".into()],
            tab_ids: vec![TabId(1), TabId(1)],
        };

        let preview = cleaner.preview(&scope).await;
        assert_eq!(preview.cookie_count, 2);
        assert_eq!(preview.usage_megabytes(), 3);
        // previewing changes nothing
        assert_eq!(browser.cookie_count(), 3);
    }

    #[tokio::test]
    async fn latest_preview_is_current() {
        let browser = Arc::new(InMemoryBrowser::new());
        let cleaner = Cleaner::new(CleanerConfig::default(), HostServices::from_browser(browser));

        let preview = cleaner.refresh_preview(&Scope::default()).await;
        assert_eq!(preview, Some(UsagePreview::default()));
    }
}
