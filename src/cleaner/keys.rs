//! Data keys: user-facing categories, host api keys and presets.
//!
//! A [`CategoryKey`] is what the user picks in the popup. The host's eraser only
//! understands [`ApiKey`]s, so [`expand_keys`] maps one to the other. Every api
//! key belongs to exactly one [`KeyClass`], which decides how the cleaner erases
//! it.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::cleaner::errors::CleanerError;

/// User-facing data category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoryKey {
    Cache,
    Cookies,
    SiteStorage,
    History,
    // Hidden technical categories, only selected by a deep clean.
    ServiceWorkers,
    FileSystems,
    #[serde(rename = "webSQL")]
    WebSql,
    Appcache,
}

/// Host platform browsing-data type identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiKey {
    Cache,
    CacheStorage,
    Cookies,
    LocalStorage,
    SessionStorage,
    #[serde(rename = "indexedDB")]
    IndexedDb,
    History,
    Downloads,
    FormData,
    ServiceWorkers,
    FileSystems,
    #[serde(rename = "webSQL")]
    WebSql,
    Appcache,
}

/// How an api key is erased.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyClass {
    /// The bulk eraser can restrict these to a set of origins.
    OriginFilterable,
    /// Needs per-URL enumeration through the history store.
    HistoryLike,
    /// No per-origin restriction exists; erasure is profile-wide.
    GlobalOnly,
    /// Cleared from inside the page, one tab at a time.
    InPage,
}

/// Categories shown as options in the popup.
pub const UI_OPTION_KEYS: [CategoryKey; 4] = [
    CategoryKey::Cache,
    CategoryKey::Cookies,
    CategoryKey::SiteStorage,
    CategoryKey::History,
];

/// Technical api keys hidden from the UI, included only by a deep clean.
pub const HIDDEN_TECHNICAL_KEYS: [ApiKey; 4] = [
    ApiKey::ServiceWorkers,
    ApiKey::FileSystems,
    ApiKey::WebSql,
    ApiKey::Appcache,
];

/// Selection used when the user never saved one.
pub const DEFAULT_SELECTED_KEYS: [CategoryKey; 1] = [CategoryKey::Cache];

impl CategoryKey {
    pub const ALL: [CategoryKey; 8] = [
        CategoryKey::Cache,
        CategoryKey::Cookies,
        CategoryKey::SiteStorage,
        CategoryKey::History,
        CategoryKey::ServiceWorkers,
        CategoryKey::FileSystems,
        CategoryKey::WebSql,
        CategoryKey::Appcache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKey::Cache => "cache",
            CategoryKey::Cookies => "cookies",
            CategoryKey::SiteStorage => "siteStorage",
            CategoryKey::History => "history",
            CategoryKey::ServiceWorkers => "serviceWorkers",
            CategoryKey::FileSystems => "fileSystems",
            CategoryKey::WebSql => "webSQL",
            CategoryKey::Appcache => "appcache",
        }
    }

    /// Api keys this category stands for. Technical categories have no mapping
    /// entry of their own and stand for the api key of the same name.
    pub fn api_keys(&self) -> &'static [ApiKey] {
        match self {
            CategoryKey::Cache => &[ApiKey::Cache, ApiKey::CacheStorage],
            CategoryKey::Cookies => &[ApiKey::Cookies],
            CategoryKey::SiteStorage => &[ApiKey::LocalStorage, ApiKey::SessionStorage, ApiKey::IndexedDb],
            CategoryKey::History => &[ApiKey::History, ApiKey::Downloads, ApiKey::FormData],
            CategoryKey::ServiceWorkers => &[ApiKey::ServiceWorkers],
            CategoryKey::FileSystems => &[ApiKey::FileSystems],
            CategoryKey::WebSql => &[ApiKey::WebSql],
            CategoryKey::Appcache => &[ApiKey::Appcache],
        }
    }
}

impl ApiKey {
    pub const ALL: [ApiKey; 13] = [
        ApiKey::Cache,
        ApiKey::CacheStorage,
        ApiKey::Cookies,
        ApiKey::LocalStorage,
        ApiKey::SessionStorage,
        ApiKey::IndexedDb,
        ApiKey::History,
        ApiKey::Downloads,
        ApiKey::FormData,
        ApiKey::ServiceWorkers,
        ApiKey::FileSystems,
        ApiKey::WebSql,
        ApiKey::Appcache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKey::Cache => "cache",
            ApiKey::CacheStorage => "cacheStorage",
            ApiKey::Cookies => "cookies",
            ApiKey::LocalStorage => "localStorage",
            ApiKey::SessionStorage => "sessionStorage",
            ApiKey::IndexedDb => "indexedDB",
            ApiKey::History => "history",
            ApiKey::Downloads => "downloads",
            ApiKey::FormData => "formData",
            ApiKey::ServiceWorkers => "serviceWorkers",
            ApiKey::FileSystems => "fileSystems",
            ApiKey::WebSql => "webSQL",
            ApiKey::Appcache => "appcache",
        }
    }

    pub fn class(&self) -> KeyClass {
        match self {
            ApiKey::Cache
            | ApiKey::CacheStorage
            | ApiKey::Cookies
            | ApiKey::FileSystems
            | ApiKey::IndexedDb
            | ApiKey::LocalStorage
            | ApiKey::ServiceWorkers
            | ApiKey::WebSql
            | ApiKey::Appcache => KeyClass::OriginFilterable,
            ApiKey::History => KeyClass::HistoryLike,
            ApiKey::Downloads | ApiKey::FormData => KeyClass::GlobalOnly,
            ApiKey::SessionStorage => KeyClass::InPage,
        }
    }
}

impl Display for CategoryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKey {
    type Err = CleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CleanerError::UnknownKey(s.to_string()))
    }
}

impl FromStr for ApiKey {
    type Err = CleanerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CleanerError::UnknownKey(s.to_string()))
    }
}

/// A key as handed to [`expand_keys`]: either a category or an already low-level api key.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SelectionKey {
    Category(CategoryKey),
    Api(ApiKey),
}

impl From<CategoryKey> for SelectionKey {
    fn from(k: CategoryKey) -> Self {
        SelectionKey::Category(k)
    }
}

impl From<ApiKey> for SelectionKey {
    fn from(k: ApiKey) -> Self {
        SelectionKey::Api(k)
    }
}

impl FromStr for SelectionKey {
    type Err = CleanerError;

    /// Category names win over api keys of the same name (`cache`, `cookies`, `history`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(category) = s.parse::<CategoryKey>() {
            return Ok(SelectionKey::Category(category));
        }
        s.parse::<ApiKey>().map(SelectionKey::Api)
    }
}

/// Expands selected keys into the api keys the host eraser understands.
///
/// Mapped categories contribute their api keys in mapping order; everything else
/// passes through unchanged. With `include_technical` the four hidden technical
/// keys are appended even if already present. Duplicates are kept, erasure is
/// idempotent downstream.
///
/// ```
/// use domain_cleaner::{expand_keys, ApiKey, CategoryKey};
/// let keys = expand_keys([CategoryKey::Cache, CategoryKey::Cookies], false);
/// assert_eq!(keys, vec![ApiKey::Cache, ApiKey::CacheStorage, ApiKey::Cookies]);
/// ```
pub fn expand_keys<I, K>(keys: I, include_technical: bool) -> Vec<ApiKey>
where
    I: IntoIterator<Item = K>,
    K: Into<SelectionKey>,
{
    let mut expanded = Vec::new();

    for key in keys {
        match key.into() {
            SelectionKey::Category(category) => expanded.extend_from_slice(category.api_keys()),
            SelectionKey::Api(api) => expanded.push(api),
        }
    }

    if include_technical {
        expanded.extend_from_slice(&HIDDEN_TECHNICAL_KEYS);
    }

    expanded
}

/// Named category selections offered as one-click buttons and shortcuts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Preset {
    CacheCookies,
    Deep,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::CacheCookies, Preset::Deep];

    pub fn keys(&self) -> &'static [CategoryKey] {
        match self {
            Preset::CacheCookies => &[CategoryKey::Cache, CategoryKey::Cookies],
            Preset::Deep => &UI_OPTION_KEYS,
        }
    }

    /// Returns the preset whose categories equal `selection`, ignoring order.
    pub fn matching(selection: &[CategoryKey]) -> Option<Preset> {
        let mut wanted = selection.to_vec();
        wanted.sort();
        wanted.dedup();

        Preset::ALL.into_iter().find(|preset| {
            let mut keys = preset.keys().to_vec();
            keys.sort();
            keys == wanted
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_and_cookies_expand_in_mapping_order() {
        let keys = expand_keys([CategoryKey::Cache, CategoryKey::Cookies], false);
        assert_eq!(keys, vec![ApiKey::Cache, ApiKey::CacheStorage, ApiKey::Cookies]);
    }

    #[test]
    fn technical_keys_are_appended_last() {
        let keys = expand_keys([CategoryKey::History], true);
        assert_eq!(
            keys,
            vec![
                ApiKey::History,
                ApiKey::Downloads,
                ApiKey::FormData,
                ApiKey::ServiceWorkers,
                ApiKey::FileSystems,
                ApiKey::WebSql,
                ApiKey::Appcache,
            ]
        );
    }

    #[test]
    fn technical_keys_are_appended_even_when_present() {
        let keys = expand_keys([CategoryKey::ServiceWorkers], true);
        assert_eq!(keys.iter().filter(|k| **k == ApiKey::ServiceWorkers).count(), 2);
        assert_eq!(keys.len(), 5);
    }

    #[test]
    fn unmapped_keys_pass_through() {
        let keys = expand_keys(
            [SelectionKey::Api(ApiKey::IndexedDb), SelectionKey::Category(CategoryKey::WebSql)],
            false,
        );
        assert_eq!(keys, vec![ApiKey::IndexedDb, ApiKey::WebSql]);
    }

    #[test]
    fn selection_names_prefer_categories() {
        let keys: Vec<SelectionKey> = ["cache", "siteStorage", "cacheStorage", "webSQL"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(
            expand_keys(keys, false),
            vec![
                ApiKey::Cache,
                ApiKey::CacheStorage,
                ApiKey::LocalStorage,
                ApiKey::SessionStorage,
                ApiKey::IndexedDb,
                ApiKey::CacheStorage,
                ApiKey::WebSql,
            ]
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        match "passwords".parse::<SelectionKey>() {
            Err(CleanerError::UnknownKey(name)) => assert_eq!(name, "passwords"),
            other => panic!("expected UnknownKey, got {:?}", other),
        }
    }

    #[test]
    fn key_names_round_trip_through_serde() {
        for key in ApiKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
            assert_eq!(key.as_str().parse::<ApiKey>().unwrap(), key);
        }
        for key in CategoryKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn classes_partition_api_keys() {
        let filterable: Vec<_> = ApiKey::ALL.into_iter().filter(|k| k.class() == KeyClass::OriginFilterable).collect();
        assert_eq!(filterable.len(), 9);
        assert_eq!(ApiKey::History.class(), KeyClass::HistoryLike);
        assert_eq!(ApiKey::Downloads.class(), KeyClass::GlobalOnly);
        assert_eq!(ApiKey::FormData.class(), KeyClass::GlobalOnly);
        assert_eq!(ApiKey::SessionStorage.class(), KeyClass::InPage);
    }

    #[test]
    fn presets_match_regardless_of_order() {
        assert_eq!(Preset::matching(&[CategoryKey::Cookies, CategoryKey::Cache]), Some(Preset::CacheCookies));
        assert_eq!(
            Preset::matching(&[CategoryKey::History, CategoryKey::SiteStorage, CategoryKey::Cookies, CategoryKey::Cache]),
            Some(Preset::Deep)
        );
        assert_eq!(Preset::matching(&DEFAULT_SELECTED_KEYS), None);
        assert_eq!(Preset::matching(&[]), None);
    }

    #[test]
    fn deep_preset_expands_to_every_ui_api_key() {
        let keys = expand_keys(Preset::Deep.keys().iter().copied(), false);
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&ApiKey::SessionStorage));
        assert!(!keys.contains(&ApiKey::ServiceWorkers));
    }
}
