//! Cookie collection and removal for a set of hostnames.
//!
//! The host's bulk eraser cannot remove cookies with hostname-suffix precision
//! without also removing unrelated cookies that share the origin's broader
//! domain, so cookies are enumerated per candidate domain, deduplicated in a
//! [`CookieMap`] and removed one by one.

use futures::future::join_all;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cleaner::domain::get_cookie_candidate_domains;
use crate::cleaner::host::CookieStore;

/// A cookie as reported by the host's cookie store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    /// Cookie name (case-sensitive).
    pub name: String,
    pub value: String,
    /// Cookie domain. Domain cookies carry a leading dot (`.example.com`).
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    /// Cookie store the record lives in (regular, incognito, container, ...).
    pub store_id: String,
}

impl CookieRecord {
    pub fn key(&self) -> CookieKey {
        CookieKey {
            store_id: self.store_id.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
            name: self.name.clone(),
        }
    }

    /// URL the host needs to address this cookie for removal.
    ///
    /// ```
    /// # use domain_cleaner::CookieRecord;
    /// let c = CookieRecord {
    ///     name: "sid".into(), value: "1".into(), domain: ".example.com".into(), path: "/app".into(),
    ///     secure: true, http_only: false, host_only: false, store_id: "0".into(),
    /// };
    /// assert_eq!(c.removal_url(), "https://example.com/app");
    /// ```
    pub fn removal_url(&self) -> String {
        let host = self.domain.strip_prefix('.').unwrap_or(&self.domain);
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}{}", scheme, host, self.path)
    }
}

/// Identity of a cookie: (store id, domain, path, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey {
    pub store_id: String,
    pub domain: String,
    pub path: String,
    pub name: String,
}

/// Cookies gathered from several domain queries, deduplicated by [`CookieKey`].
#[derive(Debug, Clone, Default)]
pub struct CookieMap {
    entries: BTreeMap<CookieKey, CookieRecord>,
}

impl CookieMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any record with the same key.
    pub fn insert(&mut self, cookie: CookieRecord) {
        self.entries.insert(cookie.key(), cookie);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &CookieRecord> {
        self.entries.values()
    }
}

impl Extend<CookieRecord> for CookieMap {
    fn extend<T: IntoIterator<Item = CookieRecord>>(&mut self, iter: T) {
        for cookie in iter {
            self.insert(cookie);
        }
    }
}

/// Collects every cookie matching a candidate domain of any of `hostnames`.
///
/// Domain queries run concurrently. A failing query is logged and skipped.
pub(crate) async fn collect_cookies_for_hostnames(store: &dyn CookieStore, hostnames: &[String]) -> CookieMap {
    let domains: Vec<String> = hostnames
        .iter()
        .flat_map(|hostname| get_cookie_candidate_domains(hostname))
        .collect();

    let results = join_all(domains.iter().map(|domain| store.query_cookies(domain))).await;

    let mut map = CookieMap::new();
    for (domain, result) in domains.iter().zip(results) {
        match result {
            Ok(cookies) => map.extend(cookies),
            Err(e) => warn!("Cookies: query for domain {} failed: {}", domain, e),
        }
    }

    debug!("Cookies: collected {} cookies for {:?}", map.len(), hostnames);
    map
}

/// Removes every cookie in `map` and returns how many removals the host confirmed.
pub(crate) async fn remove_cookies(store: &dyn CookieStore, map: &CookieMap) -> u64 {
    let mut removed = 0;

    for cookie in map.values() {
        let url = cookie.removal_url();
        match store.remove_cookie(&url, &cookie.name, &cookie.store_id).await {
            Ok(true) => removed += 1,
            Ok(false) => debug!("Cookies: host removed nothing for {} at {}", cookie.name, url),
            Err(e) => warn!("Cookies: cannot remove {} at {}: {}", cookie.name, url, e),
        }
    }

    removed
}
