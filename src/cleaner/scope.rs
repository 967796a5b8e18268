//! Scope resolution: which origins, hostnames and tabs a clearing operation targets.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::cleaner::errors::CleanerError;
use crate::cleaner::host::{TabId, TabInfo};

/// A validated http(s) page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabLocation {
    /// The page URL as reported by the host.
    pub url: String,
    /// ASCII serialization of the origin, e.g. `https://example.com:8443`.
    pub origin: String,
    pub hostname: String,
}

/// Parses a tab URL, accepting only `http` and `https` pages.
///
/// Extension and browser-internal pages are rejected: data clearing and history
/// lookups are meaningless there and partly forbidden by the host.
pub fn parse_tab_url(url: &str) -> Result<TabLocation, CleanerError> {
    let parsed = Url::parse(url)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CleanerError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    Ok(TabLocation {
        url: url.to_string(),
        origin: parsed.origin().ascii_serialization(),
        hostname: parsed.host_str().unwrap_or_default().to_string(),
    })
}

/// The targets of one clearing operation. Fixed for the duration of the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub origins: Vec<String>,
    pub hostnames: Vec<String>,
    pub tab_ids: Vec<TabId>,
}

impl Scope {
    /// Scope covering a single tab.
    pub fn for_tab(tab_id: TabId, location: &TabLocation) -> Self {
        Self {
            origins: vec![location.origin.clone()],
            hostnames: vec![location.hostname.clone()],
            tab_ids: vec![tab_id],
        }
    }

    /// Resolves the scope of the tab reported as active by the host.
    pub(crate) fn from_active_tab(tab: Option<TabInfo>) -> Result<(Self, TabLocation), CleanerError> {
        let tab = tab.ok_or(CleanerError::NoActiveTab)?;
        let (Some(id), Some(url)) = (tab.id, tab.url.as_deref()) else {
            return Err(CleanerError::NoActiveTab);
        };

        let location = parse_tab_url(url)?;
        Ok((Self::for_tab(id, &location), location))
    }
}
