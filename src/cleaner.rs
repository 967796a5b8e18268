//! Domain-scoped browsing data cleaner.
//!
//! The cleaner erases cache, cookies, site storage, history and a few technical
//! artifacts for the domain of the active tab. It owns no browser state itself:
//! every effect goes through the host capabilities declared in [`host`], and the
//! [`Cleaner`] orchestrates them.
//!
//! # Flow
//!
//! 1. Resolve a [`Scope`] from the active tab's URL ([`parse_tab_url`]).
//! 2. Expand the user's category selection into api keys ([`expand_keys`]).
//! 3. Run [`Cleaner::clear_selected_data`] and relay the [`ClearResult`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use domain_cleaner::{Cleaner, CleanerConfig, HostServices, InMemoryBrowser, CleanAction};
//!
//! # async fn demo() -> Result<(), domain_cleaner::CleanerError> {
//! let browser = Arc::new(InMemoryBrowser::new());
//! let cleaner = Cleaner::new(CleanerConfig::default(), HostServices::from_browser(browser));
//! let outcome = cleaner.run_action(CleanAction::CacheCookiesClean).await?;
//! println!("{:?}", outcome.notice);
//! # Ok(()) }
//! ```

mod actions;
mod cleaner;
mod config;
mod cookies;
mod domain;
mod errors;
mod events;
mod generation;
mod history;
mod keys;
mod preview;
mod scope;
mod session;

pub mod host;

pub use actions::{ActionOutcome, CleanAction, Notice};
pub use cleaner::{Cleaner, ClearRequest, ClearResult};
pub use config::{CleanerConfig, CleanerConfigBuilder, CleanerConfigError, DEFAULT_HSTS_SETTINGS_URL};
pub use cookies::{CookieKey, CookieMap, CookieRecord};
pub use domain::{get_base_domain, get_cookie_candidate_domains, MULTI_PART_TLDS};
pub use errors::CleanerError;
pub use events::CleanerEvent;
pub use generation::{Generation, RequestGeneration};
pub use host::{HostError, HostServices, InMemoryBrowser, TabId, WindowPlacement};
pub use keys::{
    expand_keys, ApiKey, CategoryKey, KeyClass, Preset, SelectionKey, DEFAULT_SELECTED_KEYS,
    HIDDEN_TECHNICAL_KEYS, UI_OPTION_KEYS,
};
pub use preview::{format_megabytes, UsagePreview};
pub use scope::{parse_tab_url, Scope, TabLocation};

/// Default capacity of the cleaner's broadcast event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
