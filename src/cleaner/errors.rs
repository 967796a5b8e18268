use crate::cleaner::host::HostError;

#[derive(Debug, thiserror::Error)]
pub enum CleanerError {
    #[error("Works only on http/https pages (got scheme \"{0}\")")]
    UnsupportedScheme(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No active tab or the tab has no URL")]
    NoActiveTab,

    #[error("Select at least one category")]
    EmptySelection,

    #[error("Unknown data key: {0}")]
    UnknownKey(String),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}
