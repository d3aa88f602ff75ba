use concierge_router::FragmentError;
use thiserror::Error;

/// Why a navigation did not end with swapped content.
///
/// Every variant except [`NavigationError::Superseded`] is followed by a hard
/// navigation to the target URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Fragment(#[from] FragmentError),
    #[error("page has no content wrapper")]
    MissingWrapper,
    #[error("current location is not a valid URL: {0}")]
    Location(String),
    #[error("superseded by a newer navigation")]
    Superseded,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid router configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}
