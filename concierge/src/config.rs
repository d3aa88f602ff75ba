//! Router configuration.
//!
//! Every field has a default matching the hotel site's markup; a page may
//! override any subset through a JSON object (see [`RouterConfig::from_json`]).

use std::time::Duration;

use concierge_router::SpaPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Path of the content-fragment endpoint.
    pub endpoint: String,
    /// Query parameter of a room URL that carries its slug.
    pub slug_param: String,
    pub policy: SpaPolicy,
    pub selectors: Selectors,
    pub classes: Classes,
    pub timings: Timings,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/content.php".to_owned(),
            slug_param: "room".to_owned(),
            policy: SpaPolicy::default(),
            selectors: Selectors::default(),
            classes: Classes::default(),
            timings: Timings::default(),
        }
    }
}

impl RouterConfig {
    /// Parse a (possibly partial) JSON override.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Id of the element holding everything between header and footer.
    pub wrapper_id: String,
    pub header: String,
    pub footer: String,
    pub loader: String,
    pub hero: String,
    pub desktop_nav_links: String,
    pub mobile_nav_links: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            wrapper_id: "spa-wrapper".to_owned(),
            header: "header".to_owned(),
            footer: "footer".to_owned(),
            loader: "#page-loader".to_owned(),
            hero: "[data-hero]".to_owned(),
            desktop_nav_links: ".nav-links a".to_owned(),
            mobile_nav_links: ".mobile-menu a".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Classes {
    pub wrapper: String,
    pub nav_active: String,
    pub loader_active: String,
    /// Set on `<body>` while a navigation is in flight.
    pub page_loading: String,
}

impl Default for Classes {
    fn default() -> Self {
        Self {
            wrapper: "spa-wrapper".to_owned(),
            nav_active: "active".to_owned(),
            loader_active: "active".to_owned(),
            page_loading: "page-loading".to_owned(),
        }
    }
}

/// Durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub fade_out_ms: u64,
    pub fade_in_ms: u64,
    /// Added to a fade duration before giving up on `transitionend`.
    pub transition_slack_ms: u64,
    pub hero_timeout_ms: u64,
    pub fallback_delay_ms: u64,
    pub loading_class_delay_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            fade_out_ms: 200,
            fade_in_ms: 350,
            transition_slack_ms: 50,
            hero_timeout_ms: 2500,
            fallback_delay_ms: 300,
            loading_class_delay_ms: 150,
        }
    }
}

impl Timings {
    pub fn fade_out(&self) -> Duration {
        Duration::from_millis(self.fade_out_ms)
    }

    pub fn fade_in(&self) -> Duration {
        Duration::from_millis(self.fade_in_ms)
    }

    /// Longest wait for a fade of `duration` to report completion.
    pub fn fade_ceiling(&self, duration: Duration) -> Duration {
        duration + Duration::from_millis(self.transition_slack_ms)
    }

    pub fn hero_timeout(&self) -> Duration {
        Duration::from_millis(self.hero_timeout_ms)
    }

    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }

    pub fn loading_class_delay(&self) -> Duration {
        Duration::from_millis(self.loading_class_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_router::PageKey;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = RouterConfig::from_json(
            r#"{
                "endpoint": "/fragments",
                "timings": { "hero_timeout_ms": 900 },
                "policy": { "allow": ["gym"] }
            }"#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "/fragments");
        assert_eq!(config.slug_param, "room");
        assert_eq!(config.timings.hero_timeout(), Duration::from_millis(900));
        assert_eq!(config.timings.fade_out_ms, 200);
        assert_eq!(config.policy.allow, vec![PageKey::Gym]);
        assert_eq!(config.selectors.wrapper_id, "spa-wrapper");
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        assert!(RouterConfig::from_json(r#"{ "timings": { "fade_in_ms": "slow" } }"#).is_err());
    }
}
