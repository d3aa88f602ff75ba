#![allow(missing_docs)]
//! Page components re-armed by the concierge router.
//!
//! None of these hold element references across a swap: each one re-queries
//! the document when it is re-initialized or when the router broadcasts.

mod modal;
mod reveal;
mod scroll_animations;
mod transition;
mod widgets;

use serde::{Deserialize, Serialize};

pub use modal::{ModalController, ModalOptions};
pub use reveal::{RevealEngine, RevealOptions};
pub use scroll_animations::{ScrollAnimationOptions, ScrollAnimationRegistrar};
pub use transition::{PageTransitionCoordinator, TransitionOptions, TransitionState};
pub use widgets::{HeaderScrollEffect, ScrollToTopButton, WidgetOptions};

/// Options for every component, as found under `components` in the page's
/// configuration object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentOptions {
    pub modals: ModalOptions,
    pub animations: ScrollAnimationOptions,
    pub transitions: TransitionOptions,
}

impl ComponentOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read the `components` member of a configuration object. Missing or
    /// malformed members fall back to the defaults.
    pub fn from_config_value(config: &serde_json::Value) -> Self {
        match config.get("components") {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|error| {
                concierge::warn_log!("invalid component options: {}", error);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_keep_defaults() {
        let options = ComponentOptions::from_json(
            r#"{"animations": {"mobile_breakpoint": 640}, "transitions": {"settle_ms": 500}}"#,
        )
        .unwrap();

        assert_eq!(options.animations.mobile_breakpoint, 640.0);
        assert_eq!(options.animations.selector, "[data-animate]");
        assert_eq!(options.transitions.settle_ms, 500);
        assert_eq!(options.modals, ModalOptions::default());
    }

    #[test]
    fn test_options_from_config_object() {
        let config = serde_json::json!({
            "endpoint": "/api/content.php",
            "components": {"modals": {"close_key": "Esc"}}
        });

        assert_eq!(ComponentOptions::from_config_value(&config).modals.close_key, "Esc");
        assert_eq!(
            ComponentOptions::from_config_value(&serde_json::json!({"components": 3})),
            ComponentOptions::default()
        );
    }
}
