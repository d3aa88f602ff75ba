use wasm_bindgen::JsValue;

use crate::config::RouterConfig;

/// Global the page may set before the bundle loads to override defaults.
const CONFIG_GLOBAL: &str = "CONCIERGE_CONFIG";

fn config_object() -> Option<JsValue> {
    let window = web_sys::window()?;
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL)).ok()?;

    if value.is_undefined() || value.is_null() {
        return None;
    }

    Some(value)
}

/// Read `window.CONCIERGE_CONFIG`, falling back to defaults when it is
/// absent or malformed.
pub fn config_from_window() -> RouterConfig {
    let Some(object) = config_object() else {
        return RouterConfig::default();
    };

    let json = js_sys::JSON::stringify(&object)
        .ok()
        .and_then(|json| json.as_string());

    match json.map(|json| RouterConfig::from_json(&json)) {
        Some(Ok(config)) => config,
        Some(Err(error)) => {
            crate::warn_log!("ignoring {}: {}", CONFIG_GLOBAL, error);
            RouterConfig::default()
        }
        None => {
            crate::warn_log!("ignoring {}: not serializable", CONFIG_GLOBAL);
            RouterConfig::default()
        }
    }
}

/// `window.CONCIERGE_CONFIG` as a JSON value, `Null` when absent, for
/// components that read their own section of it.
pub fn config_value_from_window() -> serde_json::Value {
    config_object()
        .and_then(|object| js_sys::JSON::stringify(&object).ok())
        .and_then(|json| json.as_string())
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or(serde_json::Value::Null)
}
