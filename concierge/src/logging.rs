//! Logging macros that write to the browser console on wasm32 and to stderr
//! everywhere else.
//!
//! All of them compile to nothing without `debug_assertions`; `debug_log!`
//! additionally needs the `debug-hooks` feature.
//!
//! ```ignore
//! use concierge::{debug_log, warn_log};
//!
//! debug_log!("link rejected: {:?}", rejection);
//! warn_log!("fragment fetch failed: {}", error);
//! ```

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks", target_arch = "wasm32"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        $crate::web_sys::console::debug_1(&format!($($arg)*).into());
    }};
}

/// Logs a debug message (requires `debug-hooks` feature + `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, feature = "debug-hooks", not(target_arch = "wasm32")))]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        eprintln!("[DEBUG] {}", format!($($arg)*));
    }};
}

/// No-op debug_log when conditions are not met
#[macro_export]
#[cfg(not(all(debug_assertions, feature = "debug-hooks")))]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Logs an info message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, target_arch = "wasm32"))]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        $crate::web_sys::console::info_1(&format!($($arg)*).into());
    }};
}

/// Logs an info message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        eprintln!("[INFO] {}", format!($($arg)*));
    }};
}

/// No-op info_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Logs a warning message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, target_arch = "wasm32"))]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        $crate::web_sys::console::warn_1(&format!($($arg)*).into());
    }};
}

/// Logs a warning message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        eprintln!("[WARN] {}", format!($($arg)*));
    }};
}

/// No-op warn_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! warn_log {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Logs an error message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, target_arch = "wasm32"))]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        $crate::web_sys::console::error_1(&format!($($arg)*).into());
    }};
}

/// Logs an error message (requires `debug_assertions`)
#[macro_export]
#[cfg(all(debug_assertions, not(target_arch = "wasm32")))]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        eprintln!("[ERROR] {}", format!($($arg)*));
    }};
}

/// No-op error_log in release builds
#[macro_export]
#[cfg(not(debug_assertions))]
macro_rules! error_log {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

#[cfg(test)]
mod tests {
    use crate::{debug_log, error_log, info_log, warn_log};

    #[test]
    #[deny(unused_variables)]
    fn test_disabled_macros_still_use_their_arguments() {
        let rejection = "fragment only";
        let error = 404;

        debug_log!("left to the browser: {:?}", rejection);
        warn_log!("fetch failed: {}", error);
    }

    #[test]
    fn test_logging_macros_compile() {
        debug_log!("Debug message: {}", 42);
        info_log!("Info message: {}", "test");
        warn_log!("Warning message: {:?}", vec![1, 2, 3]);
        error_log!("Error message: {}", "error");
    }
}
