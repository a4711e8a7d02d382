//! Utilities: logging (dynamic level) and minimal text escaping helpers.
//!
//! Key items:
//!   logging::{derive_level, set_log_level, level_for_debug_mode}
//!   output::{html_escape, display_value}

use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Leveled logging to stderr; stdout belongs to the console output sink.
///
/// The level can change at runtime (`debug <MODE>`), so it lives in an atomic.
pub mod logging {
    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        pub fn as_str(self) -> &'static str {
            match self {
                LogLevel::Error => "ERROR",
                LogLevel::Info => "INFO",
                LogLevel::Debug => "DEBUG",
                LogLevel::Trace => "TRACE",
            }
        }
    }

    static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

    pub fn set_log_level(level: LogLevel) {
        LEVEL.store(level as u8, Ordering::Relaxed);
    }

    pub fn current_log_level() -> LogLevel {
        match LEVEL.load(Ordering::Relaxed) {
            0 => LogLevel::Error,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// `-q` wins over any number of `-v`.
    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        match (quiet, verbose) {
            (true, _) => LogLevel::Error,
            (false, 0) => LogLevel::Info,
            (false, 1) => LogLevel::Debug,
            (false, _) => LogLevel::Trace,
        }
    }

    /// Map the integer argument of the `debug` command onto a level.
    pub fn level_for_debug_mode(mode: i64) -> LogLevel {
        if mode < 0 {
            return LogLevel::Error;
        }
        derive_level(u8::try_from(mode).unwrap_or(u8::MAX), false)
    }

    pub fn log(level: LogLevel, msg: impl AsRef<str>) {
        if level > current_log_level() {
            return;
        }
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        eprintln!("[{}][{millis}] {}", level.as_str(), msg.as_ref());
    }

    #[macro_export]
    macro_rules! log_info {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Info, format!($($t)*))
        };
    }
    #[macro_export]
    macro_rules! log_debug {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Debug, format!($($t)*))
        };
    }
    #[macro_export]
    macro_rules! log_trace {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Trace, format!($($t)*))
        };
    }
}

pub use logging::{derive_level, set_log_level};

/// Output related helpers.
pub mod output {
    /// Escape text for insertion into an HTML host (untrusted, user-influenced text).
    pub fn html_escape(input: &str) -> String {
        let mut out = String::with_capacity(input.len() + 8);
        for c in input.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                c => out.push(c),
            }
        }
        out
    }

    /// Render a JSON value as a short cell / inline string.
    ///
    /// Strings are shown without quotes; `false` is shown empty (unset field).
    pub fn display_value(value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null | serde_json::Value::Bool(false) => String::new(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::logging::*;
    use super::output::*;
    use serde_json::json;

    #[test]
    fn derive_level_from_flags() {
        assert_eq!(derive_level(0, false), LogLevel::Info);
        assert_eq!(derive_level(1, false), LogLevel::Debug);
        assert_eq!(derive_level(5, false), LogLevel::Trace);
        assert_eq!(derive_level(2, true), LogLevel::Error);
    }

    #[test]
    fn debug_mode_levels() {
        assert_eq!(level_for_debug_mode(-1), LogLevel::Error);
        assert_eq!(level_for_debug_mode(0), LogLevel::Info);
        assert_eq!(level_for_debug_mode(1), LogLevel::Debug);
        assert_eq!(level_for_debug_mode(9000), LogLevel::Trace);
    }

    #[test]
    fn escape_markup() {
        assert_eq!(
            html_escape("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn display_values() {
        assert_eq!(display_value(&json!("Azure")), "Azure");
        assert_eq!(display_value(&json!(false)), "");
        assert_eq!(display_value(&json!(3)), "3");
        assert_eq!(display_value(&json!([1, "x"])), "[1,\"x\"]");
    }
}
