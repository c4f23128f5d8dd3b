#![deny(missing_docs)]
//! Shared logging utilities for the tubegrab workspace.
//!
//! Every crate logs through the `tg_*` macros below so that records carry the
//! common [`TARGET`] and can be filtered as one unit by the app logger.

/// Log target shared by all tubegrab crates.
pub const TARGET: &str = "tubegrab";

/// Logs a trace-level message under the tubegrab target.
#[macro_export]
macro_rules! tg_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message under the tubegrab target.
#[macro_export]
macro_rules! tg_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message under the tubegrab target.
#[macro_export]
macro_rules! tg_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message under the tubegrab target.
#[macro_export]
macro_rules! tg_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message under the tubegrab target.
#[macro_export]
macro_rules! tg_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Initializes a terminal logger for tests.
///
/// Safe to call from every test: a second initialization is ignored.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str(TARGET)
        .build();

    let _ = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Never);
}
