#![deny(missing_docs)]
//! Shared logging utilities for the ytdx workspace.
//!
//! Every crate logs through the `ytdx_*` macros defined here so the backend
//! can be swapped in one place. The macros expand to the `log` facade, so
//! callers must depend on `log` themselves.

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! ytdx_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! ytdx_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! ytdx_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! ytdx_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! ytdx_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs a message tagged with a download job id.
///
/// The first argument is the `log` level macro name (`info`, `warn`, ...),
/// the second the job id, followed by regular format arguments:
///
/// ```ignore
/// ytdx_job!(warn, job_id, "extractor exited with {}", status);
/// ```
#[macro_export]
macro_rules! ytdx_job {
    ($level:ident, $job_id:expr, $($arg:tt)*) => {{
        log::$level!("[job {}] {}", $job_id, format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
