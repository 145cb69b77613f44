//! Minimal levelled logging for the `tessera` crates.
//!
//! The checker is single-threaded, but the logger is a process-wide singleton
//! so drivers, tests and benches can share one configuration. Messages go to
//! stderr as `[LEVEL] module::path: message`.
//!
//! # Example
//!
//! ```
//! use tessera_log::{debug, info, Level};
//!
//! tessera_log::set_level(Level::Debug);
//!
//! let unit = "main.tsr";
//! info!("checking {}", unit);
//! debug!("bindings: {:?}", vec!["x", "y"]);
//! ```
//!
//! The level can also come from the environment:
//!
//! ```no_run
//! // TESSERA_LOG=trace cargo test
//! tessera_log::init_from_env();
//! ```

use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Environment variable holding the minimum log level.
pub const LEVEL_ENV: &str = "TESSERA_LOG";

/// Environment variable that disables ANSI colours when set.
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Severity of a log message, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Unrecoverable failures.
    Error = 0,
    /// Suspicious conditions that do not stop checking.
    Warn = 1,
    /// High-level progress.
    Info = 2,
    /// Per-declaration detail.
    Debug = 3,
    /// Per-unification detail.
    Trace = 4,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Upper-case name used in log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    fn from_u8(raw: u8) -> Level {
        Self::ALL.get(raw as usize).copied().unwrap_or(Level::Info)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid log level: {}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// Process-wide logger state.
pub struct Logger {
    level: AtomicU8,
    color: AtomicBool,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
            color: AtomicBool::new(true),
        }
    }

    /// Sets the minimum level that will be printed.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Enables or disables ANSI colours.
    pub fn set_color(&self, enabled: bool) {
        self.color.store(enabled, Ordering::SeqCst);
    }

    /// Whether a message at `level` would be printed.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }

    fn write(&self, level: Level, target: &str, args: Arguments) {
        if self.color.load(Ordering::Relaxed) {
            eprintln!("{}[{}]\x1b[0m {target}: {args}", level.color_code(), level);
        } else {
            eprintln!("[{level}] {target}: {args}");
        }
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, creating it at `Info` on first use.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Info))
}

/// Sets the global minimum level.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the global minimum level from its name (`"debug"`, `"TRACE"`, ...).
pub fn set_level_from_str(s: &str) -> Result<(), ParseLevelError> {
    set_level(s.parse()?);
    Ok(())
}

/// Configures the global logger from `TESSERA_LOG` and `NO_COLOR`.
///
/// An unset or unparsable `TESSERA_LOG` leaves the level unchanged.
/// Returns the level in effect afterwards.
pub fn init_from_env() -> Level {
    let logger = get_logger();
    if let Ok(raw) = std::env::var(LEVEL_ENV) {
        if let Ok(level) = raw.parse() {
            logger.set_level(level);
        }
    }
    if std::env::var_os(NO_COLOR_ENV).is_some() {
        logger.set_color(false);
    }
    logger.level()
}

#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    let logger = get_logger();
    if logger.enabled(level) {
        logger.write(level, target, args);
    }
}

/// Logs at an explicit level, tagging the line with the caller's module path.
///
/// ```
/// use tessera_log::{log, Level};
///
/// log!(level: Level::Info, "{} declarations", 3);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {
        {
            if $crate::get_logger().enabled($level) {
                $crate::__log_with_target($level, module_path!(), format_args!($($arg)*));
            }
        }
    };
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs at [`Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
