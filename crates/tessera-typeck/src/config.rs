//! Checker configuration.

use tessera_log::warn;
use tessera_syntax::diagnostic::DEFAULT_MAX_ERRORS;

/// Environment variable overriding [`CheckerConfig::max_errors`].
pub const MAX_ERRORS_ENV: &str = "TESSERA_MAX_ERRORS";

/// Environment variable enabling [`CheckerConfig::borrow_tracking`].
pub const BORROWCK_ENV: &str = "TESSERA_BORROWCK";

/// Configuration for type checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Errors tolerated before `should_abort` turns true
    pub max_errors: usize,
    /// Register borrows with the region tracker on `&` and `&mut`
    pub borrow_tracking: bool,
    /// Require unsafe/kernel callers for unsafe/kernel callees
    pub unsafe_checks: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            max_errors: DEFAULT_MAX_ERRORS,
            borrow_tracking: false,
            unsafe_checks: true,
        }
    }
}

impl CheckerConfig {
    /// Sets the error limit.
    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Enables or disables borrow tracking.
    #[must_use]
    pub fn with_borrow_tracking(mut self, enabled: bool) -> Self {
        self.borrow_tracking = enabled;
        self
    }

    /// Enables or disables unsafe/kernel call checks.
    #[must_use]
    pub fn with_unsafe_checks(mut self, enabled: bool) -> Self {
        self.unsafe_checks = enabled;
        self
    }

    /// Defaults overridden by `TESSERA_MAX_ERRORS` and `TESSERA_BORROWCK`.
    ///
    /// Unparseable values are logged and ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_ERRORS_ENV) {
            match raw.trim().parse() {
                Ok(n) => config.max_errors = n,
                Err(_) => warn!("ignoring {MAX_ERRORS_ENV}={raw:?}: not a number"),
            }
        }
        if let Some(raw) = lookup(BORROWCK_ENV) {
            match parse_flag(&raw) {
                Some(flag) => config.borrow_tracking = flag,
                None => warn!("ignoring {BORROWCK_ENV}={raw:?}: expected 1/0/true/false"),
            }
        }
        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
