//! Press Configuration Module
//!
//! Provides per-press configuration loaded from TOML files: model sourcing,
//! confidence thresholds, advisor tuning and parameter limits.
//!
//! ## Loading Order
//!
//! 1. `PRESS_CONFIG` environment variable (path to TOML file)
//! 2. `press_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The binary calls `config::init()` once at startup, then `config::get()`:
//!
//! ```ignore
//! config::init(PressConfig::load());
//! let limits = &config::get().limits;
//! ```
//!
//! Library components never read the global; they take their section as a
//! constructor argument.

mod press_config;
pub mod defaults;
pub mod validation;

pub use press_config::*;

use std::sync::OnceLock;

/// Global press configuration, initialized once at startup.
static PRESS_CONFIG: OnceLock<PressConfig> = OnceLock::new();

/// Initialize the global press configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: PressConfig) {
    if PRESS_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global press configuration.
///
/// Falls back to built-in defaults if `init()` has not been called.
pub fn get() -> &'static PressConfig {
    PRESS_CONFIG.get_or_init(PressConfig::default)
}
