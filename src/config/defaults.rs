//! System-wide default constants.
//!
//! Centralises fixed numbers shared across subsystems.

// ============================================================================
// Cycle Simulation
// ============================================================================

/// Fixed integration step of the cycle simulator (s).
pub const SIMULATION_DT_SECS: f64 = 0.01;

/// Minimum pair spacing used by energy integration (s).
///
/// Guards against zero or negative time deltas between samples.
pub const ENERGY_MIN_DT_SECS: f64 = 0.001;

// ============================================================================
// Model Source
// ============================================================================

/// HTTP client timeout for coefficient requests (seconds).
pub const MODEL_HTTP_TIMEOUT_SECS: u64 = 6;

/// Total fetch attempts against the remote coefficient source.
pub const MODEL_FETCH_MAX_ATTEMPTS: u32 = 3;

/// Maximum backoff exponent for coefficient fetch retries (2^n multiplier).
pub const MODEL_FETCH_MAX_BACKOFF_EXPONENT: u32 = 4;

// ============================================================================
// Heuristic Fallback
// ============================================================================

/// Cycle time assumed when no regression is usable (s).
///
/// Sum of the fixed phase durations: 1.00 + 5.00 + 2.00 + 1.25.
pub const HEURISTIC_CYCLE_TIME_SECS: f64 = 9.25;
