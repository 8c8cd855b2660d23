//! Press Configuration - advisor tuning, model sourcing and parameter limits
//!
//! Every tunable constant of the simulator, model loader and advisor lives in
//! this module. Each struct implements `Default` with the reference values, so
//! running without a config file gives the documented behavior.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::{ConfidenceLevel, TargetMetric, TunableParameter};

// ============================================================================
// Config Provenance: tracks which keys the user explicitly set
// ============================================================================

/// Tracks which configuration keys were explicitly present in the user's TOML file.
///
/// After deserialization every `#[serde(default)]` field has a value, so this
/// is the only record of what the operator actually wrote.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvenance {
    /// Dotted key paths explicitly present in the user's TOML file
    pub explicit_keys: HashSet<String>,
}

impl ConfigProvenance {
    /// Check whether a dotted key path was explicitly set by the user.
    ///
    /// Example: `provenance.is_user_set("model_source.url")`
    pub fn is_user_set(&self, dotted_key: &str) -> bool {
        self.explicit_keys.contains(dotted_key)
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one press deployment.
///
/// Load with `PressConfig::load()` which searches:
/// 1. `$PRESS_CONFIG` env var
/// 2. `./press_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PressConfig {
    /// Press identification
    #[serde(default)]
    pub press: PressInfo,

    /// Cycle simulator settings
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Coefficient sourcing (remote service, local artifact, retry policy)
    #[serde(default)]
    pub model_source: ModelSourceConfig,

    /// R² → confidence mapping
    #[serde(default)]
    pub confidence: ConfidenceConfig,

    /// Sensitivity advisor tuning
    #[serde(default)]
    pub advisor: AdvisorConfig,

    /// Physical and recommended bounds per tunable parameter
    #[serde(default)]
    pub limits: ParameterLimits,
}

impl PressConfig {
    /// Load configuration using the standard search order:
    /// 1. `$PRESS_CONFIG` environment variable
    /// 2. `./press_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        Self::load_with_provenance().0
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let (config, _provenance) = Self::load_from_file_with_provenance(path)?;
        Ok(config)
    }

    /// Load from a specific TOML file path, also returning provenance
    /// so callers can distinguish user-set values from defaults.
    pub fn load_from_file_with_provenance(
        path: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings; they never fail the load.
    pub fn from_toml_str(contents: &str) -> Result<(Self, ConfigProvenance), ConfigError> {
        let typo_warnings = super::validation::validate_unknown_keys(contents);
        for w in &typo_warnings {
            warn!("{}", w);
        }

        let provenance = ConfigProvenance {
            explicit_keys: contents
                .parse::<toml::Value>()
                .map(|value| super::validation::walk_toml_keys(&value, ""))
                .unwrap_or_default()
                .into_iter()
                .collect(),
        };

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok((config, provenance))
    }

    /// Load configuration using standard search order, returning provenance.
    pub fn load_with_provenance() -> (Self, ConfigProvenance) {
        // 1. Check env var
        if let Ok(path) = std::env::var("PRESS_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file_with_provenance(&p) {
                    Ok((config, provenance)) => {
                        info!(path = %p.display(), press = %config.press.name, "Loaded press config from PRESS_CONFIG");
                        return (config, provenance);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from PRESS_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "PRESS_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./press_config.toml
        let local = PathBuf::from("press_config.toml");
        if local.exists() {
            match Self::load_from_file_with_provenance(&local) {
                Ok((config, provenance)) => {
                    info!(press = %config.press.name, "Loaded press config from ./press_config.toml");
                    return (config, provenance);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./press_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No press_config.toml found, using built-in defaults");
        (Self::default(), ConfigProvenance::default())
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Press config saved");
        Ok(())
    }

    /// Validate all settings for internal consistency.
    ///
    /// Rules:
    /// - Confidence thresholds must satisfy 0 < medium <= high <= 1
    /// - Confidence weights must sum to approximately 1.0
    /// - Retry policy needs at least one attempt and base backoff <= max backoff
    /// - Every parameter band must be ordered and nest inside its physical range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        // Confidence: medium <= high, both in (0, 1]
        let c = &self.confidence;
        if !(c.medium_threshold > 0.0 && c.medium_threshold <= c.high_threshold && c.high_threshold <= 1.0) {
            errors.push(format!(
                "confidence thresholds must satisfy 0 < medium ({:.2}) <= high ({:.2}) <= 1",
                c.medium_threshold, c.high_threshold
            ));
        }
        let weights = &c.weights;
        let weight_sum = weights.pressure + weights.efficiency + weights.cycle_time;
        if !(0.95..=1.05).contains(&weight_sum) {
            errors.push(format!("confidence.weights must sum to ~1.0, got {weight_sum:.2}"));
        }
        if weights.pressure < 0.0 || weights.efficiency < 0.0 || weights.cycle_time < 0.0 {
            errors.push("confidence.weights must not be negative".to_string());
        }

        // Model source
        let m = &self.model_source;
        if m.max_attempts == 0 {
            errors.push("model_source.max_attempts must be > 0".to_string());
        }
        if m.timeout_secs == 0 {
            errors.push("model_source.timeout_secs must be > 0".to_string());
        }
        if m.base_backoff_ms > m.max_backoff_ms {
            errors.push(format!(
                "model_source.base_backoff_ms ({}) must be <= max_backoff_ms ({})",
                m.base_backoff_ms, m.max_backoff_ms
            ));
        }
        if !(0.0..=1.0).contains(&m.min_r_squared) {
            errors.push(format!(
                "model_source.min_r_squared ({:.2}) must be within 0-1",
                m.min_r_squared
            ));
        }

        // Advisor
        let a = &self.advisor;
        if a.max_suggestions == 0 {
            errors.push("advisor.max_suggestions must be > 0".to_string());
        }
        if a.rpm_step <= 0.0 || a.default_step <= 0.0 {
            errors.push("advisor step sizes must be > 0 (used as divisor)".to_string());
        }
        if a.min_sensitivity < 0.0 {
            errors.push("advisor.min_sensitivity must not be negative".to_string());
        }

        // Simulation
        if self.simulation.relief_margin_percent < 0.0 {
            errors.push("simulation.relief_margin_percent must not be negative".to_string());
        }

        // Limits
        for param in TunableParameter::ALL {
            Self::check_band(self.limits.band(param), &format!("limits.{}", limit_key(param)), &mut errors);
        }
        if self.limits.rod_clearance_cm < 0.0 {
            errors.push("limits.rod_clearance_cm must not be negative".to_string());
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        // Reject NaN/Inf in any config value (sweep all f64 fields via serialization)
        if let Ok(value) = toml::Value::try_from(self) {
            if super::validation::contains_non_finite(&value) {
                errors.push(
                    "Config contains NaN or Inf values; all settings must be finite numbers".to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_band(band: &ParameterBand, name: &str, errors: &mut Vec<String>) {
        let values = [
            band.physical_min,
            band.physical_max,
            band.recommended_min,
            band.recommended_max,
        ];
        // NaN/Inf comparisons silently pass
        if values.iter().any(|v| !v.is_finite()) {
            errors.push(format!("{name}: bounds must be finite"));
            return;
        }
        if band.physical_min >= band.physical_max {
            errors.push(format!(
                "{name}: physical_min ({:.3}) must be < physical_max ({:.3})",
                band.physical_min, band.physical_max
            ));
        }
        if band.recommended_min > band.recommended_max {
            errors.push(format!(
                "{name}: recommended_min ({:.3}) must be <= recommended_max ({:.3})",
                band.recommended_min, band.recommended_max
            ));
        }
        if band.recommended_min < band.physical_min || band.recommended_max > band.physical_max {
            errors.push(format!("{name}: recommended band must lie inside the physical range"));
        }
    }
}

/// TOML section name for a tunable parameter's limits.
pub fn limit_key(param: TunableParameter) -> &'static str {
    match param {
        TunableParameter::BoreCm => "bore_cm",
        TunableParameter::RodCm => "rod_cm",
        TunableParameter::MotorRpm => "motor_rpm",
        TunableParameter::PumpEfficiency => "pump_efficiency",
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Press Info
// ============================================================================

/// Identification metadata. Appears in logs and reports only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressInfo {
    #[serde(default = "default_press_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

fn default_press_name() -> String {
    "Unnamed Press".to_string()
}

impl Default for PressInfo {
    fn default() -> Self {
        Self {
            name: default_press_name(),
            description: String::new(),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Cycle simulator settings.
///
/// The phase profile itself is fixed; only sizing margins are tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Margin above peak required pressure for the relief valve setting (%).
    #[serde(default = "default_relief_margin")]
    pub relief_margin_percent: f64,
}

fn default_relief_margin() -> f64 { 10.0 }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            relief_margin_percent: default_relief_margin(),
        }
    }
}

// ============================================================================
// Model Source
// ============================================================================

/// Where regression coefficients come from and how hard to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSourceConfig {
    /// Remote coefficient endpoint. Unset means skip straight to the artifact.
    ///
    /// Can be overridden by `PRESS_MODEL_URL` env var or `--model-url` CLI flag.
    #[serde(default)]
    pub url: Option<String>,

    /// Local standardized model artifact (JSON).
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,

    /// Per-request timeout (s). Expected range 5–8.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total fetch attempts against the remote source.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First backoff delay (ms); doubles per retry.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Backoff cap (ms).
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Add ±25% random jitter to each backoff delay.
    #[serde(default = "default_jitter")]
    pub jitter: bool,

    /// Minimum R² each metric must report to accept remote coefficients.
    #[serde(default = "default_min_r_squared")]
    pub min_r_squared: f64,

    /// Minimum training set size to accept remote coefficients (exclusive).
    #[serde(default = "default_min_training_points")]
    pub min_training_points: u64,
}

fn default_timeout_secs() -> u64 { super::defaults::MODEL_HTTP_TIMEOUT_SECS }
fn default_max_attempts() -> u32 { super::defaults::MODEL_FETCH_MAX_ATTEMPTS }
fn default_base_backoff_ms() -> u64 { 500 }
fn default_max_backoff_ms() -> u64 { 4_000 }
fn default_jitter() -> bool { true }
fn default_min_r_squared() -> f64 { 0.7 }
fn default_min_training_points() -> u64 { 1_000 }

impl Default for ModelSourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            artifact_path: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter: default_jitter(),
            min_r_squared: default_min_r_squared(),
            min_training_points: default_min_training_points(),
        }
    }
}

// ============================================================================
// Confidence
// ============================================================================

/// Maps the weighted R² of the three sub-models to a confidence label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Weighted R² at or above this is HIGH.
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,

    /// Weighted R² at or above this is MEDIUM; below is LOW.
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,

    #[serde(default)]
    pub weights: MetricWeights,
}

fn default_high_threshold() -> f64 { 0.92 }
fn default_medium_threshold() -> f64 { 0.85 }

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            weights: MetricWeights::default(),
        }
    }
}

impl ConfidenceConfig {
    /// Label a single R² value.
    pub fn level_for(&self, r_squared: f64) -> ConfidenceLevel {
        if r_squared >= self.high_threshold {
            ConfidenceLevel::High
        } else if r_squared >= self.medium_threshold {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Per-metric weights for the combined R².
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricWeights {
    #[serde(default = "default_weight_pressure")]
    pub pressure: f64,
    #[serde(default = "default_weight_efficiency")]
    pub efficiency: f64,
    #[serde(default = "default_weight_cycle_time")]
    pub cycle_time: f64,
}

fn default_weight_pressure() -> f64 { 0.4 }
fn default_weight_efficiency() -> f64 { 0.3 }
fn default_weight_cycle_time() -> f64 { 0.3 }

impl Default for MetricWeights {
    fn default() -> Self {
        Self {
            pressure: default_weight_pressure(),
            efficiency: default_weight_efficiency(),
            cycle_time: default_weight_cycle_time(),
        }
    }
}

impl MetricWeights {
    pub fn weight(&self, metric: TargetMetric) -> f64 {
        match metric {
            TargetMetric::Pressure => self.pressure,
            TargetMetric::Efficiency => self.efficiency,
            TargetMetric::CycleTime => self.cycle_time,
        }
    }
}

// ============================================================================
// Advisor
// ============================================================================

/// Sensitivity advisor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Maximum suggestions returned per request.
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Finite-difference step for RPM-scale parameters.
    #[serde(default = "default_rpm_step")]
    pub rpm_step: f64,

    /// Finite-difference step for all other parameters.
    #[serde(default = "default_step")]
    pub default_step: f64,

    /// Sensitivities with magnitude below this are treated as no effect.
    #[serde(default = "default_min_sensitivity")]
    pub min_sensitivity: f64,
}

fn default_max_suggestions() -> usize { 4 }
fn default_rpm_step() -> f64 { 10.0 }
fn default_step() -> f64 { 0.1 }
fn default_min_sensitivity() -> f64 { 1e-6 }

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            max_suggestions: default_max_suggestions(),
            rpm_step: default_rpm_step(),
            default_step: default_step(),
            min_sensitivity: default_min_sensitivity(),
        }
    }
}

impl AdvisorConfig {
    /// Perturbation step for a parameter.
    pub fn step_for(&self, param: TunableParameter) -> f64 {
        match param {
            TunableParameter::MotorRpm => self.rpm_step,
            _ => self.default_step,
        }
    }
}

// ============================================================================
// Parameter Limits
// ============================================================================

/// Hard physical range plus the tighter recommended operating band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBand {
    pub physical_min: f64,
    pub physical_max: f64,
    pub recommended_min: f64,
    pub recommended_max: f64,
}

impl ParameterBand {
    pub const fn new(physical: (f64, f64), recommended: (f64, f64)) -> Self {
        Self {
            physical_min: physical.0,
            physical_max: physical.1,
            recommended_min: recommended.0,
            recommended_max: recommended.1,
        }
    }

    pub fn is_recommended(&self, value: f64) -> bool {
        (self.recommended_min..=self.recommended_max).contains(&value)
    }
}

/// Limits for every tunable parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterLimits {
    #[serde(default = "default_bore_band")]
    pub bore_cm: ParameterBand,

    /// Rod upper bound is further capped at `bore - rod_clearance_cm`.
    #[serde(default = "default_rod_band")]
    pub rod_cm: ParameterBand,

    #[serde(default = "default_rpm_band")]
    pub motor_rpm: ParameterBand,

    #[serde(default = "default_efficiency_band")]
    pub pump_efficiency: ParameterBand,

    /// Minimum wall between rod and bore (cm).
    #[serde(default = "default_rod_clearance")]
    pub rod_clearance_cm: f64,
}

fn default_bore_band() -> ParameterBand { ParameterBand::new((3.0, 12.0), (3.0, 8.5)) }
fn default_rod_band() -> ParameterBand { ParameterBand::new((1.0, 11.5), (1.0, 11.5)) }
fn default_rpm_band() -> ParameterBand { ParameterBand::new((500.0, 3500.0), (1000.0, 3000.0)) }
fn default_efficiency_band() -> ParameterBand { ParameterBand::new((0.5, 0.98), (0.7, 0.95)) }
fn default_rod_clearance() -> f64 { 0.5 }

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            bore_cm: default_bore_band(),
            rod_cm: default_rod_band(),
            motor_rpm: default_rpm_band(),
            pump_efficiency: default_efficiency_band(),
            rod_clearance_cm: default_rod_clearance(),
        }
    }
}

impl ParameterLimits {
    pub fn band(&self, param: TunableParameter) -> &ParameterBand {
        match param {
            TunableParameter::BoreCm => &self.bore_cm,
            TunableParameter::RodCm => &self.rod_cm,
            TunableParameter::MotorRpm => &self.motor_rpm,
            TunableParameter::PumpEfficiency => &self.pump_efficiency,
        }
    }

    /// Physical `(min, max)` for `param` given the current bore.
    pub fn physical_range(&self, param: TunableParameter, bore_cm: f64) -> (f64, f64) {
        let band = self.band(param);
        match param {
            TunableParameter::RodCm => {
                let max = band.physical_max.min(bore_cm - self.rod_clearance_cm);
                (band.physical_min, max.max(band.physical_min))
            }
            _ => (band.physical_min, band.physical_max),
        }
    }

    /// Whether `value` sits inside the recommended band for `param`.
    pub fn is_recommended(&self, param: TunableParameter, value: f64, bore_cm: f64) -> bool {
        match param {
            TunableParameter::RodCm => self.band(param).is_recommended(value) && value < bore_cm,
            _ => self.band(param).is_recommended(value),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
