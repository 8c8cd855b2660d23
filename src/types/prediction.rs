//! Prediction types: target metrics, features, confidence, PredictionResult

use serde::{Deserialize, Serialize};

use super::InputModel;

// ============================================================================
// Metrics and Features
// ============================================================================

/// Performance metric scored by the regression model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetMetric {
    /// Maximum indicated pressure over the cycle (bar)
    Pressure,
    /// Overall hydraulic efficiency (0–1)
    Efficiency,
    /// Cycle duration (s)
    CycleTime,
}

impl TargetMetric {
    pub const ALL: [TargetMetric; 3] = [
        TargetMetric::Pressure,
        TargetMetric::Efficiency,
        TargetMetric::CycleTime,
    ];

    /// Wire key used in coefficient payloads.
    pub fn key(&self) -> &'static str {
        match self {
            TargetMetric::Pressure => "pressure",
            TargetMetric::Efficiency => "efficiency",
            TargetMetric::CycleTime => "cycleTime",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            TargetMetric::Pressure => "bar",
            TargetMetric::Efficiency => "",
            TargetMetric::CycleTime => "s",
        }
    }

    /// Read this metric from a prediction.
    pub fn value_of(&self, prediction: &PredictionResult) -> f64 {
        match self {
            TargetMetric::Pressure => prediction.max_pressure,
            TargetMetric::Efficiency => prediction.efficiency,
            TargetMetric::CycleTime => prediction.cycle_time,
        }
    }
}

impl std::fmt::Display for TargetMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetMetric::Pressure => write!(f, "max pressure"),
            TargetMetric::Efficiency => write!(f, "efficiency"),
            TargetMetric::CycleTime => write!(f, "cycle time"),
        }
    }
}

/// Input field usable as a regression feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    BoreCm,
    RodCm,
    DeadLoadTon,
    HoldingLoadTon,
    MotorRpm,
    PumpEfficiency,
    SystemLossBar,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::BoreCm,
        Feature::RodCm,
        Feature::DeadLoadTon,
        Feature::HoldingLoadTon,
        Feature::MotorRpm,
        Feature::PumpEfficiency,
        Feature::SystemLossBar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::BoreCm => "boreCm",
            Feature::RodCm => "rodCm",
            Feature::DeadLoadTon => "deadLoadTon",
            Feature::HoldingLoadTon => "holdingLoadTon",
            Feature::MotorRpm => "motorRpm",
            Feature::PumpEfficiency => "pumpEfficiency",
            Feature::SystemLossBar => "systemLossBar",
        }
    }

    /// Parse a wire feature name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn value_of(&self, input: &InputModel) -> f64 {
        match self {
            Feature::BoreCm => input.bore_cm,
            Feature::RodCm => input.rod_cm,
            Feature::DeadLoadTon => input.dead_load_ton,
            Feature::HoldingLoadTon => input.holding_load_ton,
            Feature::MotorRpm => input.motor_rpm,
            Feature::PumpEfficiency => input.pump_efficiency,
            Feature::SystemLossBar => input.system_loss_bar,
        }
    }

    /// Copy of `input` with this feature replaced by `value`.
    pub fn with_value(&self, input: &InputModel, value: f64) -> InputModel {
        let mut out = *input;
        match self {
            Feature::BoreCm => out.bore_cm = value,
            Feature::RodCm => out.rod_cm = value,
            Feature::DeadLoadTon => out.dead_load_ton = value,
            Feature::HoldingLoadTon => out.holding_load_ton = value,
            Feature::MotorRpm => out.motor_rpm = value,
            Feature::PumpEfficiency => out.pump_efficiency = value,
            Feature::SystemLossBar => out.system_loss_bar = value,
        }
        out
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Confidence and Provenance
// ============================================================================

/// Qualitative trust label derived from model R².
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the coefficients behind a prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PredictionSource {
    /// Validated coefficients from the remote model service
    Remote,
    /// Standardized model artifact from local disk
    Artifact,
    /// Built-in default coefficients
    Embedded,
    /// Physical rule-of-thumb estimates; no regression applied
    Heuristic,
}

impl std::fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Artifact => write!(f, "artifact"),
            Self::Embedded => write!(f, "embedded"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

// ============================================================================
// Prediction Result
// ============================================================================

/// Contribution of one regression term to one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermContribution {
    pub metric: TargetMetric,
    /// Term label, e.g. `intercept`, `boreCm`, `boreCm^2`, `boreCm*motorRpm`
    pub term: String,
    pub coefficient: f64,
    /// Feature value (or product) the coefficient multiplies
    pub value: f64,
    pub contribution: f64,
}

/// Predicted performance of one press configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    /// Maximum cycle pressure (bar, ≥ 0)
    pub max_pressure: f64,
    /// Overall efficiency (clamped to 0–1)
    pub efficiency: f64,
    /// Cycle time (s, ≥ 0)
    pub cycle_time: f64,
    pub confidence: ConfidenceLevel,
    pub source: PredictionSource,
    /// Class label from an artifact health classifier, when one is loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
    /// Per-term breakdown for auditability
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calculations: Vec<TermContribution>,
}
