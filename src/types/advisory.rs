//! Advisory types: goals, tunable parameters and suggestions

use serde::{Deserialize, Serialize};

use super::{CalculationStep, ConfidenceLevel, Feature, TargetMetric};

/// Input fields the advisor is allowed to retune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TunableParameter {
    BoreCm,
    RodCm,
    MotorRpm,
    PumpEfficiency,
}

impl TunableParameter {
    pub const ALL: [TunableParameter; 4] = [
        TunableParameter::BoreCm,
        TunableParameter::RodCm,
        TunableParameter::MotorRpm,
        TunableParameter::PumpEfficiency,
    ];

    /// Underlying input feature.
    pub fn feature(&self) -> Feature {
        match self {
            TunableParameter::BoreCm => Feature::BoreCm,
            TunableParameter::RodCm => Feature::RodCm,
            TunableParameter::MotorRpm => Feature::MotorRpm,
            TunableParameter::PumpEfficiency => Feature::PumpEfficiency,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            TunableParameter::BoreCm | TunableParameter::RodCm => "cm",
            TunableParameter::MotorRpm => "rpm",
            TunableParameter::PumpEfficiency => "",
        }
    }
}

impl std::fmt::Display for TunableParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TunableParameter::BoreCm => write!(f, "Bore diameter"),
            TunableParameter::RodCm => write!(f, "Rod diameter"),
            TunableParameter::MotorRpm => write!(f, "Motor speed"),
            TunableParameter::PumpEfficiency => write!(f, "Pump efficiency"),
        }
    }
}

/// Percentage change requested on each metric.
///
/// Absent or zero entries request nothing for that metric. A negative
/// `target_cycle_time_pct` asks for a faster cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub target_cycle_time_pct: Option<f64>,
    #[serde(default)]
    pub target_max_pressure_pct: Option<f64>,
    #[serde(default)]
    pub target_efficiency_pct: Option<f64>,
}

/// One requested goal dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalDimension {
    pub metric: TargetMetric,
    pub percent: f64,
}

impl Goal {
    /// Requested dimensions, skipping absent, zero or non-finite targets.
    pub fn dimensions(&self) -> Vec<GoalDimension> {
        [
            (TargetMetric::CycleTime, self.target_cycle_time_pct),
            (TargetMetric::Pressure, self.target_max_pressure_pct),
            (TargetMetric::Efficiency, self.target_efficiency_pct),
        ]
        .into_iter()
        .filter_map(|(metric, pct)| match pct {
            Some(p) if p.is_finite() && p != 0.0 => Some(GoalDimension { metric, percent: p }),
            _ => None,
        })
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().is_empty()
    }
}

/// A ranked parameter change toward a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub parameter: TunableParameter,
    /// Metric this suggestion moves
    pub metric: TargetMetric,
    pub current_value: f64,
    /// Value after clamping to physical limits
    pub suggested_value: f64,
    /// `suggested_value - current_value`
    pub change: f64,
    /// Projected effect on the target metric
    pub impact: String,
    /// Clamped at a physical limit or outside the recommended band
    pub out_of_range: bool,
    pub confidence: ConfidenceLevel,
    pub reasoning: String,
    pub calculation_steps: Vec<CalculationStep>,
}
