//! Duty-cycle types: Phase, DataPoint, CalculationStep, simulation output

use serde::{Deserialize, Serialize};

// ============================================================================
// Duty Cycle Phase
// ============================================================================

/// One stage of the fixed press duty cycle.
///
/// The order is fixed: FastDown → Working → Holding → FastUp.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Rapid approach stroke under the dead load
    FastDown,
    /// Slow pressing stroke under the holding load
    #[default]
    Working,
    /// Ram stationary, pressure held
    Holding,
    /// Return stroke on the rod (annulus) side
    FastUp,
}

impl Phase {
    /// All phases in execution order.
    pub const SEQUENCE: [Phase; 4] = [Phase::FastDown, Phase::Working, Phase::Holding, Phase::FastUp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::FastDown => "FastDown",
            Phase::Working => "Working",
            Phase::Holding => "Holding",
            Phase::FastUp => "FastUp",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::FastDown => write!(f, "Fast Down"),
            Phase::Working => write!(f, "Working"),
            Phase::Holding => write!(f, "Holding"),
            Phase::FastUp => write!(f, "Fast Up"),
        }
    }
}

// ============================================================================
// Time Series
// ============================================================================

/// One sample of the simulated cycle. Values are rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    /// Elapsed cycle time (s)
    pub time_sec: f64,
    /// Cumulative ram travel (mm)
    pub stroke_mm: f64,
    /// Oil flow (L/min)
    pub flow_lpm: f64,
    /// Indicated cylinder pressure (bar)
    pub pressure_bar: f64,
    /// Hydraulic power (kW)
    pub hyd_power_kw: f64,
    /// Pump shaft input power (kW)
    pub pump_power_kw: f64,
    /// Mechanical power delivered at the ram (kW)
    pub actuator_power_kw: f64,
    /// Phase that produced this sample
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

/// Audit-log entry describing one derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub formula: String,
    pub calculation: String,
    pub result: String,
}

impl CalculationStep {
    pub fn new(
        formula: impl Into<String>,
        calculation: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            formula: formula.into(),
            calculation: calculation.into(),
            result: result.into(),
        }
    }
}

/// Sizing figures derived from the simulated cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSizing {
    /// Highest indicated pressure across all phases (bar)
    pub peak_pressure_bar: f64,
    /// Recommended relief valve cracking pressure (bar)
    pub relief_setting_bar: f64,
    /// Highest flow demand (L/min)
    pub peak_flow_lpm: f64,
    /// Pump displacement needed to deliver peak flow at motor speed (cc/rev)
    pub pump_displacement_cc: f64,
    /// Highest hydraulic power (kW)
    pub peak_hyd_power_kw: f64,
    /// Highest pump input power (kW)
    pub peak_pump_power_kw: f64,
}

/// Full result of one simulated duty cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    /// Samples in time order
    pub data: Vec<DataPoint>,
    /// Derivation trail in execution order
    pub steps: Vec<CalculationStep>,
    pub sizing: SystemSizing,
}

impl SimulationOutput {
    /// Elapsed time of the final sample (s).
    pub fn end_time(&self) -> f64 {
        self.data.last().map_or(0.0, |p| p.time_sec)
    }
}

// ============================================================================
// Energy Summary
// ============================================================================

/// Energy consumed within one phase of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseEnergy {
    pub phase: Phase,
    /// Integrated hydraulic energy (kJ)
    pub energy_kj: f64,
    /// Time covered by the phase's samples (s)
    pub duration_sec: f64,
    /// Mean hydraulic power across the phase's samples (kW)
    pub avg_power_kw: f64,
    pub sample_count: usize,
}
