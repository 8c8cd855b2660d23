//! Press Advisor: Hydraulic Press Duty-Cycle Simulation and Performance Advisory
//!
//! Simulates one press cycle (FastDown → Working → Holding → FastUp) from a
//! handful of geometry and drive parameters, predicts cycle performance with a
//! regression model, and proposes parameter changes toward a percentage goal.
//!
//! ## Architecture
//!
//! - **Physics Engine**: Hydraulic formulas (areas, force, pressure, flow, power)
//! - **Simulation**: Fixed-step cycle simulator and per-phase energy totals
//! - **ML Engine**: Coefficient sources, single-flight cache, regression evaluation
//! - **Optimization**: Finite-difference sensitivity advisor
//!
//! ## Entrypoints
//!
//! - [`run_simulation`]: input → time series, audit steps, sizing summary
//! - [`aggregate_energy_by_phase`]: time series → energy per phase
//! - [`PerformanceModel::predict`]: input → predicted pressure, efficiency, cycle time
//! - [`SensitivityAdvisor::suggest_improvements`]: input + goal → ranked suggestions

pub mod config;
pub mod ml_engine;
pub mod optimization;
pub mod physics_engine;
pub mod simulation;
pub mod types;

// Re-export press configuration
pub use config::PressConfig;

// Re-export commonly used types
pub use types::{
    CalculationStep, ConfidenceLevel, DataPoint, Goal, InputError, InputModel, Phase,
    PhaseEnergy, PredictionResult, PredictionSource, SimulationOutput, Suggestion,
    SystemSizing, TargetMetric, TunableParameter,
};

// Re-export entrypoints
pub use ml_engine::{CoefficientCache, PerformanceModel};
pub use optimization::SensitivityAdvisor;
pub use simulation::{aggregate_energy_by_phase, run_simulation, CycleSimulator};
