//! Shared data structures for the press duty-cycle advisor
//!
//! - InputModel: press geometry, loads and pump parameters (caller-owned)
//! - Phase, DataPoint, CalculationStep: cycle simulator output
//! - PhaseEnergy: per-phase energy summary
//! - PredictionResult, ConfidenceLevel, PredictionSource: performance model output
//! - Goal, Suggestion: sensitivity advisor input and output

mod input;
mod cycle;
mod prediction;
mod advisory;

pub use input::*;
pub use cycle::*;
pub use prediction::*;
pub use advisory::*;
