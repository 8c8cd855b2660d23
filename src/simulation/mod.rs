//! Duty-cycle simulation
//!
//! Deterministic time-series model of one press cycle:
//!
//! - **profile**: fixed phase kinematics (speed, stroke, duration, governing load/area)
//! - **simulator**: integrates the profile at 10 ms into [`DataPoint`](crate::types::DataPoint)s
//!   with an audit trail and sizing summary
//! - **energy**: per-phase energy totals over any series

pub mod energy;
pub mod profile;
pub mod simulator;

pub use energy::aggregate_energy_by_phase;
pub use profile::{cycle_duration, GoverningArea, GoverningLoad, PhaseProfile, DUTY_CYCLE};
pub use simulator::{run_simulation, CycleSimulator};
