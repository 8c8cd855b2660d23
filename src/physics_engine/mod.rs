//! Physics Engine Module
//!
//! Deterministic hydraulic calculations for the press duty cycle.
//! All math here is pure physics - no regression involved.
//!
//! - `piston_area()` / `rod_area()` - Cylinder geometry
//! - `force_from_ton()` / `pressure_bar()` - Load to pressure
//! - `flow_lpm()` - Ram speed to oil flow
//! - `hydraulic_power_kw()` / `pump_input_kw()` - Power balance
//! - `pump_displacement_cc()` / `relief_setting()` - Component sizing

pub mod hydraulics;

pub use hydraulics::{
    flow_lpm, force_from_ton, hydraulic_power_kw, piston_area, pressure_bar,
    pump_displacement_cc, pump_input_kw, relief_setting, rod_area, round2, PhysicsError, GRAVITY,
};
