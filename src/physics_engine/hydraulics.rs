//! Hydraulic cylinder and pump formulas
//!
//! Bore and rod diameters arrive in cm and are converted to m internally.
//! Pressures are in bar, flows in L/min, powers in kW.

use std::f64::consts::PI;

/// Standard gravity used for ton → newton conversion (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Errors from geometry-dependent formulas.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid geometry: rod {rod_cm} cm is not smaller than bore {bore_cm} cm")]
    InvalidGeometry { bore_cm: f64, rod_cm: f64 },
}

// ============================================================================
// Cylinder Geometry
// ============================================================================

/// Full piston (cap-side) area in m².
///
/// Formula: A = π × (D/100)² / 4, D in cm
pub fn piston_area(bore_cm: f64) -> f64 {
    let d = bore_cm / 100.0;
    PI * d * d / 4.0
}

/// Rod-side annulus area in m².
///
/// Formula: A = π × ((D/100)² − (d/100)²) / 4
///
/// Fails with [`PhysicsError::InvalidGeometry`] when the rod is not thinner
/// than the bore, since the annulus would be empty or negative.
pub fn rod_area(bore_cm: f64, rod_cm: f64) -> Result<f64, PhysicsError> {
    if !(rod_cm < bore_cm) {
        return Err(PhysicsError::InvalidGeometry { bore_cm, rod_cm });
    }
    let d_bore = bore_cm / 100.0;
    let d_rod = rod_cm / 100.0;
    Ok(PI * (d_bore * d_bore - d_rod * d_rod) / 4.0)
}

// ============================================================================
// Force, Pressure and Flow
// ============================================================================

/// Weight of a mass in metric tons, in N.
pub fn force_from_ton(ton: f64) -> f64 {
    ton * 1000.0 * GRAVITY
}

/// Pressure in bar needed to produce `force_n` over `area_m2`.
pub fn pressure_bar(force_n: f64, area_m2: f64) -> f64 {
    force_n / area_m2 / 1e5
}

/// Oil flow in L/min to move `area_m2` at `speed_mm_per_sec`.
///
/// Formula: Q = A × (v/1000) × 60 × 1000
pub fn flow_lpm(area_m2: f64, speed_mm_per_sec: f64) -> f64 {
    area_m2 * (speed_mm_per_sec / 1000.0) * 60.0 * 1000.0
}

// ============================================================================
// Power and Pump Sizing
// ============================================================================

/// Hydraulic power in kW.
///
/// Formula: P = p × Q / 600 (bar, L/min)
pub fn hydraulic_power_kw(pressure_bar: f64, flow_lpm: f64) -> f64 {
    pressure_bar * flow_lpm / 600.0
}

/// Pump shaft input power in kW. Caller guarantees `pump_efficiency > 0`.
pub fn pump_input_kw(hyd_kw: f64, pump_efficiency: f64) -> f64 {
    hyd_kw / pump_efficiency
}

/// Pump displacement in cc/rev to deliver `flow_lpm` at `rpm`.
/// Caller guarantees `rpm > 0`.
pub fn pump_displacement_cc(flow_lpm: f64, rpm: f64) -> f64 {
    flow_lpm * 1000.0 / rpm
}

/// Relief valve setting in bar: required pressure plus losses plus margin.
///
/// Formula: p_relief = p_req + p_loss + p_req × margin% / 100
pub fn relief_setting(required_bar: f64, loss_bar: f64, margin_pct: f64) -> f64 {
    required_bar + loss_bar + required_bar * margin_pct / 100.0
}

/// Round to 2 decimals for stored samples.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
