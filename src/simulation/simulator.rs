//! Cycle simulator: integrates the fixed 4-phase duty cycle into a time series

use tracing::{debug, info};

use crate::config::{defaults::SIMULATION_DT_SECS, SimulationConfig};
use crate::physics_engine::{
    flow_lpm, force_from_ton, hydraulic_power_kw, piston_area, pressure_bar,
    pump_displacement_cc, pump_input_kw, relief_setting, rod_area, round2,
};
use crate::types::{
    CalculationStep, DataPoint, InputError, InputModel, Phase, SimulationOutput, SystemSizing,
};

use super::profile::{GoverningArea, GoverningLoad, PhaseProfile, DUTY_CYCLE};

/// Deterministic duty-cycle simulator for one press configuration.
///
/// Construction validates the input and records the two area derivations;
/// [`run`](Self::run) then walks every phase at a fixed `dt` and appends one
/// audit step per phase.
#[derive(Debug, Clone)]
pub struct CycleSimulator {
    input: InputModel,
    piston_area_m2: f64,
    rod_area_m2: f64,
    relief_margin_percent: f64,
    dt: f64,
    steps: Vec<CalculationStep>,
}

/// Per-phase constants computed on phase entry.
struct PhaseState {
    force_n: f64,
    area_m2: f64,
    pressure_bar: f64,
    flow_lpm: f64,
}

/// Running maxima for the sizing summary.
#[derive(Default)]
struct Peaks {
    pressure_bar: f64,
    flow_lpm: f64,
    hyd_kw: f64,
    pump_kw: f64,
}

impl CycleSimulator {
    /// Create a simulator with default simulation settings.
    pub fn new(input: &InputModel) -> Result<Self, InputError> {
        Self::with_config(input, &SimulationConfig::default())
    }

    /// Create a simulator, rejecting inputs that violate preconditions.
    pub fn with_config(input: &InputModel, config: &SimulationConfig) -> Result<Self, InputError> {
        input.validate()?;

        let piston_area_m2 = piston_area(input.bore_cm);
        let rod_area_m2 = rod_area(input.bore_cm, input.rod_cm).map_err(|_| {
            InputError::InvalidGeometry {
                bore_cm: input.bore_cm,
                rod_cm: input.rod_cm,
            }
        })?;

        let steps = vec![
            CalculationStep::new(
                "A_piston = π × (D/100)² / 4",
                format!("π × ({:.2}/100)² / 4", input.bore_cm),
                format!("{:.6} m² ({:.2} cm²)", piston_area_m2, piston_area_m2 * 1e4),
            ),
            CalculationStep::new(
                "A_rod = π × ((D/100)² − (d/100)²) / 4",
                format!("π × (({:.2}/100)² − ({:.2}/100)²) / 4", input.bore_cm, input.rod_cm),
                format!("{:.6} m² ({:.2} cm²)", rod_area_m2, rod_area_m2 * 1e4),
            ),
        ];

        Ok(Self {
            input: *input,
            piston_area_m2,
            rod_area_m2,
            relief_margin_percent: config.relief_margin_percent,
            dt: SIMULATION_DT_SECS,
            steps,
        })
    }

    /// Audit trail recorded so far.
    pub fn steps(&self) -> &[CalculationStep] {
        &self.steps
    }

    pub fn piston_area_m2(&self) -> f64 {
        self.piston_area_m2
    }

    pub fn rod_area_m2(&self) -> f64 {
        self.rod_area_m2
    }

    /// Run the full cycle.
    pub fn run(mut self) -> SimulationOutput {
        let total_steps: usize = DUTY_CYCLE.iter().map(|p| p.step_count(self.dt)).sum();
        let mut data = Vec::with_capacity(total_steps + 1);
        let mut peaks = Peaks::default();

        let mut phase_start_time = 0.0;
        let mut phase_start_stroke = 0.0;

        for profile in &DUTY_CYCLE {
            let state = self.enter_phase(profile);
            debug!(
                phase = %profile.phase,
                pressure_bar = state.pressure_bar,
                flow_lpm = state.flow_lpm,
                "Entering phase"
            );

            let hyd_kw = hydraulic_power_kw(state.pressure_bar, state.flow_lpm);
            let pump_kw = pump_input_kw(hyd_kw, self.input.pump_efficiency);
            let actuator_kw = if profile.speed_mm_s > 0.0 {
                state.force_n * (profile.speed_mm_s / 1000.0) / 1000.0
            } else {
                0.0
            };

            peaks.pressure_bar = peaks.pressure_bar.max(state.pressure_bar);
            peaks.flow_lpm = peaks.flow_lpm.max(state.flow_lpm);
            peaks.hyd_kw = peaks.hyd_kw.max(hyd_kw);
            peaks.pump_kw = peaks.pump_kw.max(pump_kw);

            let steps = profile.step_count(self.dt);
            for i in 0..steps {
                let elapsed = i as f64 * self.dt;
                data.push(DataPoint {
                    time_sec: round2(phase_start_time + elapsed),
                    stroke_mm: round2(phase_start_stroke + profile.speed_mm_s * elapsed),
                    flow_lpm: round2(state.flow_lpm),
                    pressure_bar: round2(state.pressure_bar),
                    hyd_power_kw: round2(hyd_kw),
                    pump_power_kw: round2(pump_kw),
                    actuator_power_kw: round2(actuator_kw),
                    phase: Some(profile.phase),
                });
            }

            phase_start_time += steps as f64 * self.dt;
            phase_start_stroke += profile.speed_mm_s * steps as f64 * self.dt;
        }

        // Terminal rest sample closes the series at the cycle end time
        data.push(DataPoint {
            time_sec: round2(phase_start_time),
            stroke_mm: round2(phase_start_stroke),
            flow_lpm: 0.0,
            pressure_bar: 0.0,
            hyd_power_kw: 0.0,
            pump_power_kw: 0.0,
            actuator_power_kw: 0.0,
            phase: Some(Phase::FastUp),
        });

        let sizing = self.sizing(&peaks);
        info!(
            samples = data.len(),
            end_time_s = phase_start_time,
            peak_pressure_bar = sizing.peak_pressure_bar,
            relief_setting_bar = sizing.relief_setting_bar,
            "Cycle simulation complete"
        );

        SimulationOutput {
            data,
            steps: self.steps,
            sizing,
        }
    }

    /// Compute phase constants and record the transition.
    fn enter_phase(&mut self, profile: &PhaseProfile) -> PhaseState {
        let (load_ton, load_name) = match profile.load {
            GoverningLoad::Dead => (self.input.dead_load_ton, "dead load"),
            GoverningLoad::Holding => (self.input.holding_load_ton, "holding load"),
        };
        let (area_m2, area_name) = match profile.area {
            GoverningArea::Piston => (self.piston_area_m2, "A_piston"),
            GoverningArea::Rod => (self.rod_area_m2, "A_rod"),
        };

        let force_n = force_from_ton(load_ton);
        let pressure = pressure_bar(force_n, area_m2);
        let flow = flow_lpm(area_m2, profile.speed_mm_s);

        let motion = if profile.speed_mm_s > 0.0 {
            format!(
                "ram travels {:.0} mm at {:.0} mm/s",
                profile.stroke_mm, profile.speed_mm_s
            )
        } else {
            "ram stationary, pressure held".to_string()
        };

        self.steps.push(CalculationStep::new(
            format!("{}: p = F / {area_name}, Q = {area_name} × v", profile.phase.as_str()),
            format!(
                "F = {load_ton:.2} t ({load_name}) × 1000 × 9.81 = {force_n:.0} N; \
                 p = {force_n:.0} / {area_m2:.6} / 1e5; Q = {area_m2:.6} × {:.3} × 60000",
                profile.speed_mm_s / 1000.0
            ),
            format!(
                "{:.2} s, {motion}: {pressure:.2} bar, {flow:.2} L/min",
                profile.duration_s
            ),
        ));

        PhaseState {
            force_n,
            area_m2,
            pressure_bar: pressure,
            flow_lpm: flow,
        }
    }

    fn sizing(&self, peaks: &Peaks) -> SystemSizing {
        SystemSizing {
            peak_pressure_bar: round2(peaks.pressure_bar),
            relief_setting_bar: round2(relief_setting(
                peaks.pressure_bar,
                self.input.system_loss_bar,
                self.relief_margin_percent,
            )),
            peak_flow_lpm: round2(peaks.flow_lpm),
            pump_displacement_cc: round2(pump_displacement_cc(peaks.flow_lpm, self.input.motor_rpm)),
            peak_hyd_power_kw: round2(peaks.hyd_kw),
            peak_pump_power_kw: round2(peaks.pump_kw),
        }
    }
}

/// Simulate one duty cycle for `input`.
///
/// Pure function of `input`: identical inputs give identical outputs.
pub fn run_simulation(input: &InputModel) -> Result<SimulationOutput, InputError> {
    Ok(CycleSimulator::new(input)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_input() -> InputModel {
        InputModel {
            bore_cm: 6.5,
            rod_cm: 3.0,
            dead_load_ton: 2.0,
            holding_load_ton: 8.0,
            motor_rpm: 1500.0,
            pump_efficiency: 0.9,
            system_loss_bar: 5.0,
        }
    }

    #[test]
    fn test_construction_records_area_steps() {
        let sim = CycleSimulator::new(&reference_input()).unwrap();
        assert_eq!(sim.steps().len(), 2);
        assert!(sim.steps()[0].result.contains("33.18 cm²"));
        assert!(sim.steps()[1].result.contains("26.11 cm²"));
    }

    #[test]
    fn test_one_step_per_phase_after_run() {
        let out = run_simulation(&reference_input()).unwrap();
        assert_eq!(out.steps.len(), 2 + 4);
        assert!(out.steps[2].formula.starts_with("FastDown"));
        assert!(out.steps[5].formula.starts_with("FastUp"));
    }

    #[test]
    fn test_sample_count_and_end_time() {
        let out = run_simulation(&reference_input()).unwrap();
        assert_eq!(out.data.len(), 100 + 500 + 200 + 125 + 1);
        assert_eq!(out.data[0].time_sec, 0.0);
        assert_eq!(out.end_time(), 9.25);
    }

    #[test]
    fn test_fast_down_values() {
        let out = run_simulation(&reference_input()).unwrap();
        let first = out.data[0];
        assert_eq!(first.phase, Some(Phase::FastDown));
        assert_eq!(first.pressure_bar, 59.13);
        assert_eq!(first.flow_lpm, 39.82);
        // 19620 N × 0.2 m/s = 3.924 kW at the ram
        assert_eq!(first.actuator_power_kw, 3.92);
    }

    #[test]
    fn test_holding_phase_has_no_flow() {
        let out = run_simulation(&reference_input()).unwrap();
        let holding: Vec<_> = out
            .data
            .iter()
            .filter(|p| p.phase == Some(Phase::Holding))
            .collect();
        assert_eq!(holding.len(), 200);
        assert!(holding.iter().all(|p| p.flow_lpm == 0.0 && p.hyd_power_kw == 0.0));
        assert!(holding.iter().all(|p| p.actuator_power_kw == 0.0));
        assert!(holding.iter().all(|p| p.pressure_bar > 200.0));
    }

    #[test]
    fn test_fast_up_pressure_exceeds_fast_down() {
        let out = run_simulation(&reference_input()).unwrap();
        let down = out.data.iter().find(|p| p.phase == Some(Phase::FastDown)).unwrap();
        let up = out.data.iter().find(|p| p.phase == Some(Phase::FastUp)).unwrap();
        // Same 2 t load on 26.11 cm² instead of 33.18 cm²
        assert_eq!(up.pressure_bar, 75.13);
        assert!(up.pressure_bar > down.pressure_bar);
        assert!(up.flow_lpm < down.flow_lpm);
    }

    #[test]
    fn test_stroke_is_cumulative() {
        let out = run_simulation(&reference_input()).unwrap();
        let last = out.data.last().unwrap();
        assert_eq!(last.stroke_mm, 500.0);
        assert!(out.data.windows(2).all(|w| w[1].stroke_mm >= w[0].stroke_mm));
    }

    #[test]
    fn test_sizing_summary() {
        let out = run_simulation(&reference_input()).unwrap();
        let s = out.sizing;
        // 8 t on 33.18 cm² ≈ 236.5 bar
        assert!((s.peak_pressure_bar - 236.51).abs() < 0.02, "got {}", s.peak_pressure_bar);
        // 236.51 + 5 + 23.65
        assert!((s.relief_setting_bar - 265.16).abs() < 0.05, "got {}", s.relief_setting_bar);
        assert_eq!(s.peak_flow_lpm, 39.82);
        // 39.82 L/min × 1000 / 1500 rpm
        assert!((s.pump_displacement_cc - 26.55).abs() < 0.01);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let input = InputModel {
            rod_cm: 7.0,
            ..reference_input()
        };
        assert!(matches!(
            run_simulation(&input),
            Err(InputError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_zero_efficiency_rejected() {
        let input = InputModel {
            pump_efficiency: 0.0,
            ..reference_input()
        };
        assert!(run_simulation(&input).is_err());
    }
}
