//! Fixed kinematic profile of the press duty cycle

use crate::types::Phase;

/// Load that governs a phase's force.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoverningLoad {
    Dead,
    Holding,
}

/// Cylinder area that governs a phase's pressure and flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoverningArea {
    /// Full bore (cap side)
    Piston,
    /// Bore minus rod (annulus side)
    Rod,
}

/// Kinematics of one phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProfile {
    pub phase: Phase,
    /// Ram speed (mm/s)
    pub speed_mm_s: f64,
    /// Travel over the phase (mm)
    pub stroke_mm: f64,
    /// Phase duration (s)
    pub duration_s: f64,
    pub load: GoverningLoad,
    pub area: GoverningArea,
}

/// The cycle, in execution order.
///
/// FastUp retracts on the annulus while still lifting the dead load, so its
/// indicated pressure is higher than FastDown's for the same force.
pub const DUTY_CYCLE: [PhaseProfile; 4] = [
    PhaseProfile {
        phase: Phase::FastDown,
        speed_mm_s: 200.0,
        stroke_mm: 200.0,
        duration_s: 1.0,
        load: GoverningLoad::Dead,
        area: GoverningArea::Piston,
    },
    PhaseProfile {
        phase: Phase::Working,
        speed_mm_s: 10.0,
        stroke_mm: 50.0,
        duration_s: 5.0,
        load: GoverningLoad::Holding,
        area: GoverningArea::Piston,
    },
    PhaseProfile {
        phase: Phase::Holding,
        speed_mm_s: 0.0,
        stroke_mm: 0.0,
        duration_s: 2.0,
        load: GoverningLoad::Holding,
        area: GoverningArea::Piston,
    },
    PhaseProfile {
        phase: Phase::FastUp,
        speed_mm_s: 200.0,
        stroke_mm: 250.0,
        duration_s: 1.25,
        load: GoverningLoad::Dead,
        area: GoverningArea::Rod,
    },
];

/// Sum of all phase durations (s).
pub fn cycle_duration() -> f64 {
    DUTY_CYCLE.iter().map(|p| p.duration_s).sum()
}

impl PhaseProfile {
    /// Integration steps needed to cover the phase at `dt`.
    pub fn step_count(&self, dt: f64) -> usize {
        (self.duration_s / dt).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_order_matches_phase_sequence() {
        let phases: Vec<Phase> = DUTY_CYCLE.iter().map(|p| p.phase).collect();
        assert_eq!(phases, Phase::SEQUENCE.to_vec());
    }

    #[test]
    fn test_cycle_duration() {
        assert!((cycle_duration() - 9.25).abs() < 1e-12);
    }

    #[test]
    fn test_step_counts_are_exact() {
        // 1.25 / 0.01 is 124.999… in floating point; rounding must give 125
        let counts: Vec<usize> = DUTY_CYCLE.iter().map(|p| p.step_count(0.01)).collect();
        assert_eq!(counts, vec![100, 500, 200, 125]);
    }

    #[test]
    fn test_stroke_consistent_with_speed_and_duration() {
        for p in DUTY_CYCLE {
            assert!((p.speed_mm_s * p.duration_s - p.stroke_mm).abs() < 1e-9, "{:?}", p.phase);
        }
    }

    #[test]
    fn test_fast_up_uses_rod_area() {
        let fast_up = DUTY_CYCLE[3];
        assert_eq!(fast_up.area, GoverningArea::Rod);
        assert_eq!(fast_up.load, GoverningLoad::Dead);
    }
}
