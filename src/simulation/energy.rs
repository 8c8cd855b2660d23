//! Per-phase energy integration over a simulated series

use tracing::debug;

use crate::config::defaults::ENERGY_MIN_DT_SECS;
use crate::types::{DataPoint, Phase, PhaseEnergy};

#[derive(Default)]
struct Accumulator {
    energy_kj: f64,
    duration_sec: f64,
    power_sum_kw: f64,
    samples: usize,
}

/// Integrate hydraulic power per phase.
///
/// Each consecutive pair contributes `hyd_power × dt` to the phase of its
/// first point, with `dt` floored at [`ENERGY_MIN_DT_SECS`]. Untagged points
/// count as [`Phase::Working`]. Averages run over every sample of the phase,
/// the final point included. Phases appear in first-appearance order.
pub fn aggregate_energy_by_phase(data: &[DataPoint]) -> Vec<PhaseEnergy> {
    let mut order: Vec<Phase> = Vec::new();
    let mut totals: Vec<Accumulator> = Vec::new();

    let mut slot_for = |phase: Phase, order: &mut Vec<Phase>| -> usize {
        match order.iter().position(|p| *p == phase) {
            Some(idx) => idx,
            None => {
                order.push(phase);
                totals.push(Accumulator::default());
                order.len() - 1
            }
        }
    };

    let mut indices = Vec::with_capacity(data.len());
    for point in data {
        indices.push(slot_for(point.phase.unwrap_or_default(), &mut order));
    }

    for (i, point) in data.iter().enumerate() {
        let acc = &mut totals[indices[i]];
        acc.power_sum_kw += point.hyd_power_kw;
        acc.samples += 1;

        if let Some(next) = data.get(i + 1) {
            let dt = (next.time_sec - point.time_sec).max(ENERGY_MIN_DT_SECS);
            acc.energy_kj += point.hyd_power_kw * dt;
            acc.duration_sec += dt;
        }
    }

    let summary: Vec<PhaseEnergy> = order
        .into_iter()
        .zip(totals)
        .map(|(phase, acc)| PhaseEnergy {
            phase,
            energy_kj: acc.energy_kj,
            duration_sec: acc.duration_sec,
            avg_power_kw: if acc.samples > 0 {
                acc.power_sum_kw / acc.samples as f64
            } else {
                0.0
            },
            sample_count: acc.samples,
        })
        .collect();

    debug!(
        samples = data.len(),
        phases = summary.len(),
        total_kj = summary.iter().map(|p| p.energy_kj).sum::<f64>(),
        "Energy aggregated"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: f64, power: f64, phase: Option<Phase>) -> DataPoint {
        DataPoint {
            time_sec: t,
            stroke_mm: 0.0,
            flow_lpm: 0.0,
            pressure_bar: 0.0,
            hyd_power_kw: power,
            pump_power_kw: 0.0,
            actuator_power_kw: 0.0,
            phase,
        }
    }

    #[test]
    fn test_empty_series() {
        assert!(aggregate_energy_by_phase(&[]).is_empty());
    }

    #[test]
    fn test_single_point_has_no_energy() {
        let out = aggregate_energy_by_phase(&[point(0.0, 5.0, Some(Phase::FastDown))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].energy_kj, 0.0);
        assert_eq!(out[0].avg_power_kw, 5.0);
        assert_eq!(out[0].sample_count, 1);
    }

    #[test]
    fn test_pair_attributed_to_first_point() {
        let data = [
            point(0.0, 2.0, Some(Phase::FastDown)),
            point(0.5, 4.0, Some(Phase::Working)),
            point(1.0, 0.0, Some(Phase::Working)),
        ];
        let out = aggregate_energy_by_phase(&data);
        assert_eq!(out[0].phase, Phase::FastDown);
        assert!((out[0].energy_kj - 1.0).abs() < 1e-12);
        assert_eq!(out[1].phase, Phase::Working);
        assert!((out[1].energy_kj - 2.0).abs() < 1e-12);
        assert!((out[1].avg_power_kw - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_untagged_points_count_as_working() {
        let data = [point(0.0, 1.0, None), point(1.0, 1.0, None)];
        let out = aggregate_energy_by_phase(&data);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].phase, Phase::Working);
        assert!((out[0].energy_kj - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_increasing_time_uses_floor() {
        let data = [
            point(1.0, 10.0, Some(Phase::Holding)),
            point(1.0, 10.0, Some(Phase::Holding)),
            point(0.5, 0.0, Some(Phase::Holding)),
        ];
        let out = aggregate_energy_by_phase(&data);
        assert!((out[0].energy_kj - 2.0 * 10.0 * ENERGY_MIN_DT_SECS).abs() < 1e-12);
        assert!(out[0].energy_kj > 0.0);
    }

    #[test]
    fn test_first_appearance_order() {
        let data = [
            point(0.0, 1.0, Some(Phase::FastUp)),
            point(0.1, 1.0, Some(Phase::FastDown)),
            point(0.2, 1.0, Some(Phase::FastUp)),
        ];
        let phases: Vec<Phase> = aggregate_energy_by_phase(&data).iter().map(|p| p.phase).collect();
        assert_eq!(phases, vec![Phase::FastUp, Phase::FastDown]);
    }
}
