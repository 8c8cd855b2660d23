//! Finite-difference sensitivity of predicted metrics to tunable parameters

use tracing::debug;

use crate::ml_engine::LoadedModel;
use crate::types::{InputModel, PredictionResult, TargetMetric, TunableParameter};

/// One perturbed prediction for a parameter.
#[derive(Debug, Clone)]
pub struct Probe {
    pub parameter: TunableParameter,
    /// Signed step actually applied (negative for a backward difference)
    pub step: f64,
    pub perturbed_value: f64,
    pub prediction: PredictionResult,
}

impl Probe {
    /// Perturb `parameter` forward by `step`, or backward if the forward
    /// input is invalid. `None` if neither direction yields a valid input.
    pub fn run(
        model: &LoadedModel,
        input: &InputModel,
        parameter: TunableParameter,
        step: f64,
    ) -> Option<Self> {
        let feature = parameter.feature();
        let current = feature.value_of(input);

        for signed in [step, -step] {
            let candidate = feature.with_value(input, current + signed);
            if candidate.validate().is_ok() {
                return Some(Self {
                    parameter,
                    step: signed,
                    perturbed_value: current + signed,
                    prediction: model.predict(&candidate),
                });
            }
        }

        debug!(%parameter, step, "No valid perturbation for parameter");
        None
    }

    /// `(f(x + h) − f(x)) / h` for `metric`.
    pub fn sensitivity(&self, metric: TargetMetric, baseline: &PredictionResult) -> f64 {
        (metric.value_of(&self.prediction) - metric.value_of(baseline)) / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfidenceConfig;

    fn model() -> LoadedModel {
        LoadedModel::embedded(ConfidenceConfig::default())
    }

    #[test]
    fn test_forward_difference() {
        let m = model();
        let input = InputModel::default();
        let baseline = m.predict(&input);
        let probe = Probe::run(&m, &input, TunableParameter::MotorRpm, 10.0).unwrap();
        assert_eq!(probe.step, 10.0);
        // ∂cycleTime/∂rpm = -0.003 + 0.0001·bore
        let s = probe.sensitivity(TargetMetric::CycleTime, &baseline);
        assert!((s - (-0.003 + 0.000_1 * 6.5)).abs() < 1e-9);
    }

    #[test]
    fn test_backward_difference_at_efficiency_ceiling() {
        let m = model();
        let input = InputModel {
            pump_efficiency: 0.95,
            ..Default::default()
        };
        let probe = Probe::run(&m, &input, TunableParameter::PumpEfficiency, 0.1).unwrap();
        assert_eq!(probe.step, -0.1);
        let baseline = m.predict(&input);
        let s = probe.sensitivity(TargetMetric::Efficiency, &baseline);
        assert!((s - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_backward_difference_for_rod_near_bore() {
        let m = model();
        let input = InputModel {
            bore_cm: 3.05,
            rod_cm: 3.0,
            ..Default::default()
        };
        let probe = Probe::run(&m, &input, TunableParameter::RodCm, 0.1).unwrap();
        assert_eq!(probe.step, -0.1);
    }
}
