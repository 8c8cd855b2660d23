//! SensitivityAdvisor: goal-driven parameter suggestions

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{AdvisorConfig, ParameterLimits, PressConfig};
use crate::ml_engine::{LoadedModel, PerformanceModel};
use crate::types::{
    CalculationStep, ConfidenceLevel, GoalDimension, Goal, InputError, InputModel,
    PredictionResult, Suggestion, TunableParameter,
};

use super::sensitivity::Probe;
use super::templates::{format_metric, format_value, reasoning, ReasoningSlots};

/// Turns a percentage goal into ranked parameter changes.
///
/// For each goal dimension and tunable parameter the advisor estimates the
/// metric's sensitivity by finite difference, solves for the parameter change
/// that would close the gap, clamps it to physical limits and re-predicts at
/// the clamped value to report the achievable impact.
#[derive(Debug, Clone, Default)]
pub struct SensitivityAdvisor {
    config: AdvisorConfig,
    limits: ParameterLimits,
}

impl SensitivityAdvisor {
    pub fn new(config: AdvisorConfig, limits: ParameterLimits) -> Self {
        Self { config, limits }
    }

    pub fn from_config(config: &PressConfig) -> Self {
        Self::new(config.advisor.clone(), config.limits.clone())
    }

    pub fn limits(&self) -> &ParameterLimits {
        &self.limits
    }

    /// Suggestions for `goal`, loading coefficients through `model` if needed.
    pub async fn suggest_improvements(
        &self,
        model: &PerformanceModel,
        input: &InputModel,
        goal: &Goal,
    ) -> Result<Vec<Suggestion>, InputError> {
        input.validate()?;
        let snapshot = model.snapshot().await;
        self.suggest_with(&snapshot, input, goal)
    }

    /// Suggestions against a fixed coefficient snapshot.
    pub fn suggest_with(
        &self,
        model: &LoadedModel,
        input: &InputModel,
        goal: &Goal,
    ) -> Result<Vec<Suggestion>, InputError> {
        input.validate()?;

        let dimensions = goal.dimensions();
        if dimensions.is_empty() {
            debug!("Goal requests no change, nothing to suggest");
            return Ok(Vec::new());
        }

        let baseline = model.predict(input);

        // Perturbed predictions are independent reads of the same snapshot
        let probes: Vec<Probe> = TunableParameter::ALL
            .par_iter()
            .filter_map(|p| Probe::run(model, input, *p, self.config.step_for(*p)))
            .collect();

        let mut suggestions: Vec<Suggestion> = dimensions
            .iter()
            .flat_map(|dim| {
                probes
                    .iter()
                    .filter_map(|probe| self.candidate(model, input, &baseline, dim, probe))
                    .collect::<Vec<_>>()
            })
            .collect();

        // Stable: equal keys keep dimension/parameter order
        suggestions.sort_by(|a, b| {
            b.confidence.cmp(&a.confidence).then_with(|| {
                b.change
                    .abs()
                    .partial_cmp(&a.change.abs())
                    .unwrap_or(Ordering::Equal)
            })
        });
        let candidates = suggestions.len();
        suggestions.truncate(self.config.max_suggestions);

        info!(
            dimensions = dimensions.len(),
            candidates,
            returned = suggestions.len(),
            source = %model.source(),
            "Suggestions ranked"
        );
        Ok(suggestions)
    }

    /// Build one suggestion, or `None` if the parameter has negligible effect.
    fn candidate(
        &self,
        model: &LoadedModel,
        input: &InputModel,
        baseline: &PredictionResult,
        dim: &GoalDimension,
        probe: &Probe,
    ) -> Option<Suggestion> {
        let metric = dim.metric;
        let parameter = probe.parameter;
        let feature = parameter.feature();

        let current_metric = metric.value_of(baseline);
        let target = current_metric * (1.0 + dim.percent / 100.0);
        let diff = target - current_metric;

        let sensitivity = probe.sensitivity(metric, baseline);
        if !sensitivity.is_finite() || sensitivity.abs() < self.config.min_sensitivity {
            debug!(%parameter, %metric, sensitivity, "Negligible sensitivity, skipping");
            return None;
        }

        let raw_change = diff / sensitivity;
        let current_value = feature.value_of(input);
        let proposed = current_value + raw_change;
        if !proposed.is_finite() {
            return None;
        }

        let (min, max) = self.limits.physical_range(parameter, input.bore_cm);
        let suggested_value = proposed.clamp(min, max);
        let clamped = proposed < min || proposed > max;
        let recommended = self.limits.is_recommended(parameter, suggested_value, input.bore_cm);
        let band = self.limits.band(parameter);

        // Re-predict at the clamped value for the achievable effect
        let adjusted = feature.with_value(input, suggested_value);
        let impact = match adjusted.validate() {
            Ok(()) => {
                let achieved = metric.value_of(&model.predict(&adjusted));
                let pct = if current_metric.abs() > f64::EPSILON {
                    (achieved - current_metric) / current_metric * 100.0
                } else {
                    0.0
                };
                format!(
                    "{metric}: {} → {} ({pct:+.1}%, target {})",
                    format_metric(metric, current_metric),
                    format_metric(metric, achieved),
                    format_metric(metric, target),
                )
            }
            Err(e) => format!("{metric}: not evaluated, resulting configuration is invalid ({e})"),
        };
        let geometry_ok = adjusted.validate().is_ok();

        let confidence = if clamped || !geometry_ok {
            ConfidenceLevel::Low
        } else if !recommended {
            model.metric_confidence(metric).min(ConfidenceLevel::Medium)
        } else {
            model.metric_confidence(metric)
        };

        let unit = parameter.unit();
        let calculation_steps = vec![
            CalculationStep::new(
                "target = current × (1 + goal% / 100)",
                format!("{current_metric:.4} × (1 + {:.1} / 100)", dim.percent),
                format_metric(metric, target),
            ),
            CalculationStep::new(
                "s = (f(x + h) − f(x)) / h",
                format!(
                    "({:.4} − {current_metric:.4}) / {:+}",
                    metric.value_of(&probe.prediction),
                    probe.step
                ),
                format!(
                    "{sensitivity:.6} {} per {}",
                    non_empty(metric.unit(), "units"),
                    non_empty(unit, "unit")
                ),
            ),
            CalculationStep::new(
                "Δx = (target − current) / s",
                format!("{diff:.4} / {sensitivity:.6}"),
                format!("{raw_change:.4} {}", non_empty(unit, "units")),
            ),
            CalculationStep::new(
                "x' = clamp(x + Δx, min, max)",
                format!("clamp({current_value:.4} + {raw_change:.4}, {min:.2}, {max:.2})"),
                if clamped {
                    format!("{} (held at physical limit)", format_value(parameter, suggested_value))
                } else {
                    format_value(parameter, suggested_value)
                },
            ),
        ];

        let reasoning = reasoning(&ReasoningSlots {
            parameter,
            metric,
            goal_pct: dim.percent,
            current_value,
            suggested_value,
            sensitivity,
            clamped,
            recommended,
            recommended_band: (band.recommended_min, band.recommended_max),
        });

        Some(Suggestion {
            parameter,
            metric,
            current_value,
            suggested_value,
            change: suggested_value - current_value,
            impact,
            out_of_range: clamped || !recommended || !geometry_ok,
            confidence,
            reasoning,
            calculation_steps,
        })
    }
}

fn non_empty<'a>(unit: &'a str, fallback: &'a str) -> &'a str {
    if unit.is_empty() {
        fallback
    } else {
        unit
    }
}
