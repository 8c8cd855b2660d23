//! Polynomial regression coefficients: wire schema, validation, evaluation
//!
//! The remote model service returns one block per metric:
//!
//! ```json
//! {
//!   "pressure":   { "intercept": 150.0, "linear": { "boreCm": -30.0 },
//!                   "quadratic": { "boreCm": 1.5 },
//!                   "interactions": [ { "a": "boreCm", "b": "motorRpm", "coef": 0.0001 } ] },
//!   "efficiency": { ... },
//!   "cycleTime":  { ... },
//!   "rSquared": { "pressure": 0.94, "efficiency": 0.88, "cycleTime": 0.91 },
//!   "modelMetadata": { "trainingDataPoints": 5000, "lastUpdated": "2024-01-01T00:00:00Z" }
//! }
//! ```
//!
//! Payloads are parsed into the permissive `Raw*` types first and only become
//! [`RegressionCoefficients`] after [`RawCoefficients::validate`].

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Feature, InputModel, TargetMetric, TermContribution};

// ============================================================================
// Errors
// ============================================================================

/// Rejection of a coefficient payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoefficientError {
    /// Required blocks missing, unknown features, non-numeric values
    #[error("{0}")]
    Schema(String),
    /// Structurally valid but below the acceptance thresholds
    #[error("{0}")]
    Quality(String),
}

/// Failure to evaluate a sub-model for one input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("{metric} evaluated to a non-finite value")]
    NonFinite { metric: TargetMetric },
    #[error("missing term: {0}")]
    MissingTerm(String),
    #[error("feature mismatch in {model}: {detail}")]
    FeatureMismatch { model: String, detail: String },
}

// ============================================================================
// Validated Form
// ============================================================================

/// Quadratic regression for a single metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolynomialModel {
    pub intercept: f64,
    pub linear: Vec<(Feature, f64)>,
    pub quadratic: Vec<(Feature, f64)>,
    pub interactions: Vec<InteractionTerm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionTerm {
    pub a: Feature,
    pub b: Feature,
    pub coef: f64,
}

/// R² reported per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScores {
    pub pressure: f64,
    pub efficiency: f64,
    pub cycle_time: f64,
}

impl MetricScores {
    pub fn get(&self, metric: TargetMetric) -> f64 {
        match metric {
            TargetMetric::Pressure => self.pressure,
            TargetMetric::Efficiency => self.efficiency,
            TargetMetric::CycleTime => self.cycle_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    #[serde(default)]
    pub training_data_points: u64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub validation_score: Option<f64>,
    #[serde(default)]
    pub feature_importance: BTreeMap<String, f64>,
}

/// Acceptance thresholds for remote coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    pub min_r_squared: f64,
    /// Exclusive lower bound
    pub min_training_points: u64,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            min_r_squared: 0.7,
            min_training_points: 1_000,
        }
    }
}

/// Validated coefficient set for all three metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionCoefficients {
    pub pressure: PolynomialModel,
    pub efficiency: PolynomialModel,
    pub cycle_time: PolynomialModel,
    pub r_squared: MetricScores,
    pub model_metadata: ModelMetadata,
}

// ============================================================================
// Wire Form
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCoefficients {
    #[serde(default)]
    pub pressure: Option<RawPolynomial>,
    #[serde(default)]
    pub efficiency: Option<RawPolynomial>,
    #[serde(default)]
    pub cycle_time: Option<RawPolynomial>,
    #[serde(default)]
    pub r_squared: Option<RawScores>,
    #[serde(default)]
    pub model_metadata: Option<ModelMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPolynomial {
    #[serde(default)]
    pub intercept: Option<f64>,
    #[serde(default)]
    pub linear: BTreeMap<String, f64>,
    #[serde(default)]
    pub quadratic: BTreeMap<String, f64>,
    #[serde(default)]
    pub interactions: Vec<RawInteraction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInteraction {
    pub a: String,
    pub b: String,
    pub coef: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawScores {
    #[serde(default)]
    pub pressure: Option<f64>,
    #[serde(default)]
    pub efficiency: Option<f64>,
    #[serde(default)]
    pub cycle_time: Option<f64>,
}

impl RawScores {
    /// All three scores, or `None` if any is missing.
    pub fn complete(&self) -> Option<MetricScores> {
        Some(MetricScores {
            pressure: self.pressure?,
            efficiency: self.efficiency?,
            cycle_time: self.cycle_time?,
        })
    }
}

fn resolve_feature(metric: TargetMetric, name: &str) -> Result<Feature, CoefficientError> {
    Feature::from_name(name).ok_or_else(|| {
        CoefficientError::Schema(format!("{}: unknown feature '{name}'", metric.key()))
    })
}

fn finite(metric: TargetMetric, term: &str, value: f64) -> Result<f64, CoefficientError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoefficientError::Schema(format!(
            "{}: non-finite coefficient for {term}",
            metric.key()
        )))
    }
}

impl RawPolynomial {
    fn validate(self, metric: TargetMetric) -> Result<PolynomialModel, CoefficientError> {
        let intercept = self.intercept.ok_or_else(|| {
            CoefficientError::Schema(format!("{}: missing intercept", metric.key()))
        })?;
        let intercept = finite(metric, "intercept", intercept)?;

        let terms = |map: BTreeMap<String, f64>| -> Result<Vec<(Feature, f64)>, CoefficientError> {
            map.into_iter()
                .map(|(name, coef)| -> Result<(Feature, f64), CoefficientError> {
                    Ok((resolve_feature(metric, &name)?, finite(metric, &name, coef)?))
                })
                .collect()
        };
        let linear = terms(self.linear)?;
        let quadratic = terms(self.quadratic)?;

        let interactions = self
            .interactions
            .into_iter()
            .map(|raw| -> Result<InteractionTerm, CoefficientError> {
                Ok(InteractionTerm {
                    a: resolve_feature(metric, &raw.a)?,
                    b: resolve_feature(metric, &raw.b)?,
                    coef: finite(metric, &format!("{}*{}", raw.a, raw.b), raw.coef)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PolynomialModel {
            intercept,
            linear,
            quadratic,
            interactions,
        })
    }
}

impl RawCoefficients {
    /// Structural checks first, then the quality gate.
    pub fn validate(self, gate: &QualityGate) -> Result<RegressionCoefficients, CoefficientError> {
        let block = |raw: Option<RawPolynomial>,
                     metric: TargetMetric|
         -> Result<PolynomialModel, CoefficientError> {
            raw.ok_or_else(|| CoefficientError::Schema(format!("missing '{}' block", metric.key())))?
                .validate(metric)
        };
        let pressure = block(self.pressure, TargetMetric::Pressure)?;
        let efficiency = block(self.efficiency, TargetMetric::Efficiency)?;
        let cycle_time = block(self.cycle_time, TargetMetric::CycleTime)?;

        let r_squared = self
            .r_squared
            .as_ref()
            .and_then(RawScores::complete)
            .ok_or_else(|| CoefficientError::Schema("rSquared must cover every metric".into()))?;
        let model_metadata = self
            .model_metadata
            .ok_or_else(|| CoefficientError::Schema("missing 'modelMetadata' block".into()))?;

        for metric in TargetMetric::ALL {
            let r2 = r_squared.get(metric);
            if !r2.is_finite() || r2 < gate.min_r_squared {
                return Err(CoefficientError::Quality(format!(
                    "{} R² {r2:.3} below {:.2}",
                    metric.key(),
                    gate.min_r_squared
                )));
            }
        }
        if model_metadata.training_data_points <= gate.min_training_points {
            return Err(CoefficientError::Quality(format!(
                "trained on {} points, need more than {}",
                model_metadata.training_data_points, gate.min_training_points
            )));
        }

        Ok(RegressionCoefficients {
            pressure,
            efficiency,
            cycle_time,
            r_squared,
            model_metadata,
        })
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl PolynomialModel {
    /// Evaluate against `input`, returning the value and its term breakdown.
    pub fn evaluate(
        &self,
        metric: TargetMetric,
        input: &InputModel,
    ) -> Result<(f64, Vec<TermContribution>), EvalError> {
        let mut terms = Vec::with_capacity(
            1 + self.linear.len() + self.quadratic.len() + self.interactions.len(),
        );
        let mut push = |term: String, coefficient: f64, value: f64| {
            terms.push(TermContribution {
                metric,
                term,
                coefficient,
                value,
                contribution: coefficient * value,
            });
        };

        push("intercept".to_string(), self.intercept, 1.0);
        for (feature, coef) in &self.linear {
            push(feature.as_str().to_string(), *coef, feature.value_of(input));
        }
        for (feature, coef) in &self.quadratic {
            let x = feature.value_of(input);
            push(format!("{feature}^2"), *coef, x * x);
        }
        for term in &self.interactions {
            let value = term.a.value_of(input) * term.b.value_of(input);
            push(format!("{}*{}", term.a, term.b), term.coef, value);
        }

        let total: f64 = terms.iter().map(|t| t.contribution).sum();
        if !total.is_finite() {
            return Err(EvalError::NonFinite { metric });
        }
        Ok((total, terms))
    }
}

impl RegressionCoefficients {
    /// Sub-model for `metric`. Each metric is scored by its own block only.
    pub fn model_for(&self, metric: TargetMetric) -> &PolynomialModel {
        match metric {
            TargetMetric::Pressure => &self.pressure,
            TargetMetric::Efficiency => &self.efficiency,
            TargetMetric::CycleTime => &self.cycle_time,
        }
    }

    /// Built-in coefficient set used when no external source is usable.
    ///
    /// Fitted offline to the duty-cycle simulator over the recommended
    /// operating bands. At the default input (bore 6.5 cm, rod 3.0 cm,
    /// holding 8 t, 1500 rpm, η 0.9, 5 bar loss) it predicts about
    /// 268 bar, 0.846 efficiency and a 10.98 s cycle.
    pub fn embedded() -> Self {
        use Feature::*;

        let pressure = PolynomialModel {
            intercept: 150.0,
            linear: vec![
                (BoreCm, -30.0),
                (RodCm, 2.0),
                (HoldingLoadTon, 30.0),
                (MotorRpm, 0.002),
                (PumpEfficiency, -5.0),
                (SystemLossBar, 1.0),
            ],
            quadratic: vec![(BoreCm, 1.5)],
            interactions: vec![],
        };
        let efficiency = PolynomialModel {
            intercept: 0.2,
            linear: vec![
                (BoreCm, 0.01),
                (MotorRpm, -0.000_03),
                (PumpEfficiency, 0.7),
                (SystemLossBar, -0.000_8),
            ],
            quadratic: vec![],
            interactions: vec![],
        };
        let cycle_time = PolynomialModel {
            intercept: 12.0,
            linear: vec![
                (BoreCm, 0.6),
                (HoldingLoadTon, 0.05),
                (MotorRpm, -0.003),
                (PumpEfficiency, -2.0),
            ],
            quadratic: vec![],
            interactions: vec![InteractionTerm {
                a: BoreCm,
                b: MotorRpm,
                coef: 0.000_1,
            }],
        };

        let feature_importance = [
            ("holdingLoadTon", 0.41),
            ("boreCm", 0.27),
            ("motorRpm", 0.14),
            ("pumpEfficiency", 0.12),
            ("systemLossBar", 0.04),
            ("rodCm", 0.02),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            pressure,
            efficiency,
            cycle_time,
            r_squared: MetricScores {
                pressure: 0.94,
                efficiency: 0.88,
                cycle_time: 0.91,
            },
            model_metadata: ModelMetadata {
                training_data_points: 5_000,
                last_updated: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single(),
                validation_score: Some(0.90),
                feature_importance,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> serde_json::Value {
        serde_json::json!({
            "pressure": { "intercept": 10.0, "linear": { "boreCm": 2.0 } },
            "efficiency": { "intercept": 0.5, "quadratic": { "pumpEfficiency": 0.3 } },
            "cycleTime": {
                "intercept": 9.0,
                "interactions": [ { "a": "boreCm", "b": "motorRpm", "coef": 0.001 } ]
            },
            "rSquared": { "pressure": 0.95, "efficiency": 0.9, "cycleTime": 0.93 },
            "modelMetadata": { "trainingDataPoints": 2500, "lastUpdated": "2024-05-01T12:00:00Z" }
        })
    }

    fn parse(value: serde_json::Value) -> RawCoefficients {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_payload_accepted() {
        let coeffs = parse(payload()).validate(&QualityGate::default()).unwrap();
        assert_eq!(coeffs.pressure.linear, vec![(Feature::BoreCm, 2.0)]);
        assert_eq!(coeffs.model_metadata.training_data_points, 2500);
        assert!(coeffs.model_metadata.last_updated.is_some());
    }

    #[test]
    fn test_missing_block_is_schema_error() {
        let mut value = payload();
        value.as_object_mut().unwrap().remove("cycleTime");
        let err = parse(value).validate(&QualityGate::default()).unwrap_err();
        assert!(matches!(err, CoefficientError::Schema(ref m) if m.contains("cycleTime")));
    }

    #[test]
    fn test_missing_intercept_is_schema_error() {
        let mut value = payload();
        value["efficiency"] = serde_json::json!({ "linear": { "boreCm": 1.0 } });
        let err = parse(value).validate(&QualityGate::default()).unwrap_err();
        assert!(matches!(err, CoefficientError::Schema(_)));
    }

    #[test]
    fn test_unknown_feature_is_schema_error() {
        let mut value = payload();
        value["pressure"]["linear"] = serde_json::json!({ "strokeLength": 1.0 });
        let err = parse(value).validate(&QualityGate::default()).unwrap_err();
        assert!(matches!(err, CoefficientError::Schema(ref m) if m.contains("strokeLength")));
    }

    #[test]
    fn test_low_r_squared_rejected() {
        let mut value = payload();
        value["rSquared"]["efficiency"] = serde_json::json!(0.65);
        let err = parse(value).validate(&QualityGate::default()).unwrap_err();
        assert!(matches!(err, CoefficientError::Quality(_)));
    }

    #[test]
    fn test_training_points_threshold_is_exclusive() {
        let mut value = payload();
        value["modelMetadata"]["trainingDataPoints"] = serde_json::json!(1000);
        let err = parse(value).validate(&QualityGate::default()).unwrap_err();
        assert!(matches!(err, CoefficientError::Quality(_)));
    }

    #[test]
    fn test_evaluate_sums_all_term_kinds() {
        let coeffs = parse(payload()).validate(&QualityGate::default()).unwrap();
        let input = InputModel::default();

        let (p, terms) = coeffs.pressure.evaluate(TargetMetric::Pressure, &input).unwrap();
        assert!((p - (10.0 + 2.0 * 6.5)).abs() < 1e-9);
        assert_eq!(terms.len(), 2);

        let (e, terms) = coeffs.efficiency.evaluate(TargetMetric::Efficiency, &input).unwrap();
        assert!((e - (0.5 + 0.3 * 0.81)).abs() < 1e-9);
        assert_eq!(terms[1].term, "pumpEfficiency^2");

        let (c, terms) = coeffs.cycle_time.evaluate(TargetMetric::CycleTime, &input).unwrap();
        assert!((c - (9.0 + 0.001 * 6.5 * 1500.0)).abs() < 1e-9);
        assert_eq!(terms[1].term, "boreCm*motorRpm");
    }

    #[test]
    fn test_non_finite_evaluation_detected() {
        let model = PolynomialModel {
            intercept: 0.0,
            linear: vec![(Feature::MotorRpm, f64::MAX)],
            quadratic: vec![(Feature::MotorRpm, f64::MAX)],
            interactions: vec![],
        };
        let err = model.evaluate(TargetMetric::Pressure, &InputModel::default()).unwrap_err();
        assert_eq!(err, EvalError::NonFinite { metric: TargetMetric::Pressure });
    }

    #[test]
    fn test_embedded_defaults_at_reference_input() {
        let coeffs = RegressionCoefficients::embedded();
        let input = InputModel::default();
        let (p, _) = coeffs.pressure.evaluate(TargetMetric::Pressure, &input).unwrap();
        let (e, _) = coeffs.efficiency.evaluate(TargetMetric::Efficiency, &input).unwrap();
        let (c, _) = coeffs.cycle_time.evaluate(TargetMetric::CycleTime, &input).unwrap();
        assert!((p - 267.875).abs() < 1e-9);
        assert!((e - 0.846).abs() < 1e-9);
        assert!((c - 10.975).abs() < 1e-9);
    }

    #[test]
    fn test_embedded_defaults_clear_quality_gate() {
        let coeffs = RegressionCoefficients::embedded();
        let gate = QualityGate::default();
        for metric in TargetMetric::ALL {
            assert!(coeffs.r_squared.get(metric) >= gate.min_r_squared);
        }
        assert!(coeffs.model_metadata.training_data_points > gate.min_training_points);
    }

    #[test]
    fn test_metrics_use_distinct_blocks() {
        let coeffs = RegressionCoefficients::embedded();
        assert_ne!(
            coeffs.model_for(TargetMetric::Pressure),
            coeffs.model_for(TargetMetric::CycleTime)
        );
    }
}
