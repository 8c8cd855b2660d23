//! Standardized model artifact (offline coefficient form)
//!
//! A locally stored model description exported from a scikit-learn style
//! pipeline. Each sub-model carries its feature list, a standard scaler and
//! linear coefficients over the standardized features:
//!
//! ```json
//! {
//!   "models": {
//!     "pressure":   { "features": ["boreCm", "holdingLoadTon"],
//!                     "scaler": { "mean": [6.5, 8.0], "scale": [1.2, 3.0] },
//!                     "intercept": 260.0, "coef": [-40.0, 85.0] },
//!     "efficiency": { ... },
//!     "cycleTime":  { ... },
//!     "health":     { "features": [...], "scaler": {...},
//!                     "intercept": [0.3, -0.1, -0.2], "coef": [[...], [...], [...]],
//!                     "classes": ["healthy", "worn", "critical"] }
//!   },
//!   "rSquared": { "pressure": 0.93, "efficiency": 0.9, "cycleTime": 0.92 }
//! }
//! ```
//!
//! Regression: `intercept + Σ coef_i · (x_i − mean_i) / scale_i`.
//! Classification: arg-max over per-class logits of the same form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::coefficients::{CoefficientError, EvalError, MetricScores, ModelMetadata};
use crate::types::{Feature, InputModel, TargetMetric, TermContribution};

/// Key of the optional classification sub-model.
pub const HEALTH_MODEL: &str = "health";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    pub models: BTreeMap<String, SubModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<MetricScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_metadata: Option<ModelMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubModel {
    pub features: Vec<String>,
    pub scaler: Scaler,
    pub intercept: Intercept,
    pub coef: Coef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Intercept {
    Scalar(f64),
    PerClass(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coef {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl SubModel {
    fn mismatch(name: &str, detail: String) -> EvalError {
        EvalError::FeatureMismatch {
            model: name.to_string(),
            detail,
        }
    }

    /// Resolve feature names and check that every vector lines up.
    pub fn check(&self, name: &str) -> Result<Vec<Feature>, EvalError> {
        let features = self
            .features
            .iter()
            .map(|f| {
                Feature::from_name(f)
                    .ok_or_else(|| Self::mismatch(name, format!("unknown feature '{f}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n = features.len();
        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            return Err(Self::mismatch(
                name,
                format!(
                    "{n} features but scaler has {} means and {} scales",
                    self.scaler.mean.len(),
                    self.scaler.scale.len()
                ),
            ));
        }

        match (&self.intercept, &self.coef) {
            (Intercept::Scalar(_), Coef::Vector(coef)) => {
                if coef.len() != n {
                    return Err(Self::mismatch(name, format!("{n} features but {} coefficients", coef.len())));
                }
            }
            (Intercept::PerClass(intercepts), Coef::Matrix(rows)) => {
                let classes = self
                    .classes
                    .as_ref()
                    .ok_or_else(|| EvalError::MissingTerm(format!("{name}: classes")))?;
                if rows.len() != intercepts.len() || rows.iter().any(|r| r.len() != n) {
                    return Err(Self::mismatch(name, "coefficient matrix does not match intercepts".into()));
                }
                let binary = rows.len() == 1 && classes.len() == 2;
                if !binary && rows.len() != classes.len() {
                    return Err(Self::mismatch(
                        name,
                        format!("{} logit rows for {} classes", rows.len(), classes.len()),
                    ));
                }
            }
            _ => {
                return Err(EvalError::MissingTerm(format!(
                    "{name}: intercept and coef shapes disagree"
                )))
            }
        }

        Ok(features)
    }

    /// `(x − mean) / scale` for each feature.
    fn standardize(&self, features: &[Feature], input: &InputModel) -> Vec<f64> {
        features
            .iter()
            .zip(self.scaler.mean.iter().zip(&self.scaler.scale))
            .map(|(f, (mean, scale))| (f.value_of(input) - mean) / scale)
            .collect()
    }

    /// Regression output with per-feature contributions.
    pub fn regress(
        &self,
        metric: TargetMetric,
        input: &InputModel,
    ) -> Result<(f64, Vec<TermContribution>), EvalError> {
        let features = self.check(metric.key())?;
        let (Intercept::Scalar(intercept), Coef::Vector(coef)) = (&self.intercept, &self.coef) else {
            return Err(EvalError::MissingTerm(format!("{}: scalar intercept", metric.key())));
        };

        let z = self.standardize(&features, input);
        let mut terms = vec![TermContribution {
            metric,
            term: "intercept".to_string(),
            coefficient: *intercept,
            value: 1.0,
            contribution: *intercept,
        }];
        terms.extend(features.iter().zip(coef).zip(&z).map(|((f, c), zi)| TermContribution {
            metric,
            term: format!("z({f})"),
            coefficient: *c,
            value: *zi,
            contribution: c * zi,
        }));

        let total: f64 = terms.iter().map(|t| t.contribution).sum();
        if !total.is_finite() {
            return Err(EvalError::NonFinite { metric });
        }
        Ok((total, terms))
    }

    /// Class label with the highest logit.
    pub fn classify(&self, name: &str, input: &InputModel) -> Result<String, EvalError> {
        let features = self.check(name)?;
        let (Intercept::PerClass(intercepts), Coef::Matrix(rows), Some(classes)) =
            (&self.intercept, &self.coef, &self.classes)
        else {
            return Err(EvalError::MissingTerm(format!("{name}: per-class terms")));
        };

        let z = self.standardize(&features, input);
        let logits: Vec<f64> = rows
            .iter()
            .zip(intercepts)
            .map(|(row, b)| b + row.iter().zip(&z).map(|(c, zi)| c * zi).sum::<f64>())
            .collect();
        if logits.iter().any(|l| !l.is_finite()) {
            return Err(Self::mismatch(name, "non-finite logit".into()));
        }

        let index = if logits.len() == 1 {
            usize::from(logits[0] > 0.0)
        } else {
            logits
                .iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, l)| if *l > best.1 { (i, *l) } else { best })
                .0
        };
        classes
            .get(index)
            .cloned()
            .ok_or_else(|| EvalError::MissingTerm(format!("{name}: class {index}")))
    }
}

impl ModelArtifact {
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Require the three regression sub-models and a well-formed health model.
    pub fn validate(&self) -> Result<(), CoefficientError> {
        for metric in TargetMetric::ALL {
            let model = self.models.get(metric.key()).ok_or_else(|| {
                CoefficientError::Schema(format!("artifact has no '{}' model", metric.key()))
            })?;
            if !matches!(model.intercept, Intercept::Scalar(_)) {
                return Err(CoefficientError::Schema(format!(
                    "'{}' must be a regression model",
                    metric.key()
                )));
            }
            model
                .check(metric.key())
                .map_err(|e| CoefficientError::Schema(e.to_string()))?;
        }
        if let Some(health) = self.models.get(HEALTH_MODEL) {
            health
                .check(HEALTH_MODEL)
                .map_err(|e| CoefficientError::Schema(e.to_string()))?;
        }
        Ok(())
    }

    pub fn evaluate(
        &self,
        metric: TargetMetric,
        input: &InputModel,
    ) -> Result<(f64, Vec<TermContribution>), EvalError> {
        self.models
            .get(metric.key())
            .ok_or_else(|| EvalError::MissingTerm(format!("{} model", metric.key())))?
            .regress(metric, input)
    }

    /// Health class, if the artifact carries a classifier.
    pub fn health(&self, input: &InputModel) -> Option<Result<String, EvalError>> {
        self.models
            .get(HEALTH_MODEL)
            .map(|model| model.classify(HEALTH_MODEL, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regression(features: &[&str], mean: &[f64], scale: &[f64], intercept: f64, coef: &[f64]) -> SubModel {
        SubModel {
            features: features.iter().map(|s| s.to_string()).collect(),
            scaler: Scaler {
                mean: mean.to_vec(),
                scale: scale.to_vec(),
            },
            intercept: Intercept::Scalar(intercept),
            coef: Coef::Vector(coef.to_vec()),
            classes: None,
        }
    }

    fn artifact() -> ModelArtifact {
        let mut models = BTreeMap::new();
        models.insert(
            "pressure".to_string(),
            regression(&["boreCm", "holdingLoadTon"], &[6.0, 10.0], &[0.5, 2.0], 250.0, &[-20.0, 40.0]),
        );
        models.insert(
            "efficiency".to_string(),
            regression(&["pumpEfficiency"], &[0.85], &[0.05], 0.8, &[0.05]),
        );
        models.insert(
            "cycleTime".to_string(),
            regression(&["motorRpm"], &[1500.0], &[500.0], 9.5, &[-0.4]),
        );
        models.insert(
            HEALTH_MODEL.to_string(),
            SubModel {
                features: vec!["holdingLoadTon".into()],
                scaler: Scaler {
                    mean: vec![10.0],
                    scale: vec![2.0],
                },
                intercept: Intercept::PerClass(vec![0.0, 0.0, 0.0]),
                coef: Coef::Matrix(vec![vec![-1.0], vec![0.0], vec![1.0]]),
                classes: Some(vec!["light".into(), "nominal".into(), "heavy".into()]),
            },
        );
        ModelArtifact {
            models,
            r_squared: None,
            model_metadata: None,
        }
    }

    #[test]
    fn test_standardized_regression() {
        let art = artifact();
        art.validate().unwrap();
        let input = InputModel::default();
        // z(bore) = (6.5-6)/0.5 = 1, z(load) = (8-10)/2 = -1
        let (p, terms) = art.evaluate(TargetMetric::Pressure, &input).unwrap();
        assert!((p - (250.0 - 20.0 - 40.0)).abs() < 1e-9);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[1].term, "z(boreCm)");
    }

    #[test]
    fn test_health_argmax() {
        let art = artifact();
        // z(load) = -1 → logits [1, 0, -1]
        assert_eq!(art.health(&InputModel::default()).unwrap().unwrap(), "light");
        let heavy = InputModel {
            holding_load_ton: 14.0,
            ..Default::default()
        };
        assert_eq!(art.health(&heavy).unwrap().unwrap(), "heavy");
    }

    #[test]
    fn test_binary_logistic_health() {
        let mut art = artifact();
        art.models.insert(
            HEALTH_MODEL.to_string(),
            SubModel {
                features: vec!["holdingLoadTon".into()],
                scaler: Scaler {
                    mean: vec![10.0],
                    scale: vec![2.0],
                },
                intercept: Intercept::PerClass(vec![0.5]),
                coef: Coef::Matrix(vec![vec![1.0]]),
                classes: Some(vec!["ok".into(), "overloaded".into()]),
            },
        );
        art.validate().unwrap();
        // logit = 0.5 - 1 < 0
        assert_eq!(art.health(&InputModel::default()).unwrap().unwrap(), "ok");
    }

    #[test]
    fn test_missing_metric_model_rejected() {
        let mut art = artifact();
        art.models.remove("cycleTime");
        assert!(matches!(art.validate(), Err(CoefficientError::Schema(_))));
        assert!(matches!(
            art.evaluate(TargetMetric::CycleTime, &InputModel::default()),
            Err(EvalError::MissingTerm(_))
        ));
    }

    #[test]
    fn test_scaler_length_mismatch() {
        let mut art = artifact();
        if let Some(model) = art.models.get_mut("efficiency") {
            model.scaler.scale.push(1.0);
        }
        assert!(matches!(
            art.evaluate(TargetMetric::Efficiency, &InputModel::default()),
            Err(EvalError::FeatureMismatch { .. })
        ));
        assert!(art.validate().is_err());
    }

    #[test]
    fn test_parses_untagged_shapes() {
        let json = br#"{
            "models": {
                "pressure":   { "features": ["boreCm"], "scaler": { "mean": [6.5], "scale": [1.0] },
                                "intercept": 200.0, "coef": [1.0] },
                "efficiency": { "features": ["pumpEfficiency"], "scaler": { "mean": [0.9], "scale": [0.1] },
                                "intercept": 0.8, "coef": [0.1] },
                "cycleTime":  { "features": ["motorRpm"], "scaler": { "mean": [1500], "scale": [300] },
                                "intercept": 9.0, "coef": [-0.5] },
                "health":     { "features": ["boreCm"], "scaler": { "mean": [6.5], "scale": [1.0] },
                                "intercept": [0.0, 1.0], "coef": [[0.0], [0.0]], "classes": ["a", "b"] }
            },
            "rSquared": { "pressure": 0.93, "efficiency": 0.9, "cycleTime": 0.95 }
        }"#;
        let art = ModelArtifact::from_json(json).unwrap();
        art.validate().unwrap();
        assert!(matches!(art.models["health"].intercept, Intercept::PerClass(_)));
        assert_eq!(art.health(&InputModel::default()).unwrap().unwrap(), "b");
        assert!(art.r_squared.is_some());
    }
}
