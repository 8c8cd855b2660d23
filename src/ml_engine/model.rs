//! Performance model: prediction over a loaded coefficient snapshot

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{defaults::HEURISTIC_CYCLE_TIME_SECS, ConfidenceConfig, PressConfig};
use crate::physics_engine::{force_from_ton, piston_area, pressure_bar};
use crate::types::{
    ConfidenceLevel, InputError, InputModel, PredictionResult, PredictionSource, TargetMetric,
    TermContribution,
};

use super::artifact::ModelArtifact;
use super::cache::CoefficientCache;
use super::coefficients::{EvalError, MetricScores, RegressionCoefficients};

/// Either coefficient form a source can deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelCoefficients {
    /// Intercept + linear, quadratic and interaction terms per metric
    Polynomial(RegressionCoefficients),
    /// Scaler + linear model per metric, optional health classifier
    Standardized(ModelArtifact),
}

impl ModelCoefficients {
    pub fn r_squared(&self) -> Option<MetricScores> {
        match self {
            Self::Polynomial(c) => Some(c.r_squared),
            Self::Standardized(a) => a.r_squared,
        }
    }

    fn evaluate(
        &self,
        metric: TargetMetric,
        input: &InputModel,
    ) -> Result<(f64, Vec<TermContribution>), EvalError> {
        match self {
            Self::Polynomial(c) => c.model_for(metric).evaluate(metric, input),
            Self::Standardized(a) => a.evaluate(metric, input),
        }
    }
}

/// Immutable coefficient snapshot plus its provenance.
///
/// Shared read-only between concurrent predictions; replaced wholesale on
/// reload.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    coefficients: ModelCoefficients,
    source: PredictionSource,
    confidence: ConfidenceConfig,
}

impl LoadedModel {
    pub fn new(
        coefficients: ModelCoefficients,
        source: PredictionSource,
        confidence: ConfidenceConfig,
    ) -> Self {
        Self {
            coefficients,
            source,
            confidence,
        }
    }

    /// Built-in defaults, always available.
    pub fn embedded(confidence: ConfidenceConfig) -> Self {
        Self::new(
            ModelCoefficients::Polynomial(RegressionCoefficients::embedded()),
            PredictionSource::Embedded,
            confidence,
        )
    }

    pub fn source(&self) -> PredictionSource {
        self.source
    }

    pub fn coefficients(&self) -> &ModelCoefficients {
        &self.coefficients
    }

    /// Highest level a prediction from this source may claim.
    fn confidence_cap(&self) -> ConfidenceLevel {
        match self.source {
            PredictionSource::Remote | PredictionSource::Artifact => ConfidenceLevel::High,
            PredictionSource::Embedded => ConfidenceLevel::Medium,
            PredictionSource::Heuristic => ConfidenceLevel::Low,
        }
    }

    /// Confidence from the weighted R² across all metrics.
    pub fn overall_confidence(&self) -> ConfidenceLevel {
        let Some(scores) = self.coefficients.r_squared() else {
            return ConfidenceLevel::Low;
        };
        let weights = &self.confidence.weights;
        let total_weight: f64 = TargetMetric::ALL.iter().map(|m| weights.weight(*m)).sum();
        if total_weight <= 0.0 {
            return ConfidenceLevel::Low;
        }
        let weighted: f64 = TargetMetric::ALL
            .iter()
            .map(|m| weights.weight(*m) * scores.get(*m))
            .sum::<f64>()
            / total_weight;
        self.confidence.level_for(weighted).min(self.confidence_cap())
    }

    /// Confidence for a single metric's sub-model.
    pub fn metric_confidence(&self, metric: TargetMetric) -> ConfidenceLevel {
        self.coefficients
            .r_squared()
            .map_or(ConfidenceLevel::Low, |scores| {
                self.confidence.level_for(scores.get(metric)).min(self.confidence_cap())
            })
    }

    /// Evaluate all three metrics, failing if any cannot be computed.
    pub fn evaluate(&self, input: &InputModel) -> Result<PredictionResult, EvalError> {
        let mut calculations = Vec::new();
        let mut values = [0.0; 3];
        for (slot, metric) in values.iter_mut().zip(TargetMetric::ALL) {
            let (value, terms) = self.coefficients.evaluate(metric, input)?;
            *slot = value;
            calculations.extend(terms);
        }
        let [pressure, efficiency, cycle_time] = values;

        let health = match &self.coefficients {
            ModelCoefficients::Standardized(artifact) => match artifact.health(input) {
                Some(Ok(label)) => Some(label),
                Some(Err(e)) => {
                    debug!(error = %e, "Health classifier unusable for this input");
                    None
                }
                None => None,
            },
            ModelCoefficients::Polynomial(_) => None,
        };

        Ok(PredictionResult {
            max_pressure: pressure.max(0.0),
            efficiency: efficiency.clamp(0.0, 1.0),
            cycle_time: cycle_time.max(0.0),
            confidence: self.overall_confidence(),
            source: self.source,
            health,
            calculations,
        })
    }

    /// Best-effort prediction: falls back to heuristics if evaluation fails.
    ///
    /// `input` must already be validated.
    pub fn predict(&self, input: &InputModel) -> PredictionResult {
        match self.evaluate(input) {
            Ok(result) => result,
            Err(e) => {
                warn!(source = %self.source, error = %e, "Regression unusable, using heuristic estimate");
                heuristic_prediction(input)
            }
        }
    }
}

/// Physical rule-of-thumb estimate used when no regression is usable.
///
/// Pressure is the holding load over the piston area plus system loss;
/// efficiency is the raw pump efficiency; cycle time is the fixed cycle
/// duration. Always [`ConfidenceLevel::Low`].
pub fn heuristic_prediction(input: &InputModel) -> PredictionResult {
    let pressure = pressure_bar(force_from_ton(input.holding_load_ton), piston_area(input.bore_cm))
        + input.system_loss_bar;
    let value_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };

    PredictionResult {
        max_pressure: value_or_zero(pressure).max(0.0),
        efficiency: value_or_zero(input.pump_efficiency).clamp(0.0, 1.0),
        cycle_time: HEURISTIC_CYCLE_TIME_SECS,
        confidence: ConfidenceLevel::Low,
        source: PredictionSource::Heuristic,
        health: None,
        calculations: Vec::new(),
    }
}

// ============================================================================
// PerformanceModel
// ============================================================================

/// Predicts cycle performance from the cached coefficient snapshot.
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct PerformanceModel {
    cache: Arc<CoefficientCache>,
}

impl PerformanceModel {
    pub fn new(cache: Arc<CoefficientCache>) -> Self {
        Self { cache }
    }

    /// Build the source chain described by `config`.
    pub fn from_config(config: &PressConfig) -> Self {
        Self::new(Arc::new(CoefficientCache::from_config(
            &config.model_source,
            &config.confidence,
        )))
    }

    pub fn cache(&self) -> &CoefficientCache {
        &self.cache
    }

    /// Current snapshot, loading it on first use.
    pub async fn snapshot(&self) -> Arc<LoadedModel> {
        self.cache.get().await
    }

    /// Predict performance for `input`.
    ///
    /// Only precondition violations are errors. Model unavailability degrades
    /// to fallback coefficients or heuristics with a lower confidence.
    pub async fn predict(&self, input: &InputModel) -> Result<PredictionResult, InputError> {
        input.validate()?;
        Ok(self.snapshot().await.predict(input))
    }

    /// Refetch coefficients through the source chain.
    pub async fn reload(&self) -> Arc<LoadedModel> {
        self.cache.reload().await
    }
}
