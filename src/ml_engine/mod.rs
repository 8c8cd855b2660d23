//! Performance Model Engine
//!
//! Predicts maximum pressure, efficiency and cycle time for a press
//! configuration from regression coefficients.
//!
//! ## Coefficient Sources
//!
//! Tried in order, first success wins:
//!
//! 1. Remote model service (HTTP, retried with exponential backoff on transient
//!    failures, validated for schema and quality)
//! 2. Standardized model artifact on local disk (scaler + linear models, optional
//!    health classifier)
//! 3. Embedded default coefficients (always available)
//!
//! If the loaded coefficients cannot produce a finite prediction for an input,
//! a physical heuristic estimate is returned instead, tagged
//! [`PredictionSource::Heuristic`](crate::types::PredictionSource) with low confidence.
//!
//! ## Architecture
//! - `coefficients`: polynomial wire schema, validation, evaluation, embedded defaults
//! - `artifact`: standardized artifact form
//! - `source`: `CoefficientSource` trait with HTTP and file implementations
//! - `retry`: bounded exponential backoff
//! - `cache`: single-flight snapshot cache with generation-checked reload
//! - `model`: `LoadedModel` snapshot and the `PerformanceModel` entrypoint

pub mod artifact;
pub mod cache;
pub mod coefficients;
pub mod model;
pub mod retry;
pub mod source;

pub use artifact::ModelArtifact;
pub use cache::{CacheState, CoefficientCache};
pub use coefficients::{CoefficientError, EvalError, QualityGate, RawCoefficients, RegressionCoefficients};
pub use model::{heuristic_prediction, LoadedModel, ModelCoefficients, PerformanceModel};
pub use retry::{fetch_with_retry, RetryPolicy};
pub use source::{ArtifactFileSource, CoefficientSource, HttpCoefficientSource, SourceError};
