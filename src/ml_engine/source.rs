//! Coefficient sources
//!
//! - [`HttpCoefficientSource`]: remote model service returning polynomial coefficients
//! - [`ArtifactFileSource`]: standardized model artifact on local disk
//!
//! Both validate what they read before handing it to the cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::types::PredictionSource;

use super::artifact::ModelArtifact;
use super::coefficients::{CoefficientError, QualityGate, RawCoefficients};
use super::ModelCoefficients;

/// Coefficient acquisition errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Schema violation: {0}")]
    Schema(String),
    #[error("Quality below threshold: {0}")]
    Quality(String),
    #[error("Source not configured")]
    NotConfigured,
}

impl From<CoefficientError> for SourceError {
    fn from(e: CoefficientError) -> Self {
        match e {
            CoefficientError::Schema(msg) => Self::Schema(msg),
            CoefficientError::Quality(msg) => Self::Quality(msg),
        }
    }
}

impl SourceError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Http(e) => !(e.is_builder() || e.is_decode()),
            Self::Status(status) => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            Self::Io { .. }
            | Self::Parse(_)
            | Self::Schema(_)
            | Self::Quality(_)
            | Self::NotConfigured => false,
        }
    }
}

/// Anything that can produce validated coefficients.
#[async_trait]
pub trait CoefficientSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Provenance stamped on predictions made from this source.
    fn kind(&self) -> PredictionSource;

    async fn fetch(&self) -> Result<ModelCoefficients, SourceError>;
}

// ============================================================================
// HTTP
// ============================================================================

/// Remote model service.
#[derive(Clone)]
pub struct HttpCoefficientSource {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    gate: QualityGate,
}

impl HttpCoefficientSource {
    pub fn new(url: &str, timeout: Duration, gate: QualityGate) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            timeout,
            gate,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CoefficientSource for HttpCoefficientSource {
    fn name(&self) -> &str {
        "remote"
    }

    fn kind(&self) -> PredictionSource {
        PredictionSource::Remote
    }

    async fn fetch(&self) -> Result<ModelCoefficients, SourceError> {
        let timed_out = |e: reqwest::Error| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout)
            } else {
                SourceError::Http(e)
            }
        };

        let resp = self
            .http
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(timed_out)?;

        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status()));
        }

        let body = resp.bytes().await.map_err(timed_out)?;
        debug!(url = %self.url, bytes = body.len(), "Coefficient payload received");

        let raw: RawCoefficients = serde_json::from_slice(&body)?;
        Ok(ModelCoefficients::Polynomial(raw.validate(&self.gate)?))
    }
}

// ============================================================================
// Artifact File
// ============================================================================

/// Standardized model artifact read from disk on each fetch.
#[derive(Debug, Clone)]
pub struct ArtifactFileSource {
    path: PathBuf,
}

impl ArtifactFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CoefficientSource for ArtifactFileSource {
    fn name(&self) -> &str {
        "artifact"
    }

    fn kind(&self) -> PredictionSource {
        PredictionSource::Artifact
    }

    async fn fetch(&self) -> Result<ModelCoefficients, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let artifact = ModelArtifact::from_json(&bytes)?;
        artifact.validate()?;
        debug!(path = %self.path.display(), models = artifact.models.len(), "Model artifact loaded");
        Ok(ModelCoefficients::Standardized(artifact))
    }
}
