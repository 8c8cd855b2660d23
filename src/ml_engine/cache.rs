//! Coefficient cache with single-flight loading and explicit reload
//!
//! Lifecycle: `Empty → Loading → Ready | Fallback`. The first caller to need
//! coefficients runs the source chain while later callers wait on the same
//! load. After that the snapshot only changes through [`CoefficientCache::reload`].
//!
//! Every load is stamped with the generation it started under. A reload bumps
//! the generation, so a slower load that began earlier cannot overwrite the
//! newer snapshot when it finally completes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::config::{ConfidenceConfig, ModelSourceConfig};
use crate::types::PredictionSource;

use super::coefficients::QualityGate;
use super::model::LoadedModel;
use super::retry::{fetch_with_retry, RetryPolicy};
use super::source::{ArtifactFileSource, CoefficientSource, HttpCoefficientSource, SourceError};

/// Observable cache state.
#[derive(Debug, Clone)]
pub enum CacheState {
    Empty,
    Loading,
    /// Coefficients from a configured external source
    Ready(Arc<LoadedModel>),
    /// Embedded defaults after every external source failed or none was configured
    Fallback(Arc<LoadedModel>),
}

impl CacheState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Fallback(_) => "fallback",
        }
    }
}

/// Process-wide coefficient snapshot, explicitly constructed and injected.
pub struct CoefficientCache {
    sources: Vec<Arc<dyn CoefficientSource>>,
    policy: RetryPolicy,
    confidence: ConfidenceConfig,
    current: ArcSwapOption<LoadedModel>,
    loading: AtomicBool,
    load_lock: tokio::sync::Mutex<()>,
    install_lock: Mutex<()>,
    generation: AtomicU64,
}

impl CoefficientCache {
    /// Cache over an ordered source chain. Embedded defaults close the chain.
    pub fn new(
        sources: Vec<Arc<dyn CoefficientSource>>,
        policy: RetryPolicy,
        confidence: ConfidenceConfig,
    ) -> Self {
        Self {
            sources,
            policy,
            confidence,
            current: ArcSwapOption::empty(),
            loading: AtomicBool::new(false),
            load_lock: tokio::sync::Mutex::new(()),
            install_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Cache that always serves the embedded defaults.
    pub fn embedded_only(confidence: ConfidenceConfig) -> Self {
        Self::new(Vec::new(), RetryPolicy::none(), confidence)
    }

    /// Remote URL (if set), then artifact file (if set), then embedded defaults.
    pub fn from_config(config: &ModelSourceConfig, confidence: &ConfidenceConfig) -> Self {
        let mut sources: Vec<Arc<dyn CoefficientSource>> = Vec::new();

        if let Some(url) = config.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            let gate = QualityGate {
                min_r_squared: config.min_r_squared,
                min_training_points: config.min_training_points,
            };
            match HttpCoefficientSource::new(url, Duration::from_secs(config.timeout_secs), gate) {
                Ok(source) => sources.push(Arc::new(source)),
                Err(e) => warn!(url, error = %e, "Cannot build HTTP client for model source, skipping"),
            }
        }
        if let Some(path) = &config.artifact_path {
            sources.push(Arc::new(ArtifactFileSource::new(path)));
        }

        Self::new(sources, RetryPolicy::from_config(config), confidence.clone())
    }

    pub fn state(&self) -> CacheState {
        match self.current.load_full() {
            Some(model) if model.source() == PredictionSource::Embedded => CacheState::Fallback(model),
            Some(model) => CacheState::Ready(model),
            None if self.loading.load(Ordering::SeqCst) => CacheState::Loading,
            None => CacheState::Empty,
        }
    }

    /// Installed snapshot, without triggering a load.
    pub fn current(&self) -> Option<Arc<LoadedModel>> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Snapshot, loading it once if the cache is empty.
    ///
    /// Concurrent callers share one in-flight load.
    pub async fn get(&self) -> Arc<LoadedModel> {
        if let Some(model) = self.current.load_full() {
            return model;
        }

        let _guard = self.load_lock.lock().await;
        if let Some(model) = self.current.load_full() {
            return model;
        }

        let generation = self.generation();
        self.loading.store(true, Ordering::SeqCst);
        debug!(generation, "Loading coefficients");
        let model = Arc::new(self.load_chain().await);
        self.loading.store(false, Ordering::SeqCst);
        self.install(generation, model)
    }

    /// Refetch through the source chain and replace the snapshot.
    ///
    /// Readers keep the previous snapshot until the new one is installed.
    pub async fn reload(&self) -> Arc<LoadedModel> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation, "Reloading coefficients");
        let model = Arc::new(self.load_chain().await);
        self.install(generation, model)
    }

    /// Store `model` unless a newer load has started since `generation`.
    fn install(&self, generation: u64, model: Arc<LoadedModel>) -> Arc<LoadedModel> {
        let _guard = self.install_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let latest = self.generation();
        if latest == generation {
            self.current.store(Some(Arc::clone(&model)));
            info!(
                generation,
                source = %model.source(),
                state = self.state().as_str(),
                "Coefficient snapshot installed"
            );
            model
        } else {
            debug!(generation, latest, "Discarding stale coefficient load");
            self.current.load_full().unwrap_or(model)
        }
    }

    async fn load_chain(&self) -> LoadedModel {
        for source in &self.sources {
            match fetch_with_retry(source.as_ref(), &self.policy).await {
                Ok(coefficients) => {
                    info!(source = source.name(), "Coefficients accepted");
                    return LoadedModel::new(coefficients, source.kind(), self.confidence.clone());
                }
                Err(SourceError::NotConfigured) => {
                    debug!(source = source.name(), "Source not configured, skipping");
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Coefficient source unavailable");
                }
            }
        }

        if self.sources.is_empty() {
            info!("No external model source configured, using embedded coefficients");
        } else {
            warn!("All coefficient sources failed, falling back to embedded coefficients");
        }
        LoadedModel::embedded(self.confidence.clone())
    }
}
