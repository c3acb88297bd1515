//! Inference service: owns the model bundle and answers prediction queries

use crate::model_config::ModelSettings;
use crate::model_loader::ModelBundle;
use crate::ranking;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use threatscan_core::{Prediction, Result};
use tracing::{debug, info};

/// Explicit context holding the model bundle for the life of the process
///
/// The bundle is built at most once. Concurrent first callers serialize on
/// the init lock; after that every call only clones an `Arc`.
pub struct InferenceService {
    settings: ModelSettings,
    bundle: Mutex<Option<Arc<ModelBundle>>>,
}

impl InferenceService {
    /// Create an uninitialized service
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            settings,
            bundle: Mutex::new(None),
        }
    }

    /// Create a service around an already-loaded bundle
    pub fn with_bundle(settings: ModelSettings, bundle: ModelBundle) -> Self {
        Self {
            settings,
            bundle: Mutex::new(Some(Arc::new(bundle))),
        }
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Whether the bundle has been built
    pub fn is_loaded(&self) -> bool {
        self.bundle.lock().is_some()
    }

    /// Build the bundle if needed and return it. Calling this again returns
    /// the same bundle without reloading.
    pub fn load_model(&self) -> Result<Arc<ModelBundle>> {
        let mut slot = self.bundle.lock();
        if let Some(bundle) = slot.as_ref() {
            return Ok(Arc::clone(bundle));
        }

        info!(
            "Loading model from {} ({:?} backend)",
            self.settings.model_dir.display(),
            self.settings.backend
        );
        let start = Instant::now();
        let bundle = Arc::new(ModelBundle::load(&self.settings)?);
        info!("Model loaded in {} ms", start.elapsed().as_millis());

        *slot = Some(Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Top-k predictions for `text`, highest score first.
    ///
    /// Blank text short-circuits to a single `empty` prediction without
    /// touching the model. `top_k` is clamped to `[1, number_of_classes]`.
    pub fn predict(&self, text: &str, top_k: usize) -> Result<Vec<Prediction>> {
        let bundle = self.load_model()?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(vec![Prediction::empty()]);
        }

        let start = Instant::now();
        let logits = bundle.classifier().logits(text)?;
        let probs = ranking::softmax(&logits)?;
        let predictions = ranking::rank(&probs, top_k, bundle.labels())?;

        debug!(
            "Classified {} chars in {} us, top label {:?}",
            text.len(),
            start.elapsed().as_micros(),
            predictions.first().map(|p| p.label.as_str())
        );

        Ok(predictions)
    }

    /// `predict` with the configured `top_k`
    pub fn predict_default(&self, text: &str) -> Result<Vec<Prediction>> {
        self.predict(text, self.settings.top_k)
    }
}
