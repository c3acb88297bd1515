//! Model bundle loading: directory checks, label map, device and classifier

use crate::classifier::Classifier;
use crate::keyword::KeywordClassifier;
use crate::label_map::LabelMap;
use crate::model_config::{Backend, DeviceSpec, ModelSettings, LABEL_MAP_FILE};
use candle_core::Device;
use std::path::{Path, PathBuf};
use threatscan_core::{Error, Result};
use tracing::{info, warn};

/// Tokenizer, weights, label mapping and device, built once and then shared
/// read-only by every request
pub struct ModelBundle {
    classifier: Box<dyn Classifier>,
    labels: LabelMap,
    model_dir: PathBuf,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("classifier", &self.classifier.name())
            .field("num_labels", &self.classifier.num_labels())
            .field("labels", &self.labels)
            .field("model_dir", &self.model_dir)
            .finish()
    }
}

impl ModelBundle {
    /// Load a bundle from settings
    pub fn load(settings: &ModelSettings) -> Result<Self> {
        let model_dir = &settings.model_dir;
        if !model_dir.exists() {
            return Err(Error::not_found(format!(
                "Model folder not found: {}",
                model_dir.display()
            )));
        }

        let label_map_path = settings.label_map_path();
        if !label_map_path.exists() {
            return Err(Error::not_found(format!(
                "{} not found in: {}",
                LABEL_MAP_FILE,
                model_dir.display()
            )));
        }

        let labels = LabelMap::from_file(&label_map_path)?;
        info!(
            "Loaded label map with {} entries from {}",
            labels.len(),
            label_map_path.display()
        );

        let classifier: Box<dyn Classifier> = match settings.backend {
            Backend::Bert => load_model_classifier(model_dir, settings, &labels)?,
            Backend::Keyword => {
                info!("Using keyword backend, model weights are not loaded");
                Box::new(KeywordClassifier::new(&settings.keywords, &labels)?)
            }
        };

        info!(
            "Model bundle ready: {} ({} classes on {:?})",
            classifier.name(),
            classifier.num_labels(),
            classifier.device()
        );

        Ok(Self::from_parts(classifier, labels, model_dir.clone()))
    }

    /// Assemble a bundle from an already-built classifier
    pub fn from_parts(classifier: Box<dyn Classifier>, labels: LabelMap, model_dir: PathBuf) -> Self {
        Self {
            classifier,
            labels,
            model_dir,
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn device(&self) -> &Device {
        self.classifier.device()
    }
}

#[cfg(feature = "ml-models")]
fn load_model_classifier(
    model_dir: &Path,
    settings: &ModelSettings,
    labels: &LabelMap,
) -> Result<Box<dyn Classifier>> {
    use crate::model_config::ArchitectureConfig;

    let arch = ArchitectureConfig::from_dir(model_dir)?;
    let num_labels = match arch.declared_labels() {
        Some(n) => {
            if labels.class_count() > n {
                return Err(Error::config(format!(
                    "{} has index {} but {} declares {} classes",
                    LABEL_MAP_FILE,
                    labels.class_count() - 1,
                    crate::model_config::MODEL_CONFIG_FILE,
                    n
                )));
            }
            n
        }
        None => labels.class_count(),
    };
    if num_labels == 0 {
        return Err(Error::config(format!(
            "Cannot determine number of classes for {}",
            model_dir.display()
        )));
    }
    if labels.class_count() < num_labels {
        warn!(
            "Label map covers {} of {} classes; missing indices use label_<index>",
            labels.class_count(),
            num_labels
        );
    }

    let device = select_device(settings.device)?;
    crate::transformer::load_transformer(model_dir, &arch, num_labels, settings.max_length, &device)
}

#[cfg(not(feature = "ml-models"))]
fn load_model_classifier(
    _model_dir: &Path,
    _settings: &ModelSettings,
    _labels: &LabelMap,
) -> Result<Box<dyn Classifier>> {
    Err(Error::classifier(
        "Transformer backend requires the 'ml-models' feature",
    ))
}

/// Pick the compute device. `Auto` prefers CUDA, then Metal, then CPU.
pub fn select_device(spec: DeviceSpec) -> Result<Device> {
    match spec {
        DeviceSpec::Cpu => Ok(Device::Cpu),
        DeviceSpec::Cuda => Device::new_cuda(0)
            .map_err(|e| Error::classifier(format!("Failed to initialize CUDA: {}", e))),
        DeviceSpec::Metal => Device::new_metal(0)
            .map_err(|e| Error::classifier(format!("Failed to initialize Metal: {}", e))),
        DeviceSpec::Auto => {
            if candle_core::utils::cuda_is_available() {
                match Device::new_cuda(0) {
                    Ok(device) => return Ok(device),
                    Err(e) => warn!("CUDA reported available but failed to initialize: {}", e),
                }
            }
            if candle_core::utils::metal_is_available() {
                match Device::new_metal(0) {
                    Ok(device) => return Ok(device),
                    Err(e) => warn!("Metal reported available but failed to initialize: {}", e),
                }
            }
            Ok(Device::Cpu)
        }
    }
}
