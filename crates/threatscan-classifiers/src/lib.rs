//! ThreatScan Classifiers
//!
//! Message threat classification on top of Candle.
//!
//! A [`ModelBundle`] (tokenizer, weights, label map, device) is built once by
//! the [`InferenceService`] and then queried for ranked predictions:
//! - `bert` backend: BERT/DistilBERT sequence classifiers from a local directory
//! - `keyword` backend: Aho-Corasick keyword scoring over the same label map

pub mod classifier;
pub mod keyword;
pub mod label_map;
pub mod model_config;
pub mod model_loader;
pub mod ranking;
pub mod service;
#[cfg(feature = "ml-models")]
pub mod transformer;

pub use classifier::Classifier;
pub use keyword::KeywordClassifier;
pub use label_map::LabelMap;
pub use model_config::{ArchitectureConfig, Backend, DeviceSpec, KeywordSettings, ModelSettings};
pub use model_loader::{select_device, ModelBundle};
pub use service::InferenceService;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::Classifier;
    pub use crate::model_config::{Backend, DeviceSpec, ModelSettings};
    pub use crate::model_loader::ModelBundle;
    pub use crate::service::InferenceService;
    pub use threatscan_core::Prediction;
}
