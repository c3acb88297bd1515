//! Model settings and the `config.json` shipped alongside model weights

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use threatscan_core::Result;

/// Name of the label mapping side-car file inside the model directory
pub const LABEL_MAP_FILE: &str = "label_map.json";

/// Name of the architecture config inside the model directory
pub const MODEL_CONFIG_FILE: &str = "config.json";

/// Name of the weights file inside the model directory
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Settings controlling how the model bundle is built and queried
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Directory holding weights, tokenizer and `label_map.json`
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Which classifier implementation backs predictions
    #[serde(default)]
    pub backend: Backend,

    /// Device to run on
    #[serde(default)]
    pub device: DeviceSpec,

    /// Maximum sequence length after truncation
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Number of predictions returned per request
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Keyword tables for the keyword backend
    #[serde(default)]
    pub keywords: KeywordSettings,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models/cyber-bert-v1")
}

fn default_max_length() -> usize {
    256
}

fn default_top_k() -> usize {
    3
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            backend: Backend::default(),
            device: DeviceSpec::default(),
            max_length: default_max_length(),
            top_k: default_top_k(),
            keywords: KeywordSettings::default(),
        }
    }
}

impl ModelSettings {
    /// Create settings for a model directory with defaults elsewhere
    pub fn from_dir(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Set backend
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Path of the label mapping file
    pub fn label_map_path(&self) -> PathBuf {
        self.model_dir.join(LABEL_MAP_FILE)
    }
}

/// Classifier backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Transformer sequence classifier loaded from safetensors
    #[default]
    Bert,
    /// Keyword matching placeholder, no weights required
    Keyword,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bert" | "model" => Ok(Self::Bert),
            "keyword" | "keywords" => Ok(Self::Keyword),
            other => Err(format!("unknown backend '{}' (expected bert or keyword)", other)),
        }
    }
}

/// Device preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceSpec {
    /// Accelerator if one is available, CPU otherwise
    #[default]
    Auto,
    Cpu,
    Cuda,
    Metal,
}

impl std::str::FromStr for DeviceSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "cuda:0" | "gpu" => Ok(Self::Cuda),
            "metal" | "mps" => Ok(Self::Metal),
            other => Err(format!("unknown device '{}'", other)),
        }
    }
}

/// Keyword tables used by the keyword backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordSettings {
    /// Label that receives a baseline score when nothing matches
    #[serde(default = "default_fallback_label")]
    pub fallback_label: String,

    /// Keywords per label
    #[serde(default = "default_keyword_table")]
    pub labels: BTreeMap<String, Vec<String>>,
}

fn default_fallback_label() -> String {
    "safe".to_string()
}

fn default_keyword_table() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 2] = [
        (
            "phishing",
            &[
                "verify your account",
                "password",
                "login",
                "click here",
                "confirm your identity",
                "account suspended",
                "update your payment",
            ],
        ),
        (
            "scam",
            &[
                "lottery",
                "you have won",
                "prize",
                "wire transfer",
                "gift card",
                "inheritance",
                "crypto investment",
            ],
        ),
    ];

    table
        .iter()
        .map(|(label, words)| {
            (
                label.to_string(),
                words.iter().map(|w| w.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            fallback_label: default_fallback_label(),
            labels: default_keyword_table(),
        }
    }
}

/// Subset of a transformers `config.json` needed to pick the architecture
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    #[serde(default = "default_model_type")]
    pub model_type: String,

    #[serde(default)]
    pub num_labels: Option<usize>,

    #[serde(default)]
    pub id2label: BTreeMap<String, String>,
}

fn default_model_type() -> String {
    "bert".to_string()
}

impl ArchitectureConfig {
    /// Read `config.json` from a model directory
    pub fn from_dir(model_dir: &Path) -> Result<Self> {
        let path = model_dir.join(MODEL_CONFIG_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            threatscan_core::Error::classifier(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            threatscan_core::Error::classifier(format!(
                "Failed to parse {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Number of output classes declared by the config, if any
    pub fn declared_labels(&self) -> Option<usize> {
        if !self.id2label.is_empty() {
            Some(self.id2label.len())
        } else {
            self.num_labels
        }
    }
}
