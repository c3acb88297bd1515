//! Keyword-matching classifier backend
//!
//! Scores labels by counting case-insensitive keyword hits with Aho-Corasick.
//! It needs no weights, only the label map, and stands in for the transformer
//! when serving offline or under test.

use crate::classifier::{candle_err, Classifier};
use crate::label_map::LabelMap;
use crate::model_config::KeywordSettings;
use aho_corasick::AhoCorasick;
use candle_core::{Device, Tensor};
use threatscan_core::{Error, Result};
use tracing::warn;

/// Logit contributed by each keyword hit
const HIT_WEIGHT: f32 = 2.0;

/// Logit given to the fallback label when nothing matches
const FALLBACK_WEIGHT: f32 = 1.0;

/// Fast keyword classifier using the Aho-Corasick algorithm
pub struct KeywordClassifier {
    name: String,
    patterns: AhoCorasick,
    pattern_classes: Vec<usize>,
    fallback_class: Option<usize>,
    num_labels: usize,
    device: Device,
}

impl KeywordClassifier {
    /// Build from keyword tables, resolving labels through the label map
    pub fn new(settings: &KeywordSettings, labels: &LabelMap) -> Result<Self> {
        let num_labels = labels.class_count();
        if num_labels == 0 {
            return Err(Error::config(
                "label map has no numeric class indices for the keyword backend",
            ));
        }

        let mut pattern_classes = Vec::new();
        let mut pattern_strs = Vec::new();
        for (label, words) in &settings.labels {
            let Some(class) = labels.index_of(label) else {
                warn!("Keyword label '{}' is not in the label map, skipping", label);
                continue;
            };
            for word in words.iter().filter(|w| !w.trim().is_empty()) {
                pattern_classes.push(class);
                pattern_strs.push(word.clone());
            }
        }

        let patterns = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&pattern_strs)
            .map_err(|e| Error::classifier(format!("Failed to build pattern matcher: {}", e)))?;

        let fallback_class = labels.index_of(&settings.fallback_label);
        if fallback_class.is_none() {
            warn!(
                "Fallback label '{}' is not in the label map",
                settings.fallback_label
            );
        }

        Ok(Self {
            name: "keyword".to_string(),
            patterns,
            pattern_classes,
            fallback_class,
            num_labels,
            device: Device::Cpu,
        })
    }

    /// Raw per-class scores before normalization
    pub fn scores(&self, text: &str) -> Vec<f32> {
        let mut scores = vec![0.0f32; self.num_labels];
        let mut matched = false;

        for m in self.patterns.find_iter(text) {
            scores[self.pattern_classes[m.pattern().as_usize()]] += HIT_WEIGHT;
            matched = true;
        }

        if !matched {
            if let Some(fallback) = self.fallback_class {
                scores[fallback] = FALLBACK_WEIGHT;
            }
        }

        scores
    }
}

impl Classifier for KeywordClassifier {
    fn logits(&self, text: &str) -> Result<Tensor> {
        Tensor::new(self.scores(text), &self.device).map_err(candle_err("Failed to create logits"))
    }

    fn num_labels(&self) -> usize {
        self.num_labels
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
