//! Mock classifiers for testing
//!
//! Provides a configurable implementation of the Classifier trait for
//! exercising ranking, clamping and the empty-input short-circuit.

use candle_core::{Device, Tensor};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use threatscan_classifiers::{Classifier, InferenceService, LabelMap, ModelBundle, ModelSettings};
use threatscan_core::{Error, Result};

/// A classifier returning fixed logits
pub struct MockClassifier {
    logits: Vec<f32>,
    fail: bool,
    call_count: Arc<AtomicU32>,
    device: Device,
}

impl MockClassifier {
    /// Create a new mock classifier with the given logits
    pub fn new(logits: &[f32]) -> Self {
        Self {
            logits: logits.to_vec(),
            fail: false,
            call_count: Arc::new(AtomicU32::new(0)),
            device: Device::Cpu,
        }
    }

    /// Make every call fail
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Shared handle to the call counter
    pub fn counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.call_count)
    }
}

impl Classifier for MockClassifier {
    fn logits(&self, _text: &str) -> Result<Tensor> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(Error::classifier("simulated forward failure"));
        }
        Tensor::new(self.logits.as_slice(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::classifier(e.to_string()))
    }

    fn num_labels(&self) -> usize {
        self.logits.len()
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

fn threat_labels() -> LabelMap {
    LabelMap::from_pairs([(0, "safe"), (1, "phishing"), (2, "scam"), (3, "spam")])
}

fn service_with(classifier: MockClassifier) -> InferenceService {
    let bundle = ModelBundle::from_parts(
        Box::new(classifier),
        threat_labels(),
        PathBuf::from("mock"),
    );
    InferenceService::with_bundle(ModelSettings::default(), bundle)
}

#[test]
fn test_ranked_probabilities() {
    let service = service_with(MockClassifier::new(&[0.5, 3.0, 1.0, -1.0]));

    let preds = service.predict("click this link", 3).unwrap();
    assert_eq!(preds.len(), 3);
    assert_eq!(preds[0].label, "phishing");
    assert_eq!(preds[1].label, "scam");
    assert_eq!(preds[2].label, "safe");

    let total: f32 = preds.iter().map(|p| p.score).sum();
    assert!(total <= 1.0 + 1e-5, "scores should be a subset of a softmax, got {}", total);
    for pair in preds.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for p in &preds {
        assert!((0.0..=1.0).contains(&p.score));
    }
}

#[test]
fn test_top_k_is_clamped() {
    let service = service_with(MockClassifier::new(&[0.1, 0.2, 0.3, 0.4]));

    let zero = service.predict("hello", 0).unwrap();
    let one = service.predict("hello", 1).unwrap();
    assert_eq!(zero, one);
    assert_eq!(zero.len(), 1);
    assert_eq!(zero[0].label, "spam");

    let all = service.predict("hello", 1000).unwrap();
    assert_eq!(all.len(), 4);
    let total: f32 = all.iter().map(|p| p.score).sum();
    assert!((total - 1.0).abs() < 1e-4);
}

#[test]
fn test_empty_text_skips_model() {
    let classifier = MockClassifier::new(&[1.0, 2.0, 3.0, 4.0]);
    let calls = classifier.counter();
    let service = service_with(classifier);

    for text in ["", "   ", "\n\t "] {
        let preds = service.predict(text, 3).unwrap();
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].label, "empty");
        assert_eq!(preds[0].score, 1.0);
    }
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_text_is_trimmed_before_inference() {
    let classifier = MockClassifier::new(&[1.0, 0.0, 0.0, 0.0]);
    let calls = classifier.counter();
    let service = service_with(classifier);

    let preds = service.predict("  hello  ", 3).unwrap();
    assert_eq!(preds[0].label, "safe");
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn test_unmapped_index_uses_placeholder() {
    let bundle = ModelBundle::from_parts(
        Box::new(MockClassifier::new(&[0.0, 0.0, 9.0])),
        LabelMap::from_pairs([(0, "safe"), (1, "phishing")]),
        PathBuf::from("mock"),
    );
    let service = InferenceService::with_bundle(ModelSettings::default(), bundle);

    let preds = service.predict("anything", 1).unwrap();
    assert_eq!(preds[0].label, "label_2");
}

#[test]
fn test_inference_errors_propagate() {
    let service = service_with(MockClassifier::new(&[0.0; 4]).failing());
    let err = service.predict("hello", 3).unwrap_err();
    assert!(matches!(err, Error::Classifier(_)));
}

#[test]
fn test_preloaded_bundle_is_reused() {
    let service = service_with(MockClassifier::new(&[0.0; 4]));
    assert!(service.is_loaded());

    let first = service.load_model().unwrap();
    let second = service.load_model().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
