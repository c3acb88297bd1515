//! End-to-end tests for the `bert` backend
//!
//! Builds a tiny randomly initialized BERT sequence classifier, writes it to
//! a model directory the same way an exported checkpoint is laid out, and
//! runs predictions through the inference service.

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use threatscan_classifiers::{Backend, DeviceSpec, InferenceService, ModelSettings};

const LABELS: [&str; 3] = ["safe", "phishing", "scam"];
const HIDDEN_SIZE: usize = 16;
const MAX_POSITIONS: usize = 16;

const VOCAB: [&str; 10] = [
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "verify", "your", "account", "password", "hi", "team",
];

fn bert_config_json() -> serde_json::Value {
    serde_json::json!({
        "model_type": "bert",
        "vocab_size": VOCAB.len(),
        "hidden_size": HIDDEN_SIZE,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 32,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.0,
        "max_position_embeddings": MAX_POSITIONS,
        "type_vocab_size": 2,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-12,
        "pad_token_id": 0,
        "position_embedding_type": "absolute",
        "use_cache": false,
        "id2label": {"0": "safe", "1": "phishing", "2": "scam"}
    })
}

/// Write a tiny BERT checkpoint plus tokenizer vocab and label map
fn write_tiny_bert(dir: &Path, with_pooler: bool) {
    let config_json = bert_config_json();
    std::fs::write(dir.join("config.json"), config_json.to_string()).unwrap();
    std::fs::write(dir.join("vocab.txt"), VOCAB.join("\n")).unwrap();
    std::fs::write(
        dir.join("label_map.json"),
        r#"{"0": "safe", "1": "phishing", "2": "scam"}"#,
    )
    .unwrap();

    let config: BertConfig = serde_json::from_value(config_json).unwrap();
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);

    BertModel::load(vb.pp("bert"), &config).unwrap();
    if with_pooler {
        candle_nn::linear(HIDDEN_SIZE, HIDDEN_SIZE, vb.pp("bert").pp("pooler").pp("dense")).unwrap();
    }
    candle_nn::linear(HIDDEN_SIZE, LABELS.len(), vb.pp("classifier")).unwrap();

    varmap.save(dir.join("model.safetensors")).unwrap();
}

fn bert_service(path: &Path) -> InferenceService {
    let mut settings = ModelSettings::from_dir(path).with_backend(Backend::Bert);
    settings.device = DeviceSpec::Cpu;
    settings.max_length = MAX_POSITIONS;
    InferenceService::new(settings)
}

#[test]
fn test_bert_predictions_are_ranked_distribution() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), true);
    let service = bert_service(dir.path());

    let preds = service.predict("please verify your account password", 3).unwrap();
    assert_eq!(preds.len(), 3);
    assert!(preds.iter().all(|p| LABELS.contains(&p.label.as_str())));
    assert!(preds.iter().all(|p| (0.0..=1.0).contains(&p.score)));
    assert!(preds.windows(2).all(|w| w[0].score >= w[1].score));

    // All classes requested, so the scores are the full softmax.
    let total: f32 = preds.iter().map(|p| p.score).sum();
    assert!((total - 1.0).abs() < 1e-4);

    let mut labels: Vec<&str> = preds.iter().map(|p| p.label.as_str()).collect();
    labels.sort_unstable();
    assert_eq!(labels, vec!["phishing", "safe", "scam"]);
}

#[test]
fn test_bert_top_k_is_clamped() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), true);
    let service = bert_service(dir.path());

    assert_eq!(service.predict("hi team", 10).unwrap().len(), 3);
    assert_eq!(service.predict("hi team", 0).unwrap().len(), 1);

    let top_two = service.predict("hi team", 2).unwrap();
    let all = service.predict("hi team", 3).unwrap();
    assert_eq!(top_two, all[..2].to_vec());
}

#[test]
fn test_bert_truncates_long_input() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), true);
    let service = bert_service(dir.path());

    // Far more tokens than the model has position embeddings for.
    let long_text = "verify your account password ".repeat(100);
    let preds = service.predict(&long_text, 3).unwrap();
    assert_eq!(preds.len(), 3);

    let total: f32 = preds.iter().map(|p| p.score).sum();
    assert!((total - 1.0).abs() < 1e-4);
}

#[test]
fn test_bert_is_deterministic_across_calls() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), true);
    let service = bert_service(dir.path());

    let first = service.predict("verify your password", 3).unwrap();
    let second = service.predict("verify your password", 3).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bert_without_pooler_still_predicts() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), false);
    let service = bert_service(dir.path());

    let preds = service.predict("hi team", 3).unwrap();
    assert_eq!(preds.len(), 3);
    assert!(preds.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_bert_empty_text_skips_model() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), true);
    let service = bert_service(dir.path());

    let preds = service.predict("  \n\t ", 3).unwrap();
    assert_eq!(preds.len(), 1);
    assert_eq!(preds[0].label, "empty");
    assert_eq!(preds[0].score, 1.0);
    assert!(service.is_loaded());
}

#[test]
fn test_bert_missing_weights_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_tiny_bert(dir.path(), true);
    std::fs::remove_file(dir.path().join("model.safetensors")).unwrap();

    let err = bert_service(dir.path()).load_model().unwrap_err();
    assert!(err.is_not_found());
}
