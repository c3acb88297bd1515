//! Transformer sequence classifiers loaded from a local model directory
//!
//! Supports the two layouts exported by `AutoModelForSequenceClassification`
//! for BERT-family checkpoints:
//! - `bert`: encoder, tanh pooler over `[CLS]`, linear `classifier` head
//! - `distilbert`: encoder, `pre_classifier` + ReLU over `[CLS]`, linear head
//!
//! Everything is read from disk; nothing is fetched over the network.

use crate::classifier::{candle_err, Classifier};
use crate::model_config::{ArchitectureConfig, MODEL_CONFIG_FILE, WEIGHTS_FILE};
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use candle_transformers::models::distilbert::{Config as DistilBertConfig, DistilBertModel};
use serde::de::DeserializeOwned;
use std::path::Path;
use threatscan_core::{Error, Result};
use tokenizers::{Encoding, PaddingParams, Tokenizer, TruncationParams};

/// Load the classifier matching `config.json`'s `model_type`
pub fn load_transformer(
    model_dir: &Path,
    arch: &ArchitectureConfig,
    num_labels: usize,
    max_length: usize,
    device: &Device,
) -> Result<Box<dyn Classifier>> {
    let tokenizer = load_tokenizer(model_dir, max_length)?;
    let vb = load_var_builder(model_dir, device)?;
    let name = model_dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("transformer")
        .to_string();

    match arch.model_type.as_str() {
        "bert" => {
            let config: BertConfig = parse_json_config(&model_dir.join(MODEL_CONFIG_FILE))?;
            let model = load_bert_backbone(&vb, &config)?;
            let pooler = load_pooler(&vb, config.hidden_size);
            let classifier = load_classification_head(&vb, config.hidden_size, num_labels)?;

            tracing::info!(
                "Loaded BERT classifier '{}' with {} labels (pooler: {})",
                name,
                num_labels,
                pooler.is_some()
            );

            Ok(Box::new(BertSequenceClassifier {
                name,
                tokenizer,
                model,
                pooler,
                classifier,
                device: device.clone(),
                num_labels,
            }))
        }
        "distilbert" => {
            let config_path = model_dir.join(MODEL_CONFIG_FILE);
            let raw: serde_json::Value = parse_json_config(&config_path)?;
            let hidden_size = raw
                .get("dim")
                .or_else(|| raw.get("hidden_size"))
                .and_then(|v| v.as_u64())
                .unwrap_or(768) as usize;
            let config: DistilBertConfig = parse_json_config(&config_path)?;

            let model = DistilBertModel::load(vb.pp("distilbert"), &config)
                .map_err(candle_err("Failed to load DistilBERT model"))?;
            let pre_classifier =
                candle_nn::linear(hidden_size, hidden_size, vb.pp("pre_classifier")).ok();
            let classifier = load_classification_head(&vb, hidden_size, num_labels)?;

            tracing::info!(
                "Loaded DistilBERT classifier '{}' with {} labels",
                name,
                num_labels
            );

            Ok(Box::new(DistilBertSequenceClassifier {
                name,
                tokenizer,
                model,
                pre_classifier,
                classifier,
                device: device.clone(),
                num_labels,
            }))
        }
        other => Err(Error::classifier(format!(
            "Unsupported model_type '{}' (expected bert or distilbert)",
            other
        ))),
    }
}

/// Load `tokenizer.json`, or build a WordPiece tokenizer from `vocab.txt`,
/// with truncation to `max_length` and longest-sequence padding
pub fn load_tokenizer(model_dir: &Path, max_length: usize) -> Result<Tokenizer> {
    let mut tokenizer = read_tokenizer(model_dir)?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| Error::classifier(format!("Failed to configure truncation: {}", e)))?;
    tokenizer.with_padding(Some(PaddingParams::default()));

    Ok(tokenizer)
}

fn read_tokenizer(model_dir: &Path) -> Result<Tokenizer> {
    let tokenizer_json_path = model_dir.join("tokenizer.json");
    if tokenizer_json_path.exists() {
        tracing::debug!("Loading tokenizer from tokenizer.json");
        return Tokenizer::from_file(&tokenizer_json_path)
            .map_err(|e| Error::classifier(format!("Failed to load tokenizer.json: {}", e)));
    }

    let vocab_path = model_dir.join("vocab.txt");
    if vocab_path.exists() {
        tracing::debug!("Building tokenizer from vocab.txt");

        use tokenizers::models::wordpiece::WordPiece;
        use tokenizers::normalizers::BertNormalizer;
        use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
        use tokenizers::processors::bert::BertProcessing;

        let wordpiece = WordPiece::from_file(vocab_path.to_string_lossy().as_ref())
            .unk_token("[UNK]".to_string())
            .build()
            .map_err(|e| Error::classifier(format!("Failed to build WordPiece model: {}", e)))?;

        let mut tokenizer = Tokenizer::new(wordpiece);
        tokenizer.with_normalizer(Some(BertNormalizer::default()));
        tokenizer.with_pre_tokenizer(Some(BertPreTokenizer));

        let sep = special_token(&tokenizer, "[SEP]", &vocab_path)?;
        let cls = special_token(&tokenizer, "[CLS]", &vocab_path)?;
        tokenizer.with_post_processor(Some(BertProcessing::new(sep, cls)));

        return Ok(tokenizer);
    }

    Err(Error::not_found(format!(
        "No tokenizer found in {} (tried tokenizer.json, vocab.txt)",
        model_dir.display()
    )))
}

/// `(token, id)` for a special token as assigned by the vocabulary
fn special_token(tokenizer: &Tokenizer, token: &str, vocab_path: &Path) -> Result<(String, u32)> {
    tokenizer
        .token_to_id(token)
        .map(|id| (token.to_string(), id))
        .ok_or_else(|| {
            Error::config(format!(
                "{} is missing from {}",
                token,
                vocab_path.display()
            ))
        })
}

fn parse_json_config<T: DeserializeOwned>(config_path: &Path) -> Result<T> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        Error::classifier(format!(
            "Failed to read config {}: {}",
            config_path.display(),
            e
        ))
    })?;

    serde_json::from_str(&config_str).map_err(|e| {
        Error::classifier(format!(
            "Failed to parse config {}: {}",
            config_path.display(),
            e
        ))
    })
}

fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let weights_path = model_dir.join(WEIGHTS_FILE);
    if !weights_path.exists() {
        return Err(Error::not_found(format!(
            "{} not found in {}",
            WEIGHTS_FILE,
            model_dir.display()
        )));
    }

    // SAFETY: the weights file is memory-mapped read-only and must not be
    // modified while the process is running.
    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)
            .map_err(candle_err("Failed to load weights"))?
    };

    Ok(vb)
}

fn load_bert_backbone(vb: &VarBuilder, config: &BertConfig) -> Result<BertModel> {
    let mut errors = Vec::new();

    for prefix in ["bert", ""] {
        let vb_prefix = if prefix.is_empty() {
            vb.clone()
        } else {
            vb.pp(prefix)
        };

        match BertModel::load(vb_prefix, config) {
            Ok(model) => {
                tracing::debug!(
                    "Loaded BERT backbone from '{}'",
                    if prefix.is_empty() { "<root>" } else { prefix }
                );
                return Ok(model);
            }
            Err(e) => errors.push(format!(
                "{}: {}",
                if prefix.is_empty() { "<root>" } else { prefix },
                e
            )),
        }
    }

    Err(Error::classifier(format!(
        "Failed to load BERT backbone with tried prefixes [{}]",
        errors.join(" | ")
    )))
}

fn load_pooler(vb: &VarBuilder, hidden_size: usize) -> Option<Linear> {
    let pooler = candle_nn::linear(hidden_size, hidden_size, vb.pp("bert").pp("pooler").pp("dense"))
        .or_else(|_| candle_nn::linear(hidden_size, hidden_size, vb.pp("pooler").pp("dense")));

    match pooler {
        Ok(pooler) => Some(pooler),
        Err(e) => {
            tracing::warn!(
                "No pooler weights found, classifying the raw [CLS] hidden state: {}",
                e
            );
            None
        }
    }
}

fn load_classification_head(vb: &VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Linear> {
    candle_nn::linear(hidden_size, num_labels, vb.pp("classifier")).map_err(|e| {
        Error::classifier(format!(
            "Classification head (hidden_size={}, num_labels={}) not found in weights: {}",
            hidden_size, num_labels, e
        ))
    })
}

fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Encoding> {
    tokenizer
        .encode(text, true)
        .map_err(|e| Error::classifier(format!("Tokenization failed: {}", e)))
}

fn batch_tensor<T: candle_core::WithDType>(values: &[T], device: &Device) -> Result<Tensor> {
    Tensor::new(values, device)
        .and_then(|t| t.unsqueeze(0))
        .map_err(candle_err("Failed to create input tensor"))
}

/// `[CLS]` hidden state as a `(1, hidden)` tensor
fn cls_embedding(hidden_states: &Tensor) -> Result<Tensor> {
    hidden_states
        .i((.., 0))
        .map_err(candle_err("Failed to get CLS token"))
}

struct BertSequenceClassifier {
    name: String,
    tokenizer: Tokenizer,
    model: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
    device: Device,
    num_labels: usize,
}

impl Classifier for BertSequenceClassifier {
    fn logits(&self, text: &str) -> Result<Tensor> {
        let encoding = encode(&self.tokenizer, text)?;

        let input_ids = batch_tensor(encoding.get_ids(), &self.device)?;
        let token_type_ids = batch_tensor(encoding.get_type_ids(), &self.device)?;
        let attention_mask = batch_tensor(encoding.get_attention_mask(), &self.device)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(candle_err("Model forward pass failed"))?;

        let cls = cls_embedding(&hidden_states)?;
        let pooled = match &self.pooler {
            Some(pooler) => pooler
                .forward(&cls)
                .and_then(|t| t.tanh())
                .map_err(candle_err("Pooler failed"))?,
            None => cls,
        };

        self.classifier
            .forward(&pooled)
            .map_err(candle_err("Classification head failed"))
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

struct DistilBertSequenceClassifier {
    name: String,
    tokenizer: Tokenizer,
    model: DistilBertModel,
    pre_classifier: Option<Linear>,
    classifier: Linear,
    device: Device,
    num_labels: usize,
}

impl Classifier for DistilBertSequenceClassifier {
    fn logits(&self, text: &str) -> Result<Tensor> {
        let encoding = encode(&self.tokenizer, text)?;

        let input_ids = batch_tensor(encoding.get_ids(), &self.device)?;

        // DistilBERT masks positions where the mask is non-zero.
        let inverted_mask: Vec<u8> = encoding
            .get_attention_mask()
            .iter()
            .map(|&x| u8::from(x == 0))
            .collect();
        let attention_mask = batch_tensor(inverted_mask.as_slice(), &self.device)?;

        let hidden_states = self
            .model
            .forward(&input_ids, &attention_mask)
            .map_err(candle_err("Model forward pass failed"))?;

        let cls = cls_embedding(&hidden_states)?;
        let pooled = match &self.pre_classifier {
            Some(pre_classifier) => pre_classifier
                .forward(&cls)
                .and_then(|t| t.relu())
                .map_err(candle_err("Pre-classifier failed"))?,
            None => cls,
        };

        self.classifier
            .forward(&pooled)
            .map_err(candle_err("Classification head failed"))
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
