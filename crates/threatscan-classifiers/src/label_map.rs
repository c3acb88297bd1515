//! Class index to label lookup loaded from `label_map.json`

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use threatscan_core::{Error, Result};

/// Largest class index accepted from a label map file
pub const MAX_CLASS_INDEX: usize = 65_535;

/// Mapping from stringified class index to label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    entries: BTreeMap<String, String>,
}

impl LabelMap {
    /// Build from `(index, label)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        }
    }

    /// Parse the JSON object form. Keys and values are normalized to strings
    /// so both `{"0": "safe"}` and `{"0": 0}` style files are accepted.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let object = value.as_object().ok_or_else(|| {
            Error::config("label map must be a JSON object of index -> label")
        })?;

        let mut entries = BTreeMap::new();
        for (key, value) in object {
            let key = key.trim();
            if let Ok(index) = key.parse::<u64>() {
                if index > MAX_CLASS_INDEX as u64 {
                    return Err(Error::config(format!(
                        "label map index {} exceeds the maximum of {}",
                        key, MAX_CLASS_INDEX
                    )));
                }
            }
            entries.insert(key.to_string(), stringify(value));
        }

        Ok(Self { entries })
    }

    /// Read and parse a label map file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Label for a class index, or the synthesized `label_<index>` placeholder
    pub fn label_for(&self, index: usize) -> String {
        self.entries
            .get(&index.to_string())
            .cloned()
            .unwrap_or_else(|| format!("label_{}", index))
    }

    /// Reverse lookup of the index assigned to a label
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(_, v)| v.as_str() == label)
            .and_then(|(k, _)| k.parse().ok())
    }

    /// Highest numeric index plus one, i.e. the class count the map covers
    pub fn class_count(&self) -> usize {
        self.entries
            .keys()
            .filter_map(|k| k.parse::<usize>().ok())
            .max()
            .and_then(|max| max.checked_add(1))
            .unwrap_or(0)
    }

    /// All labels in index order
    pub fn labels(&self) -> Vec<String> {
        (0..self.class_count()).map(|i| self.label_for(i)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
