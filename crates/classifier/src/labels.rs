use crate::error::{ClassifierError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Label returned for any index the class map does not know.
pub const UNKNOWN_DISEASE: &str = "Unknown Disease";

/// Mapping from model output index to disease label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassIndexMap {
    labels: HashMap<usize, String>,
}

impl ClassIndexMap {
    /// Read and validate a class index file.
    ///
    /// The file is a JSON object such as `{"0": "Apple___Apple_scab", "1": "Apple___healthy"}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ClassifierError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let map = Self::from_json(&raw).map_err(|reason| ClassifierError::LabelMap {
            path: path.to_path_buf(),
            reason,
        })?;

        tracing::info!(
            path = %path.display(),
            classes = map.len(),
            "Loaded class index map"
        );

        Ok(map)
    }

    /// Parse the class index JSON. Errors carry a human readable reason.
    pub fn from_json(raw: &str) -> std::result::Result<Self, String> {
        let entries: BTreeMap<String, String> =
            serde_json::from_str(raw).map_err(|e| e.to_string())?;

        if entries.is_empty() {
            return Err("no classes defined".to_string());
        }

        let mut labels = HashMap::with_capacity(entries.len());
        for (key, label) in entries {
            let index: usize = key
                .trim()
                .parse()
                .map_err(|_| format!("key {key:?} is not a non-negative integer"))?;

            if labels.insert(index, label).is_some() {
                return Err(format!("index {index} is defined more than once"));
            }
        }

        let map = Self { labels };

        let missing = map.missing_indices();
        if !missing.is_empty() {
            tracing::warn!(
                missing = ?missing,
                "Class index map has gaps, these indices resolve to {UNKNOWN_DISEASE:?}"
            );
        }

        Ok(map)
    }

    /// Label for `index`, or [`UNKNOWN_DISEASE`] when the index is not mapped.
    pub fn lookup(&self, index: i64) -> &str {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.labels.get(&i))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DISEASE)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indices in `0..=max` that have no label.
    fn missing_indices(&self) -> Vec<usize> {
        let max = self.labels.keys().copied().max().unwrap_or(0);
        (0..=max).filter(|i| !self.labels.contains_key(i)).collect()
    }
}

impl FromIterator<(usize, String)> for ClassIndexMap {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}
