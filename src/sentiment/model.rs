// Trained sentiment model and its on-disk artifact.
//
// A model is a fitted TF-IDF vectorizer plus one weight vector and bias per
// class. Classes are stored in lexicographic order, and that order breaks ties
// when two classes are equally probable.
//
// The artifact is a JSON document with a format tag and a version number.
// serde_json is built with `float_roundtrip`, so every weight reads back
// bit-for-bit and a saved model predicts exactly like the one that was saved.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::traits::{Prediction, SentimentClassifier};
use crate::error::AnalysisError;
use crate::text::{shared_normalizer, SparseVector, StopWordSet, TfIdfVectorizer, Vectorizer};

const ARTIFACT_FORMAT: &str = "reviewlens-sentiment";
const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentModel {
    vectorizer: TfIdfVectorizer,
    /// Stop-word set the training text was normalized with
    #[serde(default)]
    stop_words: StopWordSet,
    classes: Vec<String>,
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct Artifact<M> {
    format: String,
    version: u32,
    model: M,
}

/// Numerically stable softmax (shifts by the max score before exponentiating).
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; the lowest index wins ties.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

impl SentimentModel {
    pub(crate) fn from_parts(
        vectorizer: TfIdfVectorizer,
        stop_words: StopWordSet,
        classes: Vec<String>,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(classes.len(), weights.len());
        debug_assert!(weights.iter().all(|w| w.len() == vectorizer.vocabulary().len()));
        Self {
            vectorizer,
            stop_words,
            classes,
            weights,
            biases,
        }
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn stop_words(&self) -> StopWordSet {
        self.stop_words
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vectorizer.vocabulary().len()
    }

    pub fn weights(&self, class: usize) -> &[f64] {
        &self.weights[class]
    }

    pub fn bias(&self, class: usize) -> f64 {
        self.biases[class]
    }

    /// Raw linear scores `w_c · x + b_c`, one per class.
    pub fn scores(&self, x: &SparseVector) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| x.dot_dense(w) + b)
            .collect()
    }

    /// Class probabilities for an already vectorized document.
    pub fn probabilities(&self, x: &SparseVector) -> Vec<f64> {
        softmax(&self.scores(x))
    }

    /// Classify an already normalized token sequence. Never fails: a sequence
    /// with no known terms is scored from the biases alone.
    pub fn predict_tokens(&self, tokens: &[String]) -> Prediction {
        let x = self.vectorizer.transform(tokens);
        let probs = self.probabilities(&x);
        let best = argmax(&probs);
        Prediction {
            label: self.classes[best].clone(),
            confidence: probs[best],
            probabilities: self.classes.iter().cloned().zip(probs).collect(),
        }
    }

    /// The `n` terms with the largest positive weight for a class.
    pub fn top_terms(&self, class: usize, n: usize) -> Vec<(String, f64)> {
        let vocabulary = self.vectorizer.vocabulary();
        let mut weighted: Vec<(usize, f64)> = self.weights[class]
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, w)| w > 0.0)
            .collect();
        weighted.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        weighted
            .into_iter()
            .take(n)
            .filter_map(|(i, w)| vocabulary.term(i).map(|t| (t.to_string(), w)))
            .collect()
    }

    /// Write the model artifact, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create model directory {}", parent.display()))?;
        }
        let artifact = Artifact {
            format: ARTIFACT_FORMAT.to_string(),
            version: ARTIFACT_VERSION,
            model: self,
        };
        let json = serde_json::to_string(&artifact)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write model to {}", path.display()))?;
        info!(path = %path.display(), classes = self.classes.len(), "Saved sentiment model");
        Ok(())
    }

    /// Read a model artifact. A missing file is `AnalysisError::ModelNotFound`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::ModelNotFound(path.to_path_buf()).into());
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model from {}", path.display()))?;
        let model = Self::from_json(&json)?;
        info!(path = %path.display(), classes = model.classes.len(), "Loaded sentiment model");
        Ok(model)
    }

    fn from_json(json: &str) -> std::result::Result<Self, AnalysisError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| AnalysisError::Artifact(format!("not valid JSON: {e}")))?;

        let format = value.get("format").and_then(|v| v.as_str());
        if format != Some(ARTIFACT_FORMAT) {
            return Err(AnalysisError::Artifact(format!(
                "unexpected format tag {format:?}"
            )));
        }
        let version = value.get("version").and_then(|v| v.as_u64());
        if version != Some(u64::from(ARTIFACT_VERSION)) {
            return Err(AnalysisError::Artifact(format!(
                "unsupported artifact version {version:?} (expected {ARTIFACT_VERSION})"
            )));
        }

        let artifact: Artifact<SentimentModel> = serde_json::from_value(value)
            .map_err(|e| AnalysisError::Artifact(e.to_string()))?;
        let mut model = artifact.model;
        model.vectorizer.restore().map_err(AnalysisError::Artifact)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), AnalysisError> {
        let dim = self.vocabulary_size();
        if self.classes.len() < 2
            || self.weights.len() != self.classes.len()
            || self.biases.len() != self.classes.len()
        {
            return Err(AnalysisError::Artifact(format!(
                "{} classes with {} weight vectors and {} biases",
                self.classes.len(),
                self.weights.len(),
                self.biases.len()
            )));
        }
        if let Some(bad) = self.weights.iter().position(|w| w.len() != dim) {
            return Err(AnalysisError::Artifact(format!(
                "weight vector for `{}` has {} entries, vocabulary has {dim}",
                self.classes[bad],
                self.weights[bad].len()
            )));
        }
        Ok(())
    }
}

impl SentimentClassifier for SentimentModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, text: &str) -> crate::error::Result<Prediction> {
        if text.trim().is_empty() {
            return Err(AnalysisError::Input("review text is empty".to_string()));
        }
        Ok(self.predict_tokens(&shared_normalizer(self.stop_words).normalize(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1000.0, 999.0, -5.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p.iter().all(|&x| x >= 0.0));
        assert!(p[0] > p[1] && p[1] > p[2]);
    }

    #[test]
    fn test_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.25, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
    }

    #[test]
    fn test_rejects_wrong_version() {
        let json = r#"{"format":"reviewlens-sentiment","version":99,"model":{}}"#;
        let err = SentimentModel::from_json(json).unwrap_err();
        assert!(matches!(err, AnalysisError::Artifact(msg) if msg.contains("version")));
    }

    #[test]
    fn test_rejects_foreign_json() {
        let err = SentimentModel::from_json(r#"{"weights":[]}"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Artifact(_)));
    }
}
