// Data models: the review records that flow through the pipeline.
//
// These are kept apart from the CSV loader so the models and the pipeline can
// use them without depending on the csv crate.

use serde::{Deserialize, Serialize};

/// A review to analyze. `id` is the zero-based row position in its source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: usize,
    pub text: String,
    /// Any other columns of the source row, in source order, carried through
    /// to the detailed report.
    pub extra: Vec<(String, String)>,
}

impl Review {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            extra: Vec::new(),
        }
    }

    /// Build a list of reviews from plain texts, numbering them in order.
    pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Vec<Self> {
        texts
            .iter()
            .enumerate()
            .map(|(id, t)| Self::new(id, t.as_ref()))
            .collect()
    }
}

/// A review with its sentiment label, used for training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledReview {
    pub text: String,
    pub label: String,
}

impl LabeledReview {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}
