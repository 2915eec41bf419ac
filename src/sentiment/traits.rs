// Sentiment classifier trait: the seam between the batch pipeline and the
// model that produces labels.
//
// The trained logistic regression model is the only production implementation,
// but the pipeline only needs this interface, which keeps it testable with a
// fixed classifier.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The outcome of classifying one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// The most probable label
    pub label: String,
    /// Probability of `label` (0.0 to 1.0)
    pub confidence: f64,
    /// Full distribution, in the classifier's class order
    pub probabilities: Vec<(String, f64)>,
}

pub trait SentimentClassifier {
    /// Class labels in the order used for probabilities and tie-breaking.
    fn classes(&self) -> &[String];

    /// Classify a single text. Blank text is an input error.
    fn predict(&self, text: &str) -> Result<Prediction>;

    /// Classify several texts, returning results in the same order.
    fn predict_batch(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        texts.iter().map(|t| self.predict(t)).collect()
    }
}
