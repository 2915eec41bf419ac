// Batch analysis pipeline: reviews -> predictions, keywords, topics.
//
// One run over a dataset:
// 1. Classify every review (a review that fails, e.g. blank text, is set aside
//    and counted instead of aborting the batch)
// 2. Rank keywords over the remaining reviews
// 3. Cluster the remaining reviews into topics
// 4. Summarize sentiment counts per class
//
// The result is an AnalysisSession value. Nothing is stored globally: the
// caller keeps the session for as long as it wants to report on it and
// replaces it with the next run's session.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::data::models::Review;
use crate::error::{AnalysisError, ConvergenceWarning, Result};
use crate::sentiment::traits::SentimentClassifier;
use crate::text::{shared_normalizer, StopWordSet};
use crate::topics::kmeans::{cluster_tokens, KMeans};
use crate::topics::keywords::rank_tokens;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub top_n_keywords: usize,
    pub n_topics: usize,
    pub seed: u64,
    /// Stop-word set for keyword ranking and clustering
    pub stop_words: StopWordSet,
    pub show_progress: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            top_n_keywords: 10,
            n_topics: 3,
            seed: 42,
            stop_words: StopWordSet::Classic,
            show_progress: false,
        }
    }
}

/// One analyzed review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRow {
    pub id: usize,
    pub text: String,
    pub extra: Vec<(String, String)>,
    pub label: String,
    pub confidence: f64,
    pub topic: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassCount {
    pub label: String,
    pub count: usize,
    /// Share of analyzed reviews, 0 to 100, rounded to two decimals
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub total: usize,
    /// Every class the classifier knows, in its class order
    pub classes: Vec<ClassCount>,
}

impl SentimentSummary {
    pub fn from_labels(classes: &[String], labels: &[&str]) -> Self {
        let total = labels.len();
        let classes = classes
            .iter()
            .map(|class| {
                let count = labels.iter().filter(|l| **l == class.as_str()).count();
                let percentage = if total == 0 {
                    0.0
                } else {
                    (10_000.0 * count as f64 / total as f64).round() / 100.0
                };
                ClassCount {
                    label: class.clone(),
                    count,
                    percentage,
                }
            })
            .collect();
        Self { total, classes }
    }

    pub fn count(&self, label: &str) -> usize {
        self.classes
            .iter()
            .find(|c| c.label == label)
            .map_or(0, |c| c.count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicGroup {
    pub id: usize,
    /// The heaviest centroid terms joined with " / "
    pub label: String,
    /// Positions in `AnalysisSession::rows`, in dataset order
    pub rows: Vec<usize>,
}

/// A review left out of the batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedReview {
    pub id: usize,
    pub reason: String,
}

/// Everything one batch run produced, as plain data for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSession {
    pub rows: Vec<ReviewRow>,
    pub summary: SentimentSummary,
    pub keywords: Vec<(String, usize)>,
    pub topics: Vec<TopicGroup>,
    pub excluded: Vec<ExcludedReview>,
    #[serde(skip)]
    pub warnings: Vec<ConvergenceWarning>,
}

impl AnalysisSession {
    /// Texts of a topic's reviews, in dataset order.
    pub fn topic_texts(&self, topic: usize) -> Vec<&str> {
        self.topics
            .get(topic)
            .map(|group| {
                group
                    .rows
                    .iter()
                    .map(|&r| self.rows[r].text.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Run the full analysis over a dataset.
pub fn analyze(
    classifier: &dyn SentimentClassifier,
    reviews: &[Review],
    params: &AnalysisParams,
) -> Result<AnalysisSession> {
    if params.n_topics == 0 {
        return Err(AnalysisError::Input("number of topics must be at least 1".to_string()));
    }
    if reviews.is_empty() {
        return Err(AnalysisError::Input("no reviews to analyze".to_string()));
    }

    let progress = params.show_progress.then(|| {
        let pb = ProgressBar::new(reviews.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Classifying [{bar:40}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    });

    let mut included = Vec::with_capacity(reviews.len());
    let mut excluded = Vec::new();
    for review in reviews {
        match classifier.predict(&review.text) {
            Ok(prediction) => included.push((review, prediction)),
            Err(e) => {
                warn!(id = review.id, error = %e, "Excluding review from batch");
                excluded.push(ExcludedReview {
                    id: review.id,
                    reason: e.to_string(),
                });
            }
        }
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if included.is_empty() {
        return Err(AnalysisError::Input(format!(
            "all {} reviews failed to analyze",
            reviews.len()
        )));
    }

    let normalizer = shared_normalizer(params.stop_words);
    let corpus: Vec<Vec<String>> = included
        .iter()
        .map(|(review, _)| normalizer.normalize(&review.text))
        .collect();

    let keywords = rank_tokens(&corpus, params.top_n_keywords);
    let topics = cluster_tokens(&corpus, &KMeans::new(params.n_topics).with_seed(params.seed))?;

    let mut warnings = Vec::new();
    if let Some(w) = &topics.clustering.warning {
        warnings.push(w.clone());
    }

    let rows: Vec<ReviewRow> = included
        .into_iter()
        .zip(&topics.clustering.assignments)
        .map(|((review, prediction), &topic)| ReviewRow {
            id: review.id,
            text: review.text.clone(),
            extra: review.extra.clone(),
            label: prediction.label,
            confidence: prediction.confidence,
            topic,
        })
        .collect();

    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    let summary = SentimentSummary::from_labels(classifier.classes(), &labels);

    let topic_groups = topics
        .clustering
        .groups()
        .into_iter()
        .enumerate()
        .map(|(id, rows)| TopicGroup {
            id,
            label: topics.label(id),
            rows,
        })
        .collect();

    info!(
        analyzed = rows.len(),
        excluded = excluded.len(),
        keywords = keywords.len(),
        topics = params.n_topics,
        "Batch analysis complete"
    );

    Ok(AnalysisSession {
        rows,
        summary,
        keywords,
        topics: topic_groups,
        excluded,
        warnings,
    })
}
