// Multinomial logistic regression training.
//
// Full-batch gradient descent on the L2-regularized cross-entropy
//
//   loss = mean_i(-ln p(y_i | x_i)) + (l2 / 2) * sum_c ||w_c||^2
//
// with p = softmax(W x + b). Biases are not regularized. The problem is
// convex, so with a step no larger than 1/L (L bounds the curvature of the
// loss) every step decreases the loss and the iteration converges to the
// unique optimum. By default the step is exactly 1/L, derived from the data:
// the softmax cross-entropy Hessian is bounded by 1/2 * ||[x, 1]||^2 per
// example, plus l2 from the penalty.

use std::collections::BTreeSet;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::metrics::{stratified_split, ClassificationReport};
use super::model::{softmax, SentimentModel};
use crate::data::models::LabeledReview;
use crate::error::{AnalysisError, ConvergenceWarning, Result};
use crate::text::{shared_normalizer, SparseVector, StopWordSet, TfIdfVectorizer, Vectorizer};

/// Optimizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    /// Gradient step; `None` derives a safe step from the data.
    pub learning_rate: Option<f64>,
    /// L2 penalty on the weights.
    pub l2: f64,
    /// Stop once the loss changes by less than this between iterations.
    pub tolerance: f64,
    pub max_iter: usize,
    /// Stop-word set used to normalize training text; saved with the model.
    pub stop_words: StopWordSet,
    /// Show a progress bar while optimizing (CLI use).
    pub show_progress: bool,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            learning_rate: None,
            l2: 1e-3,
            tolerance: 1e-6,
            max_iter: 1000,
            stop_words: StopWordSet::Classic,
            show_progress: false,
        }
    }
}

/// Held-out split settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitParams {
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// A fitted model plus how the optimization went.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: SentimentModel,
    pub iterations: usize,
    pub final_loss: f64,
    /// Set when the iteration cap was hit before the tolerance was met.
    pub warning: Option<ConvergenceWarning>,
}

/// Final model trained on all data, plus the held-out diagnostics.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub outcome: TrainingOutcome,
    /// `None` when no row could be held out (every class has a single example).
    pub evaluation: Option<ClassificationReport>,
    pub train_size: usize,
    pub test_size: usize,
}

/// Train a model on every given review.
pub fn train(reviews: &[LabeledReview], params: &TrainingParams) -> Result<TrainingOutcome> {
    let classes = validate(reviews)?;
    let normalizer = shared_normalizer(params.stop_words);
    let tokens: Vec<Vec<String>> = reviews.iter().map(|r| normalizer.normalize(&r.text)).collect();

    let (vectorizer, vectors) = TfIdfVectorizer::fit_transform(&tokens);
    let targets: Vec<usize> = reviews
        .iter()
        .map(|r| classes.binary_search(&r.label).unwrap_or_default())
        .collect();

    let fit = fit_softmax_regression(
        &vectors,
        &targets,
        classes.len(),
        vectorizer.vocabulary().len(),
        params,
    );

    if let Some(warning) = &fit.warning {
        warn!(%warning, "Sentiment model training stopped at the iteration cap");
    }
    info!(
        documents = reviews.len(),
        classes = classes.len(),
        vocabulary = vectorizer.vocabulary().len(),
        iterations = fit.iterations,
        loss = fit.loss,
        "Trained sentiment model"
    );

    Ok(TrainingOutcome {
        model: SentimentModel::from_parts(
            vectorizer,
            params.stop_words,
            classes,
            fit.weights,
            fit.biases,
        ),
        iterations: fit.iterations,
        final_loss: fit.loss,
        warning: fit.warning,
    })
}

/// Evaluate on a stratified held-out split, then train the final model on
/// the full dataset.
pub fn train_with_evaluation(
    reviews: &[LabeledReview],
    params: &TrainingParams,
    split: &SplitParams,
) -> Result<TrainingReport> {
    let classes = validate(reviews)?;
    if !(0.0..1.0).contains(&split.test_size) {
        return Err(AnalysisError::Input(format!(
            "test size must be in [0, 1), got {}",
            split.test_size
        )));
    }

    let labels: Vec<String> = reviews.iter().map(|r| r.label.clone()).collect();
    let (train_idx, test_idx) = stratified_split(&labels, split.test_size, split.seed);

    let evaluation = if test_idx.is_empty() {
        debug!("No rows could be held out; skipping evaluation");
        None
    } else {
        let train_part: Vec<LabeledReview> = train_idx.iter().map(|&i| reviews[i].clone()).collect();
        let diagnostic = train(&train_part, params)?;
        let normalizer = shared_normalizer(params.stop_words);
        let y_true: Vec<String> = test_idx.iter().map(|&i| labels[i].clone()).collect();
        let y_pred: Vec<String> = test_idx
            .iter()
            .map(|&i| {
                diagnostic
                    .model
                    .predict_tokens(&normalizer.normalize(&reviews[i].text))
                    .label
            })
            .collect();
        Some(ClassificationReport::compute(&classes, &y_true, &y_pred))
    };

    let outcome = train(reviews, params)?;
    Ok(TrainingReport {
        outcome,
        evaluation,
        train_size: train_idx.len(),
        test_size: test_idx.len(),
    })
}

/// Check the dataset can produce a classifier and return its sorted classes.
fn validate(reviews: &[LabeledReview]) -> Result<Vec<String>> {
    if reviews.is_empty() {
        return Err(AnalysisError::Input("no training reviews given".to_string()));
    }
    if let Some(pos) = reviews.iter().position(|r| r.label.trim().is_empty()) {
        return Err(AnalysisError::Data(format!("row {pos} has an empty label")));
    }
    let classes: BTreeSet<&str> = reviews.iter().map(|r| r.label.as_str()).collect();
    if classes.len() < 2 {
        return Err(AnalysisError::Data(format!(
            "training needs at least 2 distinct labels, found {}",
            classes.len()
        )));
    }
    Ok(classes.into_iter().map(str::to_string).collect())
}

struct SoftmaxFit {
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    iterations: usize,
    loss: f64,
    warning: Option<ConvergenceWarning>,
}

fn fit_softmax_regression(
    xs: &[SparseVector],
    ys: &[usize],
    n_classes: usize,
    dim: usize,
    params: &TrainingParams,
) -> SoftmaxFit {
    let n = xs.len() as f64;
    let mut weights = vec![vec![0.0; dim]; n_classes];
    let mut biases = vec![0.0; n_classes];

    let step = params.learning_rate.unwrap_or_else(|| {
        let max_sq_norm = xs.iter().map(|x| x.squared_norm() + 1.0).fold(0.0, f64::max);
        1.0 / (0.5 * max_sq_norm + params.l2)
    });

    let progress = if params.show_progress {
        let pb = ProgressBar::new(params.max_iter as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Training [{bar:40}] {pos}/{len} loss {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let mut previous_loss = f64::INFINITY;
    let mut loss = f64::INFINITY;
    let mut last_change = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    for iter in 1..=params.max_iter {
        iterations = iter;
        let mut grad_w = vec![vec![0.0; dim]; n_classes];
        let mut grad_b = vec![0.0; n_classes];
        let mut data_loss = 0.0;

        for (x, &y) in xs.iter().zip(ys) {
            let scores: Vec<f64> = weights
                .iter()
                .zip(&biases)
                .map(|(w, b)| x.dot_dense(w) + b)
                .collect();
            let probs = softmax(&scores);
            data_loss -= probs[y].max(f64::MIN_POSITIVE).ln();

            for (c, p) in probs.iter().enumerate() {
                let g = p - if c == y { 1.0 } else { 0.0 };
                grad_b[c] += g;
                for (j, v) in x.iter() {
                    grad_w[c][j] += g * v;
                }
            }
        }

        loss = data_loss / n + l2_penalty(&weights, params.l2);
        last_change = (previous_loss - loss).abs();

        if let Some(pb) = &progress {
            pb.set_position(iter as u64);
            pb.set_message(format!("{loss:.5}"));
        }

        if last_change < params.tolerance {
            converged = true;
            break;
        }
        previous_loss = loss;

        for c in 0..n_classes {
            biases[c] -= step * grad_b[c] / n;
            for j in 0..dim {
                weights[c][j] -= step * (grad_w[c][j] / n + params.l2 * weights[c][j]);
            }
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    // The cap path updated the parameters after its last loss evaluation.
    if !converged && iterations > 0 {
        loss = objective(xs, ys, &weights, &biases, params.l2);
    }

    let warning = (!converged).then(|| ConvergenceWarning {
        algorithm: "logistic regression",
        iterations,
        last_change,
    });

    SoftmaxFit {
        weights,
        biases,
        iterations,
        loss,
        warning,
    }
}

/// Mean cross-entropy plus the L2 penalty, at the given parameters.
fn objective(
    xs: &[SparseVector],
    ys: &[usize],
    weights: &[Vec<f64>],
    biases: &[f64],
    l2: f64,
) -> f64 {
    let data_loss: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, &y)| {
            let scores: Vec<f64> = weights
                .iter()
                .zip(biases)
                .map(|(w, b)| x.dot_dense(w) + b)
                .collect();
            -softmax(&scores)[y].max(f64::MIN_POSITIVE).ln()
        })
        .sum();
    data_loss / xs.len() as f64 + l2_penalty(weights, l2)
}

fn l2_penalty(weights: &[Vec<f64>], l2: f64) -> f64 {
    weights.iter().flat_map(|w| w.iter()).map(|v| v * v).sum::<f64>() * l2 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::traits::SentimentClassifier;
    use crate::text::normalize;

    fn reviews(rows: &[(&str, &str)]) -> Vec<LabeledReview> {
        rows.iter().map(|(t, l)| LabeledReview::new(*t, *l)).collect()
    }

    #[test]
    fn test_single_class_is_data_error() {
        let data = reviews(&[("good", "positive"), ("great", "positive")]);
        let err = train(&data, &TrainingParams::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Data(_)));
    }

    #[test]
    fn test_empty_dataset_is_input_error() {
        let err = train(&[], &TrainingParams::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
    }

    #[test]
    fn test_classes_are_sorted() {
        let data = reviews(&[("awful", "negative"), ("lovely", "positive"), ("meh", "neutral")]);
        let outcome = train(&data, &TrainingParams::default()).unwrap();
        assert_eq!(outcome.model.classes(), &["negative", "neutral", "positive"]);
    }

    #[test]
    fn test_loss_decreases_from_uniform() {
        let data = reviews(&[("love it", "positive"), ("hate it", "negative")]);
        let outcome = train(&data, &TrainingParams::default()).unwrap();
        // Uniform prediction over two classes has loss ln 2.
        assert!(outcome.final_loss < 2.0f64.ln());
    }

    #[test]
    fn test_iteration_cap_yields_warning_not_error() {
        let data = reviews(&[("love it", "positive"), ("hate it", "negative")]);
        let params = TrainingParams {
            max_iter: 3,
            tolerance: 0.0,
            ..TrainingParams::default()
        };
        let outcome = train(&data, &params).unwrap();
        assert_eq!(outcome.iterations, 3);
        let warning = outcome.warning.expect("cap should produce a warning");
        assert_eq!(warning.iterations, 3);
        assert_eq!(outcome.model.predict("love").unwrap().label, "positive");
    }

    #[test]
    fn test_capped_loss_matches_returned_model() {
        let rows = [
            ("love this kettle", "positive"),
            ("great lamp", "positive"),
            ("hate the smell", "negative"),
            ("broken handle", "negative"),
        ];
        let params = TrainingParams {
            max_iter: 3,
            tolerance: 0.0,
            ..TrainingParams::default()
        };
        let outcome = train(&reviews(&rows), &params).unwrap();
        let model = &outcome.model;

        let data_loss: f64 = rows
            .iter()
            .map(|(text, label)| {
                let x = model.vectorizer().transform(&normalize(text));
                let class = model.classes().iter().position(|c| c == label).unwrap();
                -model.probabilities(&x)[class].ln()
            })
            .sum::<f64>()
            / rows.len() as f64;
        let penalty: f64 = (0..model.classes().len())
            .flat_map(|c| model.weights(c).iter())
            .map(|w| w * w)
            .sum::<f64>()
            * params.l2
            / 2.0;

        let expected = data_loss + penalty;
        assert!(
            (outcome.final_loss - expected).abs() < 1e-12,
            "reported {} but the returned model scores {}",
            outcome.final_loss,
            expected
        );
    }
}
