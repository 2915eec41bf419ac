// Held-out evaluation: stratified train/test split and a per-class
// precision / recall / F1 report.

use std::collections::BTreeMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Split row indices into (train, test), keeping each label's share roughly
/// equal in both parts.
///
/// Each label contributes `round(count * test_size)` rows to the test part,
/// clamped so that a label with at least two rows keeps one on each side and
/// a label with a single row stays in training. A `test_size` of zero holds
/// nothing out. Indices come back sorted.
pub fn stratified_split(labels: &[String], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_label.entry(label.as_str()).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (_, mut rows) in by_label {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let n_test = if n < 2 || test_size <= 0.0 {
            0
        } else {
            ((n as f64 * test_size).round() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    /// Compare true and predicted labels over `classes`. Undefined ratios
    /// (no predictions or no support for a class) count as 0.
    pub fn compute(classes: &[String], y_true: &[String], y_pred: &[String]) -> Self {
        let total = y_true.len();
        let mut per_class = Vec::with_capacity(classes.len());

        for class in classes {
            let tp = y_true
                .iter()
                .zip(y_pred)
                .filter(|(t, p)| *t == class && *p == class)
                .count();
            let predicted = y_pred.iter().filter(|p| *p == class).count();
            let support = y_true.iter().filter(|t| *t == class).count();

            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            per_class.push(ClassMetrics {
                label: class.clone(),
                precision,
                recall,
                f1,
                support,
            });
        }

        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
        let n_classes = per_class.len().max(1) as f64;
        let macro_avg = ClassMetrics {
            label: "macro avg".to_string(),
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n_classes,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n_classes,
            f1: per_class.iter().map(|m| m.f1).sum::<f64>() / n_classes,
            support: total,
        };
        let weight = |f: fn(&ClassMetrics) -> f64| {
            if total == 0 {
                0.0
            } else {
                per_class.iter().map(|m| f(m) * m.support as f64).sum::<f64>() / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            label: "weighted avg".to_string(),
            precision: weight(|m| m.precision),
            recall: weight(|m| m.recall),
            f1: weight(|m| m.f1),
            support: total,
        };

        Self {
            classes: per_class,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|m| m.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.classes {
            write_row(f, m, width)?;
        }
        writeln!(f)?;
        let support = self.macro_avg.support;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>9}  {:>9.2}  {:>9}",
            "accuracy", "", "", self.accuracy, support
        )?;
        write_row(f, &self.macro_avg, width)?;
        write_row(f, &self.weighted_avg, width)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, m: &ClassMetrics, width: usize) -> fmt::Result {
    writeln!(
        f,
        "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}",
        m.label, m.precision, m.recall, m.f1, m.support
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_is_stratified_and_complete() {
        let y = labels(&["pos"; 10])
            .into_iter()
            .chain(labels(&["neg"; 5]))
            .chain(labels(&["neu"]))
            .collect::<Vec<_>>();
        let (train, test) = stratified_split(&y, 0.2, 42);

        assert_eq!(train.len() + test.len(), y.len());
        let test_pos = test.iter().filter(|&&i| y[i] == "pos").count();
        let test_neg = test.iter().filter(|&&i| y[i] == "neg").count();
        let test_neu = test.iter().filter(|&&i| y[i] == "neu").count();
        assert_eq!((test_pos, test_neg, test_neu), (2, 1, 0));
    }

    #[test]
    fn test_split_is_reproducible() {
        let y = labels(&["a", "b", "a", "b", "a", "b", "a", "b"]);
        assert_eq!(stratified_split(&y, 0.25, 7), stratified_split(&y, 0.25, 7));
    }

    #[test]
    fn test_report_numbers() {
        let classes = labels(&["negative", "positive"]);
        let truth = labels(&["positive", "positive", "negative", "negative"]);
        let pred = labels(&["positive", "negative", "negative", "negative"]);
        let report = ClassificationReport::compute(&classes, &truth, &pred);

        let neg = &report.classes[0];
        assert!((neg.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((neg.recall - 1.0).abs() < 1e-12);
        let pos = &report.classes[1];
        assert!((pos.precision - 1.0).abs() < 1e-12);
        assert!((pos.recall - 0.5).abs() < 1e-12);
        assert!((report.accuracy - 0.75).abs() < 1e-12);
        assert_eq!(report.macro_avg.support, 4);
    }

    #[test]
    fn test_report_renders_every_class() {
        let classes = labels(&["negative", "positive"]);
        let y = labels(&["positive", "negative"]);
        let text = ClassificationReport::compute(&classes, &y, &y).to_string();
        assert!(text.contains("negative"));
        assert!(text.contains("weighted avg"));
        assert!(text.contains("accuracy"));
    }
}
