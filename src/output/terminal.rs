// Colored terminal output for predictions, batch summaries and statistics.
//
// main.rs and the interactive menu delegate all formatting here.

use colored::Colorize;

use crate::pipeline::batch::AnalysisSession;
use crate::sentiment::metrics::ClassificationReport;
use crate::sentiment::train::TrainingReport;
use crate::sentiment::traits::{Prediction, SentimentClassifier};

/// Display a single review's prediction with its full distribution.
pub fn display_prediction(prediction: &Prediction) {
    println!(
        "\nSentiment: {}",
        colorize_label(&prediction.label).bold()
    );
    println!("Confidence: {:.2}%", prediction.confidence * 100.0);

    for (label, p) in &prediction.probabilities {
        let filled = (p * 20.0).round() as usize;
        let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(20 - filled.min(20)));
        println!("  {:<12} {} {:.3}", label, bar.dimmed(), p);
    }
}

/// Display the outcome of a training run.
pub fn display_training_report(report: &TrainingReport) {
    let outcome = &report.outcome;
    println!("\n{}", "=== Sentiment Model Training ===".bold());
    println!(
        "  Held-out split: {} train / {} test",
        report.train_size, report.test_size
    );
    match &report.evaluation {
        Some(evaluation) => display_classification_report(evaluation),
        None => println!(
            "  {}",
            "Not enough examples per class to hold any out; evaluation skipped.".yellow()
        ),
    }

    println!(
        "  Final model: {} classes, {} terms, {} iterations (loss {:.4})",
        outcome.model.classes().len().to_string().bold(),
        outcome.model.vocabulary_size(),
        outcome.iterations,
        outcome.final_loss
    );
    if let Some(warning) = &outcome.warning {
        println!("  {} {}", "Warning:".yellow(), warning);
    }
}

/// Print a classification report in the usual precision/recall/F1 layout.
pub fn display_classification_report(report: &ClassificationReport) {
    println!("\n{}", "Sentiment model report:".bold());
    println!();
    for line in report.to_string().lines() {
        println!("  {line}");
    }
    println!();
}

/// Short summary printed right after a batch run.
pub fn display_batch_summary(session: &AnalysisSession) {
    println!("\n{}", "Batch analysis complete.".bold());
    println!("Total reviews: {}", session.summary.total);

    let counts: Vec<String> = session
        .summary
        .classes
        .iter()
        .map(|c| format!("{}: {}", colorize_label(&c.label), c.count))
        .collect();
    println!("{}", counts.join(" | "));

    if !session.excluded.is_empty() {
        println!(
            "{} {} reviews excluded (blank or unreadable text)",
            "Note:".yellow(),
            session.excluded.len()
        );
    }
    for warning in &session.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }
}

/// Detailed statistics for the last batch: sentiment shares, keywords and the
/// first `samples` reviews of every topic.
pub fn display_statistics(session: &AnalysisSession, samples: usize) {
    println!("\n{}", "=== Sentiment Statistics ===".bold());
    println!("  Total reviews: {}", session.summary.total);
    for class in &session.summary.classes {
        println!(
            "  {:<12} {:>5}  ({:.2}%)",
            colorize_label(&class.label),
            class.count,
            class.percentage
        );
    }

    display_keywords(&session.keywords);

    println!(
        "\n{}",
        format!("=== Topic Clusters (first {samples} reviews each) ===").bold()
    );
    for topic in &session.topics {
        println!(
            "\n  Topic {}: {} ({} reviews)",
            topic.id,
            topic.label.bold(),
            topic.rows.len()
        );
        for text in session.topic_texts(topic.id).into_iter().take(samples) {
            println!("    - {}", super::preview(text, 100).dimmed());
        }
    }
}

/// Display a keyword ranking.
pub fn display_keywords(keywords: &[(String, usize)]) {
    println!("\n{}", "=== Top Keywords ===".bold());
    if keywords.is_empty() {
        println!("  (none)");
        return;
    }
    for (i, (term, freq)) in keywords.iter().enumerate() {
        println!("  {:>3}. {:<30} {}", i + 1, term, freq);
    }
}

/// Colorize a sentiment label; unknown labels are left plain.
fn colorize_label(label: &str) -> colored::ColoredString {
    match label {
        "positive" => label.green(),
        "negative" => label.red(),
        "neutral" => label.yellow(),
        _ => label.normal(),
    }
}
