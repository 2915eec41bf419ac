// System status display: shows the model artifact, its classes and the
// configured data and report locations.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::sentiment::{SentimentClassifier, SentimentModel};

/// Display system status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    let model_path = &config.model_path;
    if !model_path.exists() {
        println!("Model: not trained ({})", model_path.display());
        println!("\nRun `reviewlens train` to build it.");
    } else {
        let file_size = std::fs::metadata(model_path)
            .map(|m| format_bytes(m.len()))
            .unwrap_or_else(|_| "unknown".to_string());
        println!("Model: {} ({})", model_path.display(), file_size);

        match SentimentModel::load(model_path) {
            Ok(model) => {
                println!("  Classes: {}", model.classes().join(", "));
                println!(
                    "  Vocabulary: {} terms from {} documents",
                    model.vocabulary_size(),
                    model.vectorizer().n_documents()
                );
                println!("  Stop words: {}", model.stop_words().as_str());
            }
            // An unreadable artifact is worth reporting, not failing on.
            Err(e) => match e.downcast_ref::<AnalysisError>() {
                Some(AnalysisError::Artifact(msg)) => {
                    println!("  Unusable artifact: {msg}");
                    println!("  Run `reviewlens train` to rebuild it");
                }
                _ => return Err(e),
            },
        }
    }

    println!(
        "Training data: {}{}",
        config.labeled_data.display(),
        missing_marker(&config.labeled_data)
    );
    println!(
        "Batch data: {}{}",
        config.raw_data.display(),
        missing_marker(&config.raw_data)
    );

    let report_count = std::fs::read_dir(&config.reports_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("summary_"))
                .count()
        })
        .unwrap_or(0);
    println!(
        "Reports: {} ({} summaries)",
        config.reports_dir.display(),
        report_count
    );
    println!(
        "Analysis: top {} keywords, {} topics, seed {}",
        config.top_n_keywords, config.n_topics, config.seed
    );

    Ok(())
}

fn missing_marker(path: &Path) -> &'static str {
    if path.exists() {
        ""
    } else {
        " (missing)"
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
