// Report files for a finished batch: a plain-text summary and a detailed CSV.
//
// Both files share one timestamp so a summary and its detail sheet pair up:
//   reports/summary_20250101_120000.txt
//   reports/detailed_20250101_120000.csv

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::data::TEXT_COLUMN;
use crate::pipeline::batch::AnalysisSession;

/// Columns appended to every detailed row. Source columns with these names are
/// dropped so the sheet never carries two `sentiment` columns.
const ANALYSIS_COLUMNS: [&str; 3] = ["sentiment", "confidence", "topic"];

/// Sample reviews shown per topic in the summary file.
const SUMMARY_SAMPLES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub detailed: PathBuf,
}

/// Write both reports into `dir`, creating it if needed.
pub fn write_reports(session: &AnalysisSession, dir: &Path) -> Result<ReportPaths> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create reports directory {}", dir.display()))?;

    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let paths = ReportPaths {
        summary: dir.join(format!("summary_{stamp}.txt")),
        detailed: dir.join(format!("detailed_{stamp}.csv")),
    };

    write_summary(session, &paths.summary)?;
    write_detailed_csv(session, &paths.detailed)?;

    info!(
        summary = %paths.summary.display(),
        detailed = %paths.detailed.display(),
        "Reports written"
    );
    Ok(paths)
}

/// Write the plain-text summary report.
pub fn write_summary(session: &AnalysisSession, path: &Path) -> Result<()> {
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    fs::write(path, render_summary(session, &generated))
        .with_context(|| format!("Failed to write summary report {}", path.display()))
}

/// Render the summary report body. `generated` is printed in the header.
pub fn render_summary(session: &AnalysisSession, generated: &str) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Review Analysis Summary");
    let _ = writeln!(out, "Generated: {generated}");
    let _ = writeln!(out, "{rule}");

    let _ = writeln!(out, "\nSentiment statistics");
    let _ = writeln!(out, "  Total reviews: {}", session.summary.total);
    for class in &session.summary.classes {
        let _ = writeln!(
            out,
            "  {:<12} {:>6}  ({:.2}%)",
            class.label, class.count, class.percentage
        );
    }
    if !session.excluded.is_empty() {
        let _ = writeln!(out, "  Excluded:    {:>6}", session.excluded.len());
    }

    let _ = writeln!(out, "\nTop keywords");
    for (i, (term, freq)) in session.keywords.iter().enumerate() {
        let _ = writeln!(out, "  {:>3}. {:<30} {}", i + 1, term, freq);
    }

    let _ = writeln!(out, "\nTopic clusters");
    for topic in &session.topics {
        let _ = writeln!(
            out,
            "\n  Topic {}: {} ({} reviews)",
            topic.id,
            topic.label,
            topic.rows.len()
        );
        for text in session.topic_texts(topic.id).into_iter().take(SUMMARY_SAMPLES) {
            let _ = writeln!(out, "    - {}", super::preview(text, 200));
        }
    }

    out
}

/// Write one CSV row per analyzed review: the source columns, then the
/// predicted label, its confidence and the topic id.
pub fn write_detailed_csv(session: &AnalysisSession, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create detailed report {}", path.display()))?;

    let source_columns: Vec<&str> = session
        .rows
        .first()
        .map(|row| {
            row.extra
                .iter()
                .map(|(name, _)| name.as_str())
                .filter(|name| !ANALYSIS_COLUMNS.contains(name))
                .collect()
        })
        .unwrap_or_default();

    let mut header = vec![TEXT_COLUMN];
    header.extend(&source_columns);
    header.extend(ANALYSIS_COLUMNS);
    writer.write_record(&header).context("Failed to write CSV header")?;

    for row in &session.rows {
        let mut record = vec![row.text.clone()];
        record.extend(
            row.extra
                .iter()
                .filter(|(name, _)| !ANALYSIS_COLUMNS.contains(&name.as_str()))
                .map(|(_, value)| value.clone()),
        );
        record.push(row.label.clone());
        record.push(format!("{:.4}", row.confidence));
        record.push(row.topic.to_string());
        writer
            .write_record(&record)
            .with_context(|| format!("Failed to write CSV row for review {}", row.id))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush detailed report {}", path.display()))?;
    Ok(())
}
