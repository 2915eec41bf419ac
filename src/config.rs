use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::error::AnalysisError;
use crate::pipeline::AnalysisParams;
use crate::sentiment::TrainingParams;
use crate::text::StopWordSet;

/// Central configuration loaded from environment variables.
///
/// Every value has a default, so an empty environment is valid. The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the trained sentiment model is saved and loaded
    pub model_path: PathBuf,
    /// Directory for summary and detailed reports
    pub reports_dir: PathBuf,
    pub top_n_keywords: usize,
    pub n_topics: usize,
    /// Seed for the train/test split and k-means initialization
    pub seed: u64,
    pub stop_words: StopWordSet,
    /// Default training dataset for `train`
    pub labeled_data: PathBuf,
    /// Default batch dataset for `analyze`, `keywords` and `topics`
    pub raw_data: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A variable that is set but does not parse is an error naming the
    /// variable; it is never silently replaced by the default.
    pub fn load() -> Result<Self> {
        let n_topics: usize = parse_var("REVIEWLENS_N_TOPICS", 3)?;
        if n_topics == 0 {
            anyhow::bail!("REVIEWLENS_N_TOPICS must be at least 1");
        }
        let top_n_keywords: usize = parse_var("REVIEWLENS_TOP_N_KEYWORDS", 10)?;
        if top_n_keywords == 0 {
            anyhow::bail!("REVIEWLENS_TOP_N_KEYWORDS must be at least 1");
        }

        Ok(Self {
            model_path: env::var("REVIEWLENS_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_model_path()),
            reports_dir: env::var("REVIEWLENS_REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./reports")),
            top_n_keywords,
            n_topics,
            seed: parse_var("REVIEWLENS_SEED", 42)?,
            stop_words: parse_var("REVIEWLENS_STOPWORDS", StopWordSet::Classic)?,
            labeled_data: env::var("REVIEWLENS_LABELED_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/labeled_reviews.csv")),
            raw_data: env::var("REVIEWLENS_RAW_DATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/raw_reviews.csv")),
        })
    }

    /// Check that a trained model exists.
    /// Call this before any operation that needs sentiment predictions.
    pub fn require_model(&self) -> Result<()> {
        if !self.model_path.exists() {
            return Err(AnalysisError::ModelNotFound(self.model_path.clone()).into());
        }
        Ok(())
    }

    /// Batch parameters derived from this configuration.
    pub fn analysis_params(&self) -> AnalysisParams {
        AnalysisParams {
            top_n_keywords: self.top_n_keywords,
            n_topics: self.n_topics,
            seed: self.seed,
            stop_words: self.stop_words,
            show_progress: true,
        }
    }

    /// Optimizer settings for `train`, with this configuration's stop words.
    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            stop_words: self.stop_words,
            show_progress: true,
            ..TrainingParams::default()
        }
    }
}

/// Default model location: the platform data directory, or ./models when the
/// platform has none.
pub fn default_model_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("reviewlens"))
        .unwrap_or_else(|| PathBuf::from("./models"))
        .join("sentiment_model.json")
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: {raw:?}")),
        _ => Ok(default),
    }
}
