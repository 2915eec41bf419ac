use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use reviewlens::config::Config;
use reviewlens::data;
use reviewlens::data::models::Review;
use reviewlens::output::{report, terminal};
use reviewlens::pipeline::{analyze, AnalysisSession};
use reviewlens::sentiment::{train_with_evaluation, SentimentClassifier, SentimentModel, SplitParams};
use reviewlens::text::shared_normalizer;
use reviewlens::topics::{cluster_tokens, rank_tokens, KMeans};

/// Reviewlens: sentiment, keyword and topic analysis for product reviews.
///
/// Trains a sentiment classifier on labeled reviews, then classifies new
/// reviews one at a time or in batches with keyword ranking and topic
/// clustering.
#[derive(Parser)]
#[command(name = "reviewlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the sentiment model on a labeled CSV and save it
    Train {
        /// Labeled CSV with review_text and sentiment columns
        #[arg(long)]
        data: Option<PathBuf>,

        /// Fraction of each class held out for evaluation (default: 0.2)
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        /// Seed for the held-out split (default: REVIEWLENS_SEED or 42)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Classify a single review
    Predict {
        /// The review text
        text: String,
    },

    /// Analyze a CSV of reviews: sentiment, keywords and topics
    Analyze {
        /// CSV with a review_text column (default: REVIEWLENS_RAW_DATA)
        path: Option<PathBuf>,

        /// Write summary and detailed reports to the reports directory
        #[arg(long)]
        report: bool,

        /// Print detailed statistics
        #[arg(long)]
        stats: bool,
    },

    /// Rank the most frequent keywords in a CSV of reviews
    Keywords {
        path: Option<PathBuf>,

        /// Number of keywords to show (default: REVIEWLENS_TOP_N_KEYWORDS)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Cluster a CSV of reviews into topics
    Topics {
        path: Option<PathBuf>,

        /// Number of topics (default: REVIEWLENS_N_TOPICS)
        #[arg(long)]
        topics: Option<usize>,
    },

    /// Interactive menu
    Menu,

    /// Show system status (model, data files, reports)
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reviewlens=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Train {
            data: data_path,
            test_size,
            seed,
        } => {
            let path = data_path.unwrap_or_else(|| config.labeled_data.clone());
            info!(path = %path.display(), "Training sentiment model");
            let reviews = data::load_labeled(&path)?;

            let split = SplitParams {
                test_size,
                seed: seed.unwrap_or(config.seed),
            };
            let report = train_with_evaluation(&reviews, &config.training_params(), &split)?;
            terminal::display_training_report(&report);

            report.outcome.model.save(&config.model_path)?;
            println!(
                "\nModel saved to {}",
                config.model_path.display().to_string().bold()
            );
        }

        Commands::Predict { text } => {
            let model = load_model(&config)?;
            let prediction = model.predict(&text)?;
            terminal::display_prediction(&prediction);
        }

        Commands::Analyze {
            path,
            report,
            stats,
        } => {
            let model = load_model(&config)?;
            let path = path.unwrap_or_else(|| config.raw_data.clone());
            let session = run_batch(&model, &config, &path)?;
            terminal::display_batch_summary(&session);

            if stats {
                terminal::display_statistics(&session, 2);
            }
            if report {
                write_reports(&session, &config)?;
            }
        }

        Commands::Keywords { path, top } => {
            let path = path.unwrap_or_else(|| config.raw_data.clone());
            let corpus = load_corpus(&config, &path)?;
            let keywords = rank_tokens(&corpus, top.unwrap_or(config.top_n_keywords));
            terminal::display_keywords(&keywords);
        }

        Commands::Topics { path, topics } => {
            let path = path.unwrap_or_else(|| config.raw_data.clone());
            let corpus = load_corpus(&config, &path)?;
            let k = topics.unwrap_or(config.n_topics);
            let clustering = cluster_tokens(&corpus, &KMeans::new(k).with_seed(config.seed))?;

            if let Some(warning) = &clustering.clustering.warning {
                println!("{} {}", "Warning:".yellow(), warning);
            }
            println!("\n{}", "=== Topic Clusters ===".bold());
            for (id, members) in clustering.clustering.groups().iter().enumerate() {
                println!(
                    "  Topic {}: {} ({} reviews)",
                    id,
                    clustering.label(id).bold(),
                    members.len()
                );
            }
        }

        Commands::Menu => run_menu(&config)?,

        Commands::Status => reviewlens::status::show(&config)?,
    }

    Ok(())
}

fn load_model(config: &Config) -> Result<SentimentModel> {
    config.require_model()?;
    SentimentModel::load(&config.model_path)
}

fn run_batch(model: &SentimentModel, config: &Config, path: &Path) -> Result<AnalysisSession> {
    let reviews = data::load_reviews(path)?;
    info!(path = %path.display(), reviews = reviews.len(), "Analyzing reviews");
    let session = analyze(model, &reviews, &config.analysis_params())?;
    Ok(session)
}

/// Normalize the review texts of a CSV, skipping blank rows.
fn load_corpus(config: &Config, path: &Path) -> Result<Vec<Vec<String>>> {
    let reviews: Vec<Review> = data::load_reviews(path)?;
    let normalizer = shared_normalizer(config.stop_words);
    let corpus: Vec<Vec<String>> = reviews
        .iter()
        .filter(|r| !r.text.trim().is_empty())
        .map(|r| normalizer.normalize(&r.text))
        .collect();
    if corpus.is_empty() {
        anyhow::bail!("No review text found in {}", path.display());
    }
    Ok(corpus)
}

fn write_reports(session: &AnalysisSession, config: &Config) -> Result<()> {
    let paths = report::write_reports(session, &config.reports_dir)?;
    println!("\nSummary report: {}", paths.summary.display());
    println!("Detailed report: {}", paths.detailed.display());
    Ok(())
}

/// Interactive loop. The last batch result lives here and nowhere else; each
/// new batch replaces it.
fn run_menu(config: &Config) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut model: Option<SentimentModel> = None;
    let mut session: Option<AnalysisSession> = None;

    loop {
        println!("\n{}", "=== Review Analysis ===".bold());
        println!("  1. Analyze a single review");
        println!("  2. Analyze a batch file");
        println!("  3. Write report for the last batch");
        println!("  4. Show statistics for the last batch");
        println!("  5. Exit");

        let Some(choice) = prompt(&mut lines, "Choose an option: ")? else {
            break;
        };

        match choice.as_str() {
            "1" => {
                let Some(text) = prompt(&mut lines, "Review text: ")? else {
                    break;
                };
                let model = match ensure_model(&mut model, config) {
                    Ok(model) => model,
                    Err(e) => {
                        println!("{} {e:#}", "Error:".red());
                        continue;
                    }
                };
                match model.predict(&text) {
                    Ok(prediction) => terminal::display_prediction(&prediction),
                    Err(e) => println!("{} {e}", "Error:".red()),
                }
            }
            "2" => {
                let default = config.raw_data.display().to_string();
                let Some(input) = prompt(&mut lines, &format!("CSV path [{default}]: "))? else {
                    break;
                };
                let path = if input.is_empty() {
                    config.raw_data.clone()
                } else {
                    PathBuf::from(input)
                };
                let model = match ensure_model(&mut model, config) {
                    Ok(model) => model,
                    Err(e) => {
                        println!("{} {e:#}", "Error:".red());
                        continue;
                    }
                };
                match run_batch(model, config, &path) {
                    Ok(result) => {
                        terminal::display_batch_summary(&result);
                        session = Some(result);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Batch analysis failed");
                        println!("{} {e:#}", "Error:".red());
                    }
                }
            }
            "3" => match &session {
                Some(s) => {
                    if let Err(e) = write_reports(s, config) {
                        println!("{} {e:#}", "Error:".red());
                    }
                }
                None => println!("No batch analyzed yet. Choose option 2 first."),
            },
            "4" => match &session {
                Some(s) => terminal::display_statistics(s, 2),
                None => println!("No batch analyzed yet. Choose option 2 first."),
            },
            "5" | "q" | "quit" | "exit" => break,
            other => println!("Unknown option {other:?}; enter 1-5."),
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Load the model on first use and keep it for the rest of the session.
fn ensure_model<'a>(slot: &'a mut Option<SentimentModel>, config: &Config) -> Result<&'a SentimentModel> {
    if slot.is_none() {
        *slot = Some(load_model(config)?);
    }
    slot.as_ref().context("model slot is empty after loading")
}

/// Print a prompt and read one trimmed line. `None` means stdin closed.
fn prompt<B: BufRead>(lines: &mut io::Lines<B>, message: &str) -> Result<Option<String>> {
    print!("{message}");
    io::stdout().flush().context("Failed to flush stdout")?;
    match lines.next() {
        Some(line) => Ok(Some(line.context("Failed to read input")?.trim().to_string())),
        None => Ok(None),
    }
}
