//! Veracity CLI
//!
//! Scores Arabic news snippets against the reference corpus and checks
//! their cited source. Results are printed to stdout as JSON; logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use veracity_core::{CachePolicy, EngineConfig, VeracityEngine, Verdict};

#[derive(Parser, Debug)]
#[command(name = "veracity")]
#[command(version, about = "Arabic news veracity scorer")]
struct Args {
    /// Reference corpus file (JSON array or JSON Lines)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Directory for the cached TF-IDF artifacts
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Directory for the tokenizer resource bundle
    #[arg(long, global = true)]
    tokenizer_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the similarity score and the source check
    Check {
        /// Snippet to check, or "-" to read stdin
        text: String,
    },
    /// Similarity verdict only
    Score {
        /// Snippet to score, or "-" to read stdin
        text: String,

        /// Minimum similarity for a positive verdict
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of nearest articles to rank
        #[arg(long)]
        top_n: Option<usize>,

        /// Print the ranked candidates behind the verdict
        #[arg(long)]
        explain: bool,
    },
    /// Source check only
    Verify {
        /// Snippet to verify, or "-" to read stdin
        text: String,
    },
    /// Fit the TF-IDF model and write the cache
    Fit {
        /// Refit even when cached artifacts exist
        #[arg(long)]
        force: bool,
    },
}

impl Args {
    fn config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::from_env().context("Invalid environment configuration")?;
        if let Some(path) = &self.corpus {
            config = config.with_corpus_path(path);
        }
        if let Some(dir) = &self.cache_dir {
            config = config.with_cache_dir(dir);
        }
        if let Some(dir) = &self.tokenizer_dir {
            config = config.with_tokenizer_dir(dir);
        }
        if let Command::Score {
            threshold, top_n, ..
        } = &self.command
        {
            if let Some(threshold) = threshold {
                config = config.with_threshold(*threshold);
            }
            if let Some(top_n) = top_n {
                config = config.with_top_n(*top_n);
            }
        }
        config.validate()?;
        Ok(config)
    }
}

/// Resolve the `-` stdin convention
fn read_text(text: &str) -> Result<String> {
    if text != "-" {
        return Ok(text.to_string());
    }
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .context("Failed to read stdin")?;
    // Invalid UTF-8 is kept lossy so the scorer reports it as garbled input
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn run(args: Args) -> Result<serde_json::Value> {
    let config = args.config()?;

    let output = match args.command {
        Command::Check { text } => {
            let engine = VeracityEngine::initialize(&config)?;
            let text = read_text(&text)?;
            serde_json::to_value(engine.check(&text))?
        }
        Command::Score { text, explain, .. } => {
            let engine = VeracityEngine::initialize(&config)?;
            let text = read_text(&text)?;
            if explain {
                match engine.report(&text, config.threshold, config.top_n) {
                    Ok(report) => serde_json::to_value(report)?,
                    Err(e) => {
                        tracing::error!("Error in similarity scoring: {}", e);
                        json!({ "verdict": Verdict::Error })
                    }
                }
            } else {
                json!({ "prediction": engine.score(&text) })
            }
        }
        Command::Verify { text } => {
            let engine = VeracityEngine::initialize(&config)?;
            let text = read_text(&text)?;
            json!({ "source_check": engine.verify(&text) })
        }
        Command::Fit { force } => {
            let policy = if force {
                CachePolicy::Refit
            } else {
                CachePolicy::Reuse
            };
            let engine = VeracityEngine::initialize_with(&config, policy)?;
            json!({
                "articles": engine.corpus().len(),
                "rows": engine.index().n_rows(),
                "terms": engine.index().vectorizer().len(),
                "cache_dir": config.cache_dir,
            })
        }
    };
    Ok(output)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries only JSON
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting veracity v{}", env!("CARGO_PKG_VERSION"));

    let output = run(args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
