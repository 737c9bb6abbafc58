use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use criba_core::{NormalizedTransaction, RawTransaction};
use criba_curate::{CurationPipeline, KeywordEngine};
use criba_memory::{apply_correction, JsonFileStore, MemoryStore, DEFAULT_MEMORY_DIR};

#[derive(Parser)]
#[command(
    name = "criba",
    about = "Curate parsed bank transactions: normalize, suggest payees and categories, flag duplicates, score."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the curation pipeline over a batch and print the report as JSON.
    Curate {
        /// Identity whose memory drives the suggesters
        #[arg(long)]
        identity: String,
        /// Path to a JSON array of raw transactions
        #[arg(long)]
        input: PathBuf,
        /// Path to a JSON array of previously normalized transactions,
        /// used as duplicate context
        #[arg(long)]
        prior: Option<PathBuf>,
        /// Memory store directory (default: data/memory)
        #[arg(long = "memory-dir")]
        memory_dir: Option<PathBuf>,
        /// TOML file with [[rules]] tables replacing the built-in keywords
        #[arg(long)]
        keywords: Option<PathBuf>,
        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },
    /// Record a payee/category correction in an identity's memory.
    Correct {
        #[arg(long)]
        identity: String,
        /// Transaction hash the correction applies to
        #[arg(long)]
        hash: String,
        /// Corrected payee
        #[arg(long)]
        payee: Option<String>,
        /// Corrected category
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "memory-dir")]
        memory_dir: Option<PathBuf>,
    },
    /// Print the stored memory for an identity.
    Memory {
        #[arg(long)]
        identity: String,
        #[arg(long = "memory-dir")]
        memory_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Reports go to stdout, so logging stays quiet unless RUST_LOG asks.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Curate { identity, input, prior, memory_dir, keywords, pretty } => curate(
            &identity,
            &input,
            prior.as_deref(),
            memory_dir,
            keywords.as_deref(),
            pretty,
        ),
        Commands::Correct { identity, hash, payee, category, memory_dir } => {
            correct(&identity, &hash, payee.as_deref(), category.as_deref(), memory_dir)
        }
        Commands::Memory { identity, memory_dir } => show_memory(&identity, memory_dir),
    }
}

fn curate(
    identity: &str,
    input: &Path,
    prior: Option<&Path>,
    memory_dir: Option<PathBuf>,
    keywords: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let batch: Vec<RawTransaction> = read_json(input, "transaction batch")?;
    tracing::info!("Read {} transactions from {}", batch.len(), input.display());
    let prior: Vec<NormalizedTransaction> = match prior {
        Some(path) => read_json(path, "prior window")?,
        None => Vec::new(),
    };
    let engine = match keywords {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read keyword rules from {}", path.display()))?;
            let engine = KeywordEngine::from_toml(&content).map_err(anyhow::Error::msg)?;
            tracing::info!("Loaded {} keyword rules from {}", engine.len(), path.display());
            engine
        }
        None => KeywordEngine::default_rules(),
    };

    let pipeline = CurationPipeline::with_keywords(store_at(memory_dir), engine);
    let report = pipeline.run(identity, &batch, &prior);
    tracing::info!(
        "Batch curated: {}/{} normalized, {} duplicates",
        report.metrics.normalized,
        report.metrics.total,
        report.metrics.duplicates
    );
    print_json(&report, pretty)
}

fn correct(
    identity: &str,
    hash: &str,
    payee: Option<&str>,
    category: Option<&str>,
    memory_dir: Option<PathBuf>,
) -> Result<()> {
    let store = store_at(memory_dir);
    let outcome = apply_correction(&store, identity, hash, payee, category)
        .context("Failed to apply correction")?;
    tracing::info!("Correction applied for {identity}: {} stored", outcome.total_corrections);
    print_json(&outcome, true)
}

fn show_memory(identity: &str, memory_dir: Option<PathBuf>) -> Result<()> {
    let store = store_at(memory_dir);
    print_json(&store.get(identity), true)
}

fn store_at(memory_dir: Option<PathBuf>) -> JsonFileStore {
    match memory_dir {
        Some(dir) => JsonFileStore::new(dir),
        None => JsonFileStore::new(DEFAULT_MEMORY_DIR),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid {what} JSON in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
