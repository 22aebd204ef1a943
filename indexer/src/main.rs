use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kensaku_core::{Article, IndexBuilder, MecabTokenizer, PostingsStore, SledCollection};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Parser)]
#[command(name = "kensaku-indexer")]
#[command(about = "Load an article dump and build the posting stores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a JSONL article dump into the article store
    Load {
        /// Input file, one JSON article per line
        #[arg(long)]
        input: String,
        /// Article store directory
        #[arg(long)]
        store: String,
    },
    /// Rebuild the full-text, bigram and opening-text indexes
    Build {
        /// Article store directory
        #[arg(long)]
        store: String,
        /// Index directory; removed and recreated on every run
        #[arg(long)]
        index: String,
        /// Opening-text pass covers the first N articles in store order
        #[arg(long, default_value_t = 100)]
        excerpt_limit: usize,
        /// Bigram pass covers the first N articles in store order
        #[arg(long, default_value_t = 100)]
        ngram_limit: usize,
        /// Morphological analyzer command
        #[arg(long, default_value = "mecab")]
        mecab: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Load { input, store } => load(&input, &store),
        Commands::Build {
            store,
            index,
            excerpt_limit,
            ngram_limit,
            mecab,
        } => build(&store, &index, excerpt_limit, ngram_limit, &mecab),
    }
}

fn load(input: &str, store: &str) -> Result<()> {
    let collection =
        SledCollection::open(store).with_context(|| format!("open article store at {store}"))?;
    let file = File::open(input).with_context(|| format!("open {input}"))?;

    let mut loaded = 0u64;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let article: Article = serde_json::from_str(&line)
            .with_context(|| format!("parse article line {}", loaded + 1))?;
        collection.insert(&article)?;
        loaded += 1;
    }
    collection.flush()?;
    tracing::info!(loaded, store, "article load complete");
    Ok(())
}

fn build(
    store: &str,
    index: &str,
    excerpt_limit: usize,
    ngram_limit: usize,
    mecab: &str,
) -> Result<()> {
    // Build passes assume a fresh target store, so drop any previous index
    // wholesale instead of writing into it.
    if Path::new(index).exists() {
        fs::remove_dir_all(index).with_context(|| format!("remove stale index at {index}"))?;
    }

    let collection =
        SledCollection::open(store).with_context(|| format!("open article store at {store}"))?;
    let postings =
        PostingsStore::open(index).with_context(|| format!("create index at {index}"))?;
    let tokenizer = MecabTokenizer::new(mecab);
    let builder = IndexBuilder::new(&postings, &collection, &tokenizer);

    builder.build_full()?;
    builder.build_ngrams(ngram_limit)?;
    builder.build_from_excerpt(excerpt_limit)?;
    tracing::info!(index, "index build complete");
    Ok(())
}
