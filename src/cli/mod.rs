//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "wikirag",
    version,
    about = "Hybrid retrieval-augmented question answering over a wiki",
    long_about = "WikiRAG answers questions from a pre-chunked wiki. It combines dense embedding \
                  search with TF-IDF keyword search, fuses and reranks the hits with a \
                  cross-encoder, and asks a local language model to answer from the top passages."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/wikirag/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the config file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve and rank passages without generating an answer
    Search {
        /// Search query text
        query: String,

        /// Number of passages to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip cross-encoder reranking
        #[arg(long)]
        no_rerank: bool,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Ask a question and generate a grounded answer
    Ask {
        /// Question to ask
        question: String,

        /// Number of context passages
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip cross-encoder reranking
        #[arg(long)]
        no_rerank: bool,

        /// Show the response in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Measure top-1 retrieval accuracy over labelled queries
    Eval {
        /// JSON file with [{"query": ..., "expected_source": ...}]
        cases: PathBuf,

        /// Number of passages retrieved per query
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Write the report as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
