//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and the `run` arguments.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Embed, link and cluster social media posts
#[derive(Parser)]
#[command(
    name = "threadmap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Embed, link and cluster social media posts",
    long_about = "Build embeddings for a corpus of twitter and reddit posts, attach each post's nearest neighbors and k-means cluster, and write the augmented corpus back out.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = "Quick Start:\n  $ threadmap init\n  $ threadmap run data/posts.json -o data/posts_clustered.json\n  $ threadmap run -k 8 --plot clusters.png --stats clusters.json\n  $ threadmap dedupe raw.json data/posts.json"
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log pipeline progress (info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .threadmap directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings from .threadmap/settings.toml")]
    Config,

    /// Run the full pipeline
    #[command(
        about = "Embed, find neighbors, cluster and write the augmented corpus",
        after_help = "Exit codes:\n  0  success\n  1  runtime or storage error\n  2  invalid configuration or cluster count\n  3  invalid input corpus"
    )]
    Run(RunArgs),

    /// Remove duplicate posts
    #[command(about = "Drop posts whose id or content repeats an earlier post")]
    Dedupe {
        /// Corpus to read
        input: PathBuf,

        /// Where to write the deduplicated corpus
        output: PathBuf,
    },
}

/// Overrides for a pipeline run. Unset values come from settings.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Corpus to read (overrides paths.input)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Augmented corpus to write (overrides paths.output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of clusters
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    /// Nearest neighbors kept per post
    #[arg(short = 'n', long)]
    pub neighbors: Option<usize>,

    /// Seed for centroid initialisation
    #[arg(long)]
    pub seed: Option<u64>,

    /// K-means iteration cap
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Hashed embedding dimension
    #[arg(short, long)]
    pub dimensions: Option<usize>,

    /// Use the `embedding` arrays already present on each post
    #[arg(long)]
    pub precomputed: bool,

    /// Write a cluster-size histogram (PNG)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Write cluster statistics (JSON)
    #[arg(long)]
    pub stats: Option<PathBuf>,
}
