use clap::{Args, Parser, Subcommand};
use pdf_splitter::Strategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdf-split")]
#[command(about = "Analyze PDF structure and split documents along chapters, TOC sections or page ranges")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for split files
    #[arg(short, long, global = true, default_value = "./splits")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display PDF metadata and basic information
    Info(InfoArgs),

    /// Perform a full structure analysis
    Analyze(AnalyzeArgs),

    /// Split a PDF using automatic or forced strategy selection
    Split(SplitArgs),
}

#[derive(Args)]
pub struct InfoArgs {
    /// Input source (file path or URL)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input source (file path or URL)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Input source (file path or URL)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Splitting strategy (auto, bookmarks, toc, pages)
    #[arg(short, long, default_value = "auto")]
    pub strategy: String,

    /// Maximum pages per split
    #[arg(long, value_name = "PAGES")]
    pub max_pages: Option<usize>,

    /// Maximum tokens per split (estimated from page count)
    #[arg(long, value_name = "TOKENS")]
    pub max_tokens: Option<usize>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Do not copy title, author, creator and producer into split files
    #[arg(long)]
    pub no_preserve_metadata: bool,

    /// Do not write the split manifest
    #[arg(long)]
    pub no_manifest: bool,
}

impl SplitArgs {
    /// Parsed strategy name; unknown names are a configuration error.
    pub fn strategy(&self) -> pdf_splitter::Result<Strategy> {
        self.strategy.parse()
    }
}
