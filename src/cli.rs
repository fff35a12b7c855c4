use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::pdf::CompressionProfile;

#[derive(Parser)]
#[command(name = "pdftrim")]
#[command(about = "Trim PDF documents down to selected page ranges")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level override (off, error, warn, info, debug, trace)
    #[arg(long, env = "PDFTRIM_LOG", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp {
        /// Keep the pipeline busy this long after a trim finishes
        #[arg(long, default_value = "0", env = "PDFTRIM_RELEASE_DELAY_MS")]
        release_delay_ms: u64,
    },

    /// Extract the selected pages of each PDF into new files
    #[command(alias = "extract")]
    Trim(TrimArgs),

    /// Show page counts and default ranges for PDFs
    Info {
        /// PDF files or directories to inspect
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Resolve a page range expression against a page count
    Pages {
        /// Page ranges (e.g., "1-5, 8, 11-13")
        expression: String,

        /// Total pages in the document
        total: u32,
    },
}

#[derive(Args)]
pub struct TrimArgs {
    /// PDF files or directories to process, in order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Page ranges applied to every document (default: all pages)
    #[arg(short, long)]
    pub pages: Option<String>,

    /// Page ranges for one document, by its 1-based position (e.g., "2=1-3,9")
    #[arg(long = "range", value_name = "N=EXPR")]
    pub ranges: Vec<String>,

    /// Leave out the document at this 1-based position (repeatable)
    #[arg(long = "skip", value_name = "N")]
    pub skip: Vec<usize>,

    /// Compression profile for the output
    #[arg(short, long, value_enum, default_value_t = CompressionProfile::Medium, env = "PDFTRIM_COMPRESSION")]
    pub compression: CompressionProfile,

    /// Output directory
    #[arg(short, long, default_value = ".", env = "PDFTRIM_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Replace existing output files
    #[arg(short, long)]
    pub force: bool,

    /// Keep the pipeline busy this long after a run finishes
    #[arg(long, default_value = "0", env = "PDFTRIM_RELEASE_DELAY_MS")]
    pub release_delay_ms: u64,

    /// Print per-document results as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}
