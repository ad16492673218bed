//! CLI argument definitions.

use crate::cli::validators::parse_positive;
use crate::config::{OutputFormat, StoreKind};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Random-access range queries and clip extraction for extracellular recordings.
#[derive(Debug, Parser)]
#[command(name = "spikeslice")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config directory).
    #[arg(long, global = true, env = "SPIKESLICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Suppress informational output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide progress bars.
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Assemble channels and clips on all cores.
    #[arg(long, global = true, env = "SPIKESLICE_PARALLEL")]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show recording dimensions, sample rate and storage layout.
    Info(DatasetArgs),
    /// Read a time range of traces.
    Range(RangeArgs),
    /// Extract fixed-length clips around event times.
    Clips(ClipsArgs),
    /// Convert `raw.mda` into a chunked store.
    Chunk(ChunkArgs),
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Dataset selection.
#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Dataset directory.
    pub dataset: PathBuf,

    /// Storage backend to read from.
    #[arg(long, value_enum, default_value_t = StoreKind::Auto, env = "SPIKESLICE_BACKEND")]
    pub backend: StoreKind,
}

/// Arguments for the range command.
#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Dataset to read.
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// First frame (inclusive, may be negative).
    #[arg(long, allow_negative_numbers = true)]
    pub start: i64,

    /// Last frame (exclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub end: i64,

    /// Channels to read (comma-separated, default: all).
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<usize>>,

    /// Output format.
    #[arg(short, long, env = "SPIKESLICE_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the clips command.
#[derive(Debug, Args)]
pub struct ClipsArgs {
    /// Dataset to read.
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Event frames to center clips on (comma-separated).
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        required_unless_present = "unit",
        conflicts_with = "unit"
    )]
    pub times: Option<Vec<i64>>,

    /// Use the events of this unit from `firings.mda`.
    #[arg(long)]
    pub unit: Option<i64>,

    /// Samples per clip.
    #[arg(long, value_parser = parse_positive, env = "SPIKESLICE_CLIP_LEN")]
    pub clip_len: Option<usize>,

    /// Index of the event sample inside each clip.
    #[arg(long)]
    pub centering_offset: Option<usize>,

    /// Channels to extract (comma-separated, default: all).
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<usize>>,

    /// Output format.
    #[arg(short, long, env = "SPIKESLICE_FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output file (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the chunk command.
#[derive(Debug, Args)]
pub struct ChunkArgs {
    /// Dataset directory holding `raw.mda` and `params.json`.
    pub dataset: PathBuf,

    /// Samples per chunk.
    #[arg(long, value_parser = parse_positive, env = "SPIKESLICE_CHUNK_SIZE")]
    pub chunk_size: Option<usize>,

    /// Samples of overlap stored on each side of a chunk.
    #[arg(long, env = "SPIKESLICE_PADDING")]
    pub padding: Option<usize>,

    /// Replace an existing chunked store.
    #[arg(long)]
    pub force: bool,
}
