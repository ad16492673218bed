//! Configuration types.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_CLIP_LEN, DEFAULT_PADDING};

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chunk layout and clip window settings.
    pub extraction: ExtractionConfig,

    /// Range reader settings.
    pub reader: ReaderConfig,

    /// Output settings.
    pub output: OutputConfig,
}

/// Chunk layout and clip window settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Samples per chunk when writing a chunked store.
    pub chunk_size: usize,

    /// Samples of overlap stored on each side of a chunk.
    pub padding: usize,

    /// Samples per clip.
    pub clip_len: usize,

    /// Index of the event sample inside a clip.
    ///
    /// Defaults to `(clip_len + 1) / 2 - 1` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centering_offset: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            padding: DEFAULT_PADDING,
            clip_len: DEFAULT_CLIP_LEN,
            centering_offset: None,
        }
    }
}

/// Range reader settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Assemble channels and clips on the rayon thread pool.
    pub parallel: bool,
}

/// Output settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default format for `range` and `clips` output.
    pub format: OutputFormat,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// A single JSON document.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Which block store backend to open a dataset with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Chunked store if present, else the dense recording.
    #[default]
    Auto,
    /// Load the whole recording into memory.
    Dense,
    /// Read from the on-disk chunked store.
    Chunked,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Dense => write!(f, "dense"),
            Self::Chunked => write!(f, "chunked"),
        }
    }
}
