//! Application-wide constants.
//!
//! All magic numbers and strings are defined here to ensure consistency
//! and make changes easy to track.

/// Application name used for config directories and user-facing messages.
pub const APP_NAME: &str = "spikeslice";

/// Configuration file name inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Default chunk size (samples per channel) for newly written chunked stores.
///
/// One second at 30 kHz, the usual extracellular acquisition rate.
pub const DEFAULT_CHUNK_SIZE: usize = 30_000;

/// Default padding (samples each side) for newly written chunked stores.
pub const DEFAULT_PADDING: usize = 5_000;

/// Largest range query result, in samples (4 GiB of `f32`).
pub const MAX_QUERY_SAMPLES: usize = 1 << 30;

/// Default clip length in samples.
pub const DEFAULT_CLIP_LEN: usize = 50;

/// Dataset directory layout.
pub mod dataset {
    /// Dense recording file name.
    pub const RAW_MDA: &str = "raw.mda";
    /// Chunked store directory name.
    pub const RAW_CHUNKS: &str = "raw.chunks";
    /// Dataset parameter file name.
    pub const PARAMS_JSON: &str = "params.json";
    /// Channel geometry file name.
    pub const GEOM_CSV: &str = "geom.csv";
    /// Sorted event table file name.
    pub const FIRINGS_MDA: &str = "firings.mda";
}

/// Chunked store container layout.
pub mod chunked {
    /// Metadata file inside a chunked store directory.
    pub const METADATA_FILE: &str = "store.json";
    /// Block data file inside a chunked store directory.
    pub const BLOCKS_FILE: &str = "blocks.f32";
    /// Current container format version.
    pub const FORMAT_VERSION: u32 = 1;
    /// Bytes per stored sample.
    pub const BYTES_PER_SAMPLE: usize = 4;
}

/// MDA array type codes.
pub mod mda {
    /// Unsigned 8-bit integer.
    pub const UINT8: i32 = -2;
    /// 32-bit float.
    pub const FLOAT32: i32 = -3;
    /// Signed 16-bit integer.
    pub const INT16: i32 = -4;
    /// Signed 32-bit integer.
    pub const INT32: i32 = -5;
    /// Unsigned 16-bit integer.
    pub const UINT16: i32 = -6;
    /// 64-bit float.
    pub const FLOAT64: i32 = -7;
    /// Unsigned 32-bit integer.
    pub const UINT32: i32 = -8;
    /// Maximum number of dimensions accepted in a header.
    pub const MAX_DIMS: usize = 50;
}

/// Firings table layout (0-based rows of the `R x L` array).
pub mod firings {
    /// Row holding event times (frames).
    pub const TIME_ROW: usize = 1;
    /// Row holding 1-based unit labels.
    pub const LABEL_ROW: usize = 2;
    /// Minimum number of rows a firings table must have.
    pub const MIN_ROWS: usize = 3;
}
