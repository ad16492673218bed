//! Error types for spikeslice.

use std::path::PathBuf;

/// Result type alias for spikeslice operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for spikeslice.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Range / store errors
    /// Chunk index outside the store's chunk table.
    ///
    /// Range decomposition clamps queries before deriving chunk indices, so
    /// reaching this from a public query indicates a defect.
    #[error("chunk {chunk} out of range for channel {channel} (store has {num_chunks} chunks)")]
    OutOfRangeChunk {
        /// Channel the block was requested for.
        channel: usize,
        /// Requested chunk index.
        chunk: usize,
        /// Number of chunks in the store.
        num_chunks: usize,
    },

    /// Channel id outside `[0, num_channels)`.
    #[error("channel {channel} out of range (recording has {num_channels} channels)")]
    OutOfRangeChannel {
        /// Requested channel id.
        channel: usize,
        /// Number of channels in the recording.
        num_channels: usize,
    },

    /// A stored block is too short to serve the requested slice.
    #[error(
        "block for channel {channel}, chunk {chunk} has {actual} samples, expected at least {expected}"
    )]
    BlockSize {
        /// Channel of the block.
        channel: usize,
        /// Chunk index of the block.
        chunk: usize,
        /// Minimum number of samples required.
        expected: usize,
        /// Number of samples actually stored.
        actual: usize,
    },

    /// Signal buffer does not match the declared matrix shape.
    #[error("signal data has {actual} samples, expected {channels} x {timepoints}")]
    MatrixShape {
        /// Declared channel count.
        channels: usize,
        /// Declared timepoint count.
        timepoints: usize,
        /// Number of samples supplied.
        actual: usize,
    },

    /// Channel geometry disagrees with the recording's channel count.
    #[error(
        "incompatible dimensions between geometry ({geometry_channels} channels) and timeseries ({signal_channels} channels)"
    )]
    MalformedGeometry {
        /// Rows found in the geometry file.
        geometry_channels: usize,
        /// Channels in the signal matrix.
        signal_channels: usize,
    },

    /// Clip extraction parameters are invalid.
    #[error("invalid clip configuration: {message}")]
    InvalidClipConfig {
        /// Description of the problem.
        message: String,
    },

    // Configuration errors
    /// Configuration directory could not be determined.
    #[error("could not determine configuration directory for this platform")]
    ConfigDirNotFound,

    /// Failed to read configuration file.
    #[error("failed to read config file '{path}'")]
    ConfigRead {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}'")]
    ConfigParse {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write configuration file.
    #[error("failed to write config file '{path}'")]
    ConfigWrite {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize configuration.
    #[error("failed to serialize config")]
    ConfigSerialize {
        /// Underlying serialization error.
        #[source]
        source: toml::ser::Error,
    },

    // MDA errors
    /// Failed to read an MDA file.
    #[error("failed to read MDA file '{path}'")]
    MdaRead {
        /// Path to the MDA file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// MDA header is malformed.
    #[error("invalid MDA header in '{path}': {message}")]
    MdaHeader {
        /// Path to the MDA file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// MDA data type code is not supported.
    #[error("unsupported MDA data type code {code}")]
    UnsupportedMdaType {
        /// Raw type code from the header.
        code: i32,
    },

    /// MDA array does not have the shape an operation needs.
    #[error("MDA array with dimensions {dims:?} is not a channels x timepoints matrix")]
    MdaShape {
        /// Array dimensions.
        dims: Vec<usize>,
    },

    /// Failed to write an MDA file.
    #[error("failed to write MDA file '{path}'")]
    MdaWrite {
        /// Path to the MDA file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // Chunked store errors
    /// Chunked store directory is missing or unreadable.
    #[error("failed to open chunked store '{path}'")]
    StoreOpen {
        /// Path to the store directory or file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Chunked store metadata could not be parsed.
    #[error("failed to parse chunked store metadata '{path}'")]
    StoreMetadataParse {
        /// Path to the metadata file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Chunked store contents disagree with its metadata.
    #[error("corrupt chunked store '{path}': {message}")]
    StoreCorrupt {
        /// Path to the store directory.
        path: PathBuf,
        /// Description of the inconsistency.
        message: String,
    },

    /// Failed to write a chunked store.
    #[error("failed to write chunked store '{path}'")]
    StoreWrite {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A chunked store already exists where a new one would be written.
    #[error("chunked store already exists: {path} (use --force to replace it)")]
    StoreExists {
        /// Store directory.
        path: PathBuf,
    },

    /// A range query would produce more samples than can be held.
    #[error(
        "range [{t_start}, {t_end}) over {num_channels} channels exceeds the query size limit"
    )]
    RangeTooLarge {
        /// First requested timepoint.
        t_start: i64,
        /// End of the requested interval.
        t_end: i64,
        /// Number of requested channels.
        num_channels: usize,
    },

    // Dataset errors
    /// Dataset directory does not contain any recording.
    #[error("no recording found in dataset '{path}' (expected raw.mda or raw.chunks/)")]
    RecordingNotFound {
        /// Dataset directory.
        path: PathBuf,
    },

    /// Dataset parameter file does not exist.
    #[error("dataset parameter file does not exist: {path}")]
    DatasetParamsNotFound {
        /// Expected path of `params.json`.
        path: PathBuf,
    },

    /// Dataset parameter file could not be read.
    #[error("failed to read dataset parameters '{path}'")]
    DatasetParamsRead {
        /// Path to `params.json`.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Dataset parameters hold an unusable value.
    #[error("invalid dataset parameters '{path}': {message}")]
    InvalidDatasetParams {
        /// Path to `params.json`.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// Dataset parameter file could not be parsed.
    #[error("failed to parse dataset parameters '{path}'")]
    DatasetParamsParse {
        /// Path to `params.json`.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Geometry file could not be parsed.
    #[error("failed to parse geometry file '{path}'")]
    GeometryParse {
        /// Path to `geom.csv`.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Firings array has an unexpected layout.
    #[error("invalid firings file '{path}': {message}")]
    InvalidFirings {
        /// Path to the firings file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    // Output errors
    /// Failed to write CSV output.
    #[error("failed to write CSV output")]
    CsvWrite {
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// Failed to write JSON output.
    #[error("failed to write JSON output")]
    JsonWrite {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Failed to create an output file.
    #[error("failed to create output file '{path}'")]
    OutputCreate {
        /// Path to the output file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error (for unexpected failures).
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}
