//! Block-addressable sample stores.
//!
//! A store serves one channel's samples for one chunk at a time, already
//! including the store-wide padding margin. Dense stores hold the whole
//! recording in memory as a single chunk; chunked stores persist fixed-size
//! padded chunks on disk.

mod chunked;
mod dense;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use chunked::ChunkedStore;
pub use dense::DenseStore;

/// Layout and pass-through metadata of a store, fixed at open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Number of channels `M`.
    pub num_channels: usize,
    /// Number of timepoints `N`.
    pub num_timepoints: usize,
    /// Nominal samples per chunk.
    pub chunk_size: usize,
    /// Context samples stored on each side of a chunk.
    pub padding: usize,
    /// Number of chunks per channel.
    pub num_chunks: usize,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
}

impl StoreMetadata {
    /// Samples in one stored block (`chunk_size + 2 * padding`).
    #[must_use]
    pub fn block_len(&self) -> usize {
        self.chunk_size + 2 * self.padding
    }

    /// Native timepoint of the first sample stored for `chunk`.
    ///
    /// Negative for the first chunk when the store is padded.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn chunk_origin(&self, chunk: usize) -> i64 {
        (self.chunk_size * chunk) as i64 - self.padding as i64
    }

    /// Recording duration in seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.num_timepoints as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Validate a channel id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChannel`] if `channel >= num_channels`.
    pub fn check_channel(&self, channel: usize) -> Result<()> {
        if channel >= self.num_channels {
            return Err(Error::OutOfRangeChannel {
                channel,
                num_channels: self.num_channels,
            });
        }
        Ok(())
    }

    /// Validate a `(channel, chunk)` block key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChannel`] or [`Error::OutOfRangeChunk`].
    pub fn check_block(&self, channel: usize, chunk: usize) -> Result<()> {
        self.check_channel(channel)?;
        if chunk >= self.num_chunks {
            return Err(Error::OutOfRangeChunk {
                channel,
                chunk,
                num_chunks: self.num_chunks,
            });
        }
        Ok(())
    }
}

/// Number of `chunk_size` chunks needed to cover `num_timepoints`.
#[must_use]
pub fn chunks_needed(num_timepoints: usize, chunk_size: usize) -> usize {
    num_timepoints.div_ceil(chunk_size)
}

/// A read-only source of raw sample blocks keyed by `(channel, chunk)`.
///
/// Implementations never mutate after open and may be read from many
/// threads at once.
pub trait BlockStore: Send + Sync {
    /// Store layout and pass-through metadata.
    fn metadata(&self) -> &StoreMetadata;

    /// Read one chunk of one channel, padding included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChunk`] for a chunk outside
    /// `[0, num_chunks)`, [`Error::OutOfRangeChannel`] for an unknown
    /// channel, or an I/O error from the backing storage.
    fn read_block(&self, channel: usize, chunk: usize) -> Result<Cow<'_, [f32]>>;
}

/// Any supported store backend.
#[derive(Debug)]
pub enum Store {
    /// In-memory matrix served as a single unpadded chunk.
    Dense(DenseStore),
    /// On-disk padded chunks.
    Chunked(ChunkedStore),
}

impl Store {
    /// Short backend name for display.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Dense(_) => "dense",
            Self::Chunked(_) => "chunked",
        }
    }
}

impl BlockStore for Store {
    fn metadata(&self) -> &StoreMetadata {
        match self {
            Self::Dense(store) => store.metadata(),
            Self::Chunked(store) => store.metadata(),
        }
    }

    fn read_block(&self, channel: usize, chunk: usize) -> Result<Cow<'_, [f32]>> {
        match self {
            Self::Dense(store) => store.read_block(channel, chunk),
            Self::Chunked(store) => store.read_block(channel, chunk),
        }
    }
}

impl From<DenseStore> for Store {
    fn from(store: DenseStore) -> Self {
        Self::Dense(store)
    }
}

impl From<ChunkedStore> for Store {
    fn from(store: ChunkedStore) -> Self {
        Self::Chunked(store)
    }
}
