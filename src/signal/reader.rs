//! Arbitrary time-range / channel-subset queries over a block store.

use rayon::prelude::*;
use tracing::debug;

use super::store::{BlockStore, StoreMetadata};
use super::SignalMatrix;
use crate::constants::MAX_QUERY_SAMPLES;
use crate::error::{Error, Result};

/// Anything that can answer half-open `[t_start, t_end)` range queries.
///
/// Implementations must return a `(channels.len(), t_end - t_start)`
/// matrix with zeros wherever the interval leaves the recording.
pub trait RangeSource {
    /// Number of channels in the recording.
    fn num_channels(&self) -> usize;

    /// Fetch `[t_start, t_end)` for the given channels, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChannel`] for an unknown channel or any
    /// error raised by the backing store.
    fn get_range(&self, t_start: i64, t_end: i64, channels: &[usize]) -> Result<SignalMatrix>;

    /// Validate channel ids without reading any samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChannel`] for the first unknown channel.
    fn check_channels(&self, channels: &[usize]) -> Result<()> {
        let num_channels = self.num_channels();
        match channels.iter().find(|&&ch| ch >= num_channels) {
            Some(&channel) => Err(Error::OutOfRangeChannel {
                channel,
                num_channels,
            }),
            None => Ok(()),
        }
    }
}

/// Range reader over a [`BlockStore`].
///
/// Decomposes each query into the chunks it touches, stitches the blocks
/// together and zero-fills whatever part of the query lies outside
/// `[0, num_timepoints)`. Holds no state between calls.
#[derive(Debug)]
pub struct RangeReader<S> {
    store: S,
    parallel: bool,
}

impl<S: BlockStore> RangeReader<S> {
    /// Create a sequential reader over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            parallel: false,
        }
    }

    /// Assemble channel rows on the rayon pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the reader and return its store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Store layout and pass-through metadata.
    #[must_use]
    pub fn metadata(&self) -> &StoreMetadata {
        self.store.metadata()
    }

    /// Number of timepoints `N`.
    #[must_use]
    pub fn num_timepoints(&self) -> usize {
        self.metadata().num_timepoints
    }

    /// Sampling rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.metadata().sample_rate
    }

    /// Channel ids `0..M`.
    #[must_use]
    pub fn all_channels(&self) -> Vec<usize> {
        (0..self.metadata().num_channels).collect()
    }

    /// Fetch `[t_start, t_end)` for `channels`.
    ///
    /// The result always has shape `(channels.len(), t_end - t_start)`;
    /// samples outside the recording are zero. A degenerate range
    /// (`t_end <= t_start`) yields a matrix with zero columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChannel`] before any I/O if a channel is
    /// unknown, [`Error::RangeTooLarge`] if the result would exceed
    /// [`MAX_QUERY_SAMPLES`], or the first error raised by the store. No
    /// partial result is returned.
    pub fn get_range(&self, t_start: i64, t_end: i64, channels: &[usize]) -> Result<SignalMatrix> {
        self.check_channels(channels)?;
        if t_end <= t_start {
            return Ok(SignalMatrix::zeros(channels.len(), 0));
        }
        check_query_size(t_start, t_end, channels.len())?;
        self.read_clamped(t_start, t_end, channels)
    }

    /// Split off any out-of-recording part, then read the overlap.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn read_clamped(&self, t_start: i64, t_end: i64, channels: &[usize]) -> Result<SignalMatrix> {
        let n = self.num_timepoints() as i64;
        if t_start >= 0 && t_end <= n {
            return self.read_in_bounds(t_start as usize, t_end as usize, channels);
        }

        let mut out = SignalMatrix::zeros(channels.len(), (t_end - t_start) as usize);
        let overlap_start = t_start.max(0);
        let overlap_end = t_end.min(n);
        if overlap_end > overlap_start {
            let inner = self.read_clamped(overlap_start, overlap_end, channels)?;
            out.paste_columns((overlap_start - t_start) as usize, &inner);
        }
        Ok(out)
    }

    /// Read a non-empty range that lies inside the recording.
    fn read_in_bounds(&self, t_start: usize, t_end: usize, channels: &[usize]) -> Result<SignalMatrix> {
        let chunk_size = self.metadata().chunk_size;
        let first_chunk = t_start / chunk_size;
        let last_chunk = (t_end - 1) / chunk_size;
        debug!(
            "Range [{t_start}, {t_end}) x {} channels spans chunks {first_chunk}..={last_chunk}",
            channels.len()
        );

        let mut out = SignalMatrix::zeros(channels.len(), t_end - t_start);

        if self.parallel && channels.len() > 1 {
            out.par_rows_mut()
                .zip(channels.par_iter())
                .try_for_each(|(row, &channel)| {
                    (first_chunk..=last_chunk).try_for_each(|chunk| {
                        let (t1, t2) = chunk_span(chunk_size, chunk, t_start, t_end);
                        self.copy_block(row, channel, chunk, t_start, t1, t2)
                    })
                })?;
        } else {
            for chunk in first_chunk..=last_chunk {
                let (t1, t2) = chunk_span(chunk_size, chunk, t_start, t_end);
                for (index, &channel) in channels.iter().enumerate() {
                    self.copy_block(out.row_mut(index), channel, chunk, t_start, t1, t2)?;
                }
            }
        }

        Ok(out)
    }

    /// Copy native timepoints `[t1, t2)` of one block into `row`, whose
    /// first column is timepoint `row_start`.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn copy_block(
        &self,
        row: &mut [f32],
        channel: usize,
        chunk: usize,
        row_start: usize,
        t1: usize,
        t2: usize,
    ) -> Result<()> {
        let block = self.store.read_block(channel, chunk)?;
        let origin = self.metadata().chunk_origin(chunk);
        let src_start = (t1 as i64 - origin) as usize;
        let src_end = (t2 as i64 - origin) as usize;
        if block.len() < src_end {
            return Err(Error::BlockSize {
                channel,
                chunk,
                expected: src_end,
                actual: block.len(),
            });
        }
        row[t1 - row_start..t2 - row_start].copy_from_slice(&block[src_start..src_end]);
        Ok(())
    }
}

impl<S: BlockStore> RangeSource for RangeReader<S> {
    fn num_channels(&self) -> usize {
        self.metadata().num_channels
    }

    fn get_range(&self, t_start: i64, t_end: i64, channels: &[usize]) -> Result<SignalMatrix> {
        Self::get_range(self, t_start, t_end, channels)
    }
}

/// Reject queries whose output would not fit in memory.
fn check_query_size(t_start: i64, t_end: i64, num_channels: usize) -> Result<()> {
    let samples = t_end
        .checked_sub(t_start)
        .and_then(|width| usize::try_from(width).ok())
        .and_then(|width| width.checked_mul(num_channels.max(1)));
    match samples {
        Some(samples) if samples <= MAX_QUERY_SAMPLES => Ok(()),
        _ => Err(Error::RangeTooLarge {
            t_start,
            t_end,
            num_channels,
        }),
    }
}

/// Part of `[t_start, t_end)` that falls in `chunk`.
fn chunk_span(chunk_size: usize, chunk: usize, t_start: usize, t_end: usize) -> (usize, usize) {
    let chunk_start = chunk_size * chunk;
    let chunk_end = chunk_start + chunk_size;
    (t_start.max(chunk_start), t_end.min(chunk_end))
}
