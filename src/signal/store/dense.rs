//! In-memory store: the whole recording as one unpadded chunk.

use std::borrow::Cow;

use super::{BlockStore, StoreMetadata};
use crate::error::Result;
use crate::signal::SignalMatrix;

/// A fully materialized recording.
///
/// Exposes a single chunk per channel with no padding, so every block read
/// is a borrowed slice of the matrix row.
#[derive(Debug, Clone)]
pub struct DenseStore {
    matrix: SignalMatrix,
    metadata: StoreMetadata,
}

impl DenseStore {
    /// Wrap a matrix recorded at `sample_rate` Hz.
    #[must_use]
    pub fn new(matrix: SignalMatrix, sample_rate: f64) -> Self {
        let (num_channels, num_timepoints) = matrix.shape();
        let metadata = StoreMetadata {
            num_channels,
            num_timepoints,
            // A zero-length recording still needs a non-zero divisor.
            chunk_size: num_timepoints.max(1),
            padding: 0,
            num_chunks: 1,
            sample_rate,
        };
        Self { matrix, metadata }
    }

    /// The underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> &SignalMatrix {
        &self.matrix
    }

    /// Consume the store and return its matrix.
    #[must_use]
    pub fn into_matrix(self) -> SignalMatrix {
        self.matrix
    }
}

impl BlockStore for DenseStore {
    fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    fn read_block(&self, channel: usize, chunk: usize) -> Result<Cow<'_, [f32]>> {
        self.metadata.check_block(channel, chunk)?;
        Ok(Cow::Borrowed(self.matrix.row(channel)))
    }
}
