//! Dense `channels x timepoints` sample matrix.

use rayon::slice::ChunksMut;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// A `channels x timepoints` matrix of samples, stored row-major so each
/// channel's samples are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMatrix {
    num_channels: usize,
    num_timepoints: usize,
    data: Vec<f32>,
}

impl SignalMatrix {
    /// Create a matrix filled with zeros.
    #[must_use]
    pub fn zeros(num_channels: usize, num_timepoints: usize) -> Self {
        Self {
            num_channels,
            num_timepoints,
            data: vec![0.0; num_channels * num_timepoints],
        }
    }

    /// Wrap a row-major sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatrixShape`] if `data.len()` is not
    /// `num_channels * num_timepoints`.
    pub fn from_vec(num_channels: usize, num_timepoints: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != num_channels * num_timepoints {
            return Err(Error::MatrixShape {
                channels: num_channels,
                timepoints: num_timepoints,
                actual: data.len(),
            });
        }
        Ok(Self {
            num_channels,
            num_timepoints,
            data,
        })
    }

    /// Build a matrix from one vector per channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MatrixShape`] if the rows have different lengths.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let num_channels = rows.len();
        let num_timepoints = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != num_timepoints) {
            return Err(Error::MatrixShape {
                channels: num_channels,
                timepoints: num_timepoints,
                actual: row.len(),
            });
        }
        let data: Vec<f32> = rows.into_iter().flatten().collect();
        Self::from_vec(num_channels, num_timepoints, data)
    }

    /// Number of channels (rows).
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of timepoints (columns).
    #[must_use]
    pub fn num_timepoints(&self) -> usize {
        self.num_timepoints
    }

    /// `(channels, timepoints)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.num_channels, self.num_timepoints)
    }

    /// Samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels`.
    #[must_use]
    pub fn row(&self, channel: usize) -> &[f32] {
        let start = channel * self.num_timepoints;
        &self.data[start..start + self.num_timepoints]
    }

    /// Mutable samples of one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= num_channels`.
    pub fn row_mut(&mut self, channel: usize) -> &mut [f32] {
        let start = channel * self.num_timepoints;
        &mut self.data[start..start + self.num_timepoints]
    }

    /// Iterate over channel rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.num_channels).map(move |ch| self.row(ch))
    }

    /// Sample at `(channel, timepoint)`.
    #[must_use]
    pub fn get(&self, channel: usize, timepoint: usize) -> f32 {
        self.data[channel * self.num_timepoints + timepoint]
    }

    /// Row-major view of all samples.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Consume the matrix and return its row-major buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Copy `other` into this matrix starting at column `column`.
    ///
    /// Both matrices must have the same channel count and `other` must fit.
    pub(crate) fn paste_columns(&mut self, column: usize, other: &Self) {
        debug_assert_eq!(self.num_channels, other.num_channels);
        debug_assert!(column + other.num_timepoints <= self.num_timepoints);
        let width = other.num_timepoints;
        for ch in 0..self.num_channels {
            self.row_mut(ch)[column..column + width].copy_from_slice(other.row(ch));
        }
    }

    /// Parallel iterator over mutable rows. Requires at least one timepoint.
    pub(crate) fn par_rows_mut(&mut self) -> ChunksMut<'_, f32> {
        debug_assert!(self.num_timepoints > 0);
        self.data.par_chunks_mut(self.num_timepoints)
    }
}
