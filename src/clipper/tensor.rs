//! Stack of fixed-length clips.

use crate::signal::SignalMatrix;

/// Clips of shape `(channels, clip_len, num_clips)`.
///
/// Stored clip-major, so each clip is one contiguous `channels x clip_len`
/// block.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipTensor {
    channels: Vec<usize>,
    times: Vec<i64>,
    clip_len: usize,
    centering_offset: usize,
    data: Vec<f32>,
}

impl ClipTensor {
    /// Assemble a tensor from per-event clip matrices (one per time).
    pub(crate) fn from_clips(
        channels: Vec<usize>,
        times: Vec<i64>,
        clip_len: usize,
        centering_offset: usize,
        clips: Vec<SignalMatrix>,
    ) -> Self {
        debug_assert_eq!(times.len(), clips.len());
        let mut data = Vec::with_capacity(channels.len() * clip_len * clips.len());
        for clip in clips {
            debug_assert_eq!(clip.shape(), (channels.len(), clip_len));
            data.extend_from_slice(clip.as_slice());
        }
        Self {
            channels,
            times,
            clip_len,
            centering_offset,
            data,
        }
    }

    /// `(channels, clip_len, num_clips)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels.len(), self.clip_len, self.times.len())
    }

    /// Channel ids, in output order.
    #[must_use]
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    /// Center times, one per clip, in output order.
    #[must_use]
    pub fn times(&self) -> &[i64] {
        &self.times
    }

    /// Samples per clip.
    #[must_use]
    pub fn clip_len(&self) -> usize {
        self.clip_len
    }

    /// Index of the center sample inside each clip.
    #[must_use]
    pub fn centering_offset(&self) -> usize {
        self.centering_offset
    }

    /// Number of clips.
    #[must_use]
    pub fn num_clips(&self) -> usize {
        self.times.len()
    }

    /// Sample at `(channel index, offset, clip index)`.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn get(&self, channel: usize, offset: usize, clip: usize) -> f32 {
        self.waveform(clip, channel)[offset]
    }

    /// Waveform of one channel (by index into [`Self::channels`]) in one clip.
    ///
    /// # Panics
    ///
    /// Panics if `clip` or `channel` is out of bounds.
    #[must_use]
    pub fn waveform(&self, clip: usize, channel: usize) -> &[f32] {
        assert!(channel < self.channels.len(), "channel index out of bounds");
        let start = (clip * self.channels.len() + channel) * self.clip_len;
        &self.data[start..start + self.clip_len]
    }

    /// One clip as a `channels x clip_len` matrix.
    ///
    /// # Panics
    ///
    /// Panics if `clip >= num_clips`.
    #[must_use]
    pub fn clip(&self, clip: usize) -> SignalMatrix {
        let size = self.channels.len() * self.clip_len;
        let start = clip * size;
        SignalMatrix::from_vec(
            self.channels.len(),
            self.clip_len,
            self.data[start..start + size].to_vec(),
        )
        .unwrap_or_else(|_| unreachable!("clip slice always matches its shape"))
    }

    /// Iterate over clips as `(center time, clip matrix)`.
    pub fn iter(&self) -> impl Iterator<Item = (i64, SignalMatrix)> + '_ {
        self.times
            .iter()
            .enumerate()
            .map(|(index, &time)| (time, self.clip(index)))
    }
}
