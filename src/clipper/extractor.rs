//! Fixed-window clip extraction.

use rayon::prelude::*;
use tracing::debug;

use super::ClipTensor;
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::signal::{RangeSource, SignalMatrix};

/// Default index of the center sample inside a clip of `clip_len` samples.
///
/// Even lengths place the center just left of the midpoint: 24 for 50,
/// 49 for 100, 0 for both 1 and 2.
#[must_use]
pub fn default_centering_offset(clip_len: usize) -> usize {
    (clip_len + 1) / 2 - 1
}

/// Cuts `channels x clip_len` windows around event times.
///
/// Bounds handling is left entirely to the [`RangeSource`]: clips that run
/// past either end of the recording come back zero-filled there.
#[derive(Debug, Clone)]
pub struct ClipExtractor {
    clip_len: usize,
    centering_offset: usize,
    parallel: bool,
}

impl ClipExtractor {
    /// Create an extractor with the default centering offset.
    ///
    /// # Errors
    ///
    /// Returns an error if `clip_len` is zero.
    pub fn new(clip_len: usize) -> Result<Self> {
        if clip_len == 0 {
            return Err(Error::InvalidClipConfig {
                message: "clip length must be at least 1".to_string(),
            });
        }
        Ok(Self {
            clip_len,
            centering_offset: default_centering_offset(clip_len),
            parallel: false,
        })
    }

    /// Build an extractor from the `[extraction]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the clip length or centering offset is invalid.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let extractor = Self::new(config.clip_len)?;
        match config.centering_offset {
            Some(offset) => extractor.with_offset(offset),
            None => Ok(extractor),
        }
    }

    /// Override the centering offset.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` does not fall inside the clip.
    pub fn with_offset(mut self, offset: usize) -> Result<Self> {
        if offset >= self.clip_len {
            return Err(Error::InvalidClipConfig {
                message: format!(
                    "centering offset {offset} must be less than clip length {}",
                    self.clip_len
                ),
            });
        }
        self.centering_offset = offset;
        Ok(self)
    }

    /// Fetch clips on the rayon pool instead of one after another.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
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

    /// Half-open timepoint span of the clip centered at `center`.
    ///
    /// Saturates at the ends of the `i64` range.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn clip_span(&self, center: i64) -> (i64, i64) {
        let start = center.saturating_sub(self.centering_offset as i64);
        (start, start.saturating_add(self.clip_len as i64))
    }

    #[allow(clippy::cast_possible_wrap)]
    fn checked_span(&self, center: i64) -> Option<(i64, i64)> {
        let start = center.checked_sub(self.centering_offset as i64)?;
        Some((start, start.checked_add(self.clip_len as i64)?))
    }

    /// Extract one clip per center, in the order given.
    ///
    /// `channels` of `None` selects every channel of the source. Centers
    /// need not be sorted or unique.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel is out of range or the source fails a
    /// read.
    pub fn extract<S>(
        &self,
        source: &S,
        times: &[i64],
        channels: Option<&[usize]>,
    ) -> Result<ClipTensor>
    where
        S: RangeSource + Sync,
    {
        let channels: Vec<usize> = match channels {
            Some(channels) => channels.to_vec(),
            None => (0..source.num_channels()).collect(),
        };
        // Surface bad channels even when there is nothing to extract.
        source.check_channels(&channels)?;

        debug!(
            "Extracting {} clips of {} samples (offset {}) on {} channels",
            times.len(),
            self.clip_len,
            self.centering_offset,
            channels.len()
        );

        let fetch = |&center: &i64| -> Result<SignalMatrix> {
            match self.checked_span(center) {
                Some((start, end)) => source.get_range(start, end, &channels),
                // unrepresentable spans lie wholly outside any recording
                None => Ok(SignalMatrix::zeros(channels.len(), self.clip_len)),
            }
        };
        let clips = if self.parallel {
            times.par_iter().map(fetch).collect::<Result<Vec<_>>>()?
        } else {
            times.iter().map(fetch).collect::<Result<Vec<_>>>()?
        };

        Ok(ClipTensor::from_clips(
            channels,
            times.to_vec(),
            self.clip_len,
            self.centering_offset,
            clips,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::signal::{DenseStore, RangeReader};

    fn ramp_reader(channels: usize, timepoints: usize) -> RangeReader<DenseStore> {
        #[allow(clippy::cast_precision_loss)]
        let rows = (0..channels)
            .map(|ch| {
                (0..timepoints)
                    .map(|t| (ch * 100_000 + t + 1) as f32)
                    .collect()
            })
            .collect();
        RangeReader::new(DenseStore::new(
            SignalMatrix::from_rows(rows).unwrap(),
            30_000.0,
        ))
    }

    #[test]
    fn test_default_offsets() {
        assert_eq!(default_centering_offset(50), 24);
        assert_eq!(default_centering_offset(100), 49);
        assert_eq!(default_centering_offset(51), 25);
        assert_eq!(default_centering_offset(1), 0);
        assert_eq!(default_centering_offset(2), 0);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            ClipExtractor::new(0),
            Err(Error::InvalidClipConfig { .. })
        ));
    }

    #[test]
    fn test_offset_must_fall_inside_clip() {
        let extractor = ClipExtractor::new(10).unwrap();
        assert!(extractor.clone().with_offset(9).is_ok());
        assert!(extractor.with_offset(10).is_err());
    }

    #[test]
    fn test_extreme_centers_are_zero_clips() {
        let reader = ramp_reader(2, 100);
        let extractor = ClipExtractor::new(10).unwrap();
        let clips = extractor
            .extract(&reader, &[i64::MIN, 50, i64::MAX], None)
            .unwrap();
        assert_eq!(clips.shape(), (2, 10, 3));
        assert!(clips.waveform(0, 1).iter().all(|&v| v == 0.0));
        assert!(clips.waveform(2, 0).iter().all(|&v| v == 0.0));
        assert_eq!(clips.get(0, 4, 1), 51.0);
        assert_eq!(extractor.clip_span(i64::MIN), (i64::MIN, i64::MIN + 10));
    }

    #[test]
    fn test_clip_span_centers_on_event() {
        let extractor = ClipExtractor::new(50).unwrap();
        assert_eq!(extractor.clip_span(1000), (976, 1026));
    }

    #[test]
    fn test_extract_matches_range() {
        let reader = ramp_reader(3, 5000);
        let extractor = ClipExtractor::new(50).unwrap();
        let tensor = extractor.extract(&reader, &[1000, 2000], Some(&[2, 0])).unwrap();

        assert_eq!(tensor.shape(), (2, 50, 2));
        let expected = reader.get_range(976, 1026, &[2, 0]).unwrap();
        assert_eq!(tensor.clip(0), expected);
        // Center sample sits at the offset.
        assert_eq!(tensor.get(1, 24, 1), 2001.0);
    }

    #[test]
    fn test_extract_all_channels_by_default() {
        let reader = ramp_reader(4, 100);
        let tensor = ClipExtractor::new(5)
            .unwrap()
            .extract(&reader, &[50], None)
            .unwrap();
        assert_eq!(tensor.channels(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_edge_clips_are_zero_filled() {
        let reader = ramp_reader(1, 100);
        let extractor = ClipExtractor::new(10).unwrap();
        let tensor = extractor.extract(&reader, &[1, 98], None).unwrap();

        // offset 4: first clip spans [-3, 7)
        let first = tensor.waveform(0, 0);
        assert_eq!(&first[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(first[3], 1.0);
        // second clip spans [94, 104)
        let last = tensor.waveform(1, 0);
        assert_eq!(last[5], 100.0);
        assert_eq!(&last[6..], &[0.0; 4]);
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let reader = ramp_reader(1, 100);
        let tensor = ClipExtractor::new(1)
            .unwrap()
            .extract(&reader, &[30, 10, 30], None)
            .unwrap();
        assert_eq!(tensor.times(), &[30, 10, 30]);
        assert_eq!(tensor.get(0, 0, 0), 31.0);
        assert_eq!(tensor.get(0, 0, 1), 11.0);
        assert_eq!(tensor.get(0, 0, 2), 31.0);
    }

    #[test]
    fn test_empty_times_still_checks_channels() {
        let reader = ramp_reader(2, 10);
        let extractor = ClipExtractor::new(4).unwrap();
        assert_eq!(
            extractor.extract(&reader, &[], None).unwrap().shape(),
            (2, 4, 0)
        );
        assert!(matches!(
            extractor.extract(&reader, &[], Some(&[2])),
            Err(Error::OutOfRangeChannel { channel: 2, .. })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let reader = ramp_reader(3, 1000);
        let times: Vec<i64> = (-20..1020).step_by(37).collect();
        let extractor = ClipExtractor::new(32).unwrap();
        let sequential = extractor.extract(&reader, &times, None).unwrap();
        let parallel = extractor
            .with_parallel(true)
            .extract(&reader, &times, None)
            .unwrap();
        assert_eq!(sequential, parallel);
    }
}
