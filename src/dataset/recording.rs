//! A dataset directory opened for reading.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{DatasetParams, Firings, Geometry, default_location};
use crate::clipper::{ClipExtractor, ClipTensor};
use crate::config::StoreKind;
use crate::constants::dataset::{FIRINGS_MDA, GEOM_CSV, PARAMS_JSON, RAW_CHUNKS, RAW_MDA};
use crate::error::{Error, Result};
use crate::mda::read_mda;
use crate::signal::{
    BlockStore, ChunkedStore, DenseStore, RangeReader, RangeSource, SignalMatrix, Store,
    StoreMetadata,
};

/// A recording backed by either `raw.mda` (dense) or `raw.chunks/`.
#[derive(Debug)]
pub struct Recording {
    root: PathBuf,
    reader: RangeReader<Store>,
    geometry: Option<Geometry>,
    parallel: bool,
}

impl Recording {
    /// Open the dataset at `root` with the requested backend.
    ///
    /// [`StoreKind::Auto`] prefers the chunked store when both exist.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable recording exists, the parameters are
    /// missing for a dense recording, or `geom.csv` disagrees with the
    /// channel count.
    pub fn open(root: &Path, kind: StoreKind) -> Result<Self> {
        let chunks_dir = root.join(RAW_CHUNKS);
        let raw_path = root.join(RAW_MDA);
        let params_path = root.join(PARAMS_JSON);

        let kind = match kind {
            StoreKind::Auto if chunks_dir.is_dir() => StoreKind::Chunked,
            StoreKind::Auto if raw_path.is_file() => StoreKind::Dense,
            StoreKind::Auto => {
                return Err(Error::RecordingNotFound {
                    path: root.to_path_buf(),
                });
            }
            other => other,
        };

        let store = match kind {
            StoreKind::Chunked => {
                let store = ChunkedStore::open(&chunks_dir)?;
                if params_path.exists() {
                    let params = DatasetParams::load(&params_path)?;
                    if (params.samplerate - store.metadata().sample_rate).abs() > f64::EPSILON {
                        warn!(
                            "params.json sample rate {} differs from chunked store {}; using the store's",
                            params.samplerate,
                            store.metadata().sample_rate
                        );
                    }
                }
                Store::Chunked(store)
            }
            _ => {
                if !raw_path.is_file() {
                    return Err(Error::RecordingNotFound {
                        path: root.to_path_buf(),
                    });
                }
                let params = DatasetParams::load(&params_path)?;
                let matrix = read_mda(&raw_path)?.into_signal_matrix()?;
                Store::Dense(DenseStore::new(matrix, params.samplerate))
            }
        };

        let geom_path = root.join(GEOM_CSV);
        let geometry = if geom_path.exists() {
            let geometry = Geometry::load(&geom_path)?;
            geometry.check_channels(store.metadata().num_channels)?;
            Some(geometry)
        } else {
            None
        };

        debug!(
            "Opened {} recording {}: {} channels x {} frames at {} Hz",
            store.backend_name(),
            root.display(),
            store.metadata().num_channels,
            store.metadata().num_timepoints,
            store.metadata().sample_rate
        );

        Ok(Self {
            root: root.to_path_buf(),
            reader: RangeReader::new(store),
            geometry,
            parallel: false,
        })
    }

    /// Run range queries and snippet extraction on the rayon pool.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.reader = self.reader.with_parallel(parallel);
        self.parallel = parallel;
        self
    }

    /// Dataset directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The range reader over the opened store.
    #[must_use]
    pub fn reader(&self) -> &RangeReader<Store> {
        &self.reader
    }

    /// Layout of the opened store.
    #[must_use]
    pub fn metadata(&self) -> &StoreMetadata {
        self.reader.metadata()
    }

    /// `"dense"` or `"chunked"`.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.reader.store().backend_name()
    }

    /// Number of channels.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.metadata().num_channels
    }

    /// Number of frames (timepoints).
    #[must_use]
    pub fn num_frames(&self) -> usize {
        self.metadata().num_timepoints
    }

    /// Sampling frequency in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.metadata().sample_rate
    }

    /// Time in seconds of `frame`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_to_time(&self, frame: i64) -> f64 {
        frame as f64 / self.sample_rate()
    }

    /// Nearest frame to `time` seconds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn time_to_frame(&self, time: f64) -> i64 {
        (time * self.sample_rate()).round() as i64
    }

    /// Whether `geom.csv` was present.
    #[must_use]
    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    /// Location of `channel`, from `geom.csv` or a default vertical layout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRangeChannel`] for an unknown channel.
    pub fn channel_location(&self, channel: usize) -> Result<Vec<f64>> {
        self.metadata().check_channel(channel)?;
        Ok(self
            .geometry
            .as_ref()
            .and_then(|g| g.location(channel))
            .map_or_else(|| default_location(channel), <[f64]>::to_vec))
    }

    /// Traces for `[start, end)` on `channels`.
    ///
    /// Defaults to the whole recording and every channel.
    ///
    /// # Errors
    ///
    /// Returns an error if a channel is out of range or the store fails.
    #[allow(clippy::cast_possible_wrap)]
    pub fn get_traces(
        &self,
        start: Option<i64>,
        end: Option<i64>,
        channels: Option<&[usize]>,
    ) -> Result<SignalMatrix> {
        let start = start.unwrap_or(0);
        let end = end.unwrap_or(self.num_frames() as i64);
        match channels {
            Some(channels) => self.reader.get_range(start, end, channels),
            None => self.reader.get_range(start, end, &self.reader.all_channels()),
        }
    }

    /// Fixed-length snippets centered on `centers`, with the default
    /// centering offset.
    ///
    /// # Errors
    ///
    /// Returns an error if `snippet_len` is zero, a channel is out of range,
    /// or the store fails.
    pub fn get_snippets(
        &self,
        snippet_len: usize,
        centers: &[i64],
        channels: Option<&[usize]>,
    ) -> Result<ClipTensor> {
        ClipExtractor::new(snippet_len)?
            .with_parallel(self.parallel)
            .extract(&self.reader, centers, channels)
    }

    /// Load `firings.mda` from the dataset directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load_firings(&self) -> Result<Firings> {
        Firings::load(&self.root.join(FIRINGS_MDA))
    }
}

impl RangeSource for Recording {
    fn num_channels(&self) -> usize {
        Self::num_channels(self)
    }

    fn get_range(&self, t_start: i64, t_end: i64, channels: &[usize]) -> Result<SignalMatrix> {
        self.reader.get_range(t_start, t_end, channels)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::mda::write_mda_f32;
    use tempfile::TempDir;

    fn dataset(channels: usize, frames: usize) -> (TempDir, SignalMatrix) {
        let dir = TempDir::new().unwrap();
        #[allow(clippy::cast_precision_loss)]
        let rows = (0..channels)
            .map(|ch| (0..frames).map(|t| (ch * 1000 + t) as f32).collect())
            .collect();
        let matrix = SignalMatrix::from_rows(rows).unwrap();
        write_mda_f32(&dir.path().join(RAW_MDA), &matrix).unwrap();
        DatasetParams::new(20_000.0)
            .save(&dir.path().join(PARAMS_JSON))
            .unwrap();
        (dir, matrix)
    }

    #[test]
    fn test_open_dense() {
        let (dir, _) = dataset(3, 200);
        let rec = Recording::open(dir.path(), StoreKind::Auto).unwrap();
        assert_eq!(rec.backend_name(), "dense");
        assert_eq!(rec.num_channels(), 3);
        assert_eq!(rec.num_frames(), 200);
        assert_eq!(rec.sample_rate(), 20_000.0);
        assert_eq!(rec.frame_to_time(10_000), 0.5);
        assert_eq!(rec.time_to_frame(0.5), 10_000);
    }

    #[test]
    fn test_empty_directory_has_no_recording() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Recording::open(dir.path(), StoreKind::Auto),
            Err(Error::RecordingNotFound { .. })
        ));
    }

    #[test]
    fn test_dense_requires_params() {
        let (dir, _) = dataset(1, 10);
        std::fs::remove_file(dir.path().join(PARAMS_JSON)).unwrap();
        assert!(matches!(
            Recording::open(dir.path(), StoreKind::Dense),
            Err(Error::DatasetParamsNotFound { .. })
        ));
    }

    #[test]
    fn test_geometry_mismatch_fails_open() {
        let (dir, _) = dataset(3, 10);
        std::fs::write(dir.path().join(GEOM_CSV), "0,0\n0,20\n").unwrap();
        assert!(matches!(
            Recording::open(dir.path(), StoreKind::Auto),
            Err(Error::MalformedGeometry {
                geometry_channels: 2,
                signal_channels: 3
            })
        ));
    }

    #[test]
    fn test_channel_locations() {
        let (dir, _) = dataset(2, 10);
        let rec = Recording::open(dir.path(), StoreKind::Auto).unwrap();
        assert!(!rec.has_geometry());
        assert_eq!(rec.channel_location(1).unwrap(), vec![0.0, -2.0]);
        assert!(rec.channel_location(2).is_err());

        std::fs::write(dir.path().join(GEOM_CSV), "5,0\n5,25\n").unwrap();
        let rec = Recording::open(dir.path(), StoreKind::Auto).unwrap();
        assert_eq!(rec.channel_location(1).unwrap(), vec![5.0, 25.0]);
    }

    #[test]
    fn test_traces_default_to_everything() {
        let (dir, matrix) = dataset(2, 50);
        let rec = Recording::open(dir.path(), StoreKind::Auto).unwrap();
        assert_eq!(rec.get_traces(None, None, None).unwrap(), matrix);

        let part = rec.get_traces(Some(48), Some(52), Some(&[1])).unwrap();
        assert_eq!(part.row(0), &[1048.0, 1049.0, 0.0, 0.0]);
    }

    #[test]
    fn test_chunked_preferred_when_present() {
        let (dir, matrix) = dataset(2, 95);
        {
            let dense = Recording::open(dir.path(), StoreKind::Dense).unwrap();
            let source = RangeReader::new(DenseStore::new(matrix.clone(), dense.sample_rate()));
            ChunkedStore::create(&dir.path().join(RAW_CHUNKS), &source, 20, 3, || {}).unwrap();
        }
        let rec = Recording::open(dir.path(), StoreKind::Auto).unwrap();
        assert_eq!(rec.backend_name(), "chunked");
        assert_eq!(rec.sample_rate(), 20_000.0);
        assert_eq!(rec.get_traces(None, None, None).unwrap(), matrix);

        let dense = Recording::open(dir.path(), StoreKind::Dense).unwrap();
        assert_eq!(dense.backend_name(), "dense");
    }

    #[test]
    fn test_snippets() {
        let (dir, _) = dataset(2, 100);
        let rec = Recording::open(dir.path(), StoreKind::Auto).unwrap();
        let snippets = rec.get_snippets(4, &[10, 99], Some(&[1])).unwrap();
        // offset 1: [9, 13) and [98, 102)
        assert_eq!(snippets.waveform(0, 0), &[1009.0, 1010.0, 1011.0, 1012.0]);
        assert_eq!(snippets.waveform(1, 0), &[1098.0, 1099.0, 0.0, 0.0]);
    }
}
