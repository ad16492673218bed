//! On-disk store of fixed-size padded chunks.
//!
//! A store is a directory holding `store.json` (layout metadata) and
//! `blocks.f32`, a flat file of little-endian `f32` blocks. Block
//! `(channel, chunk)` starts at sample `(channel * num_chunks + chunk) *
//! block_len`, where `block_len = chunk_size + 2 * padding`, and covers
//! native timepoints `[chunk_size * chunk - padding, chunk_size * (chunk + 1)
//! + padding)`. Margins beyond the recording are stored as zeros.

use std::borrow::Cow;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{BlockStore, StoreMetadata, chunks_needed};
use crate::constants::chunked::{BLOCKS_FILE, BYTES_PER_SAMPLE, FORMAT_VERSION, METADATA_FILE};
use crate::error::{Error, Result};
use crate::signal::RangeReader;

/// Contents of `store.json`.
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    #[serde(flatten)]
    metadata: StoreMetadata,
}

/// A chunked store opened for reading.
///
/// Holds one file handle for its whole lifetime; the handle is released
/// when the store is dropped or [`ChunkedStore::close`]d.
#[derive(Debug)]
pub struct ChunkedStore {
    root: PathBuf,
    metadata: StoreMetadata,
    blocks: Mutex<File>,
}

impl ChunkedStore {
    /// Open an existing store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata is missing or malformed, or if the
    /// block file size disagrees with the metadata.
    pub fn open(root: &Path) -> Result<Self> {
        let manifest_path = root.join(METADATA_FILE);
        let contents = fs::read_to_string(&manifest_path).map_err(|e| Error::StoreOpen {
            path: manifest_path.clone(),
            source: e,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&contents).map_err(|e| Error::StoreMetadataParse {
                path: manifest_path,
                source: e,
            })?;
        validate_manifest(root, &manifest)?;

        let blocks_path = root.join(BLOCKS_FILE);
        let file = File::open(&blocks_path).map_err(|e| Error::StoreOpen {
            path: blocks_path.clone(),
            source: e,
        })?;
        let actual = file
            .metadata()
            .map_err(|e| Error::StoreOpen {
                path: blocks_path,
                source: e,
            })?
            .len();
        let expected = total_bytes(&manifest.metadata);
        if actual != expected {
            return Err(Error::StoreCorrupt {
                path: root.to_path_buf(),
                message: format!("block file has {actual} bytes, metadata implies {expected}"),
            });
        }

        let metadata = manifest.metadata;
        debug!(
            "Opened chunked store {}: {} channels x {} timepoints, {} chunks of {} (+{} padding)",
            root.display(),
            metadata.num_channels,
            metadata.num_timepoints,
            metadata.num_chunks,
            metadata.chunk_size,
            metadata.padding
        );

        Ok(Self {
            root: root.to_path_buf(),
            metadata,
            blocks: Mutex::new(file),
        })
    }

    /// Write a new store at `root` from any range reader and open it.
    ///
    /// Padding margins are filled from the neighbouring samples of the
    /// source (zero outside the recording). `on_block` is called once per
    /// written block. The store is assembled in a sibling staging directory
    /// and moved into place only once complete, so a failed write leaves
    /// nothing behind at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreExists`] if `root` already holds a store, or an
    /// error if `chunk_size` is zero, the source cannot be read, or the
    /// store cannot be written.
    pub fn create<S: BlockStore>(
        root: &Path,
        source: &RangeReader<S>,
        chunk_size: usize,
        padding: usize,
        on_block: impl FnMut(),
    ) -> Result<Self> {
        if holds_store(root) {
            return Err(Error::StoreExists {
                path: root.to_path_buf(),
            });
        }
        Self::build(root, source, chunk_size, padding, on_block)
    }

    /// Like [`ChunkedStore::create`], but swaps out any store already at
    /// `root`. The old store is only removed after the new one is complete.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero, the source cannot be read,
    /// or the store cannot be written. The old store is kept on error.
    pub fn replace<S: BlockStore>(
        root: &Path,
        source: &RangeReader<S>,
        chunk_size: usize,
        padding: usize,
        on_block: impl FnMut(),
    ) -> Result<Self> {
        Self::build(root, source, chunk_size, padding, on_block)
    }

    fn build<S: BlockStore>(
        root: &Path,
        source: &RangeReader<S>,
        chunk_size: usize,
        padding: usize,
        on_block: impl FnMut(),
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::ConfigValidation {
                message: "chunk_size must be at least 1".to_string(),
            });
        }

        let staging = sibling(root, "partial")?;
        remove_dir_if_exists(&staging)?;
        if let Err(e) = write_store(&staging, source, chunk_size, padding, on_block) {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!("Could not remove {}: {cleanup}", staging.display());
            }
            return Err(e);
        }
        install(&staging, root)?;

        let store = Self::open(root)?;
        info!(
            "Wrote chunked store {} ({} channels, {} chunks of {} samples)",
            root.display(),
            store.metadata.num_channels,
            store.metadata.num_chunks,
            store.metadata.chunk_size
        );
        Ok(store)
    }

    /// Directory the store was opened from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Release the file handle.
    pub fn close(self) {
        debug!("Closing chunked store {}", self.root.display());
    }
}

impl BlockStore for ChunkedStore {
    fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    fn read_block(&self, channel: usize, chunk: usize) -> Result<Cow<'_, [f32]>> {
        self.metadata.check_block(channel, chunk)?;

        let mut bytes = vec![0u8; self.metadata.block_len() * BYTES_PER_SAMPLE];
        {
            let mut file = self.blocks.lock();
            file.seek(SeekFrom::Start(block_offset(&self.metadata, channel, chunk)))?;
            file.read_exact(&mut bytes)?;
        }

        let samples = bytes
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Cow::Owned(samples))
    }
}

/// Write `store.json` and `blocks.f32` into a fresh directory.
fn write_store<S: BlockStore>(
    dir: &Path,
    source: &RangeReader<S>,
    chunk_size: usize,
    padding: usize,
    mut on_block: impl FnMut(),
) -> Result<()> {
    let src = source.metadata();
    let metadata = StoreMetadata {
        num_channels: src.num_channels,
        num_timepoints: src.num_timepoints,
        chunk_size,
        padding,
        num_chunks: chunks_needed(src.num_timepoints, chunk_size),
        sample_rate: src.sample_rate,
    };

    fs::create_dir_all(dir).map_err(|e| Error::StoreWrite {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let blocks_path = dir.join(BLOCKS_FILE);
    let write_err = |e| Error::StoreWrite {
        path: blocks_path.clone(),
        source: e,
    };
    let mut writer = BufWriter::new(File::create(&blocks_path).map_err(write_err)?);

    #[allow(clippy::cast_possible_wrap)]
    let block_len = metadata.block_len() as i64;
    for channel in 0..metadata.num_channels {
        for chunk in 0..metadata.num_chunks {
            let origin = metadata.chunk_origin(chunk);
            let block = source.get_range(origin, origin + block_len, &[channel])?;
            for sample in block.row(0) {
                writer.write_all(&sample.to_le_bytes()).map_err(write_err)?;
            }
            on_block();
        }
    }
    writer.flush().map_err(write_err)?;
    drop(writer);

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        metadata,
    };
    let manifest_path = dir.join(METADATA_FILE);
    let json =
        serde_json::to_string_pretty(&manifest).map_err(|e| Error::JsonWrite { source: e })?;
    fs::write(&manifest_path, json).map_err(|e| Error::StoreWrite {
        path: manifest_path,
        source: e,
    })
}

/// Move a finished staging directory to `root`, retiring whatever was there.
fn install(staging: &Path, root: &Path) -> Result<()> {
    let move_err = |path: &Path, e| Error::StoreWrite {
        path: path.to_path_buf(),
        source: e,
    };

    if !root.exists() {
        return fs::rename(staging, root).map_err(|e| move_err(root, e));
    }

    let retired = sibling(root, "old")?;
    remove_dir_if_exists(&retired)?;
    fs::rename(root, &retired).map_err(|e| move_err(root, e))?;
    if let Err(e) = fs::rename(staging, root) {
        if let Err(restore) = fs::rename(&retired, root) {
            warn!("Could not restore {}: {restore}", root.display());
        }
        return Err(move_err(root, e));
    }
    remove_dir_if_exists(&retired)
}

/// `<parent>/.<name>.<suffix>` next to `root`.
fn sibling(root: &Path, suffix: &str) -> Result<PathBuf> {
    let name = root.file_name().ok_or_else(|| Error::StoreWrite {
        path: root.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidInput, "store path has no file name"),
    })?;
    let mut sibling_name = OsString::from(".");
    sibling_name.push(name);
    sibling_name.push(".");
    sibling_name.push(suffix);
    Ok(root.with_file_name(sibling_name))
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(Error::StoreWrite {
            path: dir.to_path_buf(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// Whether `root` already contains store files.
fn holds_store(root: &Path) -> bool {
    root.join(METADATA_FILE).exists() || root.join(BLOCKS_FILE).exists()
}

/// Byte offset of block `(channel, chunk)` in the block file.
fn block_offset(metadata: &StoreMetadata, channel: usize, chunk: usize) -> u64 {
    let index = channel * metadata.num_chunks + chunk;
    (index * metadata.block_len() * BYTES_PER_SAMPLE) as u64
}

/// Expected size of the block file.
fn total_bytes(metadata: &StoreMetadata) -> u64 {
    let blocks = metadata.num_channels * metadata.num_chunks;
    (blocks * metadata.block_len() * BYTES_PER_SAMPLE) as u64
}

fn validate_manifest(root: &Path, manifest: &Manifest) -> Result<()> {
    let corrupt = |message: String| Error::StoreCorrupt {
        path: root.to_path_buf(),
        message,
    };
    let meta = &manifest.metadata;

    if manifest.format_version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            manifest.format_version
        )));
    }
    if meta.chunk_size == 0 {
        return Err(corrupt("chunk_size is zero".to_string()));
    }
    if meta.chunk_size * meta.num_chunks < meta.num_timepoints {
        return Err(corrupt(format!(
            "{} chunks of {} samples cannot cover {} timepoints",
            meta.num_chunks, meta.chunk_size, meta.num_timepoints
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::signal::{DenseStore, SignalMatrix};
    use tempfile::TempDir;

    fn ramp_reader(channels: usize, timepoints: usize) -> RangeReader<DenseStore> {
        #[allow(clippy::cast_precision_loss)]
        let rows = (0..channels)
            .map(|ch| {
                (0..timepoints)
                    .map(|t| (ch * 10_000 + t) as f32)
                    .collect()
            })
            .collect();
        let matrix = SignalMatrix::from_rows(rows).unwrap();
        RangeReader::new(DenseStore::new(matrix, 30_000.0))
    }

    #[test]
    fn test_create_writes_padded_blocks() {
        let dir = TempDir::new().unwrap();
        let source = ramp_reader(2, 25);
        let store = ChunkedStore::create(dir.path(), &source, 10, 2, || {}).unwrap();

        let meta = store.metadata();
        assert_eq!(meta.num_chunks, 3);
        assert_eq!(meta.block_len(), 14);

        // First block: two zero margin samples, then timepoints 0..12.
        let block = store.read_block(0, 0).unwrap();
        assert_eq!(block[0], 0.0);
        assert_eq!(block[1], 0.0);
        assert_eq!(block[2], 0.0);
        assert_eq!(block[3], 1.0);
        assert_eq!(block[13], 11.0);

        // Second channel, middle block starts at timepoint 8.
        let block = store.read_block(1, 1).unwrap();
        assert_eq!(block[0], 10_008.0);

        // Last block runs past the recording end (timepoint 25 onward is zero).
        let block = store.read_block(0, 2).unwrap();
        assert_eq!(block[0], 18.0);
        assert_eq!(block[6], 24.0);
        assert_eq!(block[7], 0.0);
    }

    #[test]
    fn test_open_round_trips_metadata() {
        let dir = TempDir::new().unwrap();
        let source = ramp_reader(3, 40);
        ChunkedStore::create(dir.path(), &source, 16, 4, || {})
            .unwrap()
            .close();

        let store = ChunkedStore::open(dir.path()).unwrap();
        assert_eq!(store.metadata().num_channels, 3);
        assert_eq!(store.metadata().num_timepoints, 40);
        assert_eq!(store.metadata().sample_rate, 30_000.0);
        assert_eq!(store.root(), dir.path());
    }

    #[test]
    fn test_open_detects_truncated_block_file() {
        let dir = TempDir::new().unwrap();
        let source = ramp_reader(1, 20);
        ChunkedStore::create(dir.path(), &source, 10, 0, || {})
            .unwrap()
            .close();

        let blocks = dir.path().join(BLOCKS_FILE);
        let bytes = fs::read(&blocks).unwrap();
        fs::write(&blocks, &bytes[..bytes.len() - 4]).unwrap();

        assert!(matches!(
            ChunkedStore::open(dir.path()),
            Err(Error::StoreCorrupt { .. })
        ));
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ChunkedStore::open(&missing),
            Err(Error::StoreOpen { .. })
        ));
    }

    #[test]
    fn test_read_block_out_of_range_chunk() {
        let dir = TempDir::new().unwrap();
        let source = ramp_reader(1, 20);
        let store = ChunkedStore::create(dir.path(), &source, 10, 1, || {}).unwrap();
        assert!(matches!(
            store.read_block(0, 2),
            Err(Error::OutOfRangeChunk {
                chunk: 2,
                num_chunks: 2,
                ..
            })
        ));
    }

    struct FailingStore {
        metadata: StoreMetadata,
    }

    impl BlockStore for FailingStore {
        fn metadata(&self) -> &StoreMetadata {
            &self.metadata
        }

        fn read_block(&self, _channel: usize, _chunk: usize) -> Result<Cow<'_, [f32]>> {
            Err(Error::StoreCorrupt {
                path: PathBuf::from("failing"),
                message: "unreadable".to_string(),
            })
        }
    }

    #[test]
    fn test_create_refuses_existing_store() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("raw.chunks");
        ChunkedStore::create(&root, &ramp_reader(1, 20), 10, 0, || {})
            .unwrap()
            .close();

        assert!(matches!(
            ChunkedStore::create(&root, &ramp_reader(1, 20), 5, 0, || {}),
            Err(Error::StoreExists { .. })
        ));
        assert_eq!(ChunkedStore::open(&root).unwrap().metadata().chunk_size, 10);
    }

    #[test]
    fn test_replace_swaps_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("raw.chunks");
        ChunkedStore::create(&root, &ramp_reader(2, 30), 10, 0, || {})
            .unwrap()
            .close();

        let store = ChunkedStore::replace(&root, &ramp_reader(2, 30), 7, 3, || {}).unwrap();
        assert_eq!(store.metadata().chunk_size, 7);
        assert_eq!(store.metadata().padding, 3);
        store.close();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("raw.chunks")]);
    }

    #[test]
    fn test_failed_replace_keeps_old_store() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("raw.chunks");
        ChunkedStore::create(&root, &ramp_reader(1, 20), 10, 0, || {})
            .unwrap()
            .close();

        let failing = RangeReader::new(FailingStore {
            metadata: StoreMetadata {
                num_channels: 1,
                num_timepoints: 10,
                chunk_size: 10,
                padding: 0,
                num_chunks: 1,
                sample_rate: 1000.0,
            },
        });
        assert!(ChunkedStore::replace(&root, &failing, 5, 0, || {}).is_err());

        // old store intact, no staging left behind
        let store = ChunkedStore::open(&root).unwrap();
        assert_eq!(store.metadata().chunk_size, 10);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_create_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("raw.chunks");
        let failing = RangeReader::new(FailingStore {
            metadata: StoreMetadata {
                num_channels: 2,
                num_timepoints: 10,
                chunk_size: 10,
                padding: 0,
                num_chunks: 1,
                sample_rate: 1000.0,
            },
        });
        assert!(ChunkedStore::create(&root, &failing, 4, 0, || {}).is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_counts_blocks() {
        let dir = TempDir::new().unwrap();
        let source = ramp_reader(2, 30);
        let mut written = 0;
        ChunkedStore::create(dir.path(), &source, 10, 0, || written += 1).unwrap();
        assert_eq!(written, 6);
    }
}
