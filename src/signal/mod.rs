//! Chunked time-series random access.
//!
//! [`RangeReader`] answers `[t_start, t_end)` x channel queries over any
//! [`BlockStore`], whether the recording is held densely in memory or as
//! padded chunks on disk.

mod matrix;
mod reader;
pub mod store;

pub use matrix::SignalMatrix;
pub use reader::{RangeReader, RangeSource};
pub use store::{BlockStore, ChunkedStore, DenseStore, Store, StoreMetadata};
