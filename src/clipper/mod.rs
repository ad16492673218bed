//! Fixed-length clip extraction around event times.
//!
//! Clips are read through a [`crate::signal::RangeSource`], so windows that
//! run off either end of the recording are zero-filled rather than
//! truncated.

pub mod command;
mod extractor;
mod tensor;

pub use extractor::{ClipExtractor, default_centering_offset};
pub use tensor::ClipTensor;
