//! Output writer trait definition.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::clipper::ClipTensor;
use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::output::{CsvWriter, JsonWriter};
use crate::signal::SignalMatrix;

/// A range query result together with the context needed to label it.
#[derive(Debug, Clone, Copy)]
pub struct RangeOutput<'a> {
    /// First frame of the range.
    pub t_start: i64,
    /// Sampling frequency in Hz.
    pub sample_rate: f64,
    /// Channel ids, one per matrix row.
    pub channels: &'a [usize],
    /// The queried samples.
    pub matrix: &'a SignalMatrix,
}

impl RangeOutput<'_> {
    /// One past the last frame of the range.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn t_end(&self) -> i64 {
        self.t_start + self.matrix.num_timepoints() as i64
    }
}

/// Trait for writing query results.
pub trait OutputWriter {
    /// Write a range query result.
    fn write_range(&mut self, range: &RangeOutput<'_>) -> Result<()>;

    /// Write extracted clips.
    fn write_clips(&mut self, clips: &ClipTensor) -> Result<()>;

    /// Finalize the output (flush, close, etc.).
    fn finalize(&mut self) -> Result<()>;
}

/// Create a writer for `format` targeting `path`, or stdout when `None`.
///
/// # Errors
///
/// Returns an error if the output file cannot be created.
pub fn create_writer(format: OutputFormat, path: Option<&Path>) -> Result<Box<dyn OutputWriter>> {
    let sink: Box<dyn Write> = match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| Error::OutputCreate {
                path: path.to_path_buf(),
                source: e,
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    Ok(match format {
        OutputFormat::Csv => Box::new(CsvWriter::new(sink)),
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
    })
}
