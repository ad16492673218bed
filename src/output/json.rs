//! JSON output format writer.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::clipper::ClipTensor;
use crate::error::{Error, Result};
use crate::output::{OutputWriter, RangeOutput};

/// JSON document for a range query.
#[derive(Debug, Serialize, Deserialize)]
pub struct RangePayload {
    /// First frame (inclusive).
    pub t_start: i64,
    /// Last frame (exclusive).
    pub t_end: i64,
    /// Channel ids, one per row of `data`.
    pub channels: Vec<usize>,
    /// Sampling frequency in Hz.
    pub sample_rate: f64,
    /// Samples, one array per channel.
    pub data: Vec<Vec<f32>>,
}

/// JSON document for extracted clips.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClipsPayload {
    /// Samples per clip.
    pub clip_len: usize,
    /// Index of the event sample inside each clip.
    pub centering_offset: usize,
    /// Channel ids, in the order of each clip's rows.
    pub channels: Vec<usize>,
    /// Event times, one per clip.
    pub times: Vec<i64>,
    /// Waveforms indexed `[clip][channel][sample]`.
    pub clips: Vec<Vec<Vec<f32>>>,
}

impl From<&RangeOutput<'_>> for RangePayload {
    fn from(range: &RangeOutput<'_>) -> Self {
        Self {
            t_start: range.t_start,
            t_end: range.t_end(),
            channels: range.channels.to_vec(),
            sample_rate: range.sample_rate,
            data: range.matrix.rows().map(<[f32]>::to_vec).collect(),
        }
    }
}

impl From<&ClipTensor> for ClipsPayload {
    fn from(tensor: &ClipTensor) -> Self {
        let clips = (0..tensor.num_clips())
            .map(|clip| {
                (0..tensor.channels().len())
                    .map(|ch| tensor.waveform(clip, ch).to_vec())
                    .collect()
            })
            .collect();
        Self {
            clip_len: tensor.clip_len(),
            centering_offset: tensor.centering_offset(),
            channels: tensor.channels().to_vec(),
            times: tensor.times().to_vec(),
            clips,
        }
    }
}

/// Writer emitting one pretty-printed JSON document per result.
pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    /// Create a new JSON writer over `sink`.
    pub fn new(sink: W) -> Self {
        Self { writer: sink }
    }

    /// Return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit<T: Serialize>(&mut self, payload: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, payload)
            .map_err(|e| Error::JsonWrite { source: e })?;
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_range(&mut self, range: &RangeOutput<'_>) -> Result<()> {
        self.emit(&RangePayload::from(range))
    }

    fn write_clips(&mut self, clips: &ClipTensor) -> Result<()> {
        self.emit(&ClipsPayload::from(clips))
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
