//! CSV output format writer.

use std::io::Write;

use crate::clipper::ClipTensor;
use crate::error::{Error, Result};
use crate::output::{OutputWriter, RangeOutput};

/// CSV format output writer.
///
/// Ranges are written wide (one row per frame, one column per channel);
/// clips are written long (one row per sample).
pub struct CsvWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Create a new CSV writer over `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| Error::Io(e.into_error()))
    }

    fn record<I, T>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(fields)
            .map_err(|e| Error::CsvWrite { source: e })
    }
}

impl<W: Write> OutputWriter for CsvWriter<W> {
    fn write_range(&mut self, range: &RangeOutput<'_>) -> Result<()> {
        let mut header = vec!["frame".to_string(), "time_s".to_string()];
        header.extend(range.channels.iter().map(|ch| format!("ch{ch}")));
        self.record(&header)?;

        let matrix = range.matrix;
        for column in 0..matrix.num_timepoints() {
            #[allow(clippy::cast_possible_wrap)]
            let frame = range.t_start + column as i64;
            #[allow(clippy::cast_precision_loss)]
            let time = frame as f64 / range.sample_rate;

            let mut row = Vec::with_capacity(2 + matrix.num_channels());
            row.push(frame.to_string());
            row.push(time.to_string());
            row.extend((0..matrix.num_channels()).map(|ch| matrix.get(ch, column).to_string()));
            self.record(&row)?;
        }
        Ok(())
    }

    fn write_clips(&mut self, clips: &ClipTensor) -> Result<()> {
        self.record(["clip", "center", "channel", "offset", "value"])?;

        #[allow(clippy::cast_possible_wrap)]
        let center_index = clips.centering_offset() as i64;
        for (index, &center) in clips.times().iter().enumerate() {
            for (position, &channel) in clips.channels().iter().enumerate() {
                for (sample, value) in clips.waveform(index, position).iter().enumerate() {
                    #[allow(clippy::cast_possible_wrap)]
                    let offset = sample as i64 - center_index;
                    self.record([
                        index.to_string(),
                        center.to_string(),
                        channel.to_string(),
                        offset.to_string(),
                        value.to_string(),
                    ])?;
                }
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clipper::ClipExtractor;
    use crate::signal::{DenseStore, RangeReader, SignalMatrix};

    fn reader() -> RangeReader<DenseStore> {
        let matrix =
            SignalMatrix::from_rows(vec![vec![1.0, 2.0, 3.0, 4.0], vec![-1.0, -2.0, -3.0, -4.0]])
                .unwrap();
        RangeReader::new(DenseStore::new(matrix, 2.0))
    }

    #[test]
    fn test_range_rows() {
        let reader = reader();
        let matrix = reader.get_range(2, 5, &[1, 0]).unwrap();
        let mut writer = CsvWriter::new(Vec::new());
        writer
            .write_range(&RangeOutput {
                t_start: 2,
                sample_rate: 2.0,
                channels: &[1, 0],
                matrix: &matrix,
            })
            .unwrap();
        writer.finalize().unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "frame,time_s,ch1,ch0");
        assert_eq!(lines[1], "2,1,-3,3");
        assert_eq!(lines[3], "4,2,0,0");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_clips_long_form() {
        let reader = reader();
        let clips = ClipExtractor::new(2)
            .unwrap()
            .extract(&reader, &[1], Some(&[0]))
            .unwrap();
        let mut writer = CsvWriter::new(Vec::new());
        writer.write_clips(&clips).unwrap();

        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "clip,center,channel,offset,value");
        assert_eq!(lines[1], "0,1,0,0,2");
        assert_eq!(lines[2], "0,1,0,1,3");
    }
}
