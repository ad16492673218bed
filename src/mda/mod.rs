//! Reading and writing `.mda` arrays.
//!
//! An MDA file is a small little-endian header (type code, bytes per
//! entry, dimension count, dimensions) followed by the elements in
//! column-major order. Recordings are `channels x timepoints`; firings
//! tables are `R x events`.

mod header;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::signal::SignalMatrix;

pub use header::{MdaHeader, MdaType};

/// An MDA array held in memory.
///
/// Elements are widened to `f64` so integer event times stay exact.
#[derive(Debug, Clone, PartialEq)]
pub struct MdaArray {
    dtype: MdaType,
    dims: Vec<usize>,
    data: Vec<f64>,
}

impl MdaArray {
    /// Element type the array was stored as.
    #[must_use]
    pub fn dtype(&self) -> MdaType {
        self.dtype
    }

    /// Dimensions, first index fastest.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Elements in column-major order.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// `(rows, columns)` if the array is two-dimensional, treating trailing
    /// singleton dimensions as absent and a 1-D array as a single row.
    #[must_use]
    pub fn shape_2d(&self) -> Option<(usize, usize)> {
        match self.dims.as_slice() {
            [n] => Some((1, *n)),
            [m, n, rest @ ..] if rest.iter().all(|&d| d == 1) => Some((*m, *n)),
            _ => None,
        }
    }

    /// Element at `(row, column)` of a two-dimensional array.
    #[must_use]
    pub fn get_2d(&self, row: usize, column: usize) -> Option<f64> {
        let (rows, columns) = self.shape_2d()?;
        if row >= rows || column >= columns {
            return None;
        }
        self.data.get(row + rows * column).copied()
    }

    /// Convert a `channels x timepoints` array into a row-major matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MdaShape`] if the array is not two-dimensional.
    #[allow(clippy::cast_possible_truncation)]
    pub fn into_signal_matrix(self) -> Result<SignalMatrix> {
        let (channels, timepoints) = self
            .shape_2d()
            .ok_or_else(|| Error::MdaShape {
                dims: self.dims.clone(),
            })?;
        let mut matrix = SignalMatrix::zeros(channels, timepoints);
        for channel in 0..channels {
            let row = matrix.row_mut(channel);
            for (t, sample) in row.iter_mut().enumerate() {
                *sample = self.data[channel + channels * t] as f32;
            }
        }
        Ok(matrix)
    }
}

/// Read only the header of an MDA file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the header is invalid.
pub fn read_mda_header(path: &Path) -> Result<MdaHeader> {
    let mut reader = open(path)?;
    MdaHeader::read_from(&mut reader, path)
}

/// Read a whole MDA file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the header is invalid, or
/// the data section is shorter than the header implies.
pub fn read_mda(path: &Path) -> Result<MdaArray> {
    let mut reader = open(path)?;
    let header = MdaHeader::read_from(&mut reader, path)?;

    let header_err = |message: String| Error::MdaHeader {
        path: path.to_path_buf(),
        message,
    };
    let expected = header
        .data_bytes()
        .ok_or_else(|| header_err(format!("dimensions {:?} overflow", header.dims)))?;

    // Check the header against the file before allocating for it.
    let remaining = remaining_bytes(&mut reader).map_err(|e| Error::MdaRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if remaining < expected as u64 {
        return Err(header_err(format!(
            "data section has {remaining} bytes, header implies {expected}"
        )));
    }

    let mut bytes = Vec::with_capacity(expected);
    reader
        .take(expected as u64)
        .read_to_end(&mut bytes)
        .map_err(|e| Error::MdaRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    if bytes.len() != expected {
        return Err(header_err(format!(
            "data section has {} bytes, header implies {expected}",
            bytes.len()
        )));
    }

    let size = header.dtype.size();
    let data = bytes
        .chunks_exact(size)
        .map(|b| header.dtype.decode(b))
        .collect();

    debug!(
        "Read MDA {} ({:?}, dims {:?})",
        path.display(),
        header.dtype,
        header.dims
    );

    Ok(MdaArray {
        dtype: header.dtype,
        dims: header.dims,
        data,
    })
}

/// Write a matrix as a 2-D `f32` MDA file (`channels x timepoints`).
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_mda_f32(path: &Path, matrix: &SignalMatrix) -> Result<()> {
    let write_err = |e| Error::MdaWrite {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);

    let (channels, timepoints) = matrix.shape();
    let header = MdaHeader {
        dtype: MdaType::Float32,
        dims: vec![channels, timepoints],
    };
    header.write_to(&mut writer, path)?;

    for t in 0..timepoints {
        for channel in 0..channels {
            writer
                .write_all(&matrix.get(channel, t).to_le_bytes())
                .map_err(write_err)?;
        }
    }
    writer.flush().map_err(write_err)?;

    debug!(
        "Wrote MDA {} ({channels} x {timepoints} f32)",
        path.display()
    );
    Ok(())
}

/// Write column-major `f64` data with the given dimensions.
///
/// # Errors
///
/// Returns an error if `data` does not match `dims` or the file cannot be
/// written.
pub fn write_mda_f64(path: &Path, dims: &[usize], data: &[f64]) -> Result<()> {
    let header = MdaHeader {
        dtype: MdaType::Float64,
        dims: dims.to_vec(),
    };
    if header.num_elements() != Some(data.len()) {
        return Err(Error::MdaHeader {
            path: path.to_path_buf(),
            message: format!(
                "{} elements do not fill dimensions {dims:?}",
                data.len()
            ),
        });
    }

    let write_err = |e| Error::MdaWrite {
        path: path.to_path_buf(),
        source: e,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
    header.write_to(&mut writer, path)?;
    for value in data {
        writer.write_all(&value.to_le_bytes()).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| Error::MdaRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(BufReader::new(file))
}

fn remaining_bytes(reader: &mut BufReader<File>) -> std::io::Result<u64> {
    let len = reader.get_ref().metadata()?.len();
    Ok(len.saturating_sub(reader.stream_position()?))
}
