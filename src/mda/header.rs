//! MDA header parsing.

use std::io::{Read, Write};
use std::path::Path;

use crate::constants::mda;
use crate::error::{Error, Result};

/// Element type of an MDA array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdaType {
    /// `u8`
    Uint8,
    /// `f32`
    Float32,
    /// `i16`
    Int16,
    /// `i32`
    Int32,
    /// `u16`
    Uint16,
    /// `f64`
    Float64,
    /// `u32`
    Uint32,
}

impl MdaType {
    /// Look up a header type code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMdaType`] for an unknown code.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            mda::UINT8 => Ok(Self::Uint8),
            mda::FLOAT32 => Ok(Self::Float32),
            mda::INT16 => Ok(Self::Int16),
            mda::INT32 => Ok(Self::Int32),
            mda::UINT16 => Ok(Self::Uint16),
            mda::FLOAT64 => Ok(Self::Float64),
            mda::UINT32 => Ok(Self::Uint32),
            _ => Err(Error::UnsupportedMdaType { code }),
        }
    }

    /// Header type code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            Self::Uint8 => mda::UINT8,
            Self::Float32 => mda::FLOAT32,
            Self::Int16 => mda::INT16,
            Self::Int32 => mda::INT32,
            Self::Uint16 => mda::UINT16,
            Self::Float64 => mda::FLOAT64,
            Self::Uint32 => mda::UINT32,
        }
    }

    /// Bytes per element.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Float32 | Self::Int32 | Self::Uint32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Decode one little-endian element.
    pub(crate) fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            Self::Uint8 => f64::from(bytes[0]),
            Self::Float32 => f64::from(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::Int16 => f64::from(i16::from_le_bytes([bytes[0], bytes[1]])),
            Self::Int32 => f64::from(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::Uint16 => f64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            Self::Float64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
            Self::Uint32 => f64::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        }
    }
}

/// Parsed MDA header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdaHeader {
    /// Element type.
    pub dtype: MdaType,
    /// Array dimensions, first index fastest.
    pub dims: Vec<usize>,
}

impl MdaHeader {
    /// Total number of elements, or `None` if it overflows `usize`.
    #[must_use]
    pub fn num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Size of the data section in bytes, or `None` if it overflows `usize`.
    #[must_use]
    pub fn data_bytes(&self) -> Option<usize> {
        self.num_elements()?.checked_mul(self.dtype.size())
    }

    /// Parse a header from the start of `reader`.
    ///
    /// A negative dimension count means the dimensions are stored as `i64`.
    pub(crate) fn read_from(reader: &mut impl Read, path: &Path) -> Result<Self> {
        let read_err = |e| Error::MdaRead {
            path: path.to_path_buf(),
            source: e,
        };
        let header_err = |message: String| Error::MdaHeader {
            path: path.to_path_buf(),
            message,
        };

        let code = read_i32(reader).map_err(read_err)?;
        let dtype = MdaType::from_code(code)?;
        let bytes_per_entry = read_i32(reader).map_err(read_err)?;
        if usize::try_from(bytes_per_entry).ok() != Some(dtype.size()) {
            return Err(header_err(format!(
                "{bytes_per_entry} bytes per entry does not match type code {code}"
            )));
        }

        let raw_dims = read_i32(reader).map_err(read_err)?;
        let wide = raw_dims < 0;
        let num_dims = raw_dims.unsigned_abs() as usize;
        if num_dims == 0 || num_dims > mda::MAX_DIMS {
            return Err(header_err(format!("invalid number of dimensions {raw_dims}")));
        }

        let mut dims = Vec::with_capacity(num_dims);
        for _ in 0..num_dims {
            let dim = if wide {
                read_i64(reader).map_err(read_err)?
            } else {
                i64::from(read_i32(reader).map_err(read_err)?)
            };
            let dim = usize::try_from(dim)
                .map_err(|_| header_err(format!("negative dimension {dim}")))?;
            dims.push(dim);
        }

        let header = Self { dtype, dims };
        if header.data_bytes().is_none() {
            return Err(header_err(format!(
                "dimensions {:?} are too large to address",
                header.dims
            )));
        }
        Ok(header)
    }

    /// Write the header with `i32` dimensions.
    pub(crate) fn write_to(&self, writer: &mut impl Write, path: &Path) -> Result<()> {
        let too_large = || Error::MdaHeader {
            path: path.to_path_buf(),
            message: format!("dimensions {:?} do not fit in 32 bits", self.dims),
        };
        let write_err = |e| Error::MdaWrite {
            path: path.to_path_buf(),
            source: e,
        };

        let size = i32::try_from(self.dtype.size()).map_err(|_| too_large())?;
        let num_dims = i32::try_from(self.dims.len()).map_err(|_| too_large())?;
        let mut fields = vec![self.dtype.code(), size, num_dims];
        for &dim in &self.dims {
            fields.push(i32::try_from(dim).map_err(|_| too_large())?);
        }
        for field in fields {
            writer.write_all(&field.to_le_bytes()).map_err(write_err)?;
        }
        Ok(())
    }
}

fn read_i32(reader: &mut impl Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64(reader: &mut impl Read) -> std::io::Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bytes(fields: &[i32]) -> Vec<u8> {
        fields.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    #[test]
    fn test_type_codes_round_trip() {
        for code in -8..=-2 {
            assert_eq!(MdaType::from_code(code).unwrap().code(), code);
        }
        assert!(matches!(
            MdaType::from_code(-1),
            Err(Error::UnsupportedMdaType { code: -1 })
        ));
    }

    #[test]
    fn test_parse_narrow_dims() {
        let data = bytes(&[-4, 2, 2, 3, 7]);
        let header = MdaHeader::read_from(&mut data.as_slice(), Path::new("x.mda")).unwrap();
        assert_eq!(header.dtype, MdaType::Int16);
        assert_eq!(header.dims, vec![3, 7]);
        assert_eq!(header.data_bytes(), Some(42));
    }

    #[test]
    fn test_parse_wide_dims() {
        let mut data = bytes(&[-7, 8, -2]);
        data.extend_from_slice(&4i64.to_le_bytes());
        data.extend_from_slice(&5i64.to_le_bytes());
        let header = MdaHeader::read_from(&mut data.as_slice(), Path::new("x.mda")).unwrap();
        assert_eq!(header.dtype, MdaType::Float64);
        assert_eq!(header.dims, vec![4, 5]);
    }

    #[test]
    fn test_overflowing_dims_rejected() {
        let mut data = bytes(&[-7, 8, -2]);
        data.extend_from_slice(&i64::MAX.to_le_bytes());
        data.extend_from_slice(&4i64.to_le_bytes());
        assert!(matches!(
            MdaHeader::read_from(&mut data.as_slice(), Path::new("x.mda")),
            Err(Error::MdaHeader { .. })
        ));
    }

    #[test]
    fn test_mismatched_entry_size_rejected() {
        let data = bytes(&[-3, 8, 1, 10]);
        assert!(matches!(
            MdaHeader::read_from(&mut data.as_slice(), Path::new("x.mda")),
            Err(Error::MdaHeader { .. })
        ));
    }

    #[test]
    fn test_truncated_header_is_read_error() {
        let data = bytes(&[-3, 4]);
        assert!(matches!(
            MdaHeader::read_from(&mut data.as_slice(), Path::new("x.mda")),
            Err(Error::MdaRead { .. })
        ));
    }

    #[test]
    fn test_write_then_parse() {
        let header = MdaHeader {
            dtype: MdaType::Float32,
            dims: vec![4, 1000],
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf, Path::new("x.mda")).unwrap();
        assert_eq!(buf.len(), 20);
        let parsed = MdaHeader::read_from(&mut buf.as_slice(), Path::new("x.mda")).unwrap();
        assert_eq!(parsed, header);
    }
}
