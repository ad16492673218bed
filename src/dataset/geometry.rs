//! Channel geometry (`geom.csv`).

use std::path::Path;

use crate::error::{Error, Result};

/// Electrode locations, one row per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    locations: Vec<Vec<f64>>,
}

impl Geometry {
    /// Wrap per-channel coordinates.
    #[must_use]
    pub fn new(locations: Vec<Vec<f64>>) -> Self {
        Self { locations }
    }

    /// Read a headerless CSV with one coordinate row per channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value is not a number.
    pub fn load(path: &Path) -> Result<Self> {
        let parse_err = |e| Error::GeometryParse {
            path: path.to_path_buf(),
            source: e,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(parse_err)?;

        let mut locations = Vec::new();
        for record in reader.deserialize::<Vec<f64>>() {
            locations.push(record.map_err(parse_err)?);
        }
        Ok(Self { locations })
    }

    /// Check the row count against the recording's channel count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGeometry`] on mismatch.
    pub fn check_channels(&self, signal_channels: usize) -> Result<()> {
        if self.locations.len() != signal_channels {
            return Err(Error::MalformedGeometry {
                geometry_channels: self.locations.len(),
                signal_channels,
            });
        }
        Ok(())
    }

    /// Number of channels described.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.locations.len()
    }

    /// Coordinates of `channel`, if present.
    #[must_use]
    pub fn location(&self, channel: usize) -> Option<&[f64]> {
        self.locations.get(channel).map(Vec::as_slice)
    }
}

/// Placeholder location for a recording without geometry: a vertical
/// column with channel 0 at the top.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn default_location(channel: usize) -> Vec<f64> {
    vec![0.0, -((channel + 1) as f64)]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0, 0\n0, 25\n 16.5, 50").unwrap();
        file.flush().unwrap();

        let geometry = Geometry::load(file.path()).unwrap();
        assert_eq!(geometry.num_channels(), 3);
        assert_eq!(geometry.location(2), Some(&[16.5, 50.0][..]));
        assert_eq!(geometry.location(3), None);
    }

    #[test]
    fn test_non_numeric_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0,zero").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            Geometry::load(file.path()),
            Err(Error::GeometryParse { .. })
        ));
    }

    #[test]
    fn test_channel_count_mismatch() {
        let geometry = Geometry::new(vec![vec![0.0, 0.0]; 3]);
        assert!(geometry.check_channels(3).is_ok());
        assert!(matches!(
            geometry.check_channels(4),
            Err(Error::MalformedGeometry {
                geometry_channels: 3,
                signal_channels: 4
            })
        ));
    }

    #[test]
    fn test_default_location_stacks_downward() {
        assert_eq!(default_location(0), vec![0.0, -1.0]);
        assert_eq!(default_location(4), vec![0.0, -5.0]);
    }
}
