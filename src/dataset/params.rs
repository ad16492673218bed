//! `params.json` handling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Dataset parameters.
///
/// Only the sample rate is interpreted; other keys are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetParams {
    /// Sampling frequency in Hz.
    pub samplerate: f64,

    /// Any other parameters present in the file.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DatasetParams {
    /// Parameters with only a sample rate.
    #[must_use]
    pub fn new(samplerate: f64) -> Self {
        Self {
            samplerate,
            extra: serde_json::Map::new(),
        }
    }

    /// Read `params.json` from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, is not valid JSON, or has a
    /// non-positive sample rate.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DatasetParamsNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::DatasetParamsRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let params: Self =
            serde_json::from_str(&contents).map_err(|e| Error::DatasetParamsParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        if !(params.samplerate.is_finite() && params.samplerate > 0.0) {
            return Err(Error::InvalidDatasetParams {
                path: path.to_path_buf(),
                message: format!("samplerate must be positive, got {}", params.samplerate),
            });
        }
        Ok(params)
    }

    /// Write the parameters as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::JsonWrite { source: e })?;
        std::fs::write(path, json).map_err(|e| Error::OutputCreate {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
