//! Configuration validation.

use crate::config::{Config, ExtractionConfig};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_extraction(&config.extraction)
}

/// Validate chunk layout and clip window settings.
pub fn validate_extraction(extraction: &ExtractionConfig) -> Result<()> {
    if extraction.chunk_size == 0 {
        return Err(Error::ConfigValidation {
            message: "chunk_size must be at least 1".to_string(),
        });
    }

    if extraction.clip_len == 0 {
        return Err(Error::ConfigValidation {
            message: "clip_len must be at least 1".to_string(),
        });
    }

    if let Some(offset) = extraction.centering_offset
        && offset >= extraction.clip_len
    {
        return Err(Error::ConfigValidation {
            message: format!(
                "centering_offset must be less than clip_len ({}), got {offset}",
                extraction.clip_len
            ),
        });
    }

    Ok(())
}
