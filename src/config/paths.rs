//! Where the user configuration lives when `--config` is not given.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::constants::{APP_NAME, CONFIG_FILE};
use crate::error::{Error, Result};

/// Per-user configuration directory for spikeslice, as reported by
/// [`ProjectDirs`] (XDG config home on Linux).
///
/// # Errors
///
/// Returns [`Error::ConfigDirNotFound`] when no home directory can be
/// resolved.
pub fn config_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", APP_NAME).ok_or(Error::ConfigDirNotFound)?;
    Ok(dirs.config_dir().to_path_buf())
}

/// Default `config.toml` used by `config init|show|path` and at startup.
///
/// # Errors
///
/// Same as [`config_dir`].
pub fn config_file_path() -> Result<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_sits_in_app_dir() {
        // Platforms without a home directory have no default location.
        let Ok(dir) = config_dir() else {
            return;
        };
        let file = config_file_path().unwrap();
        assert_eq!(file.parent(), Some(dir.as_path()));
        assert_eq!(file.file_name().unwrap(), CONFIG_FILE);
        assert!(dir.components().any(|c| c.as_os_str() == APP_NAME));
    }
}
