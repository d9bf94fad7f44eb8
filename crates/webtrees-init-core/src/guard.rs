//! Filesystem safeguards for the webtrees data directory.

use crate::error::InitError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Name of the access-control file inside the data directory.
pub const ACCESS_CONTROL_FILE: &str = ".htaccess";

/// Directives that deny all web access to the data directory.
pub const DENY_ALL: &str = "order allow,deny\ndeny from all\n";

/// Mode applied to the config file.
pub const CONFIG_FILE_MODE: u32 = 0o700;

/// Keeps the data directory closed to the web and the config file private.
#[derive(Debug, Clone)]
pub struct FilesystemGuard {
    data_dir: PathBuf,
    config_file: PathBuf,
}

impl FilesystemGuard {
    pub fn new(data_dir: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            config_file: config_file.into(),
        }
    }

    pub fn access_control_file(&self) -> PathBuf {
        self.data_dir.join(ACCESS_CONTROL_FILE)
    }

    /// Recreate the deny-all `.htaccess` if it has gone missing.
    ///
    /// An existing file is left as it is, whatever it contains.
    pub fn ensure_access_control_file(&self) -> Result<(), InitError> {
        let path = self.access_control_file();
        if path.is_file() {
            return Ok(());
        }

        warn!(path = %path.display(), "{} does not exist", path.display());

        fs::write(&path, DENY_ALL).map_err(|e| InitError::io(&path, e))?;

        info!(path = %path.display(), "Created {}", path.display());
        Ok(())
    }

    /// Restrict the config file to its owner. No-op if it does not exist.
    pub fn enforce_permissions(&self) -> Result<(), InitError> {
        if !self.config_file.is_file() {
            return Ok(());
        }

        set_mode(&self.config_file, CONFIG_FILE_MODE)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), InitError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| InitError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(path: &Path, _mode: u32) -> Result<(), InitError> {
    tracing::debug!(path = %path.display(), "File modes are not supported on this platform");
    Ok(())
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
