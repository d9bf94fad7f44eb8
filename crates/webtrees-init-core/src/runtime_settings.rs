//! # Runtime Settings Writer
//!
//! Keeps the PHP ini file in line with the `PHP_*` settings.

use crate::error::InitError;
use crate::kv_file::upsert_line;
use crate::settings::Settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Contents of a freshly created ini file.
pub const INI_SEED: &str = "[PHP]\n\n";

/// Writes the interpreter limits into the ini file.
#[derive(Debug, Clone)]
pub struct RuntimeSettingsWriter {
    path: PathBuf,
    settings: Arc<Settings>,
}

impl RuntimeSettingsWriter {
    pub fn new(path: impl Into<PathBuf>, settings: Arc<Settings>) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the ini file if needed and set the four limits.
    ///
    /// Failures are logged and never abort startup: the interpreter still
    /// runs with its built-in defaults.
    pub fn ensure_runtime_file(&self) {
        info!(path = %self.path.display(), "Updating php.ini");

        if let Err(e) = self.write() {
            error!(error = %e, "Failed to update php.ini; continuing with existing settings");
        }
    }

    fn write(&self) -> Result<(), InitError> {
        if !self.path.is_file() {
            info!(path = %self.path.display(), "Creating php.ini");

            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| InitError::io(parent, e))?;
            }
            std::fs::write(&self.path, INI_SEED).map_err(|e| InitError::io(&self.path, e))?;
        }

        let s = &self.settings;
        let values = [
            ("memory_limit", &s.php_memory_limit),
            ("max_execution_time", &s.php_max_execution_time),
            ("post_max_size", &s.php_post_max_size),
            ("upload_max_filesize", &s.php_upload_max_file_size),
        ];

        for (key, value) in values {
            let Some(value) = value else {
                info!(key, "No value for {} in php.ini, leaving it alone", key);
                continue;
            };
            info!(key, "Setting value for {} in php.ini", key);
            upsert_line(&self.path, &format!("{} = {}", key, value))?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "runtime_settings_tests.rs"]
mod tests;
