//! # Config Reconciler
//!
//! Pushes environment-derived values into `data/config.ini.php` on every
//! start. The file itself is only ever created by the webtrees setup wizard;
//! this module edits it and never creates it.
//!
//! Grouped settings are all-or-nothing: a partial set of database
//! credentials or TLS files is never written, so a working config is not
//! corrupted by half a new credential set.

use crate::error::InitError;
use crate::kv_file::upsert_line;
use crate::settings::Settings;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Keys written to the config file.
pub mod keys {
    pub const REWRITE_URLS: &str = "rewrite_urls";
    pub const BASE_URL: &str = "base_url";
    pub const TRUSTED_HEADERS: &str = "trusted_headers";
    pub const DB_HOST: &str = "dbhost";
    pub const DB_PORT: &str = "dbport";
    pub const DB_USER: &str = "dbuser";
    pub const DB_PASS: &str = "dbpass";
    pub const DB_NAME: &str = "dbname";
    pub const TABLE_PREFIX: &str = "tblpfx";
    pub const DB_KEY: &str = "dbkey";
    pub const DB_CERT: &str = "dbcert";
    pub const DB_CA: &str = "dbca";
    pub const DB_VERIFY: &str = "dbverify";
}

/// Applies [`Settings`] to the webtrees config file.
#[derive(Debug, Clone)]
pub struct ConfigReconciler {
    config_file: PathBuf,
    settings: Arc<Settings>,
}

impl ConfigReconciler {
    pub fn new(config_file: impl Into<PathBuf>, settings: Arc<Settings>) -> Self {
        Self {
            config_file: config_file.into(),
            settings,
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Update the config file with the values set through the environment.
    ///
    /// Does nothing if the config file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Io`] if the file cannot be read or written.
    pub fn reconcile(&self) -> Result<(), InitError> {
        info!("Updating config file");

        if !self.config_file.is_file() {
            info!(
                path = %self.config_file.display(),
                "Config file not found at {}. Nothing to update.",
                self.config_file.display()
            );
            return Ok(());
        }

        let s = &self.settings;

        self.set(keys::REWRITE_URLS, Some(if s.pretty_urls { "1" } else { "0" }))?;
        self.set(keys::BASE_URL, s.base_url.as_deref())?;

        // An empty string means "unset", not "clear the value"
        if let Some(headers) = s.trusted_headers.as_deref().filter(|h| !h.is_empty()) {
            self.set(keys::TRUSTED_HEADERS, Some(headers))?;
        }

        if let Some(db) = s.database() {
            self.set(keys::DB_HOST, Some(db.host))?;
            self.set(keys::DB_PORT, Some(db.port))?;
            self.set(keys::DB_USER, Some(db.user))?;
            self.set(keys::DB_PASS, Some(db.pass.expose()))?;
            self.set(keys::DB_NAME, Some(db.name))?;
            self.set(keys::TABLE_PREFIX, Some(db.table_prefix))?;
        } else {
            warn!("Not all database variables are set");
        }

        if let Some(tls) = s.tls() {
            self.set(keys::DB_KEY, Some(tls.key))?;
            self.set(keys::DB_CERT, Some(tls.cert))?;
            self.set(keys::DB_CA, Some(tls.ca))?;
            self.set(keys::DB_VERIFY, Some(if tls.verify { "1" } else { "0" }))?;
        }

        Ok(())
    }

    /// Make sure `key` is set to `value`. `None` leaves the key untouched.
    fn set(&self, key: &str, value: Option<&str>) -> Result<(), InitError> {
        let Some(value) = value else {
            return Ok(());
        };

        info!(key, "Setting value for {} in config", key);

        if !self.config_file.is_file() {
            warn!(path = %self.config_file.display(), "{} does not exist", self.config_file.display());
            return Ok(());
        }

        upsert_line(&self.config_file, &format!("{}=\"{}\"", key, value))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
