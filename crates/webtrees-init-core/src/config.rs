//! # Launcher Configuration
//!
//! Describes the container layout: where webtrees lives, which command runs
//! the web server and how the first-run bootstrap behaves. Every field has a
//! default matching the official image, so an empty configuration is valid.

use crate::bootstrap::BootstrapPolicy;
use crate::error::InitError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Launcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Filesystem layout
    pub paths: PathsConfig,

    /// Web server command
    pub server: ServerConfig,

    /// First-run bootstrap behaviour
    pub setup: SetupConfig,
}

/// Filesystem layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Application root; also the web server's working directory
    pub root_dir: PathBuf,

    /// PHP ini file holding the runtime limits
    pub php_ini_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("/var/www/webtrees"),
            php_ini_file: PathBuf::from("/usr/local/etc/php/php.ini"),
        }
    }
}

/// Web server command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Program and arguments
    pub command: Vec<String>,

    /// Discard the server's stderr
    pub suppress_stderr: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: vec!["apache2-foreground".to_string()],
            suppress_stderr: true,
        }
    }
}

/// First-run bootstrap behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    /// Setup wizard endpoint on the temporary server
    pub bootstrap_url: String,

    /// Attempts before the bootstrap request is given up
    pub max_attempts: u32,

    /// Sleep after attempt `n` is `n * backoff_unit_secs`
    pub backoff_unit_secs: u64,

    /// Per-request timeout; 0 disables it
    pub request_timeout_secs: u64,

    /// Database admin tool used for the readiness probe
    pub ping_command: String,

    /// Pause between readiness probes
    pub poll_interval_secs: u64,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: "http://127.0.0.1:8080/".to_string(),
            max_attempts: 10,
            backoff_unit_secs: 1,
            request_timeout_secs: 300,
            ping_command: "mysqladmin".to_string(),
            poll_interval_secs: 1,
        }
    }
}

impl SetupConfig {
    pub fn policy(&self) -> BootstrapPolicy {
        BootstrapPolicy {
            max_attempts: self.max_attempts,
            backoff_unit: Duration::from_secs(self.backoff_unit_secs),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl LauncherConfig {
    /// `<root>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.paths.root_dir.join("data")
    }

    /// `<root>/data/config.ini.php`
    pub fn config_file(&self) -> PathBuf {
        self.data_dir().join("config.ini.php")
    }

    /// Check the values a deserializer cannot.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> Result<(), InitError> {
        let invalid = |message: &str| {
            Err(InitError::Configuration {
                message: message.to_string(),
            })
        };

        if self.server.command.first().map_or(true, |p| p.is_empty()) {
            return invalid("server.command must name a program");
        }

        if self.setup.max_attempts == 0 {
            return invalid("setup.max_attempts must be at least 1");
        }

        if self.setup.ping_command.trim().is_empty() {
            return invalid("setup.ping_command must not be empty");
        }

        let url = url::Url::parse(&self.setup.bootstrap_url).map_err(|e| {
            InitError::Configuration {
                message: format!("setup.bootstrap_url '{}' is invalid: {}", self.setup.bootstrap_url, e),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return invalid("setup.bootstrap_url must use http or https");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
