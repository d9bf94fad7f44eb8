//! Error types for the startup engine.

use std::path::PathBuf;

/// Failures that abort container startup.
///
/// Soft problems (a missing optional variable, an incomplete setting group,
/// a config file that does not exist yet) are never errors; they are logged
/// and the affected step is skipped. Everything in this enum stops the launch.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// A file or directory could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external command could not be started or waited on.
    #[error("Failed to run '{command}': {source}")]
    Process {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The database host name did not resolve during automated setup.
    ///
    /// This almost always means `DB_HOST` is mistyped.
    #[error("Could not resolve database host '{host}'")]
    UnresolvableDatabaseHost { host: String },

    /// The setup wizard never accepted the bootstrap request.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// The HTTP client used for the bootstrap request could not be built.
    #[error("Failed to create HTTP client: {message}")]
    HttpClient { message: String },

    /// The launcher configuration is unusable.
    #[error("Invalid launcher configuration: {message}")]
    Configuration { message: String },
}

impl InitError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of the setup wizard request.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Every attempt ended in a status other than 200/302 or a transport error.
    #[error("Could not send a request to {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },
}

impl BootstrapError {
    /// The endpoint the request was aimed at.
    pub fn url(&self) -> &str {
        match self {
            Self::Exhausted { url, .. } => url,
        }
    }
}
