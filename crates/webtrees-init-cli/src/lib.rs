//! # webtrees-init CLI
//!
//! Container entrypoint for webtrees. By default it prepares the
//! installation from the environment and then becomes the web server.
//!
//! Diagnostics go to stderr; stdout is reserved for command output.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webtrees_init_core::{EnvResolver, InitError, Launcher, LauncherConfig, ProcessEnv, Settings};

/// Base name of the system-wide launcher configuration.
pub const SYSTEM_CONFIG: &str = "/etc/webtrees-init/launcher";

/// Prefix of environment variables overriding launcher configuration.
pub const ENV_PREFIX: &str = "WTI";

// ============================================================================
// CLI Structure
// ============================================================================

/// webtrees container entrypoint
#[derive(Parser, Debug)]
#[command(name = "webtrees-init")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prepare webtrees from the environment and start the web server")]
pub struct Cli {
    /// Launcher configuration file
    #[arg(short, long, env = "WEBTREES_INIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute; defaults to `run`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Prepare the installation, then exec the web server
    Run,

    /// Prepare the installation without starting the web server
    Prepare,

    /// Print the settings resolved from the environment as JSON
    Settings,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("Failed to serialize settings: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Init(InitError::UnresolvableDatabaseHost { .. }) => 1,
            CliError::Init(InitError::Bootstrap(_)) => 2,
            CliError::Configuration(_)
            | CliError::InvalidArgument { .. }
            | CliError::Init(InitError::Configuration { .. }) => 3,
            CliError::Init(InitError::Io { .. } | InitError::Process { .. }) => 4,
            CliError::Init(_) | CliError::Serialization(_) => 5,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Parse arguments and run the selected command.
///
/// Returns the exit code for the process when the command finishes without
/// replacing it.
pub async fn run_cli() -> Result<i32, CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let settings = Arc::new(Settings::from_env(&EnvResolver::new(ProcessEnv)));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Settings => {
            println!("{}", serde_json::to_string_pretty(settings.as_ref())?);
            Ok(0)
        }
        Commands::Prepare => {
            let config = load_configuration(cli.config.as_deref())?;
            let launcher = Launcher::from_config(&config, settings)?;
            let outcome = launcher.prepare().await?;
            info!(outcome = ?outcome, "Preparation finished");
            Ok(0)
        }
        Commands::Run => {
            let config = load_configuration(cli.config.as_deref())?;
            let launcher = Launcher::from_config(&config, settings)?;
            Ok(launcher.run().await?)
        }
    }
}

/// Initialize logging based on CLI arguments.
///
/// `RUST_LOG` takes precedence over `--log-level`.
pub fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.log_level).map_err(|e| CliError::InvalidArgument {
            arg: "--log-level".to_string(),
            message: e.to_string(),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if cli.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| CliError::InvalidArgument {
        arg: "--json-logs".to_string(),
        message: format!("logging already initialized: {}", e),
    })
}

/// Load the launcher configuration.
///
/// Sources, later ones overriding earlier ones:
///  1. `/etc/webtrees-init/launcher.{yaml,toml}` if present
///  2. `explicit`, which must exist when given
///  3. `WTI__`-prefixed environment variables, e.g.
///     `WTI__PATHS__ROOT_DIR=/srv/webtrees`; `WTI__SERVER__COMMAND` is split
///     on spaces
pub fn load_configuration(explicit: Option<&Path>) -> Result<LauncherConfig, CliError> {
    load_configuration_from(Path::new(SYSTEM_CONFIG), explicit)
}

fn load_configuration_from(
    system: &Path,
    explicit: Option<&Path>,
) -> Result<LauncherConfig, CliError> {
    let mut builder = config::Config::builder().add_source(
        config::File::with_name(&system.to_string_lossy()).required(false),
    );

    if let Some(path) = explicit {
        info!(path = %path.display(), "Loading launcher configuration from explicit path");
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let launcher_config: LauncherConfig = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("server.command"),
        )
        .build()?
        .try_deserialize()?;

    launcher_config.validate()?;
    Ok(launcher_config)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
