//! # webtrees-init Core
//!
//! Startup engine for the webtrees container: turns environment variables
//! into application configuration, runs the first-run setup wizard when it
//! can, and hands the process over to the web server.
//!
//! ## Architecture
//!
//! Each startup step is its own component and the [`Launcher`] runs them in
//! a fixed order. Anything that touches the outside world beyond the local
//! filesystem (the background server, the database probe, DNS, sleeping)
//! sits behind a trait so the steps can be exercised without those
//! dependencies.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use webtrees_init_core::{EnvResolver, Launcher, LauncherConfig, ProcessEnv, Settings};
//!
//! # async fn start() -> Result<(), webtrees_init_core::InitError> {
//! let settings = Arc::new(Settings::from_env(&EnvResolver::new(ProcessEnv)));
//! let launcher = Launcher::from_config(&LauncherConfig::default(), settings)?;
//! launcher.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod dns;
pub mod env;
pub mod error;
pub mod guard;
pub mod kv_file;
pub mod launcher;
pub mod readiness;
pub mod reconcile;
pub mod runtime_settings;
pub mod server;
pub mod settings;
pub mod setup;
pub mod sleep;

pub use bootstrap::{BootstrapClient, BootstrapPolicy, SetupForm};
pub use config::LauncherConfig;
pub use env::{EnvResolver, EnvSource, MapEnv, ProcessEnv};
pub use error::{BootstrapError, InitError};
pub use guard::FilesystemGuard;
pub use launcher::Launcher;
pub use reconcile::ConfigReconciler;
pub use runtime_settings::RuntimeSettingsWriter;
pub use settings::{Secret, Settings};
pub use setup::{SetupOrchestrator, SetupOutcome};
