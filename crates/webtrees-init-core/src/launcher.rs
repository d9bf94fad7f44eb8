//! # Launcher
//!
//! Runs the startup steps in their fixed order and then hands the process
//! over to the web server:
//!
//! 1. runtime settings (never fatal)
//! 2. setup wizard, when needed and possible
//! 3. config reconciliation
//! 4. access-control file
//! 5. config file permissions
//! 6. foreground web server
//!
//! Every step up to 5 is idempotent, so a restarted container converges on
//! the same state.

use crate::bootstrap::BootstrapClient;
use crate::config::LauncherConfig;
use crate::dns::SystemResolver;
use crate::error::InitError;
use crate::guard::FilesystemGuard;
use crate::readiness::{AdminCommandProbe, ReadinessWaiter};
use crate::reconcile::ConfigReconciler;
use crate::runtime_settings::RuntimeSettingsWriter;
use crate::server::ServerCommand;
use crate::settings::Settings;
use crate::setup::{SetupOrchestrator, SetupOutcome};
use crate::sleep::TokioSleeper;
use std::sync::Arc;
use tracing::info;

/// The assembled startup pipeline.
pub struct Launcher {
    runtime: RuntimeSettingsWriter,
    setup: SetupOrchestrator,
    reconciler: ConfigReconciler,
    guard: FilesystemGuard,
    server: ServerCommand,
}

impl Launcher {
    pub fn new(
        runtime: RuntimeSettingsWriter,
        setup: SetupOrchestrator,
        reconciler: ConfigReconciler,
        guard: FilesystemGuard,
        server: ServerCommand,
    ) -> Self {
        Self {
            runtime,
            setup,
            reconciler,
            guard,
            server,
        }
    }

    /// Wire the real components for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Configuration`] if `config` is invalid and
    /// [`InitError::HttpClient`] if the bootstrap client cannot be built.
    pub fn from_config(config: &LauncherConfig, settings: Arc<Settings>) -> Result<Self, InitError> {
        config.validate()?;

        let config_file = config.config_file();
        let server = ServerCommand::new(
            &config.server.command,
            &config.paths.root_dir,
            config.server.suppress_stderr,
        )?;

        let sleeper = Arc::new(TokioSleeper);
        let waiter = ReadinessWaiter::new(
            Arc::new(AdminCommandProbe::new(config.setup.ping_command.clone())),
            sleeper.clone(),
            config.setup.poll_interval(),
        );
        let client = BootstrapClient::new(
            config.setup.policy(),
            config.setup.request_timeout(),
            sleeper,
        )?;

        let setup = SetupOrchestrator::new(
            settings.clone(),
            &config_file,
            config.setup.bootstrap_url.clone(),
            Arc::new(server.clone()),
            Arc::new(SystemResolver),
            waiter,
            client,
        );

        Ok(Self::new(
            RuntimeSettingsWriter::new(&config.paths.php_ini_file, settings.clone()),
            setup,
            ConfigReconciler::new(&config_file, settings),
            FilesystemGuard::new(config.data_dir(), &config_file),
            server,
        ))
    }

    /// Run every step except the hand-off.
    ///
    /// # Errors
    ///
    /// Propagates setup failures (unresolvable database host, bootstrap
    /// exhaustion, process errors) and I/O errors from the file steps.
    pub async fn prepare(&self) -> Result<SetupOutcome, InitError> {
        self.runtime.ensure_runtime_file();

        let outcome = self.setup.run().await?;
        info!(outcome = ?outcome, "Setup step finished");

        self.reconciler.reconcile()?;
        self.guard.ensure_access_control_file()?;
        self.guard.enforce_permissions()?;

        Ok(outcome)
    }

    /// Prepare, then replace this process with the web server.
    ///
    /// On Unix this only returns if the exec failed. Elsewhere the server
    /// runs as a child and its exit code is returned.
    pub async fn run(&self) -> Result<i32, InitError> {
        self.prepare().await?;
        self.hand_off()
    }

    #[cfg(unix)]
    fn hand_off(&self) -> Result<i32, InitError> {
        use std::os::unix::process::CommandExt;

        info!(program = %self.server.program(), "Starting {}", self.server.program());
        let error = self.server.foreground().exec();
        Err(InitError::Process {
            command: self.server.program().to_string(),
            source: error,
        })
    }

    #[cfg(not(unix))]
    fn hand_off(&self) -> Result<i32, InitError> {
        info!(program = %self.server.program(), "Starting {}", self.server.program());
        let status = self
            .server
            .foreground()
            .status()
            .map_err(|e| InitError::Process {
                command: self.server.program().to_string(),
                source: e,
            })?;
        Ok(status.code().unwrap_or(1))
    }
}
