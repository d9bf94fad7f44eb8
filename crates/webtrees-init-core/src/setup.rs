//! # Setup Orchestrator
//!
//! Automates the webtrees first-run wizard when the container starts without
//! a config file but with everything needed to create one.
//!
//! ```text
//! config file exists ───────────────────────────► AlreadyConfigured
//! database settings incomplete ─────────────────► MissingDatabaseSettings
//! admin account incomplete ─────────────────────► MissingAdminAccount
//! start background server
//!   ├─ DB host does not resolve ─► stop server ─► Err(UnresolvableDatabaseHost)
//!   └─ wait for database ─► POST wizard ─► stop server ─► Completed / Err(Bootstrap)
//! ```

use crate::bootstrap::{BootstrapClient, SetupForm};
use crate::dns::HostResolver;
use crate::error::InitError;
use crate::readiness::ReadinessWaiter;
use crate::server::{BackgroundServer, ServerLauncher};
use crate::settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Language sent to the wizard when `LANG` could not be resolved.
const FALLBACK_LANG: &str = "en-US";

/// How the setup step ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The config file exists; a previous run already finished setup.
    AlreadyConfigured,
    /// Not all database settings are present; setup is left to the web UI.
    MissingDatabaseSettings,
    /// Not all administrator settings are present; setup is left to the web UI.
    MissingAdminAccount,
    /// The wizard accepted the request and the temporary server was stopped.
    Completed,
}

/// Runs the setup wizard against a temporary server instance.
#[derive(Clone)]
pub struct SetupOrchestrator {
    settings: Arc<Settings>,
    config_file: PathBuf,
    bootstrap_url: String,
    server: Arc<dyn ServerLauncher>,
    resolver: Arc<dyn HostResolver>,
    waiter: ReadinessWaiter,
    client: BootstrapClient,
}

impl SetupOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: Arc<Settings>,
        config_file: impl Into<PathBuf>,
        bootstrap_url: impl Into<String>,
        server: Arc<dyn ServerLauncher>,
        resolver: Arc<dyn HostResolver>,
        waiter: ReadinessWaiter,
        client: BootstrapClient,
    ) -> Self {
        Self {
            settings,
            config_file: config_file.into(),
            bootstrap_url: bootstrap_url.into(),
            server,
            resolver,
            waiter,
            client,
        }
    }

    /// Run the wizard if it is needed and possible.
    ///
    /// # Errors
    ///
    /// - [`InitError::UnresolvableDatabaseHost`] if `DB_HOST` does not
    ///   resolve; the caller should exit with status 1.
    /// - [`InitError::Bootstrap`] if the wizard never accepted the request.
    /// - [`InitError::Process`] if the server or the database probe could not
    ///   be run.
    ///
    /// The temporary server is stopped before any of these is returned.
    pub async fn run(&self) -> Result<SetupOutcome, InitError> {
        if self.config_file.is_file() {
            return Ok(SetupOutcome::AlreadyConfigured);
        }

        info!("Attempting to automate setup wizard");

        let settings = &self.settings;
        let Some(db) = settings.database() else {
            warn!("Not all database variables are set");
            return Ok(SetupOutcome::MissingDatabaseSettings);
        };
        let Some(admin) = settings.admin_account() else {
            warn!("Not all required variables were found for setup wizard");
            return Ok(SetupOutcome::MissingAdminAccount);
        };

        info!("Automating setup wizard");
        let mut server = self.server.spawn_background()?;

        if let Err(e) = self.resolver.resolve(db.host).await {
            error!(host = %db.host, error = %e, "Could not resolve database host '{}'", db.host);
            error!("You likely have the DB_HOST environment variable set incorrectly");
            stop(server.as_mut()).await;
            return Err(InitError::UnresolvableDatabaseHost {
                host: db.host.to_string(),
            });
        }

        let lang = settings.lang.as_deref().unwrap_or(FALLBACK_LANG);
        let form = SetupForm::new(lang, &db, &admin);

        let result = self.submit(db.host, db.port, &form).await;
        stop(server.as_mut()).await;
        result?;

        info!("Setup wizard completed");
        Ok(SetupOutcome::Completed)
    }

    async fn submit(&self, host: &str, port: &str, form: &SetupForm) -> Result<(), InitError> {
        self.waiter.wait_ready(host, port).await?;

        info!(url = %self.bootstrap_url, "Sending setup wizard request to {}", self.bootstrap_url);
        self.client.retry_request(&self.bootstrap_url, form).await?;
        Ok(())
    }
}

async fn stop(server: &mut dyn BackgroundServer) {
    info!("Stopping background server");
    if let Err(e) = server.terminate().await {
        warn!(error = %e, "Failed to stop background server");
    }
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
