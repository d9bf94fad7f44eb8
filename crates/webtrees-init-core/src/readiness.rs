//! # Dependency Readiness Waiter
//!
//! Blocks until the database answers its admin ping.
//!
//! There is deliberately no upper bound on the wait: a database that never
//! comes up is a broken deployment, and hanging here is preferable to
//! running the setup wizard against nothing.

use crate::error::InitError;
use crate::sleep::Sleeper;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Something that can tell whether the database is up.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// `Ok(true)` once the server at `host:port` answers.
    ///
    /// # Errors
    ///
    /// Only when the probe itself cannot run; a server that is not ready yet
    /// is `Ok(false)`.
    async fn ping(&self, host: &str, port: &str) -> Result<bool, InitError>;

    /// Name of the dependency, for log messages.
    fn name(&self) -> &'static str;
}

/// Pings a MySQL-compatible server with `mysqladmin ping -h HOST -P PORT --silent`.
#[derive(Debug, Clone)]
pub struct AdminCommandProbe {
    program: String,
}

impl AdminCommandProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for AdminCommandProbe {
    fn default() -> Self {
        Self::new("mysqladmin")
    }
}

#[async_trait]
impl DependencyProbe for AdminCommandProbe {
    async fn ping(&self, host: &str, port: &str) -> Result<bool, InitError> {
        // Capital -P is the port; lower-case -p would be the password
        let status = Command::new(&self.program)
            .args(["ping", "-h", host, "-P", port, "--silent"])
            .stdout(Stdio::null())
            .status()
            .await
            .map_err(|e| InitError::Process {
                command: self.program.clone(),
                source: e,
            })?;

        debug!(program = %self.program, status = ?status.code(), "Database ping finished");
        Ok(status.success())
    }

    fn name(&self) -> &'static str {
        "MySQL"
    }
}

/// Polls a [`DependencyProbe`] at a fixed interval until it succeeds.
#[derive(Clone)]
pub struct ReadinessWaiter {
    probe: Arc<dyn DependencyProbe>,
    sleeper: Arc<dyn Sleeper>,
    interval: Duration,
}

impl ReadinessWaiter {
    pub fn new(probe: Arc<dyn DependencyProbe>, sleeper: Arc<dyn Sleeper>, interval: Duration) -> Self {
        Self {
            probe,
            sleeper,
            interval,
        }
    }

    /// Wait, without limit, until `host:port` is ready.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Process`] if the probe cannot be run at all.
    pub async fn wait_ready(&self, host: &str, port: &str) -> Result<(), InitError> {
        while !self.probe.ping(host, port).await? {
            info!(
                host,
                port,
                "Waiting for {} server {}:{} to be ready",
                self.probe.name(),
                host,
                port
            );
            self.sleeper.sleep(self.interval).await;
        }

        info!(host, port, "{} server is ready", self.probe.name());
        Ok(())
    }
}

#[cfg(test)]
#[path = "readiness_tests.rs"]
mod tests;
