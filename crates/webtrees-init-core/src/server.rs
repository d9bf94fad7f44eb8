//! Starting and stopping the web server.
//!
//! During setup the server runs in the background while the wizard request
//! is sent; at the end of startup it takes over the process (see
//! [`crate::launcher`]).

use crate::error::InitError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Starts a temporary server instance.
#[cfg_attr(test, mockall::automock)]
pub trait ServerLauncher: Send + Sync {
    /// Spawn the server in the background.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Process`] if the server cannot be started.
    fn spawn_background(&self) -> Result<Box<dyn BackgroundServer>, InitError>;
}

/// Handle to a running temporary server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackgroundServer: Send {
    /// Stop the server and reap it.
    async fn terminate(&mut self) -> Result<(), InitError>;
}

/// The web server command line and how to run it.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    suppress_stderr: bool,
}

impl ServerCommand {
    /// Build from a full command line (`argv[0]` first).
    ///
    /// # Errors
    ///
    /// Returns [`InitError::Configuration`] if `command` is empty.
    pub fn new(
        command: &[String],
        working_dir: impl Into<PathBuf>,
        suppress_stderr: bool,
    ) -> Result<Self, InitError> {
        let (program, args) = command.split_first().ok_or_else(|| InitError::Configuration {
            message: "server command is empty".to_string(),
        })?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            working_dir: working_dir.into(),
            suppress_stderr,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// A blocking [`std::process::Command`] for the foreground hand-off.
    pub fn foreground(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args).current_dir(&self.working_dir);
        if self.suppress_stderr {
            command.stderr(Stdio::null());
        }
        command
    }
}

impl ServerLauncher for ServerCommand {
    fn spawn_background(&self) -> Result<Box<dyn BackgroundServer>, InitError> {
        // stderr is dropped so the server does not drown the setup diagnostics
        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| InitError::Process {
                command: self.program.clone(),
                source: e,
            })?;

        info!(program = %self.program, pid = ?child.id(), "Started server in background");

        Ok(Box::new(ChildServer {
            program: self.program.clone(),
            child,
        }))
    }
}

/// A server started with [`ServerCommand::spawn_background`].
#[derive(Debug)]
pub struct ChildServer {
    program: String,
    child: Child,
}

impl ChildServer {
    /// Ask politely with SIGTERM through the system `kill` tool, so the server
    /// can shut down its workers and release the port.
    async fn send_term(&self) -> bool {
        let Some(pid) = self.child.id() else {
            return false;
        };

        match Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(pid, error = %e, "Could not run kill");
                false
            }
        }
    }
}

#[async_trait]
impl BackgroundServer for ChildServer {
    async fn terminate(&mut self) -> Result<(), InitError> {
        if !self.send_term().await {
            warn!(program = %self.program, "SIGTERM not delivered, killing server");
            // Already exited is fine; wait() below reaps it either way
            let _ = self.child.start_kill();
        }

        let status = self.child.wait().await.map_err(|e| InitError::Process {
            command: self.program.clone(),
            source: e,
        })?;
        info!(program = %self.program, status = ?status.code(), "Stopped background server");
        Ok(())
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
