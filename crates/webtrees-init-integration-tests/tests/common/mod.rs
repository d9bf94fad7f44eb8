//! Common test utilities for webtrees-init integration tests
//!
//! This module provides:
//! - Fakes for the server, database probe and DNS seams
//! - A wiremock responder that plays the setup wizard
//! - A temporary container layout and a launcher wired to it

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use webtrees_init_core::dns::HostResolver;
use webtrees_init_core::readiness::{DependencyProbe, ReadinessWaiter};
use webtrees_init_core::server::{BackgroundServer, ServerCommand, ServerLauncher};
use webtrees_init_core::sleep::RecordingSleeper;
use webtrees_init_core::{
    BootstrapClient, BootstrapPolicy, ConfigReconciler, EnvResolver, FilesystemGuard, InitError,
    Launcher, MapEnv, RuntimeSettingsWriter, Settings, SetupOrchestrator,
};
use wiremock::{Request, Respond, ResponseTemplate};

/// First line of every webtrees config file.
pub const CONFIG_HEADER: &str = "; <?php return; ?> DO NOT DELETE THIS LINE\n";

// ============================================================================
// Server fake
// ============================================================================

/// Counts background server starts and stops.
#[derive(Clone, Default)]
pub struct RecordingServerLauncher {
    spawned: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl RecordingServerLauncher {
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl ServerLauncher for RecordingServerLauncher {
    fn spawn_background(&self) -> Result<Box<dyn BackgroundServer>, InitError> {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordedServer {
            stopped: self.stopped.clone(),
        }))
    }
}

struct RecordedServer {
    stopped: Arc<AtomicUsize>,
}

#[async_trait]
impl BackgroundServer for RecordedServer {
    async fn terminate(&mut self) -> Result<(), InitError> {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Probe and resolver fakes
// ============================================================================

/// Reports the database as ready after a fixed number of failed pings.
pub struct CountdownProbe {
    remaining: Mutex<u32>,
    pings: Arc<Mutex<Vec<(String, String)>>>,
}

impl CountdownProbe {
    pub fn new(failures: u32) -> Self {
        Self {
            remaining: Mutex::new(failures),
            pings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[allow(dead_code)]
    pub fn pings(&self) -> Vec<(String, String)> {
        self.pings.lock().unwrap().clone()
    }
}

#[async_trait]
impl DependencyProbe for CountdownProbe {
    async fn ping(&self, host: &str, port: &str) -> Result<bool, InitError> {
        self.pings
            .lock()
            .unwrap()
            .push((host.to_string(), port.to_string()));

        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Ok(true);
        }
        *remaining -= 1;
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "MySQL"
    }
}

/// Resolves only the listed host names.
pub struct StaticResolver {
    known: Vec<String>,
}

impl StaticResolver {
    pub fn knowing(hosts: &[&str]) -> Self {
        Self {
            known: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> std::io::Result<()> {
        if self.known.iter().any(|h| h == host) {
            Ok(())
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("unknown host {}", host),
            ))
        }
    }
}

// ============================================================================
// Setup wizard responder
// ============================================================================

/// Plays the webtrees wizard: writes a config file from the submitted form
/// and redirects, like the real final step does.
pub struct WizardResponder {
    config_file: PathBuf,
}

impl WizardResponder {
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
        }
    }
}

impl Respond for WizardResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body = String::from_utf8_lossy(&request.body).to_string();
        let field = |name: &str| {
            body.split('&')
                .find_map(|pair| pair.strip_prefix(&format!("{}=", name)))
                .unwrap_or_default()
                .to_string()
        };

        let contents = format!(
            "{}dbtype=\"mysql\"\ndbhost=\"{}\"\ndbport=\"{}\"\ndbuser=\"{}\"\ndbpass=\"{}\"\ndbname=\"{}\"\ntblpfx=\"{}\"\n",
            CONFIG_HEADER,
            field("dbhost"),
            field("dbport"),
            field("dbuser"),
            field("dbpass"),
            field("dbname"),
            field("tblpfx"),
        );
        fs::write(&self.config_file, contents).unwrap();

        ResponseTemplate::new(302).insert_header("Location", "/index.php")
    }
}

// ============================================================================
// Container layout
// ============================================================================

/// A webtrees root with a `data/` directory and a separate php.ini location.
pub struct Layout {
    pub dir: TempDir,
}

impl Layout {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("webtrees").join("data")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("webtrees")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root().join("data")
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir().join("config.ini.php")
    }

    pub fn htaccess(&self) -> PathBuf {
        self.data_dir().join(".htaccess")
    }

    pub fn php_ini(&self) -> PathBuf {
        self.dir.path().join("php").join("php.ini")
    }

    pub fn write_config(&self, contents: &str) {
        fs::write(self.config_file(), contents).unwrap();
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }
}

/// Everything a test may want to inspect after running the launcher.
pub struct Harness {
    pub launcher: Launcher,
    pub server: RecordingServerLauncher,
    pub sleeper: Arc<RecordingSleeper>,
}

/// Wire a launcher over `layout` with fake server, probe and resolver.
///
/// The database host `db` resolves; nothing else does.
pub fn harness(layout: &Layout, env: MapEnv, bootstrap_url: &str, probe: CountdownProbe) -> Harness {
    let settings = Arc::new(Settings::from_env(&EnvResolver::new(env)));
    let server = RecordingServerLauncher::default();
    let sleeper = Arc::new(RecordingSleeper::new());

    let waiter = ReadinessWaiter::new(Arc::new(probe), sleeper.clone(), Duration::from_secs(1));
    let policy = BootstrapPolicy {
        max_attempts: 3,
        backoff_unit: Duration::from_secs(1),
    };
    let client = BootstrapClient::new(policy, Some(Duration::from_secs(5)), sleeper.clone()).unwrap();

    let setup = SetupOrchestrator::new(
        settings.clone(),
        layout.config_file(),
        bootstrap_url,
        Arc::new(server.clone()),
        Arc::new(StaticResolver::knowing(&["db"])),
        waiter,
        client,
    );

    let launcher = Launcher::new(
        RuntimeSettingsWriter::new(layout.php_ini(), settings.clone()),
        setup,
        ConfigReconciler::new(layout.config_file(), settings),
        FilesystemGuard::new(layout.data_dir(), layout.config_file()),
        ServerCommand::new(&["apache2-foreground".to_string()], layout.root(), true).unwrap(),
    );

    Harness {
        launcher,
        server,
        sleeper,
    }
}

/// Environment with complete database and administrator settings.
pub fn first_run_env() -> MapEnv {
    MapEnv::new()
        .with("DB_HOST", "db")
        .with("DB_PASS", "db-secret")
        .with("WT_USER", "admin")
        .with("WT_NAME", "Administrator")
        .with("WT_PASS", "admin-secret")
        .with("WT_EMAIL", "admin@example.com")
}
