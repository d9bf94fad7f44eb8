//! # Bootstrap HTTP Client
//!
//! Submits the final step of the webtrees setup wizard to a temporary local
//! server, retrying until the wizard answers.
//!
//! The backoff is linear: after failed attempt `n` (0-based) the client sleeps
//! `n` backoff units, so the first retry is immediate and ten attempts wait at
//! most 0 + 1 + ... + 9 = 45 units in total.

use crate::error::{BootstrapError, InitError};
use crate::settings::{AdminAccount, DatabaseGroup};
use crate::sleep::Sleeper;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Database type sent to the wizard.
pub const DB_TYPE: &str = "mysql";

/// Wizard step that creates the config file and the administrator.
pub const FINAL_STEP: &str = "6";

/// Attempt budget and backoff unit for the bootstrap request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapPolicy {
    /// Total number of requests, including the first one
    pub max_attempts: u32,

    /// Sleep after failed attempt `n` is `n * backoff_unit`
    pub backoff_unit: Duration,
}

impl Default for BootstrapPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl BootstrapPolicy {
    /// Delay after the failed attempt with 0-based index `attempt`.
    ///
    /// ```
    /// use webtrees_init_core::bootstrap::BootstrapPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = BootstrapPolicy::default();
    /// assert_eq!(policy.delay_after(0), Duration::ZERO);
    /// assert_eq!(policy.delay_after(3), Duration::from_secs(3));
    /// ```
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    /// Upper bound of the time spent sleeping when every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts).map(|a| self.delay_after(a)).sum()
    }
}

/// Fields whose values never appear in `Debug` output.
const SECRET_FIELDS: [&str; 2] = ["dbpass", "wtpass"];

/// Form payload of the wizard's final step.
#[derive(Clone)]
pub struct SetupForm {
    fields: Vec<(&'static str, String)>,
}

impl std::fmt::Debug for SetupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.fields {
            if SECRET_FIELDS.contains(name) {
                map.entry(name, &"********");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl SetupForm {
    pub fn new(lang: &str, db: &DatabaseGroup<'_>, admin: &AdminAccount<'_>) -> Self {
        let fields = vec![
            ("lang", lang.to_string()),
            ("tblpfx", db.table_prefix.to_string()),
            ("dbtype", DB_TYPE.to_string()),
            ("dbhost", db.host.to_string()),
            ("dbport", db.port.to_string()),
            ("dbuser", db.user.to_string()),
            ("dbpass", db.pass.expose().to_string()),
            ("dbname", db.name.to_string()),
            ("wtname", admin.name.to_string()),
            ("wtuser", admin.user.to_string()),
            ("wtpass", admin.pass.expose().to_string()),
            ("wtemail", admin.email.to_string()),
            ("step", FINAL_STEP.to_string()),
        ];

        Self { fields }
    }

    /// Field names and values, in submission order.
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Value of a single field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP client for the setup wizard.
///
/// Redirects are never followed: a 302 from the wizard means it is done and
/// is treated as success, not as something to chase.
#[derive(Clone)]
pub struct BootstrapClient {
    http: reqwest::Client,
    policy: BootstrapPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl BootstrapClient {
    /// Build a client.
    ///
    /// `request_timeout` bounds each individual request; `None` waits for as
    /// long as the wizard takes.
    ///
    /// # Errors
    ///
    /// Returns [`InitError::HttpClient`] if the HTTP client cannot be created.
    pub fn new(
        policy: BootstrapPolicy,
        request_timeout: Option<Duration>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, InitError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("webtrees-init/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|e| InitError::HttpClient {
            message: e.to_string(),
        })?;

        Ok(Self {
            http,
            policy,
            sleeper,
        })
    }

    pub fn policy(&self) -> BootstrapPolicy {
        self.policy
    }

    /// POST `form` to `url` until the wizard answers 200 or 302.
    ///
    /// Any other status, and any transport error, counts as a failed attempt
    /// and is followed by the linear backoff sleep.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Exhausted`] naming `url` once every attempt
    /// has failed.
    pub async fn retry_request(&self, url: &str, form: &SetupForm) -> Result<(), BootstrapError> {
        for attempt in 0..self.policy.max_attempts {
            info!(attempt, url, "Attempt {} for {}", attempt, url);

            match self.http.post(url).form(form.fields()).send().await {
                Ok(response) => {
                    let status = response.status();
                    info!(attempt, status = status.as_u16(), "Received HTTP {} response", status.as_u16());

                    if is_success(status) {
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(attempt, url, error = %e, "Request failed");
                }
            }

            self.sleeper.sleep(self.policy.delay_after(attempt)).await;
        }

        Err(BootstrapError::Exhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}

// 302 is also fine: the wizard redirects when served on a port other than 80
fn is_success(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::FOUND
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
