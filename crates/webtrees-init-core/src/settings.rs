//! # Settings Snapshot
//!
//! The immutable set of application settings resolved from the environment
//! once at startup. Components receive it by `Arc` and never look at the
//! environment themselves.

use crate::env::{EnvResolver, EnvSource};
use serde::{Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value, such as a password.
///
/// Never shown in `Debug` output, logs or serialized snapshots. The backing
/// memory is wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The clear-text value. Only call this where the value must leave the
    /// process (config file, setup form).
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("********")
    }
}

/// All settings derived from the environment.
///
/// Every field is individually optional (a `_FILE` variable pointing at a
/// missing file clears even a defaulted setting). Fields that are only
/// meaningful together are exposed through the group accessors
/// [`Settings::database`], [`Settings::admin_account`] and [`Settings::tls`],
/// which return `None` unless the whole group is present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub pretty_urls: bool,
    pub lang: Option<String>,
    pub base_url: Option<String>,

    pub db_host: Option<String>,
    pub db_port: Option<String>,
    pub db_user: Option<String>,
    pub db_pass: Option<Secret>,
    pub db_name: Option<String>,
    pub table_prefix: Option<String>,

    // https://github.com/fisharebest/webtrees/blob/main/app/Http/Middleware/UseDatabase.php
    pub db_key: Option<String>,
    pub db_cert: Option<String>,
    pub db_ca: Option<String>,
    pub db_verify: bool,

    pub wt_user: Option<String>,
    pub wt_name: Option<String>,
    pub wt_pass: Option<Secret>,
    pub wt_email: Option<String>,

    pub php_memory_limit: Option<String>,
    pub php_max_execution_time: Option<String>,
    pub php_post_max_size: Option<String>,
    pub php_upload_max_file_size: Option<String>,

    pub trusted_headers: Option<String>,
}

impl Settings {
    /// Resolve every setting from `resolver`.
    pub fn from_env<S: EnvSource>(resolver: &EnvResolver<S>) -> Self {
        let r = |key: &str| resolver.resolve(key, None, &[]);
        let d = |key: &str, default: &str| resolver.resolve(key, Some(default), &[]);

        Self {
            pretty_urls: resolver.resolve_flag("PRETTY_URLS"),
            lang: d("LANG", "en-US"),
            base_url: r("BASE_URL"),
            db_host: r("DB_HOST"),
            db_port: d("DB_PORT", "3306"),
            db_user: resolver.resolve(
                "DB_USER",
                Some("webtrees"),
                &["MYSQL_USER", "MARIADB_USER", "POSTGRES_USER"],
            ),
            db_pass: resolver
                .resolve(
                    "DB_PASS",
                    None,
                    &["MYSQL_PASSWORD", "MARIADB_PASSWORD", "POSTGRES_PASSWORD"],
                )
                .map(Secret::new),
            db_name: resolver.resolve(
                "DB_NAME",
                Some("webtrees"),
                &["MYSQL_DATABASE", "MARIADB_DATABASE", "POSTGRES_DB"],
            ),
            table_prefix: d("DB_PREFIX", "wt_"),
            db_key: r("DB_KEY"),
            db_cert: r("DB_CERT"),
            db_ca: r("DB_CA"),
            db_verify: resolver.resolve_flag("DB_VERIFY"),
            wt_user: r("WT_USER"),
            wt_name: r("WT_NAME"),
            wt_pass: r("WT_PASS").map(Secret::new),
            wt_email: r("WT_EMAIL"),
            php_memory_limit: d("PHP_MEMORY_LIMIT", "1024M"),
            php_max_execution_time: d("PHP_MAX_EXECUTION_TIME", "90"),
            php_post_max_size: d("PHP_POST_MAX_SIZE", "50M"),
            php_upload_max_file_size: d("PHP_UPLOAD_MAX_FILE_SIZE", "50M"),
            trusted_headers: d("TRUSTED_HEADERS", ""),
        }
    }

    /// The database connection settings, if all six are present.
    pub fn database(&self) -> Option<DatabaseGroup<'_>> {
        Some(DatabaseGroup {
            host: self.db_host.as_deref()?,
            port: self.db_port.as_deref()?,
            user: self.db_user.as_deref()?,
            pass: self.db_pass.as_ref()?,
            name: self.db_name.as_deref()?,
            table_prefix: self.table_prefix.as_deref()?,
        })
    }

    /// The initial administrator account, if all four fields are present.
    pub fn admin_account(&self) -> Option<AdminAccount<'_>> {
        Some(AdminAccount {
            name: self.wt_name.as_deref()?,
            user: self.wt_user.as_deref()?,
            pass: self.wt_pass.as_ref()?,
            email: self.wt_email.as_deref()?,
        })
    }

    /// The database TLS files, if key, certificate and CA are all present.
    pub fn tls(&self) -> Option<TlsGroup<'_>> {
        Some(TlsGroup {
            key: self.db_key.as_deref()?,
            cert: self.db_cert.as_deref()?,
            ca: self.db_ca.as_deref()?,
            verify: self.db_verify,
        })
    }
}

/// Complete database connection settings.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseGroup<'a> {
    pub host: &'a str,
    pub port: &'a str,
    pub user: &'a str,
    pub pass: &'a Secret,
    pub name: &'a str,
    pub table_prefix: &'a str,
}

/// Complete initial administrator account.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccount<'a> {
    pub name: &'a str,
    pub user: &'a str,
    pub pass: &'a Secret,
    pub email: &'a str,
}

/// Complete database TLS settings.
#[derive(Debug, Clone, Copy)]
pub struct TlsGroup<'a> {
    pub key: &'a str,
    pub cert: &'a str,
    pub ca: &'a str,
    pub verify: bool,
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
