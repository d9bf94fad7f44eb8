//! # Environment Resolver
//!
//! Looks a setting up in the process environment with three fallbacks:
//!
//! 1. the variable itself (`KEY`),
//! 2. a secret file named by `KEY_FILE`,
//! 3. each alternate name, resolved the same way,
//!
//! and finally the supplied default. Every step logs which source answered.

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Read-only view of a set of environment variables.
pub trait EnvSource: Send + Sync {
    /// Value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        // A non-unicode value is treated like an unset one
        std::env::var(key).ok()
    }
}

/// In-memory environment, used to resolve settings without touching the
/// process environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Resolves settings against an [`EnvSource`].
///
/// # Examples
///
/// ```
/// use webtrees_init_core::env::{EnvResolver, MapEnv};
///
/// let resolver = EnvResolver::new(MapEnv::new().with("MYSQL_USER", "alice"));
/// let user = resolver.resolve("DB_USER", Some("webtrees"), &["MYSQL_USER"]);
/// assert_eq!(user.as_deref(), Some("alice"));
/// ```
#[derive(Debug, Clone)]
pub struct EnvResolver<S> {
    source: S,
}

impl<S: EnvSource> EnvResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Resolve `key`, falling back to its `_FILE` variant, then `alternates`,
    /// then `default`.
    ///
    /// The key is upper-cased before lookup. When `KEY_FILE` names a path that
    /// is not a file the result is `None` and the default is *not* applied.
    pub fn resolve(&self, key: &str, default: Option<&str>, alternates: &[&str]) -> Option<String> {
        let key = key.to_uppercase();

        if let Some(value) = self.source.var(&key) {
            info!(key = %key, "{} found in environment variables", key);
            return Some(value);
        }

        let file_key = format!("{}_FILE", key);
        if let Some(path) = self.source.var(&file_key) {
            return read_secret_file(&file_key, Path::new(&path));
        }

        for alternate in alternates {
            if let Some(value) = self.resolve(alternate, None, &[]) {
                return Some(value);
            }
        }

        info!(
            key = %key,
            default = ?default,
            "{} NOT found in environment variables, using default",
            key
        );
        default.map(str::to_string)
    }

    /// Resolve a flag; see [`truish`].
    pub fn resolve_flag(&self, key: &str) -> bool {
        truish(self.resolve(key, None, &[]).as_deref())
    }
}

fn read_secret_file(file_key: &str, path: &Path) -> Option<String> {
    if !path.is_file() {
        warn!(key = %file_key, path = %path.display(), "{} is not a file", file_key);
        return None;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => {
            info!(key = %file_key, "{} found in environment variables", file_key);
            Some(contents.trim().to_string())
        }
        Err(e) => {
            warn!(
                key = %file_key,
                path = %path.display(),
                error = %e,
                "Could not read secret file"
            );
            None
        }
    }
}

/// Whether a value is close enough to true: `true`, `yes` or `1`, ignoring
/// case and surrounding whitespace.
pub fn truish(value: Option<&str>) -> bool {
    match value {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        None => false,
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
