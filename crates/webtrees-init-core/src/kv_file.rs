//! # Key-Value File Editor
//!
//! Idempotent, line-oriented patching of `key=value` style files such as
//! `config.ini.php` and `php.ini`.
//!
//! The file is read and written whole on every call. There is no locking:
//! callers must make sure only one writer touches a file at a time.

use crate::error::InitError;
use std::path::Path;

/// What [`upsert_line`] did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// A line with the same key already had the requested content; the file
    /// was not written.
    Unchanged,
    /// The first line starting with the key was replaced in place.
    Replaced,
    /// No line started with the key; the new line was appended.
    Appended,
}

/// Make sure `path` contains `line`.
///
/// The key is everything in `line` before the first `=` (for `a = b` that is
/// `"a "`). The first existing line starting with the key is replaced, or
/// `line` is appended if there is none. If that line is already identical,
/// nothing is written, so modification times stay untouched.
///
/// # Errors
///
/// Returns [`InitError::Io`] if the file cannot be read (including when it
/// does not exist) or written.
///
/// # Examples
///
/// ```no_run
/// use webtrees_init_core::kv_file::{upsert_line, Upsert};
///
/// let outcome = upsert_line("data/config.ini.php".as_ref(), "dbhost=\"db\"")?;
/// assert_ne!(outcome, Upsert::Unchanged);
/// # Ok::<(), webtrees_init_core::InitError>(())
/// ```
pub fn upsert_line(path: &Path, line: &str) -> Result<Upsert, InitError> {
    let contents = std::fs::read_to_string(path).map_err(|e| InitError::io(path, e))?;

    let key = line.split('=').next().unwrap_or(line);
    let new_line = format!("{}\n", line);

    let mut lines: Vec<String> = contents.split_inclusive('\n').map(str::to_string).collect();

    let outcome = match lines.iter().position(|l| l.starts_with(key)) {
        Some(index) if lines[index] == new_line => return Ok(Upsert::Unchanged),
        Some(index) => {
            lines[index] = new_line;
            Upsert::Replaced
        }
        None => {
            // Terminate a dangling last line so the new key does not fuse with it
            if let Some(last) = lines.last_mut() {
                if !last.ends_with('\n') {
                    last.push('\n');
                }
            }
            lines.push(new_line);
            Upsert::Appended
        }
    };

    std::fs::write(path, lines.concat()).map_err(|e| InitError::io(path, e))?;

    Ok(outcome)
}

#[cfg(test)]
#[path = "kv_file_tests.rs"]
mod tests;
