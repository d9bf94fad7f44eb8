//! Tests for the key-value file editor.

use super::*;
use std::fs;
use tempfile::TempDir;

fn file_with(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.ini.php");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_second_identical_upsert_does_not_rewrite() {
    let dir = TempDir::new().unwrap();
    let path = file_with(&dir, "; <?php return; ?> DO NOT DELETE THIS LINE\n");

    assert_eq!(upsert_line(&path, "dbhost=\"db\"").unwrap(), Upsert::Appended);
    let after_first = fs::read(&path).unwrap();
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    assert_eq!(upsert_line(&path, "dbhost=\"db\"").unwrap(), Upsert::Unchanged);
    assert_eq!(fs::read(&path).unwrap(), after_first);
    assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), modified);
}

#[test]
fn test_replace_changes_only_matching_line() {
    let dir = TempDir::new().unwrap();
    let path = file_with(
        &dir,
        "; header\ndbhost=\"old\"\ndbport=\"3306\"\nbase_url=\"https://x\"\n",
    );

    assert_eq!(upsert_line(&path, "dbport=\"3307\"").unwrap(), Upsert::Replaced);

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "; header\ndbhost=\"old\"\ndbport=\"3307\"\nbase_url=\"https://x\"\n"
    );
}

#[test]
fn test_only_first_matching_line_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = file_with(&dir, "a=\"1\"\na=\"2\"\n");

    upsert_line(&path, "a=\"3\"").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "a=\"3\"\na=\"2\"\n");
}

#[test]
fn test_append_adds_one_line_at_end() {
    let dir = TempDir::new().unwrap();
    let path = file_with(&dir, "one=\"1\"\ntwo=\"2\"\n");

    assert_eq!(upsert_line(&path, "three=\"3\"").unwrap(), Upsert::Appended);

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, vec!["one=\"1\"", "two=\"2\"", "three=\"3\""]);
}

#[test]
fn test_append_after_unterminated_last_line() {
    let dir = TempDir::new().unwrap();
    let path = file_with(&dir, "one=\"1\"");

    upsert_line(&path, "two=\"2\"").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "one=\"1\"\ntwo=\"2\"\n");
}

#[test]
fn test_append_to_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = file_with(&dir, "");

    upsert_line(&path, "memory_limit = 1024M").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "memory_limit = 1024M\n");
}

#[test]
fn test_space_separated_key_includes_trailing_space() {
    let dir = TempDir::new().unwrap();
    let path = file_with(&dir, "[PHP]\n\nmemory_limit = 128M\nmemory_limit_extra = 1\n");

    assert_eq!(
        upsert_line(&path, "memory_limit = 1024M").unwrap(),
        Upsert::Replaced
    );

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "[PHP]\n\nmemory_limit = 1024M\nmemory_limit_extra = 1\n"
    );
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.ini");

    let err = upsert_line(&path, "a=b").unwrap_err();

    match err {
        InitError::Io { path: p, .. } => assert_eq!(p, path),
        other => panic!("Expected Io error, got {:?}", other),
    }
    assert!(!path.exists());
}
