use super::*;
use tempfile::TempDir;

fn command(parts: &[&str], dir: &TempDir) -> ServerCommand {
    let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
    ServerCommand::new(&parts, dir.path(), true).unwrap()
}

#[test]
fn test_empty_command_is_rejected() {
    let result = ServerCommand::new(&[], "/", true);

    assert!(matches!(result, Err(InitError::Configuration { .. })));
}

#[test]
fn test_foreground_command_keeps_arguments_and_directory() {
    let dir = TempDir::new().unwrap();
    let server = command(&["apache2-foreground", "-DFOREGROUND"], &dir);

    let foreground = server.foreground();

    assert_eq!(foreground.get_program(), "apache2-foreground");
    let args: Vec<_> = foreground.get_args().collect();
    assert_eq!(args, vec!["-DFOREGROUND"]);
    assert_eq!(foreground.get_current_dir(), Some(dir.path()));
}

#[tokio::test]
async fn test_spawn_failure_names_program() {
    let dir = TempDir::new().unwrap();
    let server = command(&["webtrees-init-no-such-server"], &dir);

    match server.spawn_background() {
        Err(InitError::Process { command, .. }) => {
            assert_eq!(command, "webtrees-init-no-such-server")
        }
        Err(other) => panic!("Expected Process error, got {:?}", other),
        Ok(_) => panic!("Expected spawn to fail"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_background_server_is_terminated() {
    let dir = TempDir::new().unwrap();
    let server = command(&["sleep", "300"], &dir);

    let mut handle = server.spawn_background().unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(10), handle.terminate())
        .await
        .expect("terminate should not hang")
        .unwrap();
}
