use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config
fn minimal_config(port: u16) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[retention]
window_minutes = 15

[ffmpeg]
enabled = false
"#,
        port
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn server_command(config_path: &Path) -> tokio::process::Command {
    let mut command = tokio::process::Command::new(env!("CARGO_BIN_EXE_fileforge"));
    command
        .env("FILEFORGE_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true);
    command
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &Path) -> tokio::process::Child {
    server_command(config_path)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

async fn get_json(port: u16, path: &str) -> serde_json::Value {
    let response = Client::new()
        .get(format!("http://127.0.0.1:{}{}", port, path))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let config_file = write_config(&minimal_config(port));

    let mut server = spawn_server(config_file.path());
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let json = get_json(port, "/api/v1/health").await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_reflects_file() {
    let port = get_available_port();
    let config_file = write_config(&minimal_config(port));

    let mut server = spawn_server(config_file.path());
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let json = get_json(port, "/api/v1/config").await;
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["retention"]["window_minutes"], 15);
    assert_eq!(json["ffmpeg"]["enabled"], false);

    let retention = get_json(port, "/api/v1/settings/retention").await;
    assert_eq!(retention["window_minutes"], 15);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_uses_defaults() {
    let port = get_available_port();

    let mut server = server_command(Path::new("/nonexistent/config.toml"))
        .env("FILEFORGE_SERVER__HOST", "127.0.0.1")
        .env("FILEFORGE_SERVER__PORT", port.to_string())
        .spawn()
        .expect("Failed to spawn server");
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let json = get_json(port, "/api/v1/config").await;
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["retention"]["window_minutes"], 5);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let config_file = write_config(
        r#"
[server]
port = 8080

[retention]
window_minutes = 0
"#,
    );

    let result = timeout(Duration::from_secs(5), server_command(config_file.path()).output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[tokio::test]
async fn test_malformed_config_exits_with_error() {
    let config_file = write_config("[server]\nport = \"high\"\n");

    let result = timeout(Duration::from_secs(5), server_command(config_file.path()).output())
        .await
        .expect("Command timed out")
        .expect("Failed to execute command");

    assert!(!result.status.success());
}

#[cfg(unix)]
#[tokio::test]
async fn test_sigterm_shuts_down_cleanly() {
    let port = get_available_port();
    let config_file = write_config(&format!(
        "[server]\nhost = \"127.0.0.1\"\nport = {}\n\n[ffmpeg]\nenabled = true\n",
        port
    ));

    let server = server_command(config_file.path())
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .stdout(std::process::Stdio::piped())
        .spawn()
        .expect("Failed to spawn server");
    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    let pid = server.id().expect("Server has no pid");
    let status = std::process::Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status()
        .expect("Failed to send SIGTERM");
    assert!(status.success());

    let output = timeout(Duration::from_secs(10), server.wait_with_output())
        .await
        .expect("Server did not stop in time")
        .expect("Failed to wait for server");
    assert!(output.status.success());
    let logs = String::from_utf8_lossy(&output.stdout);
    assert!(logs.contains("FFmpeg engine released"), "logs: {}", logs);
}
