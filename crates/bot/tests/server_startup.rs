use std::io::Write;
use std::net::TcpListener;
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

/// Minimal valid config. Both remote APIs point at a closed local port, so
/// the poll loop keeps backing off while the health endpoint serves.
fn minimal_config(port: u16, dead_port: u16) -> String {
    format!(
        r#"
[telegram]
token = "123:test-token"
api_url = "http://127.0.0.1:{dead_port}"
poll_timeout_secs = 1

[auth]
method = "allow_list"
allowed_users = [42]

[qbittorrent]
url = "http://127.0.0.1:{dead_port}"
username = "admin"
password = "adminadmin"

[server]
host = "127.0.0.1"
port = {port}
"#
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the bot and return a handle
async fn spawn_bot(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_courier"))
        .env("COURIER_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn bot")
}

/// Wait for the health endpoint to answer
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/health", port))
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

async fn run_failing(config_path: &std::path::Path) -> std::process::Output {
    timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_courier"))
            .env("COURIER_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command")
}

#[tokio::test]
async fn test_health_endpoint_while_chat_api_is_down() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port, get_available_port()));

    let mut bot = spawn_bot(config.path()).await;
    assert!(wait_for_server(port, 60).await, "Bot did not start in time");

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/health", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    bot.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port, get_available_port()));

    let mut bot = spawn_bot(config.path()).await;
    assert!(wait_for_server(port, 60).await, "Bot did not start in time");

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/config", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read body");
    assert!(!body.contains("test-token"));
    assert!(!body.contains("adminadmin"));

    let json: serde_json::Value = serde_json::from_str(&body).expect("Failed to parse JSON");
    assert_eq!(json["auth"]["method"], "allow_list");
    assert_eq!(json["server"]["port"], port);

    bot.kill().await.ok();
}

#[tokio::test]
async fn test_metrics_endpoint_serves_core_metrics() {
    let port = get_available_port();
    let config = write_config(&minimal_config(port, get_available_port()));

    let mut bot = spawn_bot(config.path()).await;
    assert!(wait_for_server(port, 60).await, "Bot did not start in time");

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("courier_auth_denials_total"));
    assert!(body.contains("courier_files_moved_total"));

    bot.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let result = run_failing(std::path::Path::new("/nonexistent/config.toml")).await;
    assert!(!result.status.success());
}

#[tokio::test]
async fn test_missing_telegram_section_exits_with_error() {
    let config = write_config(
        r#"
[auth]
method = "none"

[qbittorrent]
url = "http://localhost:8080"
username = "admin"
password = "adminadmin"
"#,
    );

    let result = run_failing(config.path()).await;
    assert!(!result.status.success());
}

#[tokio::test]
async fn test_empty_allow_list_exits_with_error() {
    let config = write_config(
        r#"
[telegram]
token = "123:test-token"

[auth]
method = "allow_list"

[qbittorrent]
url = "http://localhost:8080"
username = "admin"
password = "adminadmin"
"#,
    );

    let result = run_failing(config.path()).await;
    assert!(!result.status.success());
}
