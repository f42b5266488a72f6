//! Integration tests for the classroom-qa binary. Runs the binary with a
//! temp config pointed at a mock REST server.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write as _;
use std::net::TcpListener as StdTcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Pick a free port by binding to :0 and extracting the assigned port.
fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Write a YAML config pointing the API at `api_url` and state into `dir`.
fn write_config(dir: &tempfile::TempDir, api_url: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        "api:\n  base_url: {}\n  auth_token: tok\n  user_id: u-1\nstorage:\n  state_dir: {}",
        api_url,
        dir.path().join("state").display()
    )
    .unwrap();
    path
}

fn session_json(id: &str, active: bool) -> serde_json::Value {
    json!({
        "sessionId": id,
        "courseName": "CS101",
        "sessionDate": "2024-09-27",
        "createdAt": "2024-09-27T09:00:00Z",
        "isActive": active,
        "questionCount": 2
    })
}

#[tokio::test]
async fn sessions_lists_active_sessions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/my"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [session_json("CS101-SEP27-001", true)]
        })))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &format!("{}/api", server.uri()));

    let mut cmd = Command::from(cargo_bin_cmd!("classroom-qa"));
    cmd.arg("--config").arg(&config_path).arg("sessions");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CS101-SEP27-001"))
        .stdout(predicate::str::contains("2 questions"));
}

#[tokio::test]
async fn ask_joins_submits_and_remembers_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/CS101-A"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"session": session_json("CS101-A", true)})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/CS101-A/join"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/questions"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &format!("{}/api", server.uri()));

    // Lowercase code is normalised; question comes from stdin.
    let mut cmd = Command::from(cargo_bin_cmd!("classroom-qa"));
    cmd.env("CLASSROOM_QA_CONFIG", &config_path)
        .args(["ask", "cs101-a"])
        .write_stdin("What is a lifetime?\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Question submitted to CS101-A"));

    let stored = dir.path().join("state").join("current-session-u-1.json");
    assert!(predicates::path::exists().eval(&stored));
    let contents = std::fs::read_to_string(&stored).unwrap();
    assert!(predicate::str::contains("CS101-A").eval(&contents));
}

#[tokio::test]
async fn ask_in_ended_session_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/OLD"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"session": session_json("OLD", false)})),
        )
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &format!("{}/api", server.uri()));

    let mut cmd = Command::from(cargo_bin_cmd!("classroom-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .args(["ask", "OLD", "anyone", "there?"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no longer accepting questions"));
}

#[tokio::test]
async fn end_with_yes_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/sessions/CS101-A/end"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &format!("{}/api", server.uri()));

    let mut cmd = Command::from(cargo_bin_cmd!("classroom-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .args(["end", "CS101-A", "--yes"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Session CS101-A ended"));
}

#[test]
fn end_without_confirmation_is_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &format!("http://127.0.0.1:{}/api", free_port()));

    let mut cmd = Command::from(cargo_bin_cmd!("classroom-qa"));
    cmd.arg("--config")
        .arg(&config_path)
        .args(["end", "CS101-A"])
        .write_stdin("no\n");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Cancelled"));
}

#[test]
fn server_down_shows_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(&dir, &format!("http://127.0.0.1:{}/api", free_port()));

    let mut cmd = Command::from(cargo_bin_cmd!("classroom-qa"));
    cmd.arg("--config").arg(&config_path).arg("sessions");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error: failed to load sessions"));
}
