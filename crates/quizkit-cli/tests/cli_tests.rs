//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quizkit() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizkit").unwrap();
    cmd.env_remove("QUIZKIT_BASE_URL").env_remove("QUIZKIT_PASSWORD");
    cmd
}

#[test]
fn validate_single_test() {
    quizkit()
        .arg("validate")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mini-Test (2 tasks, 15 points)"))
        .stdout(predicate::str::contains("All tests valid"));
}

#[test]
fn validate_directory_reports_warnings() {
    quizkit()
        .arg("validate")
        .arg("--test")
        .arg("../../quizzes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mini-Test"))
        .stdout(predicate::str::contains("Modulo"))
        .stdout(predicate::str::contains("Unfinished Draft"))
        .stdout(predicate::str::contains("[task 1] WARNING: question is empty"))
        .stdout(predicate::str::contains("outside 0-100"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    quizkit()
        .arg("validate")
        .arg("--test")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn grade_sample_attempts() {
    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .arg("--attempts")
        .arg("../../quizzes/mini-attempts.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("5/5, 0/10"))
        .stdout(predicate::str::contains("33.3%"))
        .stdout(predicate::str::contains("FAILED"))
        .stdout(predicate::str::contains("100.0%"))
        .stdout(predicate::str::contains("PASSED"))
        .stdout(predicate::str::contains("2 attempt(s), 1 passed, average 66.7%"));
}

#[test]
fn grade_json_output() {
    let output = quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .arg("--attempts")
        .arg("../../quizzes/mini-attempts.json")
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["attempts_count"], 2);
    assert_eq!(json["summary"]["passed"], 1);
    assert_eq!(json["attempts"][0]["task_points"], serde_json::json!([5.0, 0.0]));
    assert_eq!(json["attempts"][1]["attempt_points"], 15.0);
    assert_eq!(json["attempts"][1]["passed"], true);
}

#[test]
fn grade_partial_credit_policy() {
    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/modulo.toml")
        .arg("--attempts")
        .arg("../../quizzes/modulo-attempts.json")
        .arg("--policy")
        .arg("all-or-nothing")
        .assert()
        .success()
        .stdout(predicate::str::contains("all-or-nothing"))
        .stdout(predicate::str::contains("0/25, 5/5"));

    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/modulo.toml")
        .arg("--attempts")
        .arg("../../quizzes/modulo-attempts.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("20/25, 5/5"));
}

#[test]
fn grade_mismatched_attempt_fails() {
    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .arg("--attempts")
        .arg("../../quizzes/mini-mismatched.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("attempt by carl"))
        .stderr(predicate::str::contains("1 answers but the test has 2 tasks"));
}

#[test]
fn grade_rejects_second_submission() {
    let dir = TempDir::new().unwrap();
    let attempts = dir.path().join("twice.json");
    std::fs::write(
        &attempts,
        r#"[{"solved_by": "anna", "answers": [1, 2]}, {"solved_by": "anna", "answers": [0, 0]}]"#,
    )
    .unwrap();

    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .arg("--attempts")
        .arg(&attempts)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already submitted"));
}

#[test]
fn grade_then_summarize() {
    let dir = TempDir::new().unwrap();
    let instance = dir.path().join("instance.json");

    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .arg("--attempts")
        .arg("../../quizzes/mini-attempts.json")
        .arg("--remark")
        .arg("group A")
        .arg("--output")
        .arg(&instance)
        .assert()
        .success();
    assert!(instance.exists());

    quizkit()
        .arg("summarize")
        .arg("--instance")
        .arg(&instance)
        .assert()
        .success()
        .stdout(predicate::str::contains("Remark: group A"))
        .stdout(predicate::str::contains("Attempts: 2, passed: 1, average: 66.7%"))
        .stdout(predicate::str::contains("108: 100%"));

    quizkit()
        .arg("summarize")
        .arg("--instance")
        .arg(&instance)
        .arg("--student")
        .arg("anna")
        .assert()
        .success()
        .stdout(predicate::str::contains("5/15 (33.3%) FAILED"))
        .stdout(predicate::str::contains("PASSED").not());
}

#[test]
fn summarize_rejects_tampered_pass_flag() {
    let dir = TempDir::new().unwrap();
    let instance = dir.path().join("instance.json");

    quizkit()
        .arg("grade")
        .arg("--test")
        .arg("../../quizzes/mini-test.toml")
        .arg("--attempts")
        .arg("../../quizzes/mini-attempts.json")
        .arg("--output")
        .arg(&instance)
        .assert()
        .success();

    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&instance).unwrap()).unwrap();
    assert_eq!(value["solution_attempts"][0]["passed"], false);
    value["solution_attempts"][0]["passed"] = serde_json::json!(true);
    std::fs::write(&instance, serde_json::to_string(&value).unwrap()).unwrap();

    quizkit()
        .arg("summarize")
        .arg("--instance")
        .arg(&instance)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse instance"))
        .stderr(predicate::str::contains("marked passed=true"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizkit.toml"))
        .stdout(predicate::str::contains("Created quizzes/example.toml"));

    assert!(dir.path().join("quizkit.toml").exists());
    assert!(dir.path().join("quizzes/example.toml").exists());

    // The generated example grades cleanly.
    quizkit()
        .current_dir(dir.path())
        .arg("grade")
        .arg("--test")
        .arg("quizzes/example.toml")
        .arg("--attempts")
        .arg("quizzes/example-attempts.json")
        .arg("--config")
        .arg("quizkit.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("anna"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizkit().current_dir(dir.path()).arg("init").assert().success();

    quizkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

fn write_config(dir: &Path, base_url: &str) -> std::path::PathBuf {
    let config = dir.join("quizkit.toml");
    let session = dir.join("session.json");
    std::fs::write(
        &config,
        format!(
            "base_url = \"{base_url}\"\nsession_file = \"{}\"\n",
            session.display()
        ),
    )
    .unwrap();
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn login_refresh_logout_against_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frontend_api/get_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "username": "mmm",
            "name": "Max Mustermann",
            "role": "teacher",
            "token": "jwt-1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/frontend_api/refresh_token"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("\"jwt-2\""))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());

    quizkit()
        .args(["login", "--username", "mmm", "--password", "secret", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as mmm (Max Mustermann, teacher)"));

    quizkit()
        .args(["refresh", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Token refreshed"));

    let stored = std::fs::read_to_string(dir.path().join("session.json")).unwrap();
    assert!(stored.contains("jwt-2"));

    quizkit()
        .args(["whoami", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mmm"));

    quizkit()
        .args(["logout", "--config"])
        .arg(&config)
        .assert()
        .success();

    quizkit()
        .args(["whoami", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn login_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/frontend_api/get_token"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!(["Login error", "wrong password"])),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());

    quizkit()
        .args(["login", "--username", "mmm", "--password", "nope", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"))
        .stderr(predicate::str::contains("wrong password"));
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_refresh_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/frontend_api/refresh_token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), &server.uri());
    std::fs::write(
        dir.path().join("session.json"),
        r#"{"username": "anna", "name": "Anna", "role": "student", "token": "old"}"#,
    )
    .unwrap();

    quizkit()
        .args(["refresh", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("quizkit login"));
    assert!(!dir.path().join("session.json").exists());
}

#[test]
fn refresh_without_session_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "http://127.0.0.1:9");

    quizkit()
        .args(["refresh", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not logged in"));
}

#[test]
fn help_output() {
    quizkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz grading and session toolkit"));
}

#[test]
fn version_output() {
    quizkit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizkit"));
}
