use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::{tempdir, NamedTempFile, TempDir};

const ENV_VARS: &[&str] = &[
    "GITHUB_TOKEN",
    "GITHUB_API_URL",
    "GITHUB_SERVER_URL",
    "GITHUB_REPOSITORY_OWNER",
    "GITHUB_REPOSITORY",
    "GITHUB_RUN_ID",
    "SLACK_WEBHOOK_URL",
    "INPUT_SLACK-WEBHOOK",
    "RUST_LOG",
];

fn run_json() -> serde_json::Value {
    json!({
        "id": 1,
        "head_branch": "main",
        "event": "push",
        "head_commit": {"id": "abc123"},
        "html_url": "https://x/run/1",
        "triggering_actor": {"login": "bob"}
    })
}

fn jobs_json() -> serde_json::Value {
    json!({
        "total_count": 3,
        "jobs": [
            {"name": "build", "status": "completed", "conclusion": "success", "html_url": "https://x/job/1", "steps": []},
            {"name": "test", "status": "completed", "conclusion": "failure", "html_url": "https://x/job/2",
             "steps": [{"name": "checkout", "conclusion": "success"}, {"name": "cargo test", "conclusion": "failure"}]},
            {"name": "deploy", "status": "queued", "conclusion": null, "html_url": "https://x/job/3", "steps": []}
        ]
    })
}

/// Binary with a scrubbed environment, run from an empty directory.
fn notifier(cwd: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("actions-notify").unwrap();
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(cwd.path())
        .env("GITHUB_REPOSITORY_OWNER", "octo")
        .env("GITHUB_REPOSITORY", "octo/widgets")
        .env("GITHUB_RUN_ID", "1");
    cmd
}

#[test]
fn dry_run_prints_payload_from_mock_source() {
    let responses = tempdir().unwrap();
    fs::write(responses.path().join("run.json"), run_json().to_string()).unwrap();
    fs::write(responses.path().join("jobs.json"), jobs_json().to_string()).unwrap();

    let toml_content = format!(
        r#"[source]
provider = "mock"
path = "{}"
"#,
        responses.path().display()
    );
    let toml_file = NamedTempFile::new().unwrap();
    fs::write(toml_file.path(), toml_content).unwrap();

    let cwd = tempdir().unwrap();
    notifier(&cwd)
        .arg("notify")
        .arg("--dry-run")
        .arg("--config")
        .arg(toml_file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""text": "*build*\n✅ success""#))
        .stdout(predicate::str::contains(
            r#""text": "*test*\n❌ failure\n> Failed on: cargo test""#,
        ))
        .stdout(predicate::str::contains("deploy").not())
        .stdout(predicate::str::contains(
            "https://github.com/octo/widgets/commit/abc123",
        ));
}

#[test]
fn delivers_to_webhook() {
    let server = MockServer::start();
    let run = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/octo/widgets/actions/runs/1")
            .header("authorization", "Bearer t0ken");
        then.status(200).json_body(run_json());
    });
    let jobs = server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/actions/runs/1/jobs");
        then.status(200).json_body(jobs_json());
    });
    let hook = server.mock(|when, then| {
        when.method(POST)
            .path("/hook")
            .body_contains("[GitHub] bob")
            .body_contains("View CI/CD");
        then.status(200).body("ok");
    });

    let cwd = tempdir().unwrap();
    notifier(&cwd)
        .arg("notify")
        .env("GITHUB_TOKEN", "t0ken")
        .env("GITHUB_API_URL", server.base_url())
        .env("INPUT_SLACK-WEBHOOK", server.url("/hook"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"delivered\": true"));

    run.assert();
    jobs.assert();
    hook.assert();
}

#[test]
fn webhook_failure_exits_non_zero() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/actions/runs/1");
        then.status(200).json_body(run_json());
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/octo/widgets/actions/runs/1/jobs");
        then.status(200).json_body(jobs_json());
    });
    server.mock(|when, then| {
        when.method(POST).path("/hook");
        then.status(500).body("boom");
    });

    let cwd = tempdir().unwrap();
    notifier(&cwd)
        .arg("notify")
        .env("GITHUB_TOKEN", "t0ken")
        .env("GITHUB_API_URL", server.base_url())
        .env("SLACK_WEBHOOK_URL", server.url("/hook"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Slack API error"));
}

#[test]
fn malformed_repository_is_fatal() {
    let cwd = tempdir().unwrap();
    notifier(&cwd)
        .arg("notify")
        .arg("--dry-run")
        .env("GITHUB_REPOSITORY", "widgets")
        .env("GITHUB_TOKEN", "t0ken")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not of the form owner/repo"));
}

#[test]
fn version_json() {
    let cwd = tempdir().unwrap();
    notifier(&cwd)
        .args(["version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
