//! Integration tests for the publisher-action binary

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::net::TcpListener;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher_action() -> Command {
        cargo_bin_cmd!("publisher-action")
    }

    /// Command with a clean runner-like environment
    fn phase(phase: &str, event_path: &Path) -> Command {
        let mut cmd = publisher_action();
        cmd.env_clear()
            .env("GITHUB_EVENT_PATH", event_path)
            .env("GITHUB_REPOSITORY", "o/r")
            .env("GITHUB_RUN_ID", "9")
            .env("GITHUB_SERVER_URL", "https://github.com")
            .env("INPUT_SUCCESS_ENV_VAR_NAME", "PUBLISHER_SUCCESS")
            .env("INPUT_GITHUB_TOKEN", "ghs_test")
            .env("INPUT_CACHE_KEY", "k")
            .env("INPUT_CACHE_PATHS", "/a\n/b")
            .arg(phase);
        cmd
    }

    fn write_event(dir: &TempDir, payload: &str) -> std::path::PathBuf {
        let path = dir.path().join("event.json");
        let event = serde_json::json!({ "inputs": { "publisher_payload": payload } });
        std::fs::write(&path, event.to_string()).unwrap();
        path
    }

    /// Publisher stand-in accepting notifications on `/callback`
    async fn publisher() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/callback"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    }

    fn payload(server: &MockServer) -> String {
        serde_json::json!({
            "callbackUrl": format!("{}/callback", server.uri()),
            "clearCache": false
        })
        .to_string()
    }

    /// Bodies of every notification the Publisher received
    async fn notifications(server: &MockServer) -> Vec<serde_json::Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| r.body_json().unwrap())
            .collect()
    }

    #[test]
    fn help_displays() {
        publisher_action()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("status notification"));
    }

    #[test]
    fn version_displays() {
        publisher_action()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("publisher-action"));
    }

    #[test]
    fn malformed_payload_fails_before_anything_else() {
        let dir = TempDir::new().unwrap();
        let event = write_event(&dir, "{callbackUrl: nope");

        phase("main", &event)
            .assert()
            .failure()
            .stdout(predicate::str::contains(
                "::error::Failed to get config: Failed to parse \"publisher_payload\" input",
            ));
    }

    #[test]
    fn missing_payload_fails() {
        let dir = TempDir::new().unwrap();
        let event = dir.path().join("event.json");
        std::fs::write(&event, r#"{"inputs": {}}"#).unwrap();

        phase("pre", &event)
            .assert()
            .failure()
            .stdout(predicate::str::contains("Missing \"publisher_payload\" input"));
    }

    #[tokio::test]
    async fn invalid_token_input_fails_without_notifying() {
        let server = publisher().await;
        let dir = TempDir::new().unwrap();
        let event = write_event(&dir, &payload(&server));

        phase("pre", &event)
            .env("INPUT_GITHUB_TOKEN", "")
            .assert()
            .failure()
            .stdout(predicate::str::contains("::error::Failed to get config"))
            .stdout(predicate::str::contains("github_token"));

        assert!(notifications(&server).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_sends_no_notification() {
        let server = publisher().await;
        let dir = TempDir::new().unwrap();
        let event = write_event(&dir, &payload(&server).replace('"', ""));

        phase("post", &event).assert().failure();

        assert!(notifications(&server).await.is_empty());
    }

    #[tokio::test]
    async fn pre_notifies_started() {
        let server = publisher().await;
        let dir = TempDir::new().unwrap();
        let event = write_event(&dir, &payload(&server));

        phase("pre", &event)
            .assert()
            .success()
            .stdout(predicate::str::contains("Notifying Publisher"));

        assert_eq!(
            notifications(&server).await,
            vec![serde_json::json!({
                "status": "started",
                "workflowRunUrl": "https://github.com/o/r/actions/runs/9"
            })]
        );
    }

    #[tokio::test]
    async fn post_without_marker_reports_failure() {
        let server = publisher().await;
        let dir = TempDir::new().unwrap();
        let event = write_event(&dir, &payload(&server));

        phase("post", &event).assert().success();

        let sent = notifications(&server).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["status"], "failure");
    }

    #[tokio::test]
    async fn nul_in_exported_variable_fails_and_notifies() {
        let server = publisher().await;
        let dir = TempDir::new().unwrap();
        let env_file = dir.path().join("github_env");
        let payload = serde_json::json!({
            "callbackUrl": format!("{}/callback", server.uri()),
            "clearCache": true,
            "environmentVariables": { "FOO": "a\u{0}b" }
        })
        .to_string();
        let event = write_event(&dir, &payload);

        phase("main", &event)
            .env("GITHUB_ENV", &env_file)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("::error::Failed to set environment variable FOO"));

        let sent = notifications(&server).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["status"], "failure");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_environment_is_tolerated() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let server = publisher().await;
        let dir = TempDir::new().unwrap();
        let event = write_event(&dir, &payload(&server));

        phase("pre", &event)
            .env("SOME_BINARY_VAR", OsStr::from_bytes(&[0xff, 0xfe]))
            .assert()
            .success();

        let sent = notifications(&server).await;
        assert_eq!(sent[0]["status"], "started");
    }

    #[test]
    fn unreachable_callback_is_only_a_warning() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let dir = TempDir::new().unwrap();
        let payload = serde_json::json!({
            "callbackUrl": format!("http://127.0.0.1:{}/cb", port),
            "clearCache": false
        })
        .to_string();
        let event = write_event(&dir, &payload);

        phase("pre", &event)
            .assert()
            .success()
            .stdout(predicate::str::contains("::warning::Failed to notify Publisher"));
    }
}
