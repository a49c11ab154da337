//! Functional tests for the GitHub publisher against a mock HTTP server.

use serde_json::json;
use synapse_core::{publish_project, GitHubPublisher, PublishError, Publisher, PublisherConfig};
use synapse_test_utils::{files_response, TestWorkspace};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ghp_testtoken000000000000000000";

fn publisher(server: &MockServer) -> GitHubPublisher {
    GitHubPublisher::new(
        &PublisherConfig::default()
            .with_api_base(server.uri())
            .with_token(TOKEN),
    )
    .unwrap()
}

async fn mount_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octocat" })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn existing_repository_is_reused() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/demo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "html_url": "https://github.com/octocat/demo" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let url = publisher(&server)
        .ensure_repository("demo", "")
        .await
        .unwrap();

    assert_eq!(url, "https://github.com/octocat/demo");
}

#[tokio::test]
async fn missing_repository_is_created() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/demo"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .and(body_partial_json(json!({ "name": "demo", "auto_init": true })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "html_url": "https://github.com/octocat/demo" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let url = publisher(&server)
        .ensure_repository("demo", "generated by synapse")
        .await
        .unwrap();

    assert_eq!(url, "https://github.com/octocat/demo");
}

#[tokio::test]
async fn publishes_files_and_issues() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/demo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "html_url": "https://github.com/octocat/demo" })),
        )
        .mount(&server)
        .await;

    // README.md exists already and must be updated with its sha
    Mock::given(method("GET"))
        .and(path("/repos/octocat/demo/contents/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sha": "abc123" })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/demo/contents/README.md"))
        .and(body_partial_json(json!({
            "message": "Update README.md",
            "content": "IyBkZW1v",
            "sha": "abc123"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/octocat/demo/contents/src/main.py"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/octocat/demo/contents/src/main.py"))
        .and(body_partial_json(json!({ "message": "Add src/main.py" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/repos/octocat/demo/issues"))
        .and(body_partial_json(json!({ "labels": ["synapse-generated"] })))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let ws = TestWorkspace::new();
    let result = ws
        .pipeline
        .run(&files_response(&[("README.md", "# demo"), ("src/main.py", "print(1)")]))
        .await;
    assert!(result.success());

    let tasks = vec!["1. Setup".to_string(), "2. Build".to_string()];
    let url = publish_project(&publisher(&server), "demo", "", &result.materialized, &tasks)
        .await
        .unwrap();

    assert_eq!(url, "https://github.com/octocat/demo");
}

#[tokio::test]
async fn bad_token_is_unauthorized_and_not_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_string(format!("bad token {TOKEN}")))
        .mount(&server)
        .await;

    let err = publisher(&server)
        .ensure_repository("demo", "")
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Unauthorized { status: 401 }));
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn server_error_body_is_redacted() {
    let server = MockServer::start().await;
    mount_user(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/demo"))
        .respond_with(ResponseTemplate::new(500).set_body_string(format!("boom {TOKEN}")))
        .mount(&server)
        .await;

    let err = publisher(&server)
        .ensure_repository("demo", "")
        .await
        .unwrap_err();

    match err {
        PublishError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 500);
            assert!(!message.contains(TOKEN));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}
