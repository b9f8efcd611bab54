//! Integration tests for batch fetching
//!
//! These tests use wiremock to create mock HTTP servers and drive the real
//! `HttpFetcher` through the orchestrator end-to-end.

use std::io::Write;
use std::time::{Duration, Instant};
use sumi_fetch::config::{load_config, HttpSettings, RunConfig};
use sumi_fetch::fetch::{fetch_all, CancellationToken, HttpFetcher, Orchestrator};
use sumi_fetch::FetchErrorKind;
use tempfile::NamedTempFile;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_orchestrator() -> Orchestrator<HttpFetcher> {
    let fetcher =
        HttpFetcher::from_settings(&HttpSettings::default()).expect("Failed to build client");
    Orchestrator::new(fetcher)
}

#[tokio::test]
async fn test_mixed_batch_against_mock_server() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&mock_server)
        .await;

    let urls = vec![
        format!("{}/ok", base_url),
        String::new(),
        format!("{}/missing", base_url),
    ];
    let config = RunConfig::new(Duration::from_secs(10), 3);

    let results = http_orchestrator()
        .run(&urls, &config)
        .await
        .expect("Batch failed");

    assert_eq!(results.len(), 3);
    for (result, url) in results.iter().zip(&urls) {
        assert_eq!(result.url(), url.as_str());
    }

    assert!(results[0].is_success());
    assert_eq!(results[0].content(), "hello");

    assert_eq!(results[1].error_kind(), Some(FetchErrorKind::InvalidUrl));
    assert_eq!(results[1].content(), "");

    assert_eq!(results[2].error_kind(), Some(FetchErrorKind::BadStatus));
    assert_eq!(
        results[2].error().and_then(|e| e.status_code()),
        Some(404)
    );
    // Body of a non-200 response is discarded
    assert_eq!(results[2].content(), "");

    // Only two requests reached the server; the empty URL never did
    let received = mock_server
        .received_requests()
        .await
        .expect("Request recording disabled");
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_server_error_is_bad_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let urls = vec![format!("{}/broken", mock_server.uri())];
    let results = http_orchestrator()
        .run(&urls, &RunConfig::new(Duration::from_secs(10), 1))
        .await
        .expect("Batch failed");

    assert_eq!(
        results[0].error().and_then(|e| e.status_code()),
        Some(500)
    );
    assert!(!results[0].is_success());
}

#[tokio::test]
async fn test_duplicate_urls_fetched_independently() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/same"))
        .respond_with(ResponseTemplate::new(200).set_body_string("same"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let url = format!("{}/same", mock_server.uri());
    let urls = vec![url.clone(), url.clone(), url];

    let results = http_orchestrator()
        .run(&urls, &RunConfig::new(Duration::from_secs(10), 2))
        .await
        .expect("Batch failed");

    assert_eq!(results.len(), 3);
    assert_eq!(results.success_count(), 3);
}

#[tokio::test]
async fn test_global_deadline_aborts_slow_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fast"))
        .mount(&mock_server)
        .await;

    let urls = vec![
        format!("{}/slow", mock_server.uri()),
        format!("{}/fast", mock_server.uri()),
    ];
    let config = RunConfig::new(Duration::from_millis(300), 2)
        .with_grace_period(Duration::from_millis(200));

    let started = Instant::now();
    let results = http_orchestrator()
        .run(&urls, &config)
        .await
        .expect("Batch failed");
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_secs(3),
        "Batch took {:?}, expected to stop near the deadline",
        elapsed
    );
    assert_eq!(results[0].error_kind(), Some(FetchErrorKind::Timeout));
    assert_eq!(results[1].content(), "fast");
}

#[tokio::test]
async fn test_per_request_timeout_against_slow_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let urls = vec![format!("{}/slow", mock_server.uri())];
    let config = RunConfig::new(Duration::from_secs(30), 1)
        .with_per_request_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let results = http_orchestrator()
        .run(&urls, &config)
        .await
        .expect("Batch failed");

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(results[0].error_kind(), Some(FetchErrorKind::Timeout));
}

#[tokio::test]
async fn test_manual_cancellation_mid_batch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quick"))
        .respond_with(ResponseTemplate::new(200).set_body_string("quick"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hang"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let urls = vec![
        format!("{}/quick", mock_server.uri()),
        format!("{}/hang", mock_server.uri()),
        format!("{}/hang", mock_server.uri()),
    ];
    let config = RunConfig::new(Duration::from_secs(30), 3);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let results = http_orchestrator()
        .run_with_cancel(&urls, &config, cancel)
        .await
        .expect("Batch failed");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(results[0].content(), "quick");
    assert_eq!(results[1].error_kind(), Some(FetchErrorKind::Canceled));
    assert_eq!(results[2].error_kind(), Some(FetchErrorKind::Canceled));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agent"))
        .and(header("user-agent", "TestFetcher/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
        .mount(&mock_server)
        .await;

    let settings = HttpSettings {
        user_agent: "TestFetcher/1.0".to_string(),
        ..HttpSettings::default()
    };
    let urls = vec![format!("{}/agent", mock_server.uri())];

    let results = fetch_all(&urls, &settings, &RunConfig::new(Duration::from_secs(10), 1))
        .await
        .expect("Batch failed");

    // Without the header the mock would not match and the server answers 404
    assert_eq!(results[0].content(), "welcome");
}

#[tokio::test]
async fn test_batch_from_config_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(ResponseTemplate::new(200).set_body_string("2"))
        .mount(&mock_server)
        .await;

    let config_content = format!(
        r#"
[fetch]
global-deadline-ms = 10000
max-concurrency = 2
per-request-timeout-ms = 5000

[http]
user-agent = "ConfigFetcher/1.0"

[targets]
urls = ["{base}/one", "{base}/two", "{base}/three"]
"#,
        base = mock_server.uri()
    );

    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(config_content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush config");

    let config = load_config(file.path()).expect("Failed to load config");
    let results = fetch_all(&config.targets.urls, &config.http, &config.run_config())
        .await
        .expect("Batch failed");

    let contents: Vec<&str> = results.iter().map(|r| r.content()).collect();
    assert_eq!(contents, vec!["1", "2", ""]);
    assert_eq!(results[2].error_kind(), Some(FetchErrorKind::BadStatus));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_fetching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let urls = vec![format!("{}/anything", mock_server.uri())];
    let result = http_orchestrator()
        .run(&urls, &RunConfig::new(Duration::from_secs(10), 0))
        .await;

    assert!(result.is_err());
}
