//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the remote fetch function and its
//! reset endpoint, and drive the full crawl cycle end-to-end.

use relay_crawler::config::{Config, CrawlConfig, InvokerConfig};
use relay_crawler::crawler::{run_crawl, run_crawl_until, Session};
use relay_crawler::output::load_statistics;
use relay_crawler::{default_name_fn, HttpInvoker, Ledger, SessionPhase};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates an invoker configuration pointing at the mock server
fn invoker_config(server: &MockServer) -> InvokerConfig {
    InvokerConfig {
        function_name: "crawler-test-crawl".to_string(),
        endpoint: format!("{}/invoke", server.uri()),
        reset_endpoint: format!("{}/reset", server.uri()),
        profile: Some("crawler".to_string()),
        region: Some("eu-west-1".to_string()),
        settle_seconds: 0,
        timeout_seconds: 5,
    }
}

/// Creates a crawl configuration inside the temporary directory
fn crawl_config(dir: &TempDir, urls: &[&str], max_blocks: u32) -> CrawlConfig {
    let input_path = dir.path().join("urls.txt");
    std::fs::write(&input_path, urls.join("\n")).unwrap();

    CrawlConfig {
        input_path,
        output_dir: dir.path().join("results"),
        max_blocks_per_reset: max_blocks,
        ..CrawlConfig::default()
    }
}

/// Makes the fetch function answer `url` with the given payload status code
async fn mount_fetch(server: &MockServer, url: &str, status_code: u16) {
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "url": url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": url,
            "status_code": status_code,
            "html": format!("<p>{}</p>", url),
        })))
        .mount(server)
        .await;
}

async fn mount_reset(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/reset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == endpoint)
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_with_identity_reset() {
    let server = MockServer::start().await;
    mount_fetch(&server, "https://site.example/a", 200).await;
    mount_fetch(&server, "https://site.example/b", 403).await;
    mount_fetch(&server, "https://site.example/c", 404).await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "url": "https://site.example/d" })))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("x-function-error", "Unhandled")
                .set_body_json(json!({ "errorMessage": "Task timed out" })),
        )
        .mount(&server)
        .await;
    mount_reset(&server).await;

    let dir = TempDir::new().unwrap();
    let config = crawl_config(
        &dir,
        &[
            "https://site.example/a",
            "https://site.example/b",
            "https://site.example/c",
            "https://site.example/d",
        ],
        1,
    );

    let invoker = HttpInvoker::new(invoker_config(&server), tracing::Span::none()).unwrap();
    let mut session = Session::open(
        &config,
        invoker,
        Arc::new(default_name_fn),
        tracing::Span::none(),
    )
    .unwrap();

    let summary = session.run().await.unwrap();

    assert_eq!(session.phase(), SessionPhase::Completed);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.blocked, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.retryable, 1);
    assert_eq!(summary.resets, 1);
    assert_eq!(session.ledger().success_count(), 1);
    assert_eq!(session.ledger().failure_count(), 1);
    session.close().unwrap();

    // Ledgers
    assert_eq!(
        std::fs::read_to_string(config.success_ledger_path()).unwrap(),
        "https://site.example/a\n"
    );
    assert_eq!(
        std::fs::read_to_string(config.failure_ledger_path()).unwrap(),
        "https://site.example/c,404\n"
    );

    // Artifacts
    let artifact: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(config.crawled_dir().join("a.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(artifact["html"], "<p>https://site.example/a</p>");
    assert!(!config.crawled_dir().join("b.json").exists());
    assert!(!config.crawled_dir().join("c.json").exists());
    assert!(!config.crawled_dir().join("d.json").exists());

    // One reset, carrying the identity settings
    let resets = requests_to(&server, "/reset").await;
    assert_eq!(resets.len(), 1);
    assert_eq!(resets[0]["function_name"], "crawler-test-crawl");
    assert_eq!(resets[0]["profile"], "crawler");
    assert_eq!(resets[0]["region"], "eu-west-1");
    assert!(resets[0]["description"]
        .as_str()
        .unwrap()
        .starts_with("Crawler-"));

    // Stats see the same picture
    let stats = load_statistics(&config).unwrap();
    assert_eq!(stats.backlog_total, 4);
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.artifacts, 1);
}

#[tokio::test]
async fn test_rerun_only_invokes_unrecorded_urls() {
    let dir = TempDir::new().unwrap();
    let urls = [
        "https://site.example/ok",
        "https://site.example/gone",
        "https://site.example/banned",
    ];

    let first = MockServer::start().await;
    mount_fetch(&first, "https://site.example/ok", 200).await;
    mount_fetch(&first, "https://site.example/gone", 410).await;
    mount_fetch(&first, "https://site.example/banned", 403).await;
    mount_reset(&first).await;

    let config = Config {
        invoker: invoker_config(&first),
        crawl: crawl_config(&dir, &urls, 10),
    };
    let summary = run_crawl(config.clone()).await.unwrap();
    assert_eq!(summary.invoked(), 3);
    assert_eq!(requests_to(&first, "/invoke").await.len(), 3);

    let second = MockServer::start().await;
    mount_fetch(&second, "https://site.example/banned", 200).await;
    mount_reset(&second).await;

    let config = Config {
        invoker: invoker_config(&second),
        ..config
    };
    let summary = run_crawl(config.clone()).await.unwrap();

    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.succeeded, 1);
    let invoked = requests_to(&second, "/invoke").await;
    assert_eq!(invoked, vec![json!({ "url": "https://site.example/banned" })]);
    assert_eq!(
        std::fs::read_to_string(config.crawl.success_ledger_path()).unwrap(),
        "https://site.example/ok\nhttps://site.example/banned\n"
    );

    // Nothing left to do
    let third = MockServer::start().await;
    let config = Config {
        invoker: invoker_config(&third),
        ..config
    };
    let summary = run_crawl(config).await.unwrap();
    assert_eq!(summary.invoked(), 0);
    assert!(requests_to(&third, "/invoke").await.is_empty());
}

#[tokio::test]
async fn test_rejected_reset_aborts_crawl() {
    let server = MockServer::start().await;
    mount_fetch(&server, "https://site.example/x", 403).await;
    Mock::given(method("POST"))
        .and(path("/reset"))
        .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = Config {
        invoker: invoker_config(&server),
        crawl: crawl_config(&dir, &["https://site.example/x", "https://site.example/y"], 1),
    };

    let result = run_crawl(config.clone()).await;

    assert!(result.is_err());
    // The second URL was never sent
    assert_eq!(requests_to(&server, "/invoke").await.len(), 1);
    assert_eq!(
        std::fs::read_to_string(config.crawl.success_ledger_path()).unwrap(),
        ""
    );
}

#[tokio::test]
async fn test_interrupt_keeps_recorded_progress() {
    let server = MockServer::start().await;
    mount_fetch(&server, "https://site.example/fast", 200).await;
    mount_fetch(&server, "https://site.example/gone", 404).await;
    Mock::given(method("POST"))
        .and(path("/invoke"))
        .and(body_json(json!({ "url": "https://site.example/slow" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status_code": 200 }))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;
    mount_reset(&server).await;

    let dir = TempDir::new().unwrap();
    let config = Config {
        invoker: invoker_config(&server),
        crawl: crawl_config(
            &dir,
            &[
                "https://site.example/fast",
                "https://site.example/gone",
                "https://site.example/slow",
                "https://site.example/never",
            ],
            10,
        ),
    };

    let summary = run_crawl_until(
        config.clone(),
        tokio::time::sleep(Duration::from_secs(1)),
    )
    .await
    .unwrap();

    // Partial summary: the slow URL was in flight and the last never sent
    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.invoked(), 2);
    let invoked = requests_to(&server, "/invoke").await;
    assert!(!invoked.contains(&json!({ "url": "https://site.example/never" })));

    assert_eq!(
        std::fs::read_to_string(config.crawl.success_ledger_path()).unwrap(),
        "https://site.example/fast\n"
    );
    assert_eq!(
        std::fs::read_to_string(config.crawl.failure_ledger_path()).unwrap(),
        "https://site.example/gone,404\n"
    );
    assert!(!config.crawl.crawled_dir().join("slow.json").exists());

    let stats = load_statistics(&config.crawl).unwrap();
    assert_eq!(stats.pending, 2);
}
