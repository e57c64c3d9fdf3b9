//! Web API Supplement Tests
//!
//! Integration tests for the supplement, probe and health endpoints.

mod common;

use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

/// Mount both feeds on the plaintext origin.
async fn mount_both_feeds(server: &MockServer) {
    let shinkan = vec![
        Entry::new("Rust入門", "9784000000011", rfc2822_days_from_now(-1), "プログラミング"),
        Entry::new("猫の写真集", "9784000000028", rfc2822_days_from_now(-5), "猫"),
        Entry::new("古いRustの本", "9784000000035", rfc2822_days_from_now(-60), "Rust"),
        Entry::new("日付不明", "9784000000042", "近日".to_string(), "不明"),
    ];
    let kinkan = vec![
        Entry::new("Rust実践", "9784000000059", rfc3339_days_from_now(30), "Rust プログラミング"),
        Entry::new("刊行済み", "9784000000066", rfc3339_days_from_now(-30), "過去"),
    ];
    mount_feed(server, &plain_feed_path("shinkan"), rss_feed(&shinkan)).await;
    mount_feed(server, &plain_feed_path("kinkan"), rss_feed(&kinkan)).await;
}

fn titles(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let mock = MockServer::start().await;
    let server = test_server(&test_config(&mock));

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_supplement_filters_and_ranks() {
    let mock = MockServer::start().await;
    mount_both_feeds(&mock).await;
    let server = test_server(&test_config(&mock));

    let response = server
        .get("/api/rss-supplement?q=rust&days_window=14")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["trace_id"].as_str().unwrap().starts_with("rss_"));
    assert!(body.get("debug").is_none());

    let items = body["items"].as_array().unwrap();
    // The 60-day-old release and the already published forthcoming title
    // are filtered out; the undated release is admitted.
    assert_eq!(items.len(), 4);

    let t = titles(&body);
    assert_eq!(&t[..2], &["Rust実践".to_string(), "Rust入門".to_string()]);
    assert!(t.contains(&"日付不明".to_string()));
    assert!(!t.contains(&"古いRustの本".to_string()));
    assert!(!t.contains(&"刊行済み".to_string()));

    let first = &items[0];
    assert_eq!(first["feed"], "kinkan");
    assert_eq!(first["tag"], "forthcoming");
    assert_eq!(first["isbn13"], "9784000000059");
    assert_eq!(first["match_score"], 1.0);
    assert!(first["pubDate"].is_string());

    for pair in items.windows(2) {
        assert!(pair[0]["match_score"].as_f64() >= pair[1]["match_score"].as_f64());
    }
}

#[tokio::test]
async fn test_supplement_without_window_keeps_old_releases() {
    let mock = MockServer::start().await;
    mount_both_feeds(&mock).await;
    let server = test_server(&test_config(&mock));

    let response = server.get("/api/rss-supplement?feeds=shinkan").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let t = titles(&body);
    assert_eq!(t.len(), 4);
    // Empty query scores everything 1.0, so order is by date, undated last.
    assert_eq!(t[0], "Rust入門");
    assert_eq!(t[3], "日付不明");
    assert!(body["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|i| i["tag"] == "recent_release"));
}

#[tokio::test]
async fn test_supplement_limit_is_clamped() {
    let mock = MockServer::start().await;
    mount_both_feeds(&mock).await;
    let server = test_server(&test_config(&mock));

    let response = server.get("/api/rss-supplement?limit=0").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let response = server.get("/api/rss-supplement?limit=999").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["items"].as_array().unwrap().len() <= 50);
}

#[tokio::test]
async fn test_supplement_unknown_feeds_are_dropped() {
    let mock = MockServer::start().await;
    mount_both_feeds(&mock).await;
    let server = test_server(&test_config(&mock));

    let response = server
        .get("/api/rss-supplement?feeds=bogus&feeds=kinkan&debug=1")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(titles(&body), vec!["Rust実践".to_string()]);
    let debug = body["debug"].as_array().unwrap();
    assert_eq!(debug.len(), 1);
    assert_eq!(debug[0]["feed"], "kinkan");
}

#[tokio::test]
async fn test_supplement_debug_trace() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(plain_feed_path("shinkan")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;
    mount_feed(
        &mock,
        &secure_feed_path("shinkan"),
        rss_feed(&[Entry::new(
            "見本",
            "9784000000011",
            rfc2822_days_from_now(-1),
            "",
        )]),
    )
    .await;
    let server = test_server(&test_config(&mock));

    let response = server
        .get("/api/rss-supplement?feeds=shinkan&feeds=kinkan&debug=1")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let debug = body["debug"].as_array().unwrap();
    assert_eq!(debug.len(), 2);

    let shinkan = &debug[0];
    assert_eq!(shinkan["feed"], "shinkan");
    assert_eq!(shinkan["category"], "recent_release");
    assert_eq!(shinkan["route"], "direct-https");
    let attempts = shinkan["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0]["status"], 500);
    assert_eq!(attempts[0]["item_count"], 0);
    assert_eq!(attempts[1]["mode"], "rss");
    assert_eq!(attempts[1]["encoding"], "utf-8");
    assert_eq!(attempts[1]["item_count"], 1);
    assert_eq!(attempts[1]["sample_title"], "見本");
    assert!(attempts[1]["error"].is_null());
    assert!(attempts[1]["xml_snippet"]
        .as_str()
        .unwrap()
        .starts_with("<?xml"));
    assert!(attempts[1]["xml_snippet"].as_str().unwrap().chars().count() <= 200);

    let kinkan = &debug[1];
    assert_eq!(kinkan["route"], "failed");
    assert_eq!(kinkan["attempts"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_supplement_all_routes_failed_is_not_an_error() {
    let mock = MockServer::start().await;
    let server = test_server(&test_config(&mock));

    let response = server.get("/api/rss-supplement?q=anything").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cors_header_is_permissive() {
    let mock = MockServer::start().await;
    let server = test_server(&test_config(&mock));

    let response = server
        .get("/api/rss-supplement?feeds=none")
        .add_header(ORIGIN, "https://agent.example")
        .await;
    response.assert_status_ok();
    assert_eq!(response.header(ACCESS_CONTROL_ALLOW_ORIGIN), "*");

    let body: Value = response.json();
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_test_reports_every_target() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BASELINE))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock)
        .await;
    mount_feed(&mock, &plain_feed_path("shinkan"), rss_feed(&[])).await;
    let server = test_server(&test_config(&mock));

    let response = server.get("/api/fetch-test").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(chrono::DateTime::parse_from_rfc3339(body["time"].as_str().unwrap()).is_ok());

    let results = body["results"].as_array().unwrap();
    // baseline + 2 feeds x 4 feed tiers + 2 formats x 2 shared search tiers
    assert_eq!(results.len(), 13);

    let baseline = &results[0];
    assert!(baseline["url"].as_str().unwrap().ends_with(BASELINE));
    assert_eq!(baseline["ok"], true);

    let first_feed = &results[1];
    assert!(first_feed["url"].as_str().unwrap().ends_with("/plain/bd/shinkan/feed/"));
    assert_eq!(first_feed["ok"], true);
    assert_eq!(first_feed["status"], 200);
    assert!(first_feed["ms"].is_u64());

    let second_feed = &results[2];
    assert_eq!(second_feed["ok"], false);
    assert_eq!(second_feed["status"], 404);
}
