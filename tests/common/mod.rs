//! Test helpers for integration tests.
//!
//! Provides feed fixtures, a configuration pointing every origin at a
//! wiremock server, and an axum-test server over the real router.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookfeed::config::Config;
use bookfeed::route::RouteResolver;
use bookfeed::web::handlers::AppState;
use bookfeed::web::router::create_router;
use bookfeed::SupplementService;

/// Path prefix standing in for the plaintext origin.
pub const PLAIN: &str = "/plain";
/// Path prefix standing in for the encrypted origin.
pub const SECURE: &str = "/secure";
/// Path prefix standing in for the content proxy.
pub const PROXY: &str = "/proxy/";
/// Path standing in for the connectivity baseline.
pub const BASELINE: &str = "/baseline";

/// One feed entry fixture.
pub struct Entry {
    pub title: &'static str,
    pub link: String,
    pub date: String,
    pub description: &'static str,
}

impl Entry {
    pub fn new(title: &'static str, isbn: &str, date: String, description: &'static str) -> Self {
        Self {
            title,
            link: format!("https://www.hanmoto.com/bd/isbn/{isbn}"),
            date,
            description,
        }
    }
}

/// RFC 2822 date `days` from now (negative = past).
pub fn rfc2822_days_from_now(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc2822()
}

/// RFC 3339 date `days` from now (negative = past).
pub fn rfc3339_days_from_now(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

/// Render an RSS 2.0 document.
pub fn rss_feed(entries: &[Entry]) -> String {
    rss_feed_with_declaration(r#"<?xml version="1.0" encoding="UTF-8"?>"#, entries)
}

/// Render an RSS 2.0 document with a custom XML declaration.
pub fn rss_feed_with_declaration(declaration: &str, entries: &[Entry]) -> String {
    let items: String = entries
        .iter()
        .map(|e| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><description>{}</description></item>",
                e.title, e.link, e.date, e.description
            )
        })
        .collect();
    format!(
        r#"{declaration}
<rss version="2.0"><channel><title>版元ドットコム</title>{items}</channel></rss>"#
    )
}

/// Render an Atom document.
pub fn atom_feed(entries: &[Entry]) -> String {
    let items: String = entries
        .iter()
        .map(|e| {
            format!(
                r#"<entry><title>{}</title><link rel="alternate" href="{}"/><updated>{}</updated><summary>{}</summary></entry>"#,
                e.title, e.link, e.date, e.description
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>search</title>{items}</feed>"#
    )
}

/// An upstream error page served with status 200.
pub fn error_page() -> String {
    "<html><body><h1>Internal Server Error</h1><p>www.hanmoto.com</p></body></html>".to_string()
}

/// Configuration whose origins, proxy and search all live on `server`.
pub fn test_config(server: &MockServer) -> Config {
    let uri = server.uri();
    let mut config = Config::default();
    config.web.host = "127.0.0.1".to_string();
    config.web.port = 0;
    config.sources.origin_http = format!("{uri}{PLAIN}");
    config.sources.origin_https = format!("{uri}{SECURE}");
    config.sources.proxy_prefix = format!("{uri}{PROXY}");
    config.sources.probe_baseline_url = format!("{uri}{BASELINE}");
    config.fetch.connect_timeout_secs = 1;
    config.fetch.timeout_secs = 1;
    config
}

/// Resolver over `config`.
pub fn test_resolver(config: &Config) -> RouteResolver {
    RouteResolver::from_config(config).expect("Failed to create resolver")
}

/// axum-test server over the full router.
pub fn test_server(config: &Config) -> TestServer {
    let service = SupplementService::from_config(config).expect("Failed to create service");
    let router = create_router(Arc::new(AppState::new(service)), &config.web);
    TestServer::new(router).expect("Failed to create test server")
}

/// Feed path for a logical key on the plaintext origin.
pub fn plain_feed_path(key: &str) -> String {
    format!("{PLAIN}/bd/{key}/feed/")
}

/// Feed path for a logical key on the encrypted origin.
pub fn secure_feed_path(key: &str) -> String {
    format!("{SECURE}/bd/{key}/feed/")
}

/// Search endpoint path on the encrypted origin.
pub fn search_path() -> String {
    format!("{SECURE}/bd/search/index.php")
}

/// 200 response with an XML body and content type.
pub fn xml_response(body: impl Into<Vec<u8>>, content_type: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body.into(), content_type)
}

/// Serve `body` at `feed_path`.
pub async fn mount_feed(server: &MockServer, feed_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(feed_path.to_string()))
        .respond_with(xml_response(body, "application/rss+xml; charset=UTF-8"))
        .mount(server)
        .await;
}

/// Answer every proxied request with `template`.
pub async fn mount_proxy(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path_regex(format!("^{PROXY}")))
        .respond_with(template)
        .mount(server)
        .await;
}
