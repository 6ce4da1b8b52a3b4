//! Integration tests for the scraper
//!
//! These tests use wiremock to serve a small documentation site and run the
//! whole pipeline end-to-end. Waits go through a manual clock, so pacing and
//! backoff are asserted on without actually sleeping.

use gitbook_scraper::config::ScrapeConfig;
use gitbook_scraper::crawler::{Coordinator, ManualClock, ScrapeReport};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Seed page: nested navigation plus the seed's own content
const SITE_NAV: &str = r#"
<html><head><title>Example Docs</title></head><body>
<aside data-testid="sidebar">
  <nav><ul>
    <li><a href="/">Home</a></li>
    <li><a href="/guide">Guide</a>
      <ul>
        <li><a href="/guide/install">Install</a></li>
        <li><a href="/guide/usage">Usage</a></li>
      </ul>
    </li>
    <li><a href="/faq">FAQ</a></li>
  </ul></nav>
</aside>
<main><h1>Home</h1><p>Welcome to the docs.</p></main>
</body></html>
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body>\
         <nav><a href=\"/\">Back</a></nav>\
         <main><h1>{title}</h1>{body}</main>\
         <script>analytics()</script></body></html>"
    )
}

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn serve_site(server: &MockServer) {
    serve(server, "/", SITE_NAV.to_string()).await;
    serve(server, "/guide", page("Guide", "<p>How to use it.</p>")).await;
    serve(
        server,
        "/guide/install",
        page("Install", "<pre><code class=\"language-bash\">cargo install it</code></pre>"),
    )
    .await;
    serve(server, "/guide/usage", page("Usage", "<p>Run <code>it</code>.</p>")).await;
    serve(server, "/faq", page("FAQ", "<ul><li>Why?</li><li>Because.</li></ul>")).await;
}

/// Creates a test configuration writing into `dir`
fn create_test_config(server: &MockServer, dir: &TempDir) -> ScrapeConfig {
    let mut config = ScrapeConfig::new(format!("{}/", server.uri()));
    config.output_path = dir.path().join("out").join("documentation.md");
    config.user_agent = "TestBot/1.0".to_string();
    config.delay_seconds = 0.0;
    config
}

async fn run(config: ScrapeConfig) -> (ScrapeReport, String, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let output_path = config.output_path.clone();
    let report = Coordinator::with_clock(config, clock.clone())
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Scrape failed");
    let document = std::fs::read_to_string(output_path).expect("Output not written");
    (report, document, clock)
}

#[tokio::test]
async fn test_full_scrape_in_navigation_order() {
    let server = MockServer::start().await;
    serve_site(&server).await;
    let dir = TempDir::new().unwrap();

    let (report, document, _) = run(create_test_config(&server, &dir)).await;

    assert!(report.success);
    assert!(!report.cancelled);
    assert_eq!(report.pages_fetched, 5);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(
        document,
        "# Home\n\nWelcome to the docs.\n\n\
         # Guide\n\nHow to use it.\n\n\
         ## Install\n\n```bash\ncargo install it\n```\n\n\
         ## Usage\n\nRun `it`.\n\n\
         # FAQ\n\n- Why?\n- Because.\n"
    );
}

#[tokio::test]
async fn test_scrape_with_toc_round_trips_anchors() {
    let server = MockServer::start().await;
    serve_site(&server).await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.generate_toc = true;
    let (_, document, _) = run(config).await;

    assert!(document.starts_with(
        "# Table of Contents\n\n\
         - [Home](#home)\n\
         - [Guide](#guide)\n  \
         - [Install](#install)\n  \
         - [Usage](#usage)\n\
         - [FAQ](#faq)\n\n---\n\n"
    ));

    let anchors: Vec<&str> = document
        .lines()
        .filter_map(|line| line.split("](#").nth(1))
        .map(|rest| rest.trim_end_matches(')'))
        .collect();
    assert_eq!(anchors.len(), 5);
    for anchor in anchors {
        assert!(
            document.contains(&format!("<a id=\"{}\"></a>", anchor)),
            "missing anchor {}",
            anchor
        );
    }
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<nav><ul><li><a href="/flaky">Flaky</a></li></ul></nav>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("Flaky", "<p>Finally.</p>")))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.retries = 3;
    let (report, document, clock) = run(config).await;

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(document, "# Flaky\n\nFinally.\n");
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[tokio::test]
async fn test_retry_after_is_honored() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<nav><ul><li><a href="/busy">Busy</a></li></ul></nav>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "5"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    serve(&server, "/busy", page("Busy", "<p>Ready now.</p>")).await;
    let dir = TempDir::new().unwrap();

    let (report, document, clock) = run(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_fetched, 1);
    assert!(document.contains("Ready now."));
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn test_seed_server_errors_are_retried_during_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<nav><ul><li><a href="/">Home</a></li></ul></nav>
               <main><h1>Home</h1><p>Up again.</p></main>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.retries = 3;
    let (report, document, clock) = run(config).await;

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(document, "# Home\n\nUp again.\n");
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
}

#[tokio::test]
async fn test_relative_links_follow_redirected_seed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/guide/"))
        .expect(1)
        .mount(&server)
        .await;
    serve(
        &server,
        "/guide/",
        r#"<html><head><title>Guide</title></head><body>
        <nav><ul>
            <li><a href="./">Guide</a></li>
            <li><a href="install">Install</a></li>
        </ul></nav>
        <main><h1>Guide</h1><p>Start with <a href="install">the install page</a>.</p></main>
        </body></html>"#
            .to_string(),
    )
    .await;
    serve(&server, "/guide/install", page("Install", "<p>Install body.</p>")).await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.base_url = format!("{}/guide/", server.uri());
    let (report, document, _) = run(config).await;

    assert_eq!(report.pages_fetched, 2);
    assert!(report.failed_pages.is_empty());
    assert_eq!(
        document,
        format!(
            "# Guide\n\nStart with [the install page]({}/guide/install).\n\n\
             # Install\n\nInstall body.\n",
            server.uri()
        )
    );
}

#[tokio::test]
async fn test_missing_page_becomes_placeholder() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<nav><ul>
            <li><a href="/first">First</a></li>
            <li><a href="/gone">Gone</a></li>
            <li><a href="/last">Last</a></li>
        </ul></nav>"#
            .to_string(),
    )
    .await;
    serve(&server, "/first", page("First", "<p>One.</p>")).await;
    serve(&server, "/last", page("Last", "<p>Three.</p>")).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let (report, document, _) = run(create_test_config(&server, &dir)).await;

    assert!(report.success);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.failed_pages.len(), 1);
    assert_eq!(report.failed_pages[0].title, "Gone");
    assert_eq!(report.failed_pages[0].reason, "HTTP 404");

    let gone_url = format!("{}/gone", server.uri());
    assert!(document.contains(&format!(
        "# Gone\n\n> **Note:** Content unavailable for <{}> (HTTP 404).",
        gone_url
    )));
    let first = document.find("# First").unwrap();
    let gone = document.find("# Gone").unwrap();
    let last = document.find("# Last").unwrap();
    assert!(first < gone && gone < last);
}

#[tokio::test]
async fn test_site_without_navigation_is_single_page() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        "<html><head><title>Solo</title></head>\
         <body><main><h1>Solo</h1><p>Only page.</p></main></body></html>"
            .to_string(),
    )
    .await;
    let dir = TempDir::new().unwrap();

    let (report, document, _) = run(create_test_config(&server, &dir)).await;

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(document, "# Solo\n\nOnly page.\n");
}

#[tokio::test]
async fn test_unreachable_seed_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let config = create_test_config(&server, &dir);
    let output_path = config.output_path.clone();
    let result = Coordinator::with_clock(config, Arc::new(ManualClock::new()))
        .unwrap()
        .run()
        .await;

    assert!(matches!(
        result,
        Err(gitbook_scraper::ScraperError::FatalDiscovery { .. })
    ));
    assert!(!output_path.exists());
}

#[tokio::test]
async fn test_toc_filter_fetches_only_selected_subtree() {
    let server = MockServer::start().await;
    serve(&server, "/", SITE_NAV.to_string()).await;
    serve(&server, "/guide", page("Guide", "<p>How to use it.</p>")).await;
    serve(&server, "/guide/install", page("Install", "<p>Install it.</p>")).await;
    serve(&server, "/guide/usage", page("Usage", "<p>Use it.</p>")).await;
    Mock::given(method("GET"))
        .and(path("/faq"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.toc_items = BTreeSet::from(["guide".to_string()]);
    let (report, document, _) = run(config).await;

    assert_eq!(report.pages_fetched, 3);
    assert_eq!(
        document,
        "# Guide\n\nHow to use it.\n\n## Install\n\nInstall it.\n\n## Usage\n\nUse it.\n"
    );
}

#[tokio::test]
async fn test_filter_matching_nothing_writes_empty_document() {
    let server = MockServer::start().await;
    serve(&server, "/", SITE_NAV.to_string()).await;
    for route in ["/guide", "/guide/install", "/guide/usage", "/faq"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.generate_toc = true;
    config.toc_items = BTreeSet::from(["Does Not Exist".to_string()]);
    let (report, document, _) = run(config).await;

    assert!(report.success);
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(document, "");
}

#[tokio::test]
async fn test_duplicate_titles_get_distinct_anchors() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<nav><ul>
            <li><a href="/server">Server</a>
                <ul><li><a href="/server/setup">Setup</a></li></ul></li>
            <li><a href="/client">Client</a>
                <ul><li><a href="/client/setup">Setup</a></li></ul></li>
        </ul></nav>"#
            .to_string(),
    )
    .await;
    serve(&server, "/server", page("Server", "<p>S.</p>")).await;
    serve(&server, "/server/setup", page("Setup", "<p>Server setup.</p>")).await;
    serve(&server, "/client", page("Client", "<p>C.</p>")).await;
    serve(&server, "/client/setup", page("Setup", "<p>Client setup.</p>")).await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.generate_toc = true;
    let (_, document, _) = run(config).await;

    assert!(document.contains("  - [Setup](#setup)\n"));
    assert!(document.contains("  - [Setup](#setup-1)\n"));
    assert!(document.contains("<a id=\"setup\"></a>\n## Setup\n\nServer setup."));
    assert!(document.contains("<a id=\"setup-1\"></a>\n## Setup\n\nClient setup."));
}

#[tokio::test]
async fn test_repeated_runs_are_byte_identical() {
    let server = MockServer::start().await;
    serve_site(&server).await;
    let dir = TempDir::new().unwrap();

    let mut first = create_test_config(&server, &dir);
    first.generate_toc = true;
    first.concurrency = 4;
    let mut second = first.clone();
    second.output_path = dir.path().join("second.md");
    second.concurrency = 1;

    let (first_report, first_doc, _) = run(first).await;
    let (second_report, second_doc, _) = run(second).await;

    assert_eq!(first_doc, second_doc);
    assert_eq!(first_report.document_sha256, second_report.document_sha256);
    assert_eq!(first_report.document_sha256.len(), 64);
}

#[tokio::test]
async fn test_custom_selectors_are_tried_first() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<html><body>
            <nav><ul><li><a href="/wrong">Wrong</a></li></ul></nav>
            <div class="toc-tree"><ul><li><a href="/right">Right</a></li></ul></div>
        </body></html>"#
            .to_string(),
    )
    .await;
    serve(
        &server,
        "/right",
        "<html><body><main><p>Main text.</p></main>\
         <div class=\"doc-text\"><p>Custom text.</p></div></body></html>"
            .to_string(),
    )
    .await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.selectors.nav = vec!["div.toc-tree".to_string()];
    config.selectors.content = vec!["div.doc-text".to_string()];
    let (_, document, _) = run(config).await;

    assert_eq!(document, "# Right\n\nCustom text.\n");
}
