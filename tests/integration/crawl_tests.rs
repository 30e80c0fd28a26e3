//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, output files included.

use harvest_index::config::{parse_config, Config};
use harvest_index::crawler::{run_crawl, Crawler};
use harvest_index::storage::{CrawlDocument, SNAPSHOT_FILE};
use harvest_index::HarvestError;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `base_url` into `output`
fn create_test_config(base_url: &str, output: &Path, max_pages: usize) -> Config {
    parse_config(&format!(
        r#"
[crawler]
base-url = "{}"
max-pages = {}
rate-limit-ms = 0
request-timeout-secs = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[output]
directory = "{}"
"#,
        base_url,
        max_pages,
        output.display()
    ))
    .expect("Failed to parse test config")
}

async fn mount_html(server: &MockServer, route: &str, body: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn read_document(path: &Path) -> CrawlDocument {
    let raw = std::fs::read_to_string(path).expect("Failed to read document");
    serde_json::from_str(&raw).expect("Failed to decode document")
}

fn domain_of(server: &MockServer) -> String {
    server.uri().trim_start_matches("http://").to_string()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    // Every page is fetched exactly once even though they link to each other
    mount_html(
        &mock_server,
        "/",
        r#"<html><body><nav>Menu</nav><p>Welcome home</p>
        <a href="/page1">Page 1</a> <a href="/page2#top">Page 2</a></body></html>"#,
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/page1",
        r#"<html><body><p>Content 1</p><a href="/">Home</a><a href="/page2">Page 2</a></body></html>"#,
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/page2",
        r#"<html><body><script>var x = 1;</script><p>Content 2</p><a href="/page1">Back</a></body></html>"#,
        1,
    )
    .await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let documents = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(documents.len(), 3);
    let urls: Vec<&str> = documents.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", mock_server.uri()),
            format!("{}/page1", mock_server.uri()),
            format!("{}/page2", mock_server.uri()),
        ]
    );

    let home = &documents[0];
    assert_eq!(home.title, "/");
    assert_eq!(home.domain, domain_of(&mock_server));
    assert!(home.content.contains("Welcome home"));
    assert!(!home.content.contains("Menu"));
    assert!(!documents[2].content.contains("var x"));

    for (i, document) in documents.iter().enumerate() {
        let on_disk = read_document(&output.path().join(format!("doc_{}.json", i + 1)));
        assert_eq!(&on_disk, document);
    }
    assert!(!output.path().join("doc_4.json").exists());

    let snapshot: Vec<CrawlDocument> = serde_json::from_str(
        &std::fs::read_to_string(output.path().join(SNAPSHOT_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(snapshot, documents);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_robots(&mock_server, "User-agent: *\nDisallow: /admin").await;

    // Both fetched pages link to the disallowed page before it is dequeued
    mount_html(
        &mock_server,
        "/",
        r#"<html><body><a href="/public">Public</a><a href="/admin/panel">Admin</a></body></html>"#,
        1,
    )
    .await;
    mount_html(
        &mock_server,
        "/public",
        r#"<p>Public page</p><a href="/admin/panel">Admin again</a>"#,
        1,
    )
    .await;
    mount_html(&mock_server, "/admin/panel", "<p>Secret</p>", 0).await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let mut crawler = Crawler::new(&config).await.expect("Failed to create crawler");
    let documents = crawler.run().await.expect("Crawl failed");

    assert_eq!(documents.len(), 2);
    assert!(documents.iter().all(|d| !d.url.contains("/admin")));
    let stats = crawler.last_stats();
    assert_eq!(stats.denied, 1);
    assert_eq!(stats.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_robots_agent_specific_group() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_robots(&mock_server, "User-agent: TestBot\nDisallow: /\n\nUser-agent: *\nAllow: /").await;
    mount_html(&mock_server, "/", "<p>Home</p>", 0).await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let documents = run_crawl(&config).await.expect("Crawl failed");

    assert!(documents.is_empty());
    assert_eq!(std::fs::read_to_string(output.path().join(SNAPSHOT_FILE)).unwrap(), "[]");
}

#[tokio::test]
async fn test_max_pages_bound() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();
    mount_html(&mock_server, "/", &links, 1).await;
    for i in 1..=5 {
        mount_html(&mock_server, &format!("/p{}", i), "<p>leaf</p>", if i == 1 { 1 } else { 0 })
            .await;
    }

    let config = create_test_config(&mock_server.uri(), output.path(), 2);
    let documents = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(documents.len(), 2);
    assert!(output.path().join("doc_2.json").exists());
    assert!(!output.path().join("doc_3.json").exists());
}

#[tokio::test]
async fn test_off_site_links_not_followed() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // Same server under another host name is a different site
    let port = url::Url::parse(&mock_server.uri()).unwrap().port().unwrap();
    mount_html(
        &mock_server,
        "/",
        &format!(
            r#"<a href="http://localhost:{}/other">x</a>
            <a href="https://example.org/elsewhere">y</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="/local">local</a>"#,
            port
        ),
        1,
    )
    .await;
    mount_html(&mock_server, "/local", "<p>local</p>", 1).await;
    mount_html(&mock_server, "/other", "<p>other</p>", 0).await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let documents = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(documents.len(), 2);
    let domain = domain_of(&mock_server);
    assert!(documents.iter().all(|d| d.domain == domain));
}

#[tokio::test]
async fn test_failing_page_is_skipped() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_html(
        &mock_server,
        "/",
        r#"<a href="/broken">broken</a><a href="/ok">ok</a>"#,
        1,
    )
    .await;
    // Linked twice but fetched once: failures are remembered as visited
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/ok", r#"<p>fine</p><a href="/broken">again</a>"#, 1).await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let mut crawler = Crawler::new(&config).await.expect("Failed to create crawler");
    let documents = crawler.run().await.expect("Crawl failed");

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[1].url, format!("{}/ok", mock_server.uri()));
    // Positions count successes only
    assert_eq!(read_document(&output.path().join("doc_2.json")).url, documents[1].url);
    assert_eq!(crawler.last_stats().failed, 1);
}

#[tokio::test]
async fn test_robots_server_error_is_permissive() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/", "<p>Home</p>", 1).await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let documents = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(documents.len(), 1);
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; respects robots.txt)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Home</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), output.path(), 10);
    let documents = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(documents.len(), 1);
}

#[tokio::test]
async fn test_uncreatable_output_directory_is_fatal() {
    let mock_server = MockServer::start().await;
    let scratch = TempDir::new().unwrap();
    let blocker = scratch.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();

    mount_html(&mock_server, "/", "<p>Home</p>", 0).await;

    let config = create_test_config(&mock_server.uri(), &blocker.join("out"), 10);
    let result = run_crawl(&config).await;

    assert!(matches!(result, Err(HarvestError::Storage(_))));
}
