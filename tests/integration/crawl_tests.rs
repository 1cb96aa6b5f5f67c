//! Integration tests for multi-page imports
//!
//! These tests use wiremock to create a small mock site and crawl it.

use sumi_mirror::config::{Config, CrawlConfig};
use sumi_mirror::crawler::{detect_internal_pages, Coordinator};
use sumi_mirror::{Importer, IssueKind};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

fn fast_crawl(max_pages: usize, concurrency: usize) -> CrawlConfig {
    CrawlConfig {
        max_pages,
        concurrency,
        delay_between_pages: 0,
    }
}

/// Mounts a home page linking to about, contact and a missing page
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page(
            "Home",
            r#"<nav><a href="/">Home</a><a href="/about">About</a><a href="/contact#form">Contact</a>
<a href="/missing">Old page</a><a href="/brochure.pdf">Brochure</a>
<a href="https://elsewhere.test/">Partner</a></nav>"#,
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(page("About us", "<h1>About</h1>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(page("Contact", "<h1>Contact</h1>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[test]
fn test_detect_internal_pages() {
    let source = Url::parse("https://acme.test/").unwrap();
    let html = r##"
        <a href="/about">About</a>
        <a href="/about#team">Team</a>
        <a href="https://acme.test/blog/first-post.html">First post</a>
        <a href="/files/report.pdf">Report</a>
        <a href="https://other.test/">Other</a>
        <a href="mailto:hi@acme.test">Mail</a>
        <a href="#top">Top</a>
    "##;

    let pages = detect_internal_pages(html, &source);
    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();

    assert_eq!(urls, vec!["https://acme.test/about", "https://acme.test/blog/first-post.html"]);
    assert_eq!(pages[0].title, "About");
    assert_eq!(pages[1].suggested_filename, "blog-first-post.html");
    assert!(pages.iter().all(|p| !p.is_external));
}

#[test]
fn test_detect_skips_external_and_images() {
    let source = Url::parse("https://example.com/").unwrap();
    let html = r#"<a href="/about">About</a><a href="/contact">Contact</a>
<a href="https://external.com/">Partner</a><a href="/logo.png">Logo</a>"#;

    let urls: Vec<String> = detect_internal_pages(html, &source)
        .into_iter()
        .map(|p| p.url)
        .collect();
    assert_eq!(urls, vec!["https://example.com/about", "https://example.com/contact"]);
}

#[tokio::test]
async fn test_crawl_site() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let coordinator = Coordinator::new(&importer, fast_crawl(10, 1));

    let result = coordinator
        .crawl_site(&format!("{}/", server.uri()))
        .await
        .expect("Crawl failed");

    let files: Vec<&str> = result.pages.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(files, vec!["index.html", "about.html", "contact.html"]);
    assert_eq!(result.pages[1].title, "About us");
    assert!(result.pages.iter().all(|p| p.html.starts_with("<!DOCTYPE html>")));

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::Network);
    assert!(result.errors[0].message.contains("/missing"));
}

#[tokio::test]
async fn test_crawl_respects_max_pages() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let coordinator = Coordinator::new(&importer, fast_crawl(2, 1));

    let result = coordinator
        .crawl_site(&format!("{}/", server.uri()))
        .await
        .expect("Crawl failed");

    let files: Vec<&str> = result.pages.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(files, vec!["index.html", "about.html"]);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_crawl_unreachable_root() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let coordinator = Coordinator::new(&importer, fast_crawl(10, 1));

    let result = coordinator
        .crawl_site(&format!("{}/", server.uri()))
        .await
        .expect("Crawl should report the failure, not return Err");

    assert!(result.pages.is_empty());
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn test_import_multiple_pages_keeps_input_order() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let coordinator = Coordinator::new(&importer, fast_crawl(10, 2));

    let urls = vec![
        format!("{}/contact", server.uri()),
        format!("{}/missing", server.uri()),
        format!("{}/about", server.uri()),
    ];
    let result = coordinator.import_multiple_pages(&urls).await;

    let titles: Vec<&str> = result.pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Contact", "About us"]);
    assert_eq!(result.pages[0].url, urls[0]);
    assert_eq!(result.errors.len(), 1);
}
