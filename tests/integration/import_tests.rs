//! Integration tests for the import pipeline
//!
//! These tests use wiremock to stand in for origin servers and for the
//! same-origin proxy, and run the full pipeline end-to-end.

use std::time::Duration;
use sumi_mirror::config::{Config, ImportOptions};
use sumi_mirror::{Importer, IssueKind};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn css_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/css")
}

fn options_for(source: &str) -> ImportOptions {
    ImportOptions::default().with_source_url(source)
}

#[tokio::test]
async fn test_stylesheet_inlined_via_proxy() {
    let proxy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/proxy"))
        .and(query_param("url", "https://example.com/style.css"))
        .and(query_param("type", "css"))
        .respond_with(css_response("body{color:red}"))
        .expect(1)
        .mount(&proxy)
        .await;

    let mut config = Config::default();
    config.fetch.proxy_url = Some(format!("{}/api/proxy", proxy.uri()));
    let importer = Importer::new(&config).expect("Failed to create importer");

    let html = r#"<html><head><link rel="stylesheet" href="/style.css"></head><body><p>Hi</p></body></html>"#;
    let result = importer
        .import_html(html, &options_for("https://example.com/"))
        .await
        .expect("Import failed");

    assert!(!result.html.contains(r#"href="https://example.com/style.css""#));
    assert!(!result.html.contains("<link rel=\"stylesheet\""));
    assert!(result.html.contains(r#"<style data-inlined="true">"#));
    assert!(result.html.contains("color:red"));
    assert!(result.inlined_css.contains("/* Inlined from: https://example.com/style.css */"));
    assert_eq!(result.css, vec!["https://example.com/style.css"]);
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
}

#[tokio::test]
async fn test_import_url_direct() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<!DOCTYPE html><html><head><title>Shop</title>
<link rel="stylesheet" href="/css/style.css"></head>
<body><img src="img/hero.jpg"><a href="/about">About</a></body></html>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/css/style.css"))
        .respond_with(css_response(".hero{background:url(../img/bg.png)}"))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let result = importer
        .import_url(&format!("{}/", base))
        .await
        .expect("Import failed");

    assert!(result.is_success());
    assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
    // url() inside the stylesheet resolves against the stylesheet, not the page
    assert!(result.inlined_css.contains(&format!("url({}/img/bg.png)", base)));
    assert!(result.html.contains(&format!(r#"src="{}/img/hero.jpg""#, base)));
    assert!(result.html.contains(&format!(r#"href="{}/about""#, base)));
    assert!(!result.html.contains("css/style.css\""));
    assert_eq!(result.images, vec![format!("{}/img/hero.jpg", base)]);
}

#[tokio::test]
async fn test_css_timeout_is_soft_failure() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<html><head><link rel="stylesheet" href="/slow.css"></head><body><h1>Still here</h1></body></html>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow.css"))
        .respond_with(css_response("p{margin:0}").set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.import.fetch_timeout = Some(1000);
    let importer = Importer::new(&config).expect("Failed to create importer");

    let result = importer
        .import_url(&format!("{}/", base))
        .await
        .expect("Import failed");

    assert!(!result.html.is_empty());
    assert!(result.html.contains("Still here"));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::Network);
    assert_eq!(result.errors[0].url.as_deref(), Some(format!("{}/slow.css", base).as_str()));
    // The link stays so the page can still load the stylesheet itself
    assert!(result.html.contains("slow.css"));
}

#[tokio::test]
async fn test_html_served_as_css_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.css"))
        .respond_with(html_response("<!DOCTYPE html><html><body>Not found</body></html>"))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let source = format!("{}/", server.uri());
    let result = importer
        .import_html(
            r#"<link rel="stylesheet" href="missing.css"><p>x</p>"#,
            &options_for(&source),
        )
        .await
        .expect("Import failed");

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::ContentTypeMismatch);
    assert!(!result.html.contains("Not found"));
}

#[tokio::test]
async fn test_root_fetch_failure_gives_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let result = importer
        .import_url(&format!("{}/", server.uri()))
        .await
        .expect("Root failure must not be an Err");

    assert!(!result.is_success());
    assert_eq!(result.html, "");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, IssueKind::Network);
}

#[tokio::test]
async fn test_import_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r#"<html><head><link rel="stylesheet" href="site.css?v=3"></head>
<body><!--[if lt IE 9]><script src="html5shiv.js"></script><![endif]--><img src="/logo.png"></body></html>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/site.css"))
        .respond_with(css_response("h1{font-family:Georgia}"))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let source = format!("{}/", server.uri());

    let once = importer.import_url(&source).await.expect("Import failed");
    let twice = importer
        .import_html(&once.html, &options_for(&source))
        .await
        .expect("Re-import failed");

    assert_eq!(once.html, twice.html);
    assert_eq!(once.html.matches("data-inlined").count(), 1);
    assert!(!once.html.contains("[if lt IE 9]"));
}

#[tokio::test]
async fn test_trackers_removed() {
    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let html = r#"<html><head>
<script src="https://www.googletagmanager.com/gtm.js"></script>
<script>window.dataLayer=window.dataLayer||[];dataLayer.push({'gtm.start':1});</script>
</head><body>
<noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-X"></iframe></noscript>
<p>Content</p></body></html>"#;

    let result = importer
        .import_html(html, &options_for("https://shop.test/"))
        .await
        .expect("Import failed");

    assert_eq!(result.html.matches("googletagmanager.com").count(), 0);
    assert!(!result.html.contains("dataLayer"));
    assert!(result.html.contains("<p>Content</p>"));
    assert!(result.js.is_empty());
    assert!(result.warnings.iter().any(|w| w.kind == IssueKind::Blocked));
}

#[tokio::test]
async fn test_cdn_stylesheet_preserved_and_not_fetched() {
    let proxy = MockServer::start().await;

    Mock::given(any())
        .respond_with(css_response(""))
        .expect(0)
        .mount(&proxy)
        .await;

    let mut config = Config::default();
    config.fetch.proxy_url = Some(format!("{}/api/proxy", proxy.uri()));
    let importer = Importer::new(&config).expect("Failed to create importer");

    let link = r#"<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/twitter-bootstrap/5.3.2/css/bootstrap.min.css">"#;
    let result = importer
        .import_html(
            &format!("<html><head>{}</head><body></body></html>", link),
            &options_for("https://shop.test/"),
        )
        .await
        .expect("Import failed");

    assert!(result.html.contains(link));
    assert_eq!(result.html.matches("bootstrap.min.css").count(), 1);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_fragment_becomes_document() {
    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let result = importer
        .import_html("<div>Hello</div>", &ImportOptions::default())
        .await
        .expect("Import failed");

    let html = result.html;
    assert_eq!(html.matches("<!DOCTYPE html>").count(), 1);
    assert_eq!(html.matches("<head>").count(), 1);
    assert_eq!(html.matches("<body>").count(), 1);
    assert!(html.contains("<div>Hello</div>"));
    assert!(html.find("<head>") < html.find("<body>"));
}

#[tokio::test]
async fn test_analyze_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_response(
            r##"<html><head><title>Acme Studio</title>
<meta name="description" content="We build things">
<link rel="stylesheet" href="/theme.css">
<link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Poppins:wght@400;600&display=swap">
</head><body>
<header><nav><a href="/">Home</a><a href="/work">Work</a><a href="#contact">Contact</a></nav></header>
<section class="hero"><h1>We design</h1><a class="btn" href="/start">Start a project</a></section>
<section id="pricing"><h2>Plans</h2><ul><li>Basic</li><li>Pro</li></ul></section>
<footer><p>Made with care by the Acme team.</p></footer>
</body></html>"##,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/theme.css"))
        .respond_with(css_response(":root{--accent:#FF6600}body{color:#111;font-family:Poppins,sans-serif}"))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let analysis = importer
        .analyze_url(&format!("{}/", base))
        .await
        .expect("Analysis failed");

    assert_eq!(analysis.title, "Acme Studio");
    assert_eq!(analysis.description, "We build things");
    assert!(analysis.colors.contains(&"#ff6600".to_string()));
    assert!(analysis.colors.contains(&"#111111".to_string()));
    assert!(analysis.fonts.iter().any(|f| f == "Poppins"));
    assert_eq!(analysis.navigation.len(), 3);
    assert_eq!(analysis.navigation[1].href, format!("{}/work", base));
    assert_eq!(analysis.sections.len(), 2);
    assert_eq!(analysis.text_content.button_text, vec!["Start a project"]);
    assert_eq!(analysis.text_content.list_items, vec!["Basic", "Pro"]);
    assert!(analysis.layout.has_hero && analysis.layout.has_footer);
    assert!(analysis.css.inlined.contains("--accent"));
    assert_eq!(analysis.css.external.len(), 1);
    assert!(analysis.css.external[0].starts_with("https://fonts.googleapis.com/"));
    assert!(analysis.truncated.is_empty());
}

#[tokio::test]
async fn test_inline_images() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dot.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, b'P', b'N', b'G'])
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.import.inline_images = true;
    let importer = Importer::new(&config).expect("Failed to create importer");

    let options = config.import.with_source_url(&format!("{}/", server.uri()));
    let result = importer
        .import_html(r#"<img src="dot.png" srcset="dot@2x.png 2x" alt="dot">"#, &options)
        .await
        .expect("Import failed");

    assert!(result.html.contains(r#"src="data:image/png;base64,iVBORw==""#));
    assert!(!result.html.contains("srcset"));
}

#[tokio::test]
async fn test_failed_stylesheet_with_shared_file_name_kept() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/style.css"))
        .respond_with(css_response(".a{color:teal}"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b/style.css"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let source = format!("{}/", server.uri());
    let html = r#"<html><head>
<link rel="stylesheet" href="/a/style.css">
<link rel="stylesheet" href="/b/style.css">
</head><body><p>x</p></body></html>"#;

    let result = importer
        .import_html(html, &options_for(&source))
        .await
        .expect("Import failed");

    assert_eq!(result.errors.len(), 1);
    assert!(result.inlined_css.contains("color:teal"));
    assert!(!result.html.contains(&format!(r#"href="{}/a/style.css""#, server.uri())));
    assert!(result.html.contains(&format!(r#"href="{}/b/style.css""#, server.uri())));
}

#[tokio::test]
async fn test_meta_pixel_removed() {
    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let html = r#"<html><head>
<script>!function(f,b,e,v,n,t,s){}(window,document,'script');fbq('init', '1234567890');fbq('track', 'PageView');</script>
<noscript><img height="1" width="1" style="display:none" src="https://www.facebook.com/tr?id=1234567890&ev=PageView&noscript=1"/></noscript>
</head><body><p>Content</p></body></html>"#;

    let result = importer
        .import_html(html, &options_for("https://shop.test/"))
        .await
        .expect("Import failed");

    assert!(!result.html.contains("facebook.com/tr"));
    assert!(!result.html.contains("fbq("));
    assert!(result.html.contains("<p>Content</p>"));
}

#[tokio::test]
async fn test_non_ascii_document() {
    let importer = Importer::new(&Config::default()).expect("Failed to create importer");
    let html = "<!-- 日本語 --><html><head><title>t</title></head><body><p>こんにちは</p></body></html>";

    let result = importer
        .import_html(html, &ImportOptions::default())
        .await
        .expect("Import failed");

    assert_eq!(result.html.matches("<!DOCTYPE html>").count(), 1);
    assert!(result.html.contains("<p>こんにちは</p>"));
}
