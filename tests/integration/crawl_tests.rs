//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, extract and enqueue cycle end-to-end over real HTTP.

use page_harvest::config::{CrawlConfig, CrawlSettings, PolitenessPolicy};
use page_harvest::crawler::{run_crawl, CrawlResult, FetchError};
use page_harvest::output::{export, MULTI_VALUE_SEPARATOR};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Settings with no delays so tests run quickly
fn fast_settings() -> CrawlSettings {
    CrawlSettings {
        request_delay: 0.0,
        backoff_factor: 0.0,
        max_retries: 2,
        request_timeout: 5.0,
        ..CrawlSettings::default()
    }
}

fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn crawl(server: &MockServer, settings: CrawlSettings) -> CrawlResult {
    let seed = format!("{}/", server.uri());
    let config = CrawlConfig::new(&seed, settings).expect("valid config");
    run_crawl(config).await.expect("crawl should finish")
}

fn record_paths(result: &CrawlResult) -> Vec<String> {
    result
        .records
        .iter()
        .map(|record| {
            url::Url::parse(&record.url)
                .expect("record URL parses")
                .path()
                .to_string()
        })
        .collect()
}

async fn page_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() != "/robots.txt")
        .count()
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home", r#"<a href="/a">A</a><a href="/b">B</a>"#),
    )
    .await;

    let settings = CrawlSettings {
        max_depth: 0,
        ..fast_settings()
    };
    let result = crawl(&server, settings).await;

    assert_eq!(record_paths(&result), vec!["/"]);
    assert_eq!(result.records[0].title, "Home");
    assert_eq!(page_requests(&server).await, 1);
}

#[tokio::test]
async fn test_page_without_anchors() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Lonely", "<p>No links at all</p>")).await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.pages_visited, 1);
    assert_eq!(result.records[0].body_text, "No links at all");
}

#[tokio::test]
async fn test_multi_level_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home", r#"<a href="/a">A</a><a href="/b">B</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/a",
        html_page("A", r#"<a href="/">Home</a><a href="/c">C</a>"#),
    )
    .await;
    mount_page(&server, "/b", html_page("B", r#"<a href="/c#top">C</a>"#)).await;
    mount_page(&server, "/c", html_page("C", "<p>Leaf</p>")).await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(record_paths(&result), vec!["/", "/a", "/b", "/c"]);
    assert_eq!(page_requests(&server).await, 4);
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_server_error_exhausts_retries_and_continues() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home", r#"<a href="/broken">X</a><a href="/ok">Y</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", html_page("Ok", r#"<a href="/broken">again</a>"#)).await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(record_paths(&result), vec!["/", "/ok"]);
    assert_eq!(result.pages_visited, 3);
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].url.ends_with("/broken"));
    assert!(matches!(
        result.failures[0].error,
        FetchError::Status { status: 500, .. }
    ));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", r#"<a href="/gone">X</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.failures.len(), 1);
}

#[tokio::test]
async fn test_slow_page_times_out() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", r#"<a href="/slow">X</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html_page("Slow", ""))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = CrawlSettings {
        request_timeout: 0.3,
        max_retries: 0,
        ..fast_settings()
    };
    let result = crawl(&server, settings).await;

    assert_eq!(record_paths(&result), vec!["/"]);
    assert!(matches!(
        result.failures[0].error,
        FetchError::Timeout { .. }
    ));
}

#[tokio::test]
async fn test_content_selector_fallback_to_body() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>T</title><meta name="description" content="About us"></head>
           <body>
             <nav>Menu</nav>
             <div>Plain
               body</div>
             <script>ignored()</script>
             <footer>Footer</footer>
           </body></html>"#
            .to_string(),
    )
    .await;

    let result = crawl(&server, fast_settings()).await;

    let record = &result.records[0];
    assert_eq!(record.meta_description, "About us");
    assert_eq!(record.body_text, "Plain body");
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_max_pages_budget() {
    let server = MockServer::start().await;
    let links: String = (1..=5)
        .map(|n| format!(r#"<a href="/p{}">{}</a>"#, n, n))
        .collect();
    mount_page(&server, "/", html_page("Home", &links)).await;
    for n in 1..=5 {
        mount_page(&server, &format!("/p{}", n), html_page("P", "")).await;
    }

    let settings = CrawlSettings {
        max_pages: 3,
        ..fast_settings()
    };
    let result = crawl(&server, settings).await;

    assert_eq!(result.pages_visited, 3);
    assert_eq!(record_paths(&result), vec!["/", "/p1", "/p2"]);
    assert_eq!(page_requests(&server).await, 3);
}

#[tokio::test]
async fn test_domain_restriction() {
    let server = MockServer::start().await;
    let port = url::Url::parse(&server.uri())
        .expect("server URI parses")
        .port()
        .expect("server URI has a port");
    // Same server, different hostname
    let other_host = format!("http://localhost:{}/elsewhere", port);
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(r#"<a href="{}">Other</a><a href="/local">Local</a>"#, other_host),
        ),
    )
    .await;
    mount_page(&server, "/local", html_page("Local", "")).await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Else", "")))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(record_paths(&result), vec!["/", "/local"]);
    for record in &result.records {
        assert!(record.url.starts_with("http://127.0.0.1:"));
    }
}

#[tokio::test]
async fn test_domain_restriction_disabled() {
    let server = MockServer::start().await;
    let port = url::Url::parse(&server.uri())
        .expect("server URI parses")
        .port()
        .expect("server URI has a port");
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            &format!(r#"<a href="http://localhost:{}/elsewhere">Other</a>"#, port),
        ),
    )
    .await;
    mount_page(&server, "/elsewhere", html_page("Else", "")).await;

    let settings = CrawlSettings {
        restrict_to_domain: false,
        ..fast_settings()
    };
    let result = crawl(&server, settings).await;

    assert_eq!(record_paths(&result), vec!["/", "/elsewhere"]);
}

#[tokio::test]
async fn test_ignored_extensions_never_requested() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/report.PDF">PDF</a><a href="/photo.jpg">JPG</a><a href="/page">Page</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/page", html_page("Page", "")).await;
    Mock::given(method("GET"))
        .and(path("/report.PDF"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(record_paths(&result), vec!["/", "/page"]);
}

#[tokio::test]
async fn test_queue_size_cap() {
    let server = MockServer::start().await;
    let links: String = (1..=4)
        .map(|n| format!(r#"<a href="/q{}">{}</a>"#, n, n))
        .collect();
    mount_page(&server, "/", html_page("Home", &links)).await;
    for n in 1..=4 {
        mount_page(&server, &format!("/q{}", n), html_page("Q", "")).await;
    }

    let settings = CrawlSettings {
        max_queue_size: 2,
        ..fast_settings()
    };
    let result = crawl(&server, settings).await;

    assert_eq!(record_paths(&result), vec!["/", "/q1", "/q2"]);
    assert_eq!(page_requests(&server).await, 3);
}

#[tokio::test]
async fn test_strict_robots_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<a href="/private/secret">S</a><a href="/public">P</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/public", html_page("Public", "")).await;
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let settings = CrawlSettings {
        politeness: PolitenessPolicy::Strict,
        ..fast_settings()
    };
    let result = crawl(&server, settings).await;

    assert_eq!(record_paths(&result), vec!["/", "/public"]);
    assert!(matches!(
        result.failures[0].error,
        FetchError::Disallowed { .. }
    ));
}

#[tokio::test]
async fn test_permissive_robots_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home", r#"<a href="/private">S</a>"#)).await;
    mount_page(&server, "/private", html_page("Private", "")).await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(record_paths(&result), vec!["/", "/private"]);
}

#[tokio::test]
async fn test_export_round_trip() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Export</title></head><body>
           <h1>One</h1><h1>Two</h1><h4>Deep</h4><main>Text</main>
           </body></html>"#
            .to_string(),
    )
    .await;

    let result = crawl(&server, fast_settings()).await;

    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("crawled_data.csv");
    assert!(export(&result, &out));

    let mut reader = csv::Reader::from_path(&out).expect("csv readable");
    assert_eq!(
        reader.headers().expect("header row").iter().collect::<Vec<_>>(),
        vec![
            "url",
            "title",
            "meta_description",
            "h1",
            "h2",
            "h3_plus",
            "body_text",
            "date_crawled",
            "errors"
        ]
    );
    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("rows parse");
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "Export");
    assert_eq!(
        rows[0][3].split(MULTI_VALUE_SEPARATOR).collect::<Vec<_>>(),
        vec!["One", "Two"]
    );
    assert_eq!(&rows[0][5], "h4: Deep");
    assert_eq!(&rows[0][6], "Text");
}

#[tokio::test]
async fn test_navigation_chrome_is_stripped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page(
            "Home",
            r#"<header><div class="content">Header menu</div></header>
               <nav><a href="/menu-only">Menu</a></nav>
               <p>Welcome text <a href="/story">Story</a></p>
               <footer><a href="/legal">Legal</a></footer>"#,
        ),
    )
    .await;
    mount_page(&server, "/story", html_page("Story", "<p>Story text</p>")).await;
    mount_page(&server, "/menu-only", html_page("Menu", "<p>Menu page</p>")).await;
    mount_page(&server, "/legal", html_page("Legal", "<p>Legal page</p>")).await;

    let result = crawl(&server, fast_settings()).await;

    assert_eq!(record_paths(&result), vec!["/", "/story"]);
    assert_eq!(result.records[0].body_text, "Welcome text Story");
    assert_eq!(page_requests(&server).await, 2);
}
