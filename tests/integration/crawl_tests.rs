//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a miniature catalog site and run the
//! fetcher, tree builder and chapter assembly against it end-to-end.

use icd_harvest::config::{ChapterConfig, Config, FetcherConfig};
use icd_harvest::crawler::{harvest, CatalogAssembler, Fetcher, TreeBuilder};
use icd_harvest::output::read_catalog;
use icd_harvest::{CodeNode, HarvestError};
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAPTER: &str = "/ICD10CM/Codes/Z00-Z99";
const RANGE_A: &str = "/ICD10CM/Codes/Z00-Z99/Z00-Z13/";
const RANGE_B: &str = "/ICD10CM/Codes/Z00-Z99/Z14-Z15/";
const Z00_PAGE: &str = "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-";

/// Creates a test configuration pointed at the mock server, without delays
fn create_test_config(base_url: &str) -> Config {
    Config {
        fetcher: FetcherConfig {
            base_url: base_url.to_string(),
            user_agent: "Mozilla/5.0 (TestHarvester)".to_string(),
            max_attempts: 3,
            request_delay_ms: 0,
            retry_backoff_ms: 0,
            timeout_secs: 10,
        },
        chapters: vec![ChapterConfig::numeric("Z", "Z00-Z99")],
        ..Config::default()
    }
}

/// Wraps content in a page with navigation chrome around the content region
fn page(content: &str) -> String {
    format!(
        r#"<html><head><title>ICD-10-CM</title></head><body>
        <div class="nav">
            <a href="/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.9">Z00.9 navigation only</a>
        </div>
        <div class="body-content">{}</div>
        </body></html>"#,
        content
    )
}

/// A code page with a hierarchy entry, optional sections and child links
fn code_page(code: &str, description: &str, sections: &str, children: &[(&str, &str)]) -> String {
    let links: String = children
        .iter()
        .map(|(child, href)| format!(r#"<li><a href="{}">{} child description</a></li>"#, href, child))
        .collect();

    page(&format!(
        r#"<ul class="codeHierarchy">
            <li>Chapter 21 Factors influencing health status</li>
            <li>{code} {description}</li>
        </ul>
        {sections}
        <div class="children"><ul>{links}</ul></div>"#
    ))
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts a small Z chapter:
///
/// ```text
/// Z00-Z99
/// ├── Z00-Z13: Z01, Z00 (listed out of order)
/// └── Z14-Z15: Z14 (page always fails)
///
/// Z00
/// ├── Z00.0
/// │   ├── Z00.00
/// │   └── Z00.01 (404)
/// └── Z00.1
/// ```
async fn mount_chapter(server: &MockServer) {
    mount_html(
        server,
        CHAPTER,
        page(&format!(
            r#"<ul>
                <li><a href="{RANGE_B}">Z14-Z15 Genetic carrier</a></li>
                <li><a href="{RANGE_A}">Z00-Z13 Encounters</a></li>
                <li><a href="{RANGE_A}">Z00-Z13 duplicate link</a></li>
                <li><a href="/ICD10CM/Codes/F01-F99/F01-F09/">F01-F09 elsewhere</a></li>
                <li><a href="/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.0">Z00.0 code page</a></li>
            </ul>"#
        )),
    )
    .await;

    mount_html(
        server,
        RANGE_A,
        page(
            r#"<ul class="codeHierarchy">
                <li><a href="/ICD10CM/Codes/Z00-Z99/Z00-Z13">Z00-Z13</a> Encounters</li>
                <li><a href="/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z01-">Z01</a> Other special examinations</li>
                <li><a href="/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-">Z00</a> Encounter for general examination</li>
            </ul>"#,
        ),
    )
    .await;

    mount_html(
        server,
        RANGE_B,
        page(
            r#"<ul class="codeHierarchy">
                <li><a href="/ICD10CM/Codes/Z00-Z99/Z14-Z15/Z14-">Z14</a> Genetic carrier</li>
                <li><a href="/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-">Z00</a> Listed again</li>
            </ul>"#,
        ),
    )
    .await;

    mount_html(
        server,
        "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-",
        code_page(
            "Z00",
            "Encounter for general examination",
            r#"<span>Clinical Information</span><ul><li>Routine checkup</li><li>Screening</li></ul>
            <strong>Approximate Synonyms</strong><ul><li>Annual physical</li></ul>"#,
            &[
                ("Z00.0", "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.0"),
                ("Z00.1", "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.1"),
                ("Z00.0", "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.0"),
                ("Z01", "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z01-"),
                ("Z00-Z13", "/ICD10CM/Codes/Z00-Z99/Z00-Z13"),
            ],
        ),
    )
    .await;

    mount_html(
        server,
        "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.0",
        code_page(
            "Z00.0",
            "Encounter for general adult medical examination",
            r#"<h3>Applicable To</h3><ul><li>Health check&nbsp;NOS</li></ul>"#,
            &[
                ("Z00.00", "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.00"),
                ("Z00.01", "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.01"),
            ],
        ),
    )
    .await;

    mount_html(
        server,
        "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.00",
        code_page("Z00.00", "Without abnormal findings", "", &[]),
    )
    .await;

    mount_status(server, "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.01", 404).await;

    mount_html(
        server,
        "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-/Z00.1",
        code_page("Z00.1", "Encounter for newborn check", "", &[]),
    )
    .await;

    mount_html(
        server,
        "/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z01-",
        code_page("Z01", "Other special examinations", "", &[]),
    )
    .await;

    mount_status(server, "/ICD10CM/Codes/Z00-Z99/Z14-Z15/Z14-", 500).await;
}

fn child_codes(node: &CodeNode) -> Vec<&str> {
    node.children.iter().map(|c| c.code.as_str()).collect()
}

#[tokio::test]
async fn test_fetch_sends_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "Mozilla/5.0 (TestHarvester)"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    let body = fetcher
        .fetch_body(&format!("{}/page", mock_server.uri()))
        .await;
    assert_eq!(body.as_deref(), Some("<html></html>"));
}

#[tokio::test]
async fn test_fetch_retries_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("third time lucky"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    let body = fetcher
        .fetch_body(&format!("{}/flaky", mock_server.uri()))
        .await;
    assert_eq!(body.as_deref(), Some("third time lucky"));
}

#[tokio::test]
async fn test_fetch_gives_up_after_max_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    let document = fetcher
        .fetch_document(&format!("{}/down", mock_server.uri()))
        .await;
    assert!(document.is_none());
}

#[tokio::test]
async fn test_fetch_treats_non_200_success_as_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/accepted"))
        .respond_with(ResponseTemplate::new(202).set_body_string("not quite"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    let body = fetcher
        .fetch_body(&format!("{}/accepted", mock_server.uri()))
        .await;
    assert!(body.is_none());
}

#[tokio::test]
async fn test_fetch_timeout_counts_as_failed_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.fetcher.timeout_secs = 1;
    config.fetcher.max_attempts = 2;
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    let body = fetcher
        .fetch_body(&format!("{}/slow", mock_server.uri()))
        .await;
    assert!(body.is_none());
}

#[tokio::test]
async fn test_fetch_unreachable_host() {
    // Nothing listens on the discard port
    let mut config = create_test_config("http://127.0.0.1:9");
    config.fetcher.max_attempts = 2;
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    assert!(fetcher.fetch_body("http://127.0.0.1:9/page").await.is_none());
}

#[tokio::test]
async fn test_build_tree() {
    let mock_server = MockServer::start().await;
    mount_chapter(&mock_server).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let builder = TreeBuilder::new(&fetcher, &base_url, &config.catalog);

    let root = builder
        .build(
            &format!("{}/ICD10CM/Codes/Z00-Z99/Z00-Z13/Z00-", mock_server.uri()),
            "Z00",
        )
        .await
        .expect("Root page should be fetched");

    assert_eq!(root.code, "Z00");
    assert_eq!(root.description, "Encounter for general examination");
    assert_eq!(root.clinical_information, vec!["Routine checkup", "Screening"]);
    assert!(root.applicable_to.is_empty());
    assert_eq!(root.approximate_synonyms, vec!["Annual physical"]);

    // Duplicates, siblings, ranges and navigation links are not children
    assert_eq!(child_codes(&root), vec!["Z00.0", "Z00.1"]);

    let adult = &root.children[0];
    assert_eq!(adult.description, "Encounter for general adult medical examination");
    assert_eq!(adult.applicable_to, vec!["Health check NOS"]);

    // Z00.01 returned 404 on every attempt: no placeholder is recorded
    assert_eq!(child_codes(adult), vec!["Z00.00"]);
    assert!(adult.children[0].children.is_empty());

    assert!(root.check_invariants().is_ok());
}

#[tokio::test]
async fn test_fetch_waits_before_attempts_and_between_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.fetcher.request_delay_ms = 50;
    config.fetcher.retry_backoff_ms = 100;
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");

    let start = Instant::now();
    let body = fetcher
        .fetch_body(&format!("{}/down", mock_server.uri()))
        .await;
    let elapsed = start.elapsed();

    assert!(body.is_none());
    // Three delays before the attempts, two backoffs between them
    assert!(
        elapsed >= Duration::from_millis(3 * 50 + 2 * 100),
        "finished too early: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_build_requests_pages_depth_first() {
    let mock_server = MockServer::start().await;
    mount_chapter(&mock_server).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let builder = TreeBuilder::new(&fetcher, &base_url, &config.catalog);

    builder
        .build(&format!("{}{}", mock_server.uri(), Z00_PAGE), "Z00")
        .await
        .expect("Root page should be fetched");

    let requested: Vec<String> = mock_server
        .received_requests()
        .await
        .expect("Request recording should be enabled")
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();

    // Z00.0's subtree, including every attempt on the missing Z00.01, is
    // finished before its sibling Z00.1 is requested
    let expected: Vec<String> = [
        "",
        "/Z00.0",
        "/Z00.00",
        "/Z00.01",
        "/Z00.01",
        "/Z00.01",
        "/Z00.1",
    ]
    .iter()
    .map(|suffix| format!("{}{}", Z00_PAGE, suffix))
    .collect();

    assert_eq!(requested, expected);
}

#[tokio::test]
async fn test_build_unreachable_root_is_absent() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/ICD10CM/Codes/Z00-Z99/Z14-Z15/Z14-", 500).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let builder = TreeBuilder::new(&fetcher, &base_url, &config.catalog);

    let root = builder
        .build(
            &format!("{}/ICD10CM/Codes/Z00-Z99/Z14-Z15/Z14-", mock_server.uri()),
            "Z14",
        )
        .await;

    assert!(root.is_none());
}

#[tokio::test]
async fn test_discover_ranges_and_roots() {
    let mock_server = MockServer::start().await;
    mount_chapter(&mock_server).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let assembler = CatalogAssembler::new(&fetcher, &base_url, &config.catalog);
    let chapter = &config.chapters[0];

    let ranges = assembler
        .discover_ranges(chapter)
        .await
        .expect("Range discovery failed");
    let urls: Vec<String> = ranges.iter().map(|r| r.url.clone()).collect();

    assert_eq!(
        urls,
        vec![
            format!("{}{}", mock_server.uri(), RANGE_A),
            format!("{}{}", mock_server.uri(), RANGE_B),
        ]
    );

    let roots = assembler.discover_roots(chapter, &ranges).await;
    let codes: Vec<&str> = roots.iter().map(|r| r.code.as_str()).collect();

    assert_eq!(codes, vec!["Z00", "Z01", "Z14"]);
}

#[tokio::test]
async fn test_assemble_chapter() {
    let mock_server = MockServer::start().await;
    mount_chapter(&mock_server).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let assembler = CatalogAssembler::new(&fetcher, &base_url, &config.catalog);

    let nodes = assembler
        .assemble(&config.chapters[0])
        .await
        .expect("Assembly failed");

    // Z14 never loads, so only the two reachable roots remain, sorted
    let codes: Vec<&str> = nodes.iter().map(|n| n.code.as_str()).collect();
    assert_eq!(codes, vec!["Z00", "Z01"]);
    assert_eq!(nodes[0].len(), 4);
    assert!(nodes.iter().all(|n| n.check_invariants().is_ok()));
}

#[tokio::test]
async fn test_chapter_without_ranges_fails() {
    let mock_server = MockServer::start().await;
    mount_html(&mock_server, CHAPTER, page("<p>Under maintenance</p>")).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let assembler = CatalogAssembler::new(&fetcher, &base_url, &config.catalog);

    let result = assembler.assemble(&config.chapters[0]).await;
    assert!(matches!(result, Err(HarvestError::NoRanges { chapter }) if chapter == "Z"));
}

#[tokio::test]
async fn test_chapter_without_roots_fails() {
    let mock_server = MockServer::start().await;
    mount_html(
        &mock_server,
        CHAPTER,
        page(&format!(r#"<a href="{RANGE_A}">Z00-Z13</a>"#)),
    )
    .await;
    mount_html(&mock_server, RANGE_A, page("<p>No hierarchy here</p>")).await;

    let config = create_test_config(&mock_server.uri());
    let fetcher = Fetcher::new(&config.fetcher).expect("Failed to build fetcher");
    let base_url = Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let assembler = CatalogAssembler::new(&fetcher, &base_url, &config.catalog);

    let result = assembler.assemble(&config.chapters[0]).await;
    assert!(matches!(result, Err(HarvestError::NoRootCodes { chapter }) if chapter == "Z"));
}

#[tokio::test]
async fn test_harvest_writes_chapters_independently() {
    let mock_server = MockServer::start().await;
    mount_chapter(&mock_server).await;
    // Nothing is mounted for the F chapter, so its root page 404s

    let mut config = create_test_config(&mock_server.uri());
    config.chapters = vec![
        ChapterConfig::numeric("F", "F01-F99"),
        ChapterConfig::numeric("Z", "Z00-Z99"),
    ];

    let output_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let summary = harvest(&config, &config.chapters, output_dir.path())
        .await
        .expect("Harvest setup failed");

    assert!(!summary.is_success());
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "F");
    assert!(matches!(summary.failed[0].1, HarvestError::NoRanges { .. }));

    assert_eq!(summary.completed.len(), 1);
    let report = &summary.completed[0];
    assert_eq!(report.prefix, "Z");
    assert_eq!(report.ranges, 2);
    assert_eq!(report.roots, 3);
    assert_eq!(report.stats.roots, 2);
    assert_eq!(report.stats.total_codes, 5);
    assert_eq!(report.stats.max_depth, 2);

    assert!(!output_dir.path().join("F_Applicable_Approximate.json").exists());

    let written = read_catalog(&output_dir.path().join("Z_Applicable_Approximate.json"))
        .expect("Failed to read written catalog");
    assert_eq!(written.len(), 2);
    assert_eq!(written[0].code, "Z00");
    assert_eq!(child_codes(&written[0]), vec!["Z00.0", "Z00.1"]);
    assert_eq!(written[1].code, "Z01");
    assert_eq!(written[1].description, "Other special examinations");
}
