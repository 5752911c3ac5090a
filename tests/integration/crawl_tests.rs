//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the full
//! discover, fetch, extract and resolve cycle end-to-end.

use herbar::config::Config;
use herbar::crawler::{crawl, Coordinator};
use herbar::output::{to_json_string, write_all, OutputHandler, SqliteOutput};
use herbar::{FetchCause, HerbarError};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATEGORY_PATH: &str = "/Kategorie:Bylinky";

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::for_site(base_url);
    // Very short for testing
    config.crawler.default_delay_ms = 10;
    config.crawler.request_timeout_secs = 5;
    config.crawler.policy_timeout_secs = 2;
    config
}

fn category_page(slugs: &[&str]) -> String {
    let links: String = slugs
        .iter()
        .map(|slug| format!(r#"<li><a href="/{0}" title="{0}">{0}</a></li>"#, slug))
        .collect();
    format!(
        r#"<html><body>
        <div id="mw-navigation"><a href="/Hlavni_strana">Hlavní strana</a></div>
        <h1 id="firstHeading">Kategorie:Bylinky</h1>
        <div id="mw-content-text">
            <div class="mw-parser-output"><p>Viz též <a href="/Koreni_a_bylinky">koření</a>.</p></div>
            <div id="mw-subcategories"><a href="/Kategorie:Koreni">Koření</a></div>
            <div id="mw-pages">
                <h2>Stránky v kategorii „Bylinky“</h2>
                <div class="mw-content-ltr"><div class="mw-category"><ul>{}</ul></div></div>
            </div>
        </div>
        </body></html>"#,
        links
    )
}

fn article_page(title: &str, image: Option<&str>) -> String {
    let image = image
        .map(|file| {
            format!(
                r#"<a href="/Soubor:{0}" class="image"><img src="/images/thumb/{0}" alt="{0}"></a>"#,
                file
            )
        })
        .unwrap_or_default();
    format!(
        r#"<html><body>
        <h1 id="firstHeading">{0}</h1>
        <div id="mw-content-text"><div class="mw-parser-output">
            {1}
            <p>{0} je aromatická bylina.</p>
            <h2><span class="mw-headline">Zdravotní přínosy</span></h2>
            <p>Uklidňuje žaludek.</p>
            <h2><span class="mw-headline">Skladování</span></h2>
            <p>V suchu a temnu.</p>
        </div></div>
        </body></html>"#,
        title, image
    )
}

fn file_page(file: &str) -> String {
    format!(
        r#"<html><body>
        <div class="fullImageLink" id="file"><a href="/images/a/ab/{0}"><img src="/images/thumb/{0}"></a></div>
        </body></html>"#,
        file
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
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

/// Category with Mata (with image), Bazalka, and Kopr (server error)
async fn mount_herb_site(server: &MockServer) {
    mount_page(server, CATEGORY_PATH, category_page(&["Mata", "Kopr", "Bazalka"])).await;
    mount_page(server, "/Mata", article_page("Máta", Some("Mata.jpg"))).await;
    mount_page(server, "/Bazalka", article_page("Bazalka", None)).await;
    mount_page(server, "/Soubor:Mata.jpg", file_page("Mata.jpg")).await;

    Mock::given(method("GET"))
        .and(path("/Kopr"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_skips_failed_pages() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_herb_site(&server).await;

    let config = create_test_config(&base_url);
    let (collection, stats) = crawl(&config).await.expect("crawl should succeed");

    let ids: Vec<&str> = collection.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Bazalka", "Mata"]);

    assert_eq!(stats.candidates, 3);
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.records, 2);
    assert!(!stats.aborted);

    for record in &collection {
        assert!(!record.id.is_empty());
        assert_eq!(record.license, "CC BY-NC-SA 4.0 (source site)");
        assert_eq!(record.source_url, format!("{}/{}", base_url, record.id));
    }
}

#[tokio::test]
async fn test_record_fields_and_image_resolution() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_herb_site(&server).await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    let mata = collection.get("Mata").expect("Mata should be collected");
    assert_eq!(mata.name, "Máta");
    assert_eq!(mata.summary.as_deref(), Some("Máta je aromatická bylina."));
    assert_eq!(
        mata.sections.get("zdravotni_prinosy").map(String::as_str),
        Some("Uklidňuje žaludek.")
    );
    assert_eq!(
        mata.sections.get("skladovani").map(String::as_str),
        Some("V suchu a temnu.")
    );

    let image = mata.primary_image().expect("Mata has an image");
    assert_eq!(
        image.page_url.as_deref(),
        Some(format!("{}/Soubor:Mata.jpg", base_url).as_str())
    );
    assert_eq!(
        image.thumb_url.as_deref(),
        Some(format!("{}/images/thumb/Mata.jpg", base_url).as_str())
    );
    assert_eq!(
        image.file_url.as_deref(),
        Some(format!("{}/images/a/ab/Mata.jpg", base_url).as_str())
    );
    assert_eq!(stats.images_resolved, 1);

    let bazalka = collection.get("Bazalka").unwrap();
    assert!(bazalka.images.is_empty());
}

#[tokio::test]
async fn test_unresolvable_image_keeps_record() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    mount_page(&server, "/Mata", article_page("Máta", Some("Mata.jpg"))).await;
    Mock::given(method("GET"))
        .and(path("/Soubor:Mata.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    assert_eq!(collection.len(), 1);
    let image = collection.records()[0].primary_image().unwrap();
    assert!(image.page_url.is_some());
    assert!(image.file_url.is_none());
    assert_eq!(stats.images_unresolved, 1);
}

#[tokio::test]
async fn test_repeated_runs_serialize_identically() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_herb_site(&server).await;

    let config = create_test_config(&base_url);
    let (first, _) = crawl(&config).await.unwrap();
    let (second, _) = crawl(&config).await.unwrap();

    assert_eq!(
        to_json_string(&first).unwrap(),
        to_json_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_category_failure_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = crawl(&create_test_config(&server.uri())).await;
    match result {
        Err(HerbarError::Fetch(e)) => assert_eq!(e.cause, FetchCause::Status(500)),
        other => panic!("expected category fetch error, got {:?}", other.map(|(c, _)| c.len())),
    }
}

#[tokio::test]
async fn test_empty_category_yields_empty_collection() {
    let server = MockServer::start().await;
    mount_page(&server, CATEGORY_PATH, category_page(&[])).await;

    let (collection, stats) = crawl(&create_test_config(&server.uri())).await.unwrap();
    assert!(collection.is_empty());
    assert_eq!(stats.candidates, 0);
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(CATEGORY_PATH))
        .and(header("user-agent", "herbar-scraper/0.1 (+https://example.org)"))
        .respond_with(ResponseTemplate::new(200).set_body_string(category_page(&[])))
        .mount(&server)
        .await;

    // Without the signature the category request would miss the mock and 404
    assert!(crawl(&create_test_config(&server.uri())).await.is_ok());
}

#[tokio::test]
async fn test_crawl_delay_from_robots_is_honored() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 0.2\n").await;
    mount_page(&server, CATEGORY_PATH, category_page(&["Bazalka", "Mata"])).await;
    mount_page(&server, "/Bazalka", article_page("Bazalka", None)).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;

    let started = Instant::now();
    let (collection, _) = crawl(&create_test_config(&base_url)).await.unwrap();

    assert_eq!(collection.len(), 2);
    // One delay before each of the two article fetches
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_robots_disallowed_pages_are_not_fetched() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /Tajne\n").await;
    mount_page(&server, CATEGORY_PATH, category_page(&["Mata", "Tajne"])).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;
    Mock::given(method("GET"))
        .and(path("/Tajne"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Tajné", None)))
        .expect(0)
        .mount(&server)
        .await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    assert_eq!(collection.len(), 1);
    assert_eq!(stats.disallowed, 1);
}

#[tokio::test]
async fn test_robots_can_be_ignored() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nDisallow: /\n").await;
    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;

    let mut config = create_test_config(&base_url);
    config.crawler.respect_robots = false;
    let (collection, stats) = crawl(&config).await.unwrap();

    assert_eq!(collection.len(), 1);
    assert_eq!(stats.disallowed, 0);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    Mock::given(method("GET"))
        .and(path("/Mata"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;

    let mut config = create_test_config(&base_url);
    config.crawler.max_retries = 2;
    let (collection, stats) = crawl(&config).await.unwrap();

    assert_eq!(collection.len(), 1);
    assert_eq!(stats.retries, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_without_retries_transient_failure_skips_page() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    Mock::given(method("GET"))
        .and(path("/Mata"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    assert!(collection.is_empty());
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn test_abort_returns_partial_collection() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 30\n").await;
    mount_page(&server, CATEGORY_PATH, category_page(&["Bazalka", "Mata"])).await;
    mount_page(&server, "/Bazalka", article_page("Bazalka", None)).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;

    let mut coordinator = Coordinator::new(&create_test_config(&base_url)).unwrap();
    let abort = coordinator.abort_handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        abort.abort();
    });

    let collection = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("abort should end the crawl promptly")
        .unwrap();

    assert!(collection.is_empty());
    assert!(coordinator.stats().aborted);
    assert_eq!(coordinator.stats().candidates, 2);
}

#[tokio::test]
async fn test_overall_timeout_stops_crawl() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_robots(&server, "User-agent: *\nCrawl-delay: 30\n").await;
    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;

    let mut config = create_test_config(&base_url);
    config.crawler.overall_timeout_secs = Some(1);

    let (collection, stats) = tokio::time::timeout(Duration::from_secs(10), crawl(&config))
        .await
        .expect("time budget should end the crawl")
        .unwrap();

    assert!(collection.is_empty());
    assert!(stats.aborted);
}

#[tokio::test]
async fn test_duplicate_slugs_get_unique_ids() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, CATEGORY_PATH, category_page(&["Mata", "bylinky/Mata"])).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;
    mount_page(&server, "/bylinky/Mata", article_page("Máta peprná", None)).await;

    let (collection, _) = crawl(&create_test_config(&base_url)).await.unwrap();

    let ids: Vec<&str> = collection.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Mata", "Mata-2"]);
}

#[tokio::test]
async fn test_outputs_written_after_crawl() {
    let server = MockServer::start().await;
    mount_herb_site(&server).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri());
    config.output.json_path = dir.path().join("herbs.json").display().to_string();
    config.output.database_path = Some(dir.path().join("herbs.db").display().to_string());

    let (collection, _) = crawl(&config).await.unwrap();
    write_all(&config.output, &collection).unwrap();

    let json = std::fs::read_to_string(dir.path().join("herbs.json")).unwrap();
    assert_eq!(json, to_json_string(&collection).unwrap());

    let mirror = SqliteOutput::open(&dir.path().join("herbs.db")).unwrap();
    assert_eq!(mirror.name(), "sqlite");
    assert_eq!(mirror.load_collection().unwrap(), collection);
}

fn imageinfo_response(file_url: &str) -> serde_json::Value {
    json!({
        "batchcomplete": true,
        "query": { "pages": [{
            "ns": 6,
            "title": "Soubor:Mata.jpg",
            "imageinfo": [{
                "url": file_url,
                "width": 800,
                "height": 600,
                "size": 51200,
                "extmetadata": { "LicenseShortName": { "value": "CC BY-SA 4.0" } }
            }]
        }]}
    })
}

#[tokio::test]
async fn test_category_description_links_are_not_candidates() {
    let server = MockServer::start().await;
    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    mount_page(&server, "/Mata", article_page("Máta", None)).await;
    Mock::given(method("GET"))
        .and(path("/Koreni_a_bylinky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_page("Koření", None)))
        .expect(0)
        .mount(&server)
        .await;

    let (collection, stats) = crawl(&create_test_config(&server.uri())).await.unwrap();

    assert_eq!(stats.candidates, 1);
    assert_eq!(collection.records()[0].id, "Mata");
}

#[tokio::test]
async fn test_image_metadata_from_wiki_api() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_herb_site(&server).await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "imageinfo"))
        .and(query_param("titles", "File:Mata.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(imageinfo_response("https://upload.example.org/Mata.jpg")),
        )
        .mount(&server)
        .await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    let image = collection.get("Mata").unwrap().primary_image().unwrap();
    // The file page link wins over the API url
    assert_eq!(
        image.file_url.as_deref(),
        Some(format!("{}/images/a/ab/Mata.jpg", base_url).as_str())
    );
    assert_eq!(image.file_title.as_deref(), Some("Mata.jpg"));
    assert_eq!(image.width, Some(800));
    assert_eq!(image.height, Some(600));
    assert_eq!(image.size_bytes, Some(51200));
    assert_eq!(image.license.as_deref(), Some("CC BY-SA 4.0"));
    assert_eq!(stats.images_resolved, 1);
}

#[tokio::test]
async fn test_api_resolves_image_when_file_page_fails() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, CATEGORY_PATH, category_page(&["Mata"])).await;
    mount_page(&server, "/Mata", article_page("Máta", Some("Mata.jpg"))).await;
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("prop", "imageinfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(imageinfo_response("https://upload.example.org/Mata.jpg")),
        )
        .mount(&server)
        .await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    let image = collection.records()[0].primary_image().unwrap();
    assert_eq!(image.file_url.as_deref(), Some("https://upload.example.org/Mata.jpg"));
    assert_eq!(stats.images_resolved, 1);
    assert_eq!(stats.images_unresolved, 0);
}

#[tokio::test]
async fn test_lead_image_fills_article_without_image() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_herb_site(&server).await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "pageimages"))
        .and(query_param("titles", "Bazalka"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": [{
                "title": "Bazalka",
                "pageimage": "Bazalka_lístky.jpg",
                "original": {
                    "source": "https://upload.example.org/Bazalka_l%C3%ADstky.jpg",
                    "width": 1200,
                    "height": 900
                }
            }]}
        })))
        .mount(&server)
        .await;

    let (collection, stats) = crawl(&create_test_config(&base_url)).await.unwrap();

    let image = collection.get("Bazalka").unwrap().primary_image().unwrap();
    assert_eq!(
        image.file_url.as_deref(),
        Some("https://upload.example.org/Bazalka_l%C3%ADstky.jpg")
    );
    assert_eq!(image.file_title.as_deref(), Some("Bazalka_lístky.jpg"));
    assert!(image.page_url.is_none());
    assert_eq!(image.width, Some(1200));
    assert_eq!(stats.lead_images, 1);
    assert_eq!(stats.images_resolved, 2);
}

#[tokio::test]
async fn test_empty_api_paths_disable_api_requests() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    mount_herb_site(&server).await;

    Mock::given(method("GET"))
        .and(query_param("action", "query"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&base_url);
    config.site.api_paths.clear();
    let (collection, stats) = crawl(&config).await.unwrap();

    assert!(collection.get("Bazalka").unwrap().images.is_empty());
    assert_eq!(stats.lead_images, 0);
    assert_eq!(stats.images_resolved, 1);
}
