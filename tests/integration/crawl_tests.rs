//! Integration tests for the crawl engine
//!
//! These tests stand up wiremock servers acting as news sites (sitemap plus
//! article pages) and drive full runs through the orchestrator's control
//! surface, asserting on status snapshots and on what reached the store.

use chrono::Utc;
use pressbox::config::{Config, CrawlerConfig, FetchConfig, OutputConfig, UserAgentConfig};
use pressbox::crawler::{Orchestrator, RunState};
use pressbox::storage::{NewArticle, SiteType, SiteUpsert, SqliteStorage, Storage};
use pressbox::url::CanonicalUrl;
use pressbox::PressboxError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> Arc<Config> {
    Arc::new(Config {
        crawler: CrawlerConfig {
            workers: 1,
            days_to_crawl: 2,
            default_crawl_interval_minutes: 15,
            reject_patterns: vec!["/gallery/".to_string()],
        },
        fetch: FetchConfig {
            delay_min_secs: 0.0,
            delay_max_secs: 0.01,
            timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
        sites: vec![],
    })
}

fn new_storage() -> Arc<Mutex<SqliteStorage>> {
    Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()))
}

fn register_site(
    storage: &Arc<Mutex<SqliteStorage>>,
    name: &str,
    sitemap_url: &str,
    site_type: SiteType,
    sport_focus: Option<&str>,
) -> i64 {
    let parsed = url::Url::parse(sitemap_url).unwrap();
    // keep the port so sites on different local mock servers stay distinct
    let domain = match parsed.port() {
        Some(port) => format!("{}:{}", parsed.host_str().unwrap(), port),
        None => parsed.host_str().unwrap().to_string(),
    };

    let mut guard = storage.lock().unwrap();
    guard
        .upsert_site(&SiteUpsert {
            name: name.to_string(),
            domain,
            sitemap_url: sitemap_url.to_string(),
            crawl_interval_minutes: 15,
            site_type,
            sport_focus: sport_focus.map(str::to_string),
        })
        .unwrap()
}

/// A sitemap whose entries all carry a recent lastmod
fn sitemap_xml(urls: &[String]) -> String {
    let now = Utc::now().to_rfc3339();
    let body: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc><lastmod>{}</lastmod></url>", u, now))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        body
    )
}

/// An article page substantial enough to pass validation
fn article_html(title: &str, sport_sentence: &str) -> String {
    let paragraph = format!("{} The crowd stayed until the final whistle. ", sport_sentence);
    format!(
        r#"<html><head><title>{title}</title></head><body>
        <article>
          <h1>{title}</h1>
          <div class="byline">Sam Field</div>
          <div class="article-body"><p>{}</p></div>
        </article>
        </body></html>"#,
        paragraph.repeat(6),
        title = title
    )
}

async fn mount_article(server: &MockServer, route: &str, title: &str, sentence: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(article_html(title, sentence)))
        .mount(server)
        .await;
}

async fn wait_until_idle(orchestrator: &Orchestrator) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while orchestrator.is_running() {
        assert!(Instant::now() < deadline, "run did not finish in time");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_specific_site_scenario() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls = vec![
        format!("{}/news/derby-recap", base),
        format!("{}/news/transfer-latest", base),
        format!("{}/news/injury-update", base),
    ];

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;

    mount_article(&server, "/news/derby-recap", "Derby recap", "The derby swung late.").await;
    mount_article(&server, "/news/transfer-latest", "Transfer latest", "A record fee was agreed.")
        .await;
    mount_article(&server, "/news/injury-update", "Injury update", "The captain faces six weeks out.")
        .await;

    let storage = new_storage();
    register_site(
        &storage,
        "Kickoff Daily",
        &format!("{}/sitemap.xml", base),
        SiteType::Specific,
        Some("soccer"),
    );

    // one of the three URLs is already in the store
    let seen = CanonicalUrl::parse(&urls[0]).unwrap();
    {
        let mut guard = storage.lock().unwrap();
        guard
            .insert_article_if_absent(&NewArticle {
                url_hash: seen.hash().to_string(),
                url: seen.as_str().to_string(),
                title: "Derby recap".to_string(),
                author: None,
                content: "previously ingested".to_string(),
                sport_category: Some("soccer".to_string()),
                published_at: None,
                last_modified: None,
                source_site: "Kickoff Daily".to_string(),
            })
            .unwrap();
    }

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let status = orchestrator.status();
    assert_eq!(status.state, Some(RunState::Completed));
    assert_eq!(status.progress, 3);
    assert_eq!(status.total, 3);
    assert_eq!(status.articles_saved, 2);
    assert!(status.errors.is_empty());

    // both new records carry the site's sport focus
    let guard = storage.lock().unwrap();
    assert_eq!(guard.count_articles().unwrap(), 3);
    for url in &urls[1..] {
        let canonical = CanonicalUrl::parse(url).unwrap();
        let article = guard.get_article_by_hash(canonical.hash()).unwrap().unwrap();
        assert_eq!(article.sport_category.as_deref(), Some("soccer"));
        assert_eq!(article.source_site, "Kickoff Daily");
        assert_eq!(article.author.as_deref(), Some("Sam Field"));
    }
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls = vec![
        format!("{}/news/one", base),
        format!("{}/news/two", base),
    ];

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    mount_article(&server, "/news/one", "Story one", "The opener was tense.").await;
    mount_article(&server, "/news/two", "Story two", "The second match was not.").await;

    let storage = new_storage();
    register_site(
        &storage,
        "The Sports Desk",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();

    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;
    assert_eq!(orchestrator.status().articles_saved, 2);

    // same sitemap, warm store: nothing new to save
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let status = orchestrator.status();
    assert_eq!(status.state, Some(RunState::Completed));
    assert_eq!(status.progress, 2);
    assert_eq!(status.articles_saved, 0);

    let guard = storage.lock().unwrap();
    assert_eq!(guard.count_articles().unwrap(), 2);
}

#[tokio::test]
async fn test_duplicate_sitemap_entries_yield_one_record() {
    let server = MockServer::start().await;
    let base = server.uri();

    // the same story listed three ways: plain, tracking params, trailing slash
    let urls = vec![
        format!("{}/news/big-story", base),
        format!("{}/news/big-story?utm_source=feed", base),
        format!("{}/news/big-story/", base),
    ];

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    mount_article(&server, "/news/big-story", "Big story", "A cup upset for the ages.").await;

    let storage = new_storage();
    register_site(
        &storage,
        "The Sports Desk",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let status = orchestrator.status();
    assert_eq!(status.progress, 3);
    assert_eq!(status.articles_saved, 1);

    let guard = storage.lock().unwrap();
    assert_eq!(guard.count_articles().unwrap(), 1);
}

#[tokio::test]
async fn test_recency_window_filters_old_entries() {
    let server = MockServer::start().await;
    let base = server.uri();

    let recent = Utc::now().to_rfc3339();
    let old = (Utc::now() - chrono::Duration::days(30)).to_rfc3339();
    let sitemap = format!(
        r#"<urlset>
          <url><loc>{base}/news/fresh</loc><lastmod>{recent}</lastmod></url>
          <url><loc>{base}/news/stale</loc><lastmod>{old}</lastmod></url>
          <url><loc>{base}/news/undated</loc></url>
        </urlset>"#
    );

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .mount(&server)
        .await;
    mount_article(&server, "/news/fresh", "Fresh story", "A result from this week.").await;
    mount_article(&server, "/news/undated", "Undated story", "No timestamp but still news.").await;
    // /news/stale is never mocked; fetching it would fail the test counters

    let storage = new_storage();
    register_site(
        &storage,
        "The Sports Desk",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    // the stale entry is outside the window; the undated one falls back to
    // discovery time and is included
    let status = orchestrator.status();
    assert_eq!(status.state, Some(RunState::Completed));
    assert_eq!(status.total, 2);
    assert_eq!(status.progress, 2);
    assert_eq!(status.articles_saved, 2);
}

#[tokio::test]
async fn test_sitemap_failure_marks_site_and_run_continues() {
    let broken = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&broken)
        .await;

    let urls = vec![format!("{}/news/only-story", healthy.uri())];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&healthy)
        .await;
    mount_article(&healthy, "/news/only-story", "Only story", "One site still works.").await;

    let storage = new_storage();
    register_site(
        &storage,
        "Broken Site",
        &format!("{}/sitemap.xml", broken.uri()),
        SiteType::General,
        None,
    );
    register_site(
        &storage,
        "Healthy Site",
        &format!("{}/sitemap.xml", healthy.uri()),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let status = orchestrator.status();
    assert!(!status.is_running);
    // a completed run can still carry a non-empty error log
    assert_eq!(status.state, Some(RunState::Completed));
    assert!(status.errors.iter().any(|e| e.contains("Broken Site")));
    assert_eq!(status.articles_saved, 1);
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls: Vec<String> = (0..5).map(|i| format!("{}/news/story-{}", base, i)).collect();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    for i in 0..5 {
        Mock::given(method("GET"))
            .and(path(format!("/news/story-{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_html("Story", "A slow but steady report."))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
    }

    let storage = new_storage();
    register_site(
        &storage,
        "Slow Site",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();

    // give the run a moment to get underway
    tokio::time::sleep(Duration::from_millis(100)).await;
    let before = orchestrator.status();

    let second = orchestrator.start(7, None);
    assert!(matches!(second, Err(PressboxError::AlreadyRunning)));

    // the rejected start left the active run untouched
    let after = orchestrator.status();
    assert!(after.is_running);
    assert_eq!(after.started_at, before.started_at);
    assert!(after.progress >= before.progress);

    wait_until_idle(&orchestrator).await;
    assert_eq!(orchestrator.status().state, Some(RunState::Completed));
}

#[tokio::test]
async fn test_stop_cancels_within_one_unit() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls: Vec<String> = (0..10).map(|i| format!("{}/news/story-{}", base, i)).collect();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/news/story-{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_html("Story", "The report takes its time."))
                    .set_delay(Duration::from_millis(150)),
            )
            .mount(&server)
            .await;
    }

    let storage = new_storage();
    register_site(
        &storage,
        "Slow Site",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    orchestrator.stop();
    orchestrator.stop(); // idempotent

    wait_until_idle(&orchestrator).await;

    let status = orchestrator.status();
    assert_eq!(status.state, Some(RunState::Cancelled));
    // the run stopped partway; cancellation itself adds no errors
    assert!(status.progress < 10);
    assert!(status.errors.is_empty());
}

#[tokio::test]
async fn test_progress_is_monotonic_under_polling() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls: Vec<String> = (0..6).map(|i| format!("{}/news/story-{}", base, i)).collect();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/news/story-{}", i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(article_html("Story", "Polling sees steady progress."))
                    .set_delay(Duration::from_millis(60)),
            )
            .mount(&server)
            .await;
    }

    let storage = new_storage();
    register_site(
        &storage,
        "Steady Site",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();

    let mut last_progress = 0;
    let mut last_saved = 0;
    while orchestrator.is_running() {
        let status = orchestrator.status();
        assert!(status.progress >= last_progress, "progress went backwards");
        assert!(status.articles_saved >= last_saved, "saved went backwards");
        last_progress = status.progress;
        last_saved = status.articles_saved;
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    let status = orchestrator.status();
    assert_eq!(status.progress, 6);
    assert_eq!(status.articles_saved, 6);
}

#[tokio::test]
async fn test_general_site_detects_category() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls = vec![format!("{}/news/finals-preview", base)];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    mount_article(
        &server,
        "/news/finals-preview",
        "NBA finals preview",
        "The basketball season reaches its decisive series.",
    )
    .await;

    let storage = new_storage();
    register_site(
        &storage,
        "The Sports Desk",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let canonical = CanonicalUrl::parse(&urls[0]).unwrap();
    let guard = storage.lock().unwrap();
    let article = guard.get_article_by_hash(canonical.hash()).unwrap().unwrap();
    assert_eq!(article.sport_category.as_deref(), Some("basketball"));
}

#[tokio::test]
async fn test_rejected_and_failed_entries_still_count_progress() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls = vec![
        format!("{}/gallery/match-photos", base), // reject pattern
        format!("{}/news/missing", base),         // 404s
        format!("{}/news/good", base),
    ];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    mount_article(&server, "/news/good", "Good story", "At least one page behaves.").await;

    let storage = new_storage();
    register_site(
        &storage,
        "Messy Site",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let status = orchestrator.status();
    assert_eq!(status.state, Some(RunState::Completed));
    assert_eq!(status.progress, 3);
    assert_eq!(status.articles_saved, 1);
    assert!(status.errors.len() >= 2);
}

#[tokio::test]
async fn test_crawl_logs_are_written() {
    let server = MockServer::start().await;
    let base = server.uri();

    let urls = vec![format!("{}/news/logged", base)];
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap_xml(&urls)))
        .mount(&server)
        .await;
    mount_article(&server, "/news/logged", "Logged story", "Every pass leaves a trace.").await;

    let storage = new_storage();
    let site_id = register_site(
        &storage,
        "Audited Site",
        &format!("{}/sitemap.xml", base),
        SiteType::General,
        None,
    );

    let orchestrator = Orchestrator::new(test_config(), storage.clone()).unwrap();
    orchestrator.start(7, None).unwrap();
    wait_until_idle(&orchestrator).await;

    let guard = storage.lock().unwrap();
    let logs = guard.get_recent_crawl_logs(site_id, 10).unwrap();
    assert_eq!(logs.len(), 2);

    use pressbox::storage::{CrawlLogStatus, CrawlStage};
    assert_eq!(logs[0].stage, CrawlStage::Article);
    assert_eq!(logs[0].status, CrawlLogStatus::Success);
    assert_eq!(logs[0].articles_saved, 1);
    assert_eq!(logs[1].stage, CrawlStage::Sitemap);
    assert_eq!(logs[1].urls_found, 1);

    assert!(guard.last_crawl_time(site_id).unwrap().is_some());
}
