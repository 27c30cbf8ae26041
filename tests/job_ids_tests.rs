mod common;

use chrono::Utc;
use common::*;
use jobintel::config::CrawlerDefaults;
use jobintel::entities::job_record::NewJobRecord;
use jobintel::jobs::job_ids::{
    extract_job_links, parse_total_jobs, run_job_ids, search_url, CrawlError, CrawlOptions,
    CrawlOverrides, ACTIVE_STATUS, JOB_IDS_HEADER, SOURCE_TAG,
};
use jobintel::store::{JobStore, MemoryJobStore};
use std::time::Duration;

const SEARCH_BASE: &str = "https://search.example.com/jobs";
const COUNT_CLASS: &str = "jobsearch-JobCountAndSortPane-jobCount";

fn defaults() -> CrawlerDefaults {
    CrawlerDefaults {
        headless: true,
        base_url: SEARCH_BASE.to_string(),
        network_idle_timeout: 60000,
        job_count_class: COUNT_CLASS.to_string(),
        job_link_data_attr: "data-jk".to_string(),
    }
}

fn options() -> CrawlOptions {
    CrawlOptions::resolve(
        "rust dev",
        "Toronto",
        CrawlOverrides {
            user_agent: Some("crawler-test".to_string()),
            ..Default::default()
        },
        &defaults(),
    )
}

fn search() -> String {
    search_url(SEARCH_BASE, "rust dev", "Toronto").unwrap()
}

fn results_page(total: &str, ids: &[&str]) -> String {
    let links: String = ids
        .iter()
        .map(|id| format!(r#"<li><a class="jcs-JobTitle" data-jk="{id}" href="/rc/clk?jk={id}">Job {id}</a></li>"#))
        .collect();
    format!(
        r#"<html><body>
<div class="{COUNT_CLASS} css-13jafh6"><span>{total}</span></div>
<ul>{links}<li><a href="/about">About</a></li></ul>
</body></html>"#
    )
}

fn seeded_record(job_id: &str) -> NewJobRecord {
    NewJobRecord {
        job_id: job_id.to_string(),
        source: SOURCE_TAG.to_string(),
        status: ACTIVE_STATUS.to_string(),
        retrieved_date: Utc::now(),
        scrape_session_id: "earlier-session".to_string(),
    }
}

fn read_ids(path: &std::path::Path) -> (String, Vec<String>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap()[0].to_string();
    let ids = reader
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();
    (header, ids)
}

#[test]
fn test_total_jobs_from_count_span() {
    let html = results_page("1,234 jobs", &[]);
    assert_eq!(parse_total_jobs(&html, COUNT_CLASS), 1234);
}

#[test]
fn test_total_jobs_missing_container_is_zero() {
    assert_eq!(parse_total_jobs("<html><body></body></html>", COUNT_CLASS), 0);

    let no_span = format!(r#"<div class="{COUNT_CLASS}">42 jobs</div>"#);
    assert_eq!(parse_total_jobs(&no_span, COUNT_CLASS), 0);

    let no_digits = results_page("many jobs", &[]);
    assert_eq!(parse_total_jobs(&no_digits, COUNT_CLASS), 0);
}

#[test]
fn test_job_links_in_document_order() {
    let html = results_page("3 jobs", &["c", "a", "b", "a"]);
    assert_eq!(extract_job_links(&html, "data-jk"), vec!["c", "a", "b", "a"]);
}

#[test]
fn test_overrides_take_precedence_over_defaults() {
    let options = CrawlOptions::resolve(
        "t",
        "l",
        CrawlOverrides {
            headless: Some(false),
            network_idle_timeout: Some(5000),
            job_link_data_attr: Some("data-id".to_string()),
            ..Default::default()
        },
        &defaults(),
    );
    assert!(!options.headless);
    assert_eq!(options.timeout, Duration::from_millis(5000));
    assert_eq!(options.job_link_data_attr, "data-id");
    assert_eq!(options.base_url, SEARCH_BASE);
    assert_eq!(options.job_count_class, COUNT_CLASS);
    assert!(!options.user_agent.is_empty());
}

#[tokio::test]
async fn test_crawl_saves_only_unseen_ids() {
    setup();
    let search = search();
    let web = FakeWeb::new()
        .page(search.clone(), results_page("31 jobs", &[]))
        .page(format!("{search}&start=0"), results_page("31 jobs", &["j1", "j2", "j3"]))
        .page(format!("{search}&start=10"), results_page("31 jobs", &["j3", "j4"]))
        .page(format!("{search}&start=20"), results_page("31 jobs", &["j5"]));
    let launcher = FakeLauncher::new(web);
    let store = MemoryJobStore::new();
    store.insert(seeded_record("j2")).await.unwrap();
    let tmp = tempfile::tempdir().unwrap();

    let summary = run_job_ids(&launcher, &store, tmp.path(), &options())
        .await
        .unwrap();

    assert_eq!(summary.message, "Scraping completed successfully");
    assert_eq!(summary.total_job_ids_found, 6);
    assert_eq!(summary.new_job_ids_saved, 4);
    assert!(summary.start_time <= summary.end_time);
    assert!(summary.csv_file_name.starts_with("indeed_job_ids_"));
    assert!(summary.csv_file_name.ends_with(".csv"));

    assert_eq!(store.len(), 5);
    assert_eq!(store.get("j2").unwrap().scrape_session_id, "earlier-session");
    let j1 = store.get("j1").unwrap();
    assert_eq!(j1.scrape_session_id, summary.scrape_session_id);
    assert_eq!(j1.source, "Indeed");
    assert_eq!(j1.status, "Active");

    assert_eq!(
        launcher.web.visits(),
        vec![
            search.clone(),
            format!("{search}&start=0"),
            format!("{search}&start=10"),
            format!("{search}&start=20"),
        ]
    );
    assert_eq!(launcher.web.launches()[0].user_agent, "crawler-test");
    assert_eq!(launcher.web.closes(), 1);

    let (header, ids) = read_ids(&tmp.path().join(&summary.csv_file_name));
    assert_eq!(header, JOB_IDS_HEADER);
    assert_eq!(ids, vec!["j1", "j2", "j3", "j3", "j4", "j5"]);
}

#[tokio::test]
async fn test_failing_later_page_is_skipped() {
    let search = search();
    let web = FakeWeb::new()
        .page(search.clone(), results_page("40", &[]))
        .page(format!("{search}&start=0"), results_page("40", &["a"]))
        .page(format!("{search}&start=20"), results_page("40", &["c"]));
    let launcher = FakeLauncher::new(web);
    let store = MemoryJobStore::new();
    let tmp = tempfile::tempdir().unwrap();

    let summary = run_job_ids(&launcher, &store, tmp.path(), &options())
        .await
        .unwrap();

    assert_eq!(summary.total_job_ids_found, 2);
    assert_eq!(summary.new_job_ids_saved, 2);
    assert_eq!(launcher.web.visits().len(), 4);
    let (_, ids) = read_ids(&tmp.path().join(&summary.csv_file_name));
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn test_zero_results_writes_header_only() {
    let search = search();
    let web = FakeWeb::new().page(search.clone(), "<html><body>No jobs</body></html>");
    let launcher = FakeLauncher::new(web);
    let store = MemoryJobStore::new();
    let tmp = tempfile::tempdir().unwrap();

    let summary = run_job_ids(&launcher, &store, tmp.path(), &options())
        .await
        .unwrap();

    assert_eq!(summary.total_job_ids_found, 0);
    assert_eq!(summary.new_job_ids_saved, 0);
    assert_eq!(launcher.web.visits(), vec![search]);
    let content = std::fs::read_to_string(tmp.path().join(&summary.csv_file_name)).unwrap();
    assert_eq!(content.trim(), JOB_IDS_HEADER);
}

#[tokio::test]
async fn test_first_page_failure_aborts_the_crawl() {
    let launcher = FakeLauncher::new(FakeWeb::new());
    let store = MemoryJobStore::new();
    let tmp = tempfile::tempdir().unwrap();

    let result = run_job_ids(&launcher, &store, tmp.path(), &options()).await;

    assert!(matches!(result, Err(CrawlError::Browser(_))));
    assert_eq!(launcher.web.closes(), 1);
    assert!(store.is_empty());
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_invalid_base_url_never_launches() {
    let launcher = FakeLauncher::new(FakeWeb::new());
    let store = MemoryJobStore::new();
    let tmp = tempfile::tempdir().unwrap();
    let options = CrawlOptions::resolve(
        "t",
        "l",
        CrawlOverrides {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        },
        &defaults(),
    );

    let result = run_job_ids(&launcher, &store, tmp.path(), &options).await;

    assert!(matches!(result, Err(CrawlError::InvalidBaseUrl { .. })));
    assert!(launcher.web.launches().is_empty());
}

#[tokio::test]
async fn test_unwritable_output_still_returns_summary() {
    let search = search();
    let web = FakeWeb::new()
        .page(search.clone(), results_page("1", &[]))
        .page(format!("{search}&start=0"), results_page("1", &["only"]));
    let launcher = FakeLauncher::new(web);
    let store = MemoryJobStore::new();
    let tmp = tempfile::tempdir().unwrap();
    let missing_dir = tmp.path().join("does-not-exist");

    let summary = run_job_ids(&launcher, &store, &missing_dir, &options())
        .await
        .unwrap();

    assert_eq!(summary.new_job_ids_saved, 1);
    assert!(!missing_dir.exists());
}
