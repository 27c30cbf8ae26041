//! Listing crawl: walks the paginated search results for a (title, location)
//! query, stores unseen job ids and writes every id seen to a CSV file.

use chrono::{DateTime, Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::predicate::{Attr, Class, Name, Predicate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use utoipa::ToSchema;

use crate::browser::{random_user_agent, Browser, BrowserError, BrowserLauncher, BrowserOptions};
use crate::config::CrawlerDefaults;
use crate::entities::job_record::NewJobRecord;
use crate::store::{JobStore, StoreError};

/// Result count is divided by this to get the number of pages.
pub const JOBS_PER_PAGE: u64 = 15;
/// `start=` advances by this much per page, independently of `JOBS_PER_PAGE`.
pub const PAGE_OFFSET_STRIDE: u64 = 10;

pub const SOURCE_TAG: &str = "Indeed";
pub const ACTIVE_STATUS: &str = "Active";
pub const JOB_IDS_HEADER: &str = "Job IDs";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid search base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-request overrides; anything left `None` falls back to [`CrawlerDefaults`].
#[derive(Debug, Clone, Default)]
pub struct CrawlOverrides {
    pub user_agent: Option<String>,
    pub headless: Option<bool>,
    pub base_url: Option<String>,
    pub network_idle_timeout: Option<u64>,
    pub job_count_class: Option<String>,
    pub job_link_data_attr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub job_title: String,
    pub location: String,
    pub user_agent: String,
    pub headless: bool,
    pub base_url: String,
    pub timeout: Duration,
    pub job_count_class: String,
    pub job_link_data_attr: String,
}

impl CrawlOptions {
    pub fn resolve(
        job_title: impl Into<String>,
        location: impl Into<String>,
        overrides: CrawlOverrides,
        defaults: &CrawlerDefaults,
    ) -> Self {
        CrawlOptions {
            job_title: job_title.into(),
            location: location.into(),
            user_agent: overrides.user_agent.unwrap_or_else(random_user_agent),
            headless: overrides.headless.unwrap_or(defaults.headless),
            base_url: overrides.base_url.unwrap_or_else(|| defaults.base_url.clone()),
            timeout: Duration::from_millis(
                overrides
                    .network_idle_timeout
                    .unwrap_or(defaults.network_idle_timeout),
            ),
            job_count_class: overrides
                .job_count_class
                .unwrap_or_else(|| defaults.job_count_class.clone()),
            job_link_data_attr: overrides
                .job_link_data_attr
                .unwrap_or_else(|| defaults.job_link_data_attr.clone()),
        }
    }
}

/// Outcome of one crawl session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CrawlSummary {
    pub message: String,
    pub scrape_session_id: String,
    /// Every id seen, duplicates included.
    pub total_job_ids_found: u64,
    pub new_job_ids_saved: u64,
    #[schema(value_type = String, format = DateTime)]
    pub start_time: DateTime<Utc>,
    #[schema(value_type = String, format = DateTime)]
    pub end_time: DateTime<Utc>,
    pub csv_file_name: String,
}

pub fn page_count(total_jobs: u64) -> u64 {
    total_jobs.div_ceil(JOBS_PER_PAGE)
}

pub fn page_offset(page_num: u64) -> u64 {
    page_num * PAGE_OFFSET_STRIDE
}

pub fn search_url(base_url: &str, job_title: &str, location: &str) -> Result<String, CrawlError> {
    Url::parse_with_params(base_url, &[("q", job_title), ("l", location)])
        .map(|url| url.to_string())
        .map_err(|e| CrawlError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })
}

pub fn page_url(search_url: &str, offset: u64) -> String {
    format!("{}&start={}", search_url, offset)
}

/// Reads the total result count from the count container's first `span`.
/// A missing container, or one without digits, counts as zero.
pub fn parse_total_jobs(html: &str, job_count_class: &str) -> u64 {
    let document = Document::from(html);
    let container = match document
        .find(Name("div").and(Class(job_count_class)))
        .next()
    {
        Some(node) => node,
        None => return 0,
    };

    let text = match container.find(Name("span")).next() {
        Some(span) => span.text(),
        None => {
            warn!("Job count container has no span; assuming zero results");
            return 0;
        }
    };

    let text = text.replace(',', "");
    DIGITS
        .find(&text)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Values of `link_attr` on every anchor carrying it, in document order.
pub fn extract_job_links(html: &str, link_attr: &str) -> Vec<String> {
    let document = Document::from(html);
    document
        .find(Name("a").and(Attr(link_attr, ())))
        .filter_map(|a| a.attr(link_attr))
        .map(str::to_string)
        .collect()
}

pub fn job_ids_file_name(now: DateTime<Local>) -> String {
    format!("indeed_job_ids_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

pub fn write_job_ids(path: &Path, job_ids: &[String]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([JOB_IDS_HEADER])?;
    for job_id in job_ids {
        writer.write_record([job_id])?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Default)]
struct SessionTally {
    total_job_ids_found: u64,
    new_job_ids_saved: u64,
    all_job_ids: Vec<String>,
}

/// Stores `job_id` unless already present. Returns whether it was new.
async fn save_if_new(
    store: &dyn JobStore,
    job_id: &str,
    session_id: &str,
) -> Result<bool, StoreError> {
    if store.exists(job_id).await? {
        info!("Job ID {} already exists in the database. Skipping.", job_id);
        return Ok(false);
    }

    let record = NewJobRecord {
        job_id: job_id.to_string(),
        source: SOURCE_TAG.to_string(),
        status: ACTIVE_STATUS.to_string(),
        retrieved_date: Utc::now(),
        scrape_session_id: session_id.to_string(),
    };
    match store.insert(record).await {
        Ok(()) => {
            info!("Job ID {} saved to database.", job_id);
            Ok(true)
        }
        // Another writer got there between the check and the insert.
        Err(StoreError::Duplicate(_)) => {
            info!("Job ID {} already exists in the database. Skipping.", job_id);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn crawl_page(
    browser: &dyn Browser,
    store: &dyn JobStore,
    url: &str,
    page_number: u64,
    options: &CrawlOptions,
    session_id: &str,
    tally: &mut SessionTally,
) -> Result<(), CrawlError> {
    info!("Navigating to {}...", url);
    let page = browser.goto(url).await?;

    info!("Finding all <a> tags with {} attribute...", options.job_link_data_attr);
    let job_ids = extract_job_links(&page.content, &options.job_link_data_attr);
    if job_ids.is_empty() {
        warn!(
            "No job links found on page {}. Please check the HTML structure.",
            page_number
        );
    }

    for job_id in job_ids {
        tally.total_job_ids_found += 1;
        if save_if_new(store, &job_id, session_id).await? {
            tally.new_job_ids_saved += 1;
        }
        tally.all_job_ids.push(job_id);
    }
    Ok(())
}

/// Runs one crawl session.
///
/// Only a failure on the first results page (or a bad base url) aborts the
/// run; a failing later page is logged and skipped.
#[tracing::instrument(skip(launcher, store, options), fields(job_title = %options.job_title, location = %options.location))]
pub async fn run_job_ids(
    launcher: &dyn BrowserLauncher,
    store: &dyn JobStore,
    output_dir: &Path,
    options: &CrawlOptions,
) -> Result<CrawlSummary, CrawlError> {
    info!("Starting the extraction process...");
    let start_time = Utc::now();
    let session_id = uuid::Uuid::new_v4().to_string();
    info!("Scrape session ID: {}", session_id);

    let search_url = search_url(&options.base_url, &options.job_title, &options.location)?;

    let browser = launcher
        .launch(BrowserOptions {
            user_agent: options.user_agent.clone(),
            headless: options.headless,
            timeout: options.timeout,
        })
        .await?;

    info!("Navigating to {}...", search_url);
    let first_page = match browser.goto(&search_url).await {
        Ok(page) => page,
        Err(e) => {
            browser.close().await;
            return Err(e.into());
        }
    };

    let total_jobs = parse_total_jobs(&first_page.content, &options.job_count_class);
    info!("Total number of jobs: {}", total_jobs);
    let total_pages = page_count(total_jobs);
    info!("Total number of pages: {}", total_pages);

    let mut tally = SessionTally::default();
    for page_num in 0..total_pages {
        let url = page_url(&search_url, page_offset(page_num));
        if let Err(e) = crawl_page(
            browser.as_ref(),
            store,
            &url,
            page_num + 1,
            options,
            &session_id,
            &mut tally,
        )
        .await
        {
            error!("Failed to load page {}: {}", page_num + 1, e);
        }
    }

    let csv_file_name = job_ids_file_name(Local::now());
    let output_path: PathBuf = output_dir.join(&csv_file_name);
    match write_job_ids(&output_path, &tally.all_job_ids) {
        Ok(()) => info!("Job IDs have been written to {}", output_path.display()),
        Err(e) => error!("Failed to write CSV file at {}: {}", output_path.display(), e),
    }

    info!("Closing browser...");
    browser.close().await;
    info!("Browser closed. Extraction process completed.");

    Ok(CrawlSummary {
        message: "Scraping completed successfully".to_string(),
        scrape_session_id: session_id,
        total_job_ids_found: tally.total_job_ids_found,
        new_job_ids_saved: tally.new_job_ids_saved,
        start_time,
        end_time: Utc::now(),
        csv_file_name,
    })
}
