//! Detail extraction: visits each job's detail page and turns its markup into
//! one `job_data.csv` row.

use crate::browser::{Browser, BrowserError, BrowserLauncher, BrowserOptions};
use crate::config::Settings;
use crate::jobs::salary::{normalize_salary, NormalizedSalary, NOT_AVAILABLE};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Attr, Class, Name, Predicate};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

pub const JOB_DATA_FILE_NAME: &str = "job_data.csv";

/// Value recorded when the in-platform apply button is present.
pub const EASY_APPLY: &str = "Indeed Easy Apply";

pub const JOB_DATA_HEADERS: [&str; 13] = [
    "Job URL",
    "Job Title",
    "Company Name",
    "Location",
    "Salary Text",
    "Min Salary",
    "Max Salary",
    "Salary Unit",
    "Job Type",
    "Shift and Schedule",
    "Apply Link",
    "Job Description",
    "Job Description Text",
];

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read job ids from {path}: {source}")]
    Input { path: PathBuf, source: csv::Error },
    #[error("failed to write job data to {path}: {source}")]
    Output { path: PathBuf, source: csv::Error },
    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Markup hooks on a job detail page.
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub title_class: &'static str,
    pub company_attr: (&'static str, &'static str),
    pub location_attr: (&'static str, &'static str),
    pub salary_class: &'static str,
    pub insight_section_class: &'static str,
    /// Space-separated; every class must be present.
    pub insight_heading_classes: &'static str,
    pub insight_value_classes: &'static str,
    pub job_type_heading: &'static str,
    pub shift_heading: &'static str,
    pub easy_apply_id: &'static str,
    pub external_apply_classes: &'static str,
    pub description_id: &'static str,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        DetailSelectors {
            title_class: "jobsearch-JobInfoHeader-title",
            company_attr: ("data-company-name", "true"),
            location_attr: ("data-testid", "inlineHeader-companyLocation"),
            salary_class: "css-19j1a75",
            insight_section_class: "js-match-insights-provider-e6s05i",
            insight_heading_classes: "js-match-insights-provider-11n8e9a e1tiznh50",
            insight_value_classes: "js-match-insights-provider-tvvxwd ecydgvn1",
            job_type_heading: "Job type",
            shift_heading: "Shift and schedule",
            easy_apply_id: "indeedApplyButton",
            external_apply_classes: "css-1oxck4n e8ju0x51",
            description_id: "jobDescriptionText",
        }
    }
}

/// Matches elements whose class list holds every class in a space-separated set.
#[derive(Debug, Clone, Copy)]
struct Classes<'a>(&'a str);

impl Predicate for Classes<'_> {
    fn matches(&self, node: &Node) -> bool {
        match node.attr("class") {
            Some(attr) => self
                .0
                .split_whitespace()
                .all(|wanted| attr.split_whitespace().any(|class| class == wanted)),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyTarget {
    EasyApply,
    /// Link on the external apply button, before redirects are followed.
    External(String),
    NotAvailable,
}

/// Everything read off a detail page before the apply link is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedJobPage {
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub salary_text: String,
    pub salary: NormalizedSalary,
    pub job_type: String,
    pub shift_and_schedule: String,
    pub apply: ApplyTarget,
    pub description_html: String,
    pub description_text: String,
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub job_url: String,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub salary_text: String,
    pub min_salary: String,
    pub max_salary: String,
    pub salary_unit: String,
    pub job_type: String,
    pub shift_and_schedule: String,
    pub apply_link: String,
    pub description_html: String,
    pub description_text: String,
}

impl JobDetails {
    fn from_parsed(job_url: String, parsed: ParsedJobPage, apply_link: String) -> Self {
        JobDetails {
            job_url,
            title: parsed.title,
            company_name: parsed.company_name,
            location: parsed.location,
            salary_text: parsed.salary_text,
            min_salary: parsed.salary.min,
            max_salary: parsed.salary.max,
            salary_unit: parsed.salary.unit.as_str().to_string(),
            job_type: parsed.job_type,
            shift_and_schedule: parsed.shift_and_schedule,
            apply_link,
            description_html: parsed.description_html,
            description_text: parsed.description_text,
        }
    }

    pub fn to_record(&self) -> [&str; 13] {
        [
            &self.job_url,
            &self.title,
            &self.company_name,
            &self.location,
            &self.salary_text,
            &self.min_salary,
            &self.max_salary,
            &self.salary_unit,
            &self.job_type,
            &self.shift_and_schedule,
            &self.apply_link,
            &self.description_html,
            &self.description_text,
        ]
    }
}

fn text_or_na(node: Option<Node>) -> String {
    node.map(|n| n.text().trim().to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Text of every text node under `node`, trimmed, empties dropped, joined by a space.
/// Script and style contents are skipped.
pub fn plain_text(node: &Node) -> String {
    node.descendants()
        .filter(|n| {
            !matches!(
                n.parent().and_then(|p| p.name()),
                Some("script") | Some("style")
            )
        })
        .filter_map(|n| n.as_text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses every whitespace run to one space.
pub fn compact_html(html: &str) -> String {
    WHITESPACE_RUN.replace_all(html.trim(), " ").trim().to_string()
}

/// Looks for the insight section whose heading reads `heading` and joins its
/// values with `", "`.
fn insight_values(document: &Document, selectors: &DetailSelectors, heading: &str) -> String {
    for section in document.find(Name("div").and(Class(selectors.insight_section_class))) {
        let header = section
            .find(Name("h3").and(Classes(selectors.insight_heading_classes)))
            .next();
        if header.map(|h| h.text().trim() == heading).unwrap_or(false) {
            let values: Vec<String> = section
                .find(Name("div").and(Classes(selectors.insight_value_classes)))
                .map(|v| v.text().trim().to_string())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                return NOT_AVAILABLE.to_string();
            }
            return values.join(", ");
        }
    }
    NOT_AVAILABLE.to_string()
}

fn apply_target(document: &Document, selectors: &DetailSelectors) -> ApplyTarget {
    let easy_apply = document
        .find(Name("button").and(Attr("id", selectors.easy_apply_id)))
        .next();
    if easy_apply.is_some() {
        return ApplyTarget::EasyApply;
    }

    document
        .find(Name("button").and(Classes(selectors.external_apply_classes)))
        .next()
        .and_then(|button| button.attr("href"))
        .map(|href| ApplyTarget::External(href.to_string()))
        .unwrap_or(ApplyTarget::NotAvailable)
}

/// Reads the detail fields out of a rendered job page. Missing elements give
/// `N/A` rather than an error.
pub fn parse_job_page(html: &str, selectors: &DetailSelectors) -> ParsedJobPage {
    let document = Document::from(html);

    let title = text_or_na(
        document
            .find(Name("h1").and(Class(selectors.title_class)))
            .next(),
    );
    let company_name = text_or_na(
        document
            .find(Name("div").and(Attr(selectors.company_attr.0, selectors.company_attr.1)))
            .next(),
    );
    let location = text_or_na(
        document
            .find(Name("div").and(Attr(selectors.location_attr.0, selectors.location_attr.1)))
            .next(),
    );

    let salary_text = text_or_na(
        document
            .find(Name("span").and(Class(selectors.salary_class)))
            .next(),
    );
    let salary = if salary_text == NOT_AVAILABLE {
        NormalizedSalary::not_available()
    } else {
        normalize_salary(&salary_text)
    };

    let description = document
        .find(Name("div").and(Attr("id", selectors.description_id)))
        .next();
    let (description_html, description_text) = match description {
        Some(node) => (compact_html(&node.inner_html()), plain_text(&node)),
        None => (NOT_AVAILABLE.to_string(), NOT_AVAILABLE.to_string()),
    };

    ParsedJobPage {
        title,
        company_name,
        location,
        salary_text,
        salary,
        job_type: insight_values(&document, selectors, selectors.job_type_heading),
        shift_and_schedule: insight_values(&document, selectors, selectors.shift_heading),
        apply: apply_target(&document, selectors),
        description_html,
        description_text,
    }
}

pub fn job_url(detail_base_url: &str, job_id: &str) -> String {
    match Url::parse_with_params(detail_base_url, &[("jk", job_id)]) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?jk={}", detail_base_url, job_id),
    }
}

/// Extracts one job. The only failures are navigation failures, either on
/// the detail page or while following the external apply link.
#[tracing::instrument(skip(browser, detail_base_url, selectors))]
pub async fn extract_job(
    browser: &dyn Browser,
    job_id: &str,
    detail_base_url: &str,
    selectors: &DetailSelectors,
) -> Result<JobDetails, BrowserError> {
    let url = job_url(detail_base_url, job_id);
    info!("Navigating to job URL: {}...", url);
    let page = browser.goto(&url).await?;

    info!("Page loaded. Extracting job details...");
    let parsed = parse_job_page(&page.content, selectors);

    let apply_link = match &parsed.apply {
        ApplyTarget::EasyApply => EASY_APPLY.to_string(),
        ApplyTarget::NotAvailable => NOT_AVAILABLE.to_string(),
        ApplyTarget::External(href) => {
            let target = Url::parse(&page.url)
                .and_then(|base| base.join(href))
                .map(|u| u.to_string())
                .unwrap_or_else(|_| href.clone());
            browser.goto(&target).await?.url
        }
    };

    Ok(JobDetails::from_parsed(url, parsed, apply_link))
}

/// Extracts every id in order. A failing id is logged and left out; the rest
/// keep their relative order. Up to `concurrency` pages are in flight at once.
pub async fn extract_jobs(
    browser: &dyn Browser,
    job_ids: &[String],
    detail_base_url: &str,
    selectors: &DetailSelectors,
    concurrency: usize,
) -> Vec<JobDetails> {
    let jobs: Vec<_> = job_ids
        .iter()
        .map(|job_id| async move {
            match extract_job(browser, job_id, detail_base_url, selectors).await {
                Ok(details) => Some(details),
                Err(e) => {
                    error!(
                        "Error extracting job details from {}: {}",
                        job_url(detail_base_url, job_id),
                        e
                    );
                    None
                }
            }
        })
        .collect();

    stream::iter(jobs)
        .buffered(concurrency.max(1))
        .collect::<Vec<Option<JobDetails>>>()
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Reads the first column of every non-empty row after the header.
pub fn read_job_ids(path: &Path) -> Result<Vec<String>, ExtractError> {
    let to_err = |source: csv::Error| ExtractError::Input {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(to_err)?;

    let mut job_ids = Vec::new();
    for record in reader.records() {
        let record = record.map_err(to_err)?;
        if let Some(id) = record.get(0).map(str::trim).filter(|id| !id.is_empty()) {
            job_ids.push(id.to_string());
        }
    }
    Ok(job_ids)
}

pub fn write_job_data(path: &Path, rows: &[JobDetails]) -> Result<(), ExtractError> {
    let to_err = |source: csv::Error| ExtractError::Output {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    writer.write_record(JOB_DATA_HEADERS).map_err(to_err)?;
    for row in rows {
        writer.write_record(row.to_record()).map_err(to_err)?;
    }
    writer
        .flush()
        .map_err(|e| to_err(csv::Error::from(e)))?;
    Ok(())
}

/// `job_data.csv` next to the input file.
pub fn job_data_path(input: &Path) -> PathBuf {
    input
        .parent()
        .map(|dir| dir.join(JOB_DATA_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(JOB_DATA_FILE_NAME))
}

#[derive(Debug, Clone)]
pub struct DetailOptions {
    pub detail_base_url: String,
    pub timeout: Duration,
    pub headless: bool,
    pub user_agent: Option<String>,
    pub concurrency: usize,
    pub selectors: DetailSelectors,
}

impl DetailOptions {
    /// Navigation timeout and headless mode follow the crawler defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        DetailOptions {
            detail_base_url: settings.detail_base_url.clone(),
            timeout: Duration::from_millis(settings.crawler.network_idle_timeout),
            headless: settings.crawler.headless,
            user_agent: None,
            concurrency: settings.extract_concurrency,
            selectors: DetailSelectors::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRunSummary {
    pub output_file: PathBuf,
    pub requested: usize,
    pub extracted: usize,
}

/// Runs a full extraction over the ids listed in `input`, writing
/// `job_data.csv` beside it.
#[tracing::instrument(skip(launcher, options), fields(input = %input.display()))]
pub async fn run_job_details(
    launcher: &dyn BrowserLauncher,
    input: &Path,
    options: &DetailOptions,
) -> Result<DetailRunSummary, ExtractError> {
    info!("Starting the extraction process...");
    let job_ids = read_job_ids(input)?;

    let browser_options = match &options.user_agent {
        Some(user_agent) => BrowserOptions {
            user_agent: user_agent.clone(),
            headless: options.headless,
            timeout: options.timeout,
        },
        None => BrowserOptions::with_random_user_agent(options.headless, options.timeout),
    };
    let browser = launcher.launch(browser_options).await?;

    let rows = extract_jobs(
        browser.as_ref(),
        &job_ids,
        &options.detail_base_url,
        &options.selectors,
        options.concurrency,
    )
    .await;

    info!("Closing browser...");
    browser.close().await;

    let output_file = job_data_path(input);
    write_job_data(&output_file, &rows)?;
    info!("Job data has been written to {}", output_file.display());

    Ok(DetailRunSummary {
        output_file,
        requested: job_ids.len(),
        extracted: rows.len(),
    })
}
