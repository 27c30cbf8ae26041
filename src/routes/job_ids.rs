use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use url::Url;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::jobs::job_ids::{run_job_ids, CrawlOptions, CrawlOverrides, CrawlSummary};
use crate::AppState;

const MAX_FIELD_LEN: usize = 1000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct JobIdScrapeRequest {
    /// Job title to search for
    pub job_title: String,
    /// Location to search in
    pub location: String,
    /// Optional: User-Agent for the session. A generated one is used when absent.
    pub user_agent: Option<String>,
    /// Optional: Headless flag passed to the browser session. Defaults to the configured value.
    /// The built-in HTTP session never renders a window and only logs it.
    pub headless: Option<bool>,
    /// Optional: Search results base URL.
    pub base_url: Option<String>,
    /// Optional: Navigation timeout in milliseconds.
    pub network_idle_timeout: Option<u64>,
    /// Optional: Class of the element holding the total job count.
    pub job_count_class: Option<String>,
    /// Optional: Attribute carrying the job id on result links.
    pub job_link_data_attr: Option<String>,
}

fn check_text(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} may not be blank", name)));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::InvalidRequest(format!(
            "{} must be at most {} characters",
            name, MAX_FIELD_LEN
        )));
    }
    Ok(())
}

impl JobIdScrapeRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_text("job_title", &self.job_title)?;
        check_text("location", &self.location)?;
        for (name, value) in [
            ("user_agent", &self.user_agent),
            ("job_count_class", &self.job_count_class),
            ("job_link_data_attr", &self.job_link_data_attr),
        ] {
            if let Some(value) = value {
                check_text(name, value)?;
            }
        }
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url)
                .map_err(|e| AppError::InvalidRequest(format!("base_url is not a valid URL: {}", e)))?;
        }
        if self.network_idle_timeout == Some(0) {
            return Err(AppError::InvalidRequest(
                "network_idle_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn into_options(self, state: &AppState) -> CrawlOptions {
        let overrides = CrawlOverrides {
            user_agent: self.user_agent,
            headless: self.headless,
            base_url: self.base_url,
            network_idle_timeout: self.network_idle_timeout,
            job_count_class: self.job_count_class,
            job_link_data_attr: self.job_link_data_attr,
        };
        CrawlOptions::resolve(self.job_title, self.location, overrides, &state.settings.crawler)
    }
}

/// Crawl the search results for a job title and location, store unseen job ids
/// and write every id found to the pending extraction folder.
#[utoipa::path(
    post,
    path = "/scrape-job-ids/",
    request_body = JobIdScrapeRequest,
    responses(
        (status = 200, description = "Crawl finished", body = CrawlSummary),
        (status = 400, description = "Invalid request parameters"),
        (status = 500, description = "The first results page could not be loaded")
    )
)]
#[tracing::instrument(skip(state, payload))]
pub async fn scrape_job_ids(
    State(state): State<AppState>,
    payload: Result<Json<JobIdScrapeRequest>, JsonRejection>,
) -> Result<Json<CrawlSummary>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    request.validate()?;

    let options = request.into_options(&state);
    let summary = run_job_ids(
        state.launcher.as_ref(),
        state.store.as_ref(),
        &state.layout.pending(),
        &options,
    )
    .await?;

    Ok(Json(summary))
}
