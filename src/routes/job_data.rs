use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{error, info};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::jobs::job_details::{run_job_details, DetailOptions};
use crate::output::PENDING_DIR;
use crate::AppState;

const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct JobDataScrapeRequest {
    /// Optional: A single job id file to process. Every CSV in the folder is processed when absent.
    pub file_name: Option<String>,
    /// Optional: Folder under the output root. Defaults to `pendingExtraction`.
    pub folder_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobDataScrapeResponse {
    pub message: String,
    /// Input files that were extracted and moved to `completed`
    pub processed_files: Vec<String>,
}

/// Blank strings count as absent. Anything that is not a single plain path
/// component is rejected.
fn plain_name(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    let mut components = Path::new(&value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(Some(value)),
        _ => Err(AppError::InvalidRequest(format!(
            "{} must be a plain name: {}",
            field, value
        ))),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract job details for one id file, or for every id file in a folder.
/// Each processed file is moved to `completed`; a file whose extraction fails
/// is moved to `error`.
#[utoipa::path(
    post,
    path = "/scrape-job-data/",
    request_body = JobDataScrapeRequest,
    responses(
        (status = 200, description = "Files processed", body = JobDataScrapeResponse),
        (status = 400, description = "Invalid request parameters"),
        (status = 404, description = "Folder or file not found"),
        (status = 500, description = "Extraction or file move failed")
    )
)]
#[tracing::instrument(skip(state, payload))]
pub async fn scrape_job_data(
    State(state): State<AppState>,
    payload: Result<Json<JobDataScrapeRequest>, JsonRejection>,
) -> Result<Json<JobDataScrapeResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let file_name = plain_name("file_name", request.file_name)?;
    let folder_name =
        plain_name("folder_name", request.folder_name)?.unwrap_or_else(|| PENDING_DIR.to_string());

    let folder = state.layout.folder(&folder_name);
    if !folder.is_dir() {
        return Err(AppError::NotFound(format!("Folder not found: {}", folder_name)));
    }

    let files: Vec<PathBuf> = match file_name {
        Some(name) => {
            let path = folder.join(&name);
            if !path.is_file() {
                return Err(AppError::NotFound(format!("File not found: {}", name)));
            }
            vec![path]
        }
        None => state.layout.candidate_files(&folder).map_err(|e| {
            AppError::InternalError(format!("Failed to list {}: {}", folder.display(), e))
        })?,
    };
    if files.is_empty() {
        return Err(AppError::NotFound(format!("No files found in {}", folder_name)));
    }

    let options = DetailOptions::from_settings(&state.settings);
    let mut processed_files = Vec::with_capacity(files.len());

    for file in files {
        let name = display_name(&file);
        match run_job_details(state.launcher.as_ref(), &file, &options).await {
            Ok(summary) => {
                info!(
                    "Extracted {} of {} jobs from {}",
                    summary.extracted, summary.requested, name
                );
                state.layout.move_to_completed(&file).map_err(|e| {
                    AppError::InternalError(format!("Failed to move {} to completed: {}", name, e))
                })?;
                processed_files.push(name);
            }
            Err(e) => {
                error!("Error processing file {}: {}", name, e);
                if let Err(move_err) = state.layout.move_to_error(&file) {
                    error!("Failed to move {} to error folder: {}", name, move_err);
                }
                return Err(AppError::ProcessingError(format!("{}: {}", name, e)));
            }
        }
    }

    Ok(Json(JobDataScrapeResponse {
        message: "Job data extraction completed".to_string(),
        processed_files,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_only() {
        assert_eq!(plain_name("f", None).unwrap(), None);
        assert_eq!(plain_name("f", Some("  ".into())).unwrap(), None);
        assert_eq!(
            plain_name("f", Some("ids.csv".into())).unwrap(),
            Some("ids.csv".to_string())
        );
        assert!(plain_name("f", Some("../secrets".into())).is_err());
        assert!(plain_name("f", Some("a/b.csv".into())).is_err());
        assert!(plain_name("f", Some("/etc/passwd".into())).is_err());
    }
}
