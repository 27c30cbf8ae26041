use anyhow::{bail, Context};
use std::env;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use jobintel::build_state;
use jobintel::config::Settings;
use jobintel::jobs::{run_job_details, run_job_ids, CrawlOptions, CrawlOverrides, DetailOptions};

const USAGE: &str = "usage:\n  jobintel-worker job-ids <job title> <location>\n  jobintel-worker job-data <path to job ids csv>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing (INFO level)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let args: Vec<String> = env::args().skip(1).collect();

    let settings = Settings::from_env().context("failed to load configuration")?;
    let state = build_state(settings).await.context("failed to connect to database")?;

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["job-ids", job_title, location] => {
            let options = CrawlOptions::resolve(
                *job_title,
                *location,
                CrawlOverrides::default(),
                &state.settings.crawler,
            );
            let summary = run_job_ids(
                state.launcher.as_ref(),
                state.store.as_ref(),
                &state.layout.pending(),
                &options,
            )
            .await?;
            info!(
                "Session {}: {} job ids found, {} new, written to {}",
                summary.scrape_session_id,
                summary.total_job_ids_found,
                summary.new_job_ids_saved,
                summary.csv_file_name
            );
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        ["job-data", file] => {
            let input = PathBuf::from(file);
            let options = DetailOptions::from_settings(&state.settings);
            match run_job_details(state.launcher.as_ref(), &input, &options).await {
                Ok(summary) => info!(
                    "Extracted {} of {} jobs into {}",
                    summary.extracted,
                    summary.requested,
                    summary.output_file.display()
                ),
                Err(e) => {
                    error!(?e, "job-data extraction failed");
                    return Err(e.into());
                }
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
