use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_OUTPUT_ROOT: &str = "output";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_DETAIL_BASE_URL: &str = "https://ca.indeed.com/viewjob";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error parsing YAML configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Defaults for the listing crawler, read from the `get_job_ids.defaults`
/// block of the YAML config.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CrawlerDefaults {
    pub headless: bool,
    pub base_url: String,
    /// Navigation timeout in milliseconds.
    pub network_idle_timeout: u64,
    pub job_count_class: String,
    pub job_link_data_attr: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    get_job_ids: JobIdsSection,
}

#[derive(Debug, Deserialize)]
struct JobIdsSection {
    defaults: CrawlerDefaults,
}

impl CrawlerDefaults {
    pub fn from_yaml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(file.get_job_ids.defaults)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_yaml_str(&raw, path)
    }
}

/// Process-wide settings, resolved once at startup and passed to every run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_root: PathBuf,
    pub database_url: Option<String>,
    pub bind_addr: String,
    pub detail_base_url: String,
    /// Maximum number of detail pages fetched at once.
    pub extract_concurrency: usize,
    pub crawler: CrawlerDefaults,
}

impl Settings {
    /// Reads `.env` (if present) and the environment, then loads the crawler
    /// defaults from `SCRAPER_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config_path =
            env::var("SCRAPER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        tracing::info!("Loading configuration from {}", config_path);
        let crawler = CrawlerDefaults::load(Path::new(&config_path))?;

        let extract_concurrency = match env::var("EXTRACT_CONCURRENCY") {
            Ok(value) => match value.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "EXTRACT_CONCURRENCY",
                        value,
                    })
                }
            },
            Err(_) => 1,
        };

        let settings = Settings {
            output_root: env::var("OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            detail_base_url: env::var("DETAIL_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_DETAIL_BASE_URL.to_string()),
            extract_concurrency,
            crawler,
        };
        tracing::info!("Output directory: {}", settings.output_root.display());
        Ok(settings)
    }
}
