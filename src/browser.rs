use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to start browser session: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("navigation to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("navigation to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// A page after navigation settled.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// Address after following redirects.
    pub url: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub user_agent: String,
    /// Ignored by [`HttpBrowser`] apart from logging.
    pub headless: bool,
    pub timeout: Duration,
}

impl BrowserOptions {
    /// Options with a freshly generated desktop user agent.
    pub fn with_random_user_agent(headless: bool, timeout: Duration) -> Self {
        BrowserOptions {
            user_agent: random_user_agent(),
            headless,
            timeout,
        }
    }
}

pub fn random_user_agent() -> String {
    ua_generator::ua::spoof_ua().to_string()
}

/// One browsing session. Navigations are issued one after another on the same
/// session; `close` ends it.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn goto(&self, url: &str) -> Result<LoadedPage, BrowserError>;

    async fn close(&self) {}
}

/// Opens browser sessions. Each crawl or extraction run opens its own.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: BrowserOptions) -> Result<Box<dyn Browser>, BrowserError>;
}

/// Browser backed by a cookie-keeping HTTP client. Pages are read as served,
/// without script execution, so `headless` only affects logging.
pub struct HttpBrowser {
    client: Client,
    timeout: Duration,
}

impl HttpBrowser {
    pub fn new(options: &BrowserOptions) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .cookie_store(true)
            .timeout(options.timeout)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        Ok(HttpBrowser {
            client,
            timeout: options.timeout,
        })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn goto(&self, url: &str) -> Result<LoadedPage, BrowserError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                BrowserError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            } else {
                BrowserError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrowserError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content = response.text().await.map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(LoadedPage {
            url: final_url,
            content,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpLauncher;

#[async_trait]
impl BrowserLauncher for HttpLauncher {
    async fn launch(&self, options: BrowserOptions) -> Result<Box<dyn Browser>, BrowserError> {
        tracing::info!(
            "Launching browser with User-Agent: {} (headless: {})",
            options.user_agent,
            options.headless
        );
        Ok(Box::new(HttpBrowser::new(&options)?))
    }
}
