#![allow(dead_code)]

use async_trait::async_trait;
use jobintel::browser::{Browser, BrowserError, BrowserLauncher, BrowserOptions, LoadedPage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}

/// Serves canned pages keyed by exact URL. Unknown URLs fail to navigate.
#[derive(Default)]
pub struct FakeWeb {
    pages: HashMap<String, String>,
    redirects: HashMap<String, String>,
    visits: Mutex<Vec<String>>,
    launches: Mutex<Vec<BrowserOptions>>,
    closes: Mutex<usize>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// `from` resolves to `to`, which must itself be a known page.
    pub fn redirect(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.redirects.insert(from.into(), to.into());
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn launches(&self) -> Vec<BrowserOptions> {
        self.launches.lock().unwrap().clone()
    }

    pub fn closes(&self) -> usize {
        *self.closes.lock().unwrap()
    }

    fn load(&self, url: &str) -> Result<LoadedPage, BrowserError> {
        self.visits.lock().unwrap().push(url.to_string());
        let final_url = self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string());
        match self.pages.get(&final_url) {
            Some(content) => Ok(LoadedPage {
                url: final_url,
                content: content.clone(),
            }),
            None => Err(BrowserError::Timeout {
                url: url.to_string(),
                timeout_ms: 60000,
            }),
        }
    }
}

struct FakeBrowser {
    web: Arc<FakeWeb>,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<LoadedPage, BrowserError> {
        self.web.load(url)
    }

    async fn close(&self) {
        *self.web.closes.lock().unwrap() += 1;
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    pub web: Arc<FakeWeb>,
}

impl FakeLauncher {
    pub fn new(web: FakeWeb) -> Self {
        FakeLauncher { web: Arc::new(web) }
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self, options: BrowserOptions) -> Result<Box<dyn Browser>, BrowserError> {
        self.web.launches.lock().unwrap().push(options);
        Ok(Box::new(FakeBrowser {
            web: self.web.clone(),
        }))
    }
}

pub const DETAIL_BASE: &str = "https://jobs.example.com/viewjob";

pub fn detail_url(job_id: &str) -> String {
    format!("{}?jk={}", DETAIL_BASE, job_id)
}

/// A detail page in the listing site's markup.
pub fn detail_page(title: &str, salary: Option<&str>, apply: &str) -> String {
    let salary = salary
        .map(|s| format!(r#"<span class="css-19j1a75 eu4oa1w0">{}</span>"#, s))
        .unwrap_or_default();
    format!(
        r#"<html><body>
<h1 class="jobsearch-JobInfoHeader-title css-1b4cr5z"><span>{title}</span></h1>
<div data-company-name="true"><a href="/cmp/acme">Acme Corp</a></div>
<div data-testid="inlineHeader-companyLocation"><div>Toronto, ON</div></div>
<div id="salaryInfoAndJobType">{salary}</div>
<div class="js-match-insights-provider-e6s05i eu4oa1w0">
  <h3 class="js-match-insights-provider-11n8e9a e1tiznh50">Job type</h3>
  <div class="js-match-insights-provider-tvvxwd ecydgvn1">Full-time</div>
  <div class="js-match-insights-provider-tvvxwd ecydgvn1">Permanent</div>
</div>
<div class="js-match-insights-provider-e6s05i eu4oa1w0">
  <h3 class="js-match-insights-provider-11n8e9a e1tiznh50">Shift and schedule</h3>
  <div class="js-match-insights-provider-tvvxwd ecydgvn1">Monday to Friday</div>
  <div class="js-match-insights-provider-tvvxwd ecydgvn1">  </div>
</div>
{apply}
<div id="jobDescriptionText" class="jobsearch-jobDescriptionText">
  <p>We are   hiring.</p>
  <ul>
    <li>Write Rust</li>
  </ul>
</div>
</body></html>"#
    )
}

pub const EASY_APPLY_BUTTON: &str =
    r#"<button id="indeedApplyButton" class="css-t8wchy">Apply now</button>"#;

pub fn external_apply_button(href: &str) -> String {
    format!(
        r#"<button class="css-1oxck4n e8ju0x51" href="{}">Apply on company site</button>"#,
        href
    )
}

pub fn write_ids_file(path: &std::path::Path, ids: &[&str]) {
    let mut body = String::from("Job IDs\n");
    for id in ids {
        body.push_str(id);
        body.push('\n');
    }
    std::fs::write(path, body).unwrap();
}
