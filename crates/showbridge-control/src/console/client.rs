//! HTTP client for the console's embedded web server

use showbridge_core::{ConsoleConfig, Executor, ExecutorNumber, ShowSnapshot};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::parse::{parse_executors, parse_show_name};
use crate::Result;

/// Path of the execute page, relative to the base URL
const EXECUTOR_PAGE: &str = "exec.html";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads show metadata from the console. Stateless between calls.
#[derive(Debug, Clone)]
pub struct ConsoleScraper {
    client: reqwest::Client,
    base_url: String,
    show_path_markers: Vec<String>,
}

impl ConsoleScraper {
    /// Create a scraper for the configured console
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
            show_path_markers: config.show_path_markers.clone(),
        })
    }

    /// Base URL requests are made against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current show name, `None` when it is not listed or the fetch fails
    pub async fn fetch_show_name(&self) -> Option<String> {
        match self.try_fetch_show_name().await {
            Ok(name) => name,
            Err(e) => {
                warn!("Failed to fetch show name: {}", e);
                None
            }
        }
    }

    async fn try_fetch_show_name(&self) -> Result<Option<String>> {
        debug!("Fetching show name from {}", self.base_url);
        let html = self.get(&self.base_url).await?;
        parse_show_name(&html, &self.show_path_markers)
    }

    /// Executor table from the execute page
    pub async fn fetch_executors(&self) -> Result<BTreeMap<ExecutorNumber, Executor>> {
        let url = format!("{}/{}", self.base_url, EXECUTOR_PAGE);
        debug!("Fetching executors from {}", url);
        let html = self.get(&url).await?;
        parse_executors(&html)
    }

    /// Fetch show name and executors concurrently
    pub async fn fetch_data(&self) -> Result<ShowSnapshot> {
        let (show_name, executors) = tokio::join!(self.fetch_show_name(), self.fetch_executors());
        Ok(ShowSnapshot::new(show_name, executors?))
    }

    async fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
