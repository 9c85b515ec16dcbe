use std::path::{Path, PathBuf};

use futures::future;
use reqwest::Client;
use reqwest::header::ACCEPT;

use crate::config::ScraperConfig;

const CHALLENGE_MARKERS: [&str; 4] = [
    "Just a moment...",
    "cf-chl",
    "challenge-platform",
    "Attention Required!",
];

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Blocked or empty response from {0}")]
    Blocked(String),
    #[error("Failed to read payload {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No {0} source configured")]
    NotConfigured(&'static str),
}

/// Raw payloads of both chambers, each failing on its own.
#[derive(Debug)]
pub struct SourcePayloads {
    pub house: Result<String, ScraperError>,
    pub senate: Result<String, ScraperError>,
}

/// Plain HTTP page fetcher. It does not solve bot challenges; a challenge page is
/// reported as [`ScraperError::Blocked`].
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    config: ScraperConfig,
}

impl WebScraper {
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch_house_schedule(&self) -> Result<String, ScraperError> {
        let base = self
            .config
            .house_url
            .as_deref()
            .ok_or(ScraperError::NotConfigured("House"))?;
        let url = with_week(base, self.config.week.as_deref());
        log::info!("Fetching House committee schedule from {}...", url);

        let body = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        check_not_blocked(&url, body)
    }

    pub async fn fetch_senate_schedule(&self) -> Result<String, ScraperError> {
        let url = self
            .config
            .senate_url
            .as_deref()
            .ok_or(ScraperError::NotConfigured("Senate"))?;
        log::info!("Fetching Senate committee schedule from {}...", url);

        let body = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        check_not_blocked(url, body)
    }

    /// Fetches both chambers concurrently.
    pub async fn fetch_all(&self) -> SourcePayloads {
        let (house, senate) =
            future::join(self.fetch_house_schedule(), self.fetch_senate_schedule()).await;
        SourcePayloads { house, senate }
    }
}

/// Reads a payload saved to disk, standing in for a fetch.
pub fn read_payload(path: &Path) -> Result<String, ScraperError> {
    let body = std::fs::read_to_string(path).map_err(|source| ScraperError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    check_not_blocked(&path.display().to_string(), body)
}

fn with_week(url: &str, week: Option<&str>) -> String {
    match week {
        Some(week) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            format!("{}{}week={}", url, separator, week.trim())
        }
        None => url.to_string(),
    }
}

fn check_not_blocked(origin: &str, body: String) -> Result<String, ScraperError> {
    if body.trim().is_empty() || CHALLENGE_MARKERS.iter().any(|m| body.contains(m)) {
        log::warn!("Response from {} looks blocked or empty", origin);
        return Err(ScraperError::Blocked(origin.to_string()));
    }
    Ok(body)
}
