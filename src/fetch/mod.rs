// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;

/// Anything that can hand back the raw HTML of the statistics page.
pub trait DocumentSource {
    fn fetch(&self) -> Result<String>;
}

/// Fetches the page over HTTP with a single blocking GET.
pub struct HttpSource {
    client: Client,
    url: Url,
}

impl HttpSource {
    pub fn new(url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("parsing source URL {}", url))?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client, url })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            &cfg.source_url,
            &cfg.user_agent,
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self) -> Result<String> {
        info!(url = %self.url, "fetching document");
        let body = self
            .client
            .get(self.url.clone())
            .send()
            .with_context(|| format!("GET {} failed", self.url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.url))?
            .text()
            .with_context(|| format!("Reading text from {}", self.url))?;
        debug!(bytes = body.len(), "document received");
        Ok(body)
    }
}

/// A fixed document, for offline runs and tests.
pub struct StaticSource(pub String);

impl DocumentSource for StaticSource {
    fn fetch(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
