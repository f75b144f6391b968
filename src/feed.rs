use anyhow::{anyhow, Context, Result};
use std::time::Instant;
use tracing::{debug, info};

use crate::models::Listing;

pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/SimplifyJobs/Summer2026-Internships/dev/.github/scripts/listings.json";

pub trait FeedSource {
    fn fetch(&self) -> Result<Vec<Listing>>;
}

pub struct HttpFeed {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("internhunt/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for HttpFeed {
    fn fetch(&self) -> Result<Vec<Listing>> {
        let start = Instant::now();
        debug!("Fetching listings from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to fetch job listings from {}", self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch job listings: {} returned {}",
                self.url,
                response.status()
            ));
        }

        let body = response
            .text()
            .context("Failed to read job listings response")?;
        let listings = parse_listings(&body)?;

        info!(
            "Feed fetch completed - listings={}, duration={:.2}s",
            listings.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(listings)
    }
}

pub fn parse_listings(body: &str) -> Result<Vec<Listing>> {
    serde_json::from_str(body).context("Failed to parse job listings JSON")
}
