// src/feed/source.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::CurateError;
use crate::feed::parse_feed;
use crate::feed::types::{FeedEntry, FeedSource};

/// Upstream article feed, either fetched over HTTP or read from a stored document.
pub struct ArxivFeedSource {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

/// reqwest client shared by feed and document downloads.
pub fn build_http_client(cfg: &HttpConfig) -> Result<reqwest::Client, CurateError> {
    let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
    if let Some(secs) = cfg.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().map_err(|e| CurateError::Fetch {
        url: String::new(),
        source: e,
    })
}

impl ArxivFeedSource {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    fn parse_timed(body: &str) -> Result<Vec<FeedEntry>, CurateError> {
        let t0 = std::time::Instant::now();
        let entries = parse_feed(body)?;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_entries_total").increment(entries.len() as u64);
        Ok(entries)
    }
}

#[async_trait]
impl FeedSource for ArxivFeedSource {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>, CurateError> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_timed(s),
            Mode::Http { url, client } => {
                let t0 = std::time::Instant::now();
                let resp = client.get(url.as_str()).send().await.map_err(|e| {
                    tracing::warn!(error = ?e, url = %url, "feed http error");
                    CurateError::Fetch {
                        url: url.clone(),
                        source: e,
                    }
                })?;
                if !resp.status().is_success() {
                    return Err(CurateError::HttpStatus {
                        url: url.clone(),
                        status: resp.status().as_u16(),
                    });
                }
                let body = resp.text().await.map_err(|e| CurateError::Fetch {
                    url: url.clone(),
                    source: e,
                })?;
                histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                tracing::debug!(bytes = body.len(), url = %url, "feed downloaded");
                Self::parse_timed(&body)
            }
        }
    }

    fn name(&self) -> &str {
        match &self.mode {
            Mode::Fixture(_) => "fixture",
            Mode::Http { .. } => "arxiv",
        }
    }
}
