// src/pipeline.rs
//! One end-to-end run: fetch, curate (with window widening), publish.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use metrics::{counter, gauge};
use std::path::PathBuf;
use std::sync::Arc;

use crate::artifacts::fetch::HttpDocumentFetcher;
use crate::artifacts::render::PdfiumRenderer;
use crate::artifacts::{ArtifactCache, CacheOptions};
use crate::config::{CuratorConfig, WindowConfig};
use crate::curate::{CurationSettings, Curator, OutputChannel};
use crate::error::CurateError;
use crate::feed::types::{FeedEntry, FeedSource};
use crate::publish::FeedPublisher;

/// `now - hours`, optionally truncated to 00:00 UTC of that day.
pub fn cutoff_for(now: DateTime<Utc>, hours: i64, align_to_utc_day: bool) -> DateTime<Utc> {
    let cutoff = now - Duration::hours(hours);
    if !align_to_utc_day {
        return cutoff;
    }
    match cutoff.date_naive().and_hms_opt(0, 0, 0) {
        Some(midnight) => Utc.from_utc_datetime(&midnight),
        None => cutoff,
    }
}

#[derive(Debug, Clone)]
pub struct CurationRun {
    pub channel: OutputChannel,
    pub cutoff: DateTime<Utc>,
    /// True when the narrow window was empty and the wide one was used.
    pub widened: bool,
}

/// Curate with the narrow window; if nothing qualifies, curate the same entries
/// again from scratch with the wide window.
///
/// Upstream publishes in bursts (nothing over weekends), so an empty narrow
/// pass is expected. Previews materialized by the narrow pass stay on disk.
pub async fn curate_with_fallback(
    curator: &Curator,
    entries: &[FeedEntry],
    terms: &[String],
    now: DateTime<Utc>,
    window: &WindowConfig,
) -> Result<CurationRun, CurateError> {
    let narrow = cutoff_for(now, window.narrow_hours, window.align_to_utc_day);
    let channel = curator.curate(entries, narrow, terms).await?;
    if !channel.items.is_empty() {
        return Ok(CurationRun {
            channel,
            cutoff: narrow,
            widened: false,
        });
    }

    tracing::info!(
        narrow_hours = window.narrow_hours,
        wide_hours = window.wide_hours,
        "no entries in the narrow window, widening"
    );
    counter!("curate_window_widened_total").increment(1);
    let wide = cutoff_for(now, window.wide_hours, window.align_to_utc_day);
    let channel = curator.curate(entries, wide, terms).await?;
    Ok(CurationRun {
        channel,
        cutoff: wide,
        widened: true,
    })
}

/// Build the curator with the HTTP fetcher and PDFium renderer from `cfg`.
pub fn build_curator(cfg: &CuratorConfig, client: reqwest::Client) -> Curator {
    let cache = ArtifactCache::new(
        Arc::new(HttpDocumentFetcher::new(client)),
        Arc::new(PdfiumRenderer::new(
            cfg.preview.render_dpi,
            cfg.preview.jpeg_quality,
            cfg.preview.pdfium_library_path.clone(),
        )),
        CacheOptions {
            max_pages: cfg.preview.max_pages,
            require_completion_marker: cfg.preview.require_completion_marker,
        },
    );
    Curator::new(cache, CurationSettings::from_config(cfg))
}

#[derive(Debug)]
pub struct RunSummary {
    pub run: CurationRun,
    /// `None` when publishing was skipped (dry run).
    pub published_to: Option<PathBuf>,
}

/// Fetch the feed, curate it and publish the result.
///
/// Any fetch error aborts before output is touched; a previous feed file is
/// left in place in that case.
pub async fn run_once(
    source: &dyn FeedSource,
    curator: &Curator,
    terms: &[String],
    window: &WindowConfig,
    publisher: Option<&FeedPublisher>,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    tracing::info!(source = source.name(), "fetching upstream feed");
    let entries = source
        .fetch_entries()
        .await
        .with_context(|| format!("fetching feed from {}", source.name()))?;
    tracing::info!(entries = entries.len(), "feed parsed");

    let run = curate_with_fallback(curator, &entries, terms, now, window)
        .await
        .context("curating feed")?;

    let published_to = match publisher {
        Some(p) => Some(p.publish(&run.channel).await?.to_path_buf()),
        None => None,
    };

    gauge!("publish_items").set(run.channel.items.len() as f64);
    gauge!("publish_last_run_ts").set(now.timestamp().max(0) as f64);

    Ok(RunSummary { run, published_to })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn cutoff_is_plain_subtraction_by_default() {
        let now = at("2023-01-23T09:30:00Z");
        assert_eq!(cutoff_for(now, 24, false), at("2023-01-22T09:30:00Z"));
        assert_eq!(cutoff_for(now, 72, false), at("2023-01-20T09:30:00Z"));
    }

    #[test]
    fn aligned_cutoff_starts_at_midnight() {
        let now = at("2023-01-23T09:30:00Z");
        assert_eq!(cutoff_for(now, 24, true), at("2023-01-22T00:00:00Z"));
    }
}
