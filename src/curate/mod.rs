// src/curate/mod.rs
//! # Curation Engine
//! Turns upstream entries into the published channel.
//!
//! Entries are handled one at a time in upstream order: recency check against
//! the cutoff, keyword match, preview materialization, then item assembly.
//! Order is never changed and nothing is added beyond the upstream entries.

pub mod html;

use chrono::{DateTime, Utc};
use metrics::counter;
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::artifacts::{ArtifactCache, ArtifactRecord};
use crate::config::{CuratorConfig, EntryErrorPolicy};
use crate::curate::html::{
    annotation_pattern, build_description, clean_title_with, document_link, GalleryImage,
};
use crate::error::CurateError;
use crate::feed::types::FeedEntry;
use crate::keywords::match_terms;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelImage {
    pub title: String,
    pub url: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CuratedItem {
    pub title: String,
    pub link: String,
    pub description_html: String,
    /// Upstream `published` value, unparsed.
    pub published: String,
}

#[derive(Debug, Clone)]
pub struct OutputChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub generated_at: DateTime<Utc>,
    pub image: ChannelImage,
    pub items: Vec<CuratedItem>,
}

/// Static inputs for a curation pass, derived once from the config.
#[derive(Debug, Clone)]
pub struct CurationSettings {
    pub channel_title: String,
    pub channel_link: String,
    pub channel_description: String,
    pub image_url: String,
    pub site_url: String,
    pub papers_root: PathBuf,
    pub papers_dir: String,
    pub abstract_token: String,
    pub document_token: String,
    pub source_prefix: String,
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub on_entry_error: EntryErrorPolicy,
}

impl CurationSettings {
    pub fn from_config(cfg: &CuratorConfig) -> Self {
        Self {
            channel_title: cfg.channel.title.clone(),
            channel_link: cfg.channel.link.clone(),
            channel_description: cfg.channel.description.clone(),
            image_url: format!(
                "{}/{}",
                cfg.site_url,
                cfg.channel.image_path.trim_start_matches('/')
            ),
            site_url: cfg.site_url.clone(),
            papers_root: cfg.papers_root(),
            papers_dir: cfg.papers_dir.clone(),
            abstract_token: cfg.links.abstract_token.clone(),
            document_token: cfg.links.document_token.clone(),
            source_prefix: cfg.links.source_prefix.clone(),
            thumb_width: cfg.preview.thumb_width,
            thumb_height: cfg.preview.thumb_height,
            on_entry_error: cfg.on_entry_error,
        }
    }
}

enum Outcome {
    Kept(CuratedItem),
    Stale,
    Unmatched,
    Duplicate,
}

pub struct Curator {
    cache: ArtifactCache,
    settings: CurationSettings,
    annotation: Regex,
}

impl Curator {
    pub fn new(cache: ArtifactCache, settings: CurationSettings) -> Self {
        let annotation = annotation_pattern(&settings.source_prefix);
        Self {
            cache,
            settings,
            annotation,
        }
    }

    pub fn settings(&self) -> &CurationSettings {
        &self.settings
    }

    /// Build the channel from `entries` whose `updated >= cutoff` and that match
    /// at least one of `terms`. Materializes previews for every kept entry.
    ///
    /// Under [`EntryErrorPolicy::Abort`] the first entry error ends the pass;
    /// under [`EntryErrorPolicy::Skip`] it is logged and the entry dropped.
    pub async fn curate(
        &self,
        entries: &[FeedEntry],
        cutoff: DateTime<Utc>,
        terms: &[String],
    ) -> Result<OutputChannel, CurateError> {
        let mut items = Vec::new();
        let mut seen_links: HashSet<&str> = HashSet::new();
        let (mut stale, mut unmatched, mut failed, mut dup) = (0usize, 0usize, 0usize, 0usize);

        for entry in entries {
            counter!("curate_entries_total").increment(1);
            let outcome = self.curate_entry(entry, cutoff, terms, &seen_links).await;
            match outcome {
                Ok(Outcome::Kept(item)) => {
                    seen_links.insert(entry.link.as_str());
                    items.push(item);
                }
                Ok(Outcome::Stale) => {
                    stale += 1;
                    counter!("curate_skipped_stale_total").increment(1);
                }
                Ok(Outcome::Unmatched) => {
                    unmatched += 1;
                    counter!("curate_skipped_unmatched_total").increment(1);
                }
                Ok(Outcome::Duplicate) => dup += 1,
                Err(e) => {
                    counter!("curate_entry_errors_total", "stage" => e.stage()).increment(1);
                    match self.settings.on_entry_error {
                        EntryErrorPolicy::Abort => return Err(e),
                        EntryErrorPolicy::Skip => {
                            failed += 1;
                            tracing::warn!(
                                error = %e,
                                stage = e.stage(),
                                link = %entry.link,
                                "skipping entry"
                            );
                        }
                    }
                }
            }
        }

        counter!("curate_kept_total").increment(items.len() as u64);
        tracing::info!(
            %cutoff,
            kept = items.len(),
            stale,
            unmatched,
            failed,
            dup,
            "curation pass finished"
        );

        Ok(self.channel(items))
    }

    async fn curate_entry(
        &self,
        entry: &FeedEntry,
        cutoff: DateTime<Utc>,
        terms: &[String],
        seen_links: &HashSet<&str>,
    ) -> Result<Outcome, CurateError> {
        let updated = parse_updated(entry)?;
        // a link is published at most once per pass
        if seen_links.contains(entry.link.as_str()) {
            return Ok(Outcome::Duplicate);
        }
        if updated < cutoff {
            return Ok(Outcome::Stale);
        }

        let matches = match_terms(&format!("{} {}", entry.title, entry.description), terms);
        if matches.is_empty() {
            return Ok(Outcome::Unmatched);
        }

        let doc_link = document_link(
            &entry.link,
            &self.settings.abstract_token,
            &self.settings.document_token,
        );
        let record = ArtifactRecord::from_document_link(&doc_link, &self.settings.papers_root)?;
        self.cache.ensure_materialized(&doc_link, &record.dir).await?;

        let title = clean_title_with(&entry.title, &self.annotation);
        let images = self.gallery_for(&record);
        let description_html =
            build_description(&entry.link, &title, &matches, &entry.description, &images);

        tracing::debug!(id = %record.id, keywords = ?matches, previews = images.len(), "entry kept");
        Ok(Outcome::Kept(CuratedItem {
            title,
            link: entry.link.clone(),
            description_html,
            published: entry.published.clone(),
        }))
    }

    fn gallery_for(&self, record: &ArtifactRecord) -> Vec<GalleryImage> {
        self.cache
            .existing_previews(record)
            .into_iter()
            .map(|i| GalleryImage {
                url: format!(
                    "{}/{}",
                    self.settings.site_url,
                    record.preview_rel_url(&self.settings.papers_dir, i)
                ),
                width: self.settings.thumb_width,
                height: self.settings.thumb_height,
            })
            .collect()
    }

    fn channel(&self, items: Vec<CuratedItem>) -> OutputChannel {
        let s = &self.settings;
        OutputChannel {
            title: s.channel_title.clone(),
            link: s.channel_link.clone(),
            description: s.channel_description.clone(),
            generated_at: Utc::now(),
            image: ChannelImage {
                title: s.channel_title.clone(),
                url: s.image_url.clone(),
                link: s.image_url.clone(),
            },
            items,
        }
    }
}

fn parse_updated(entry: &FeedEntry) -> Result<DateTime<Utc>, CurateError> {
    DateTime::parse_from_rfc3339(entry.updated.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| CurateError::Timestamp {
            link: entry.link.clone(),
            value: entry.updated.clone(),
            source,
        })
}
