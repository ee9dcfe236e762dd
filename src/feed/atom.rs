// src/feed/atom.rs
//! Atom documents as served by the arXiv query API.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::CurateError;
use crate::feed::types::FeedEntry;

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: Option<Text>,
    #[serde(default)]
    title: Option<Text>,
    #[serde(default)]
    summary: Option<Text>,
    #[serde(default)]
    content: Option<Text>,
    #[serde(default)]
    published: Option<Text>,
    #[serde(default)]
    updated: Option<Text>,
    #[serde(rename = "link", default)]
    links: Vec<Link>,
}

// Text constructs may carry a `type` attribute, so read them as elements.
#[derive(Debug, Default, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel", default)]
    rel: Option<String>,
}

fn text(t: Option<Text>) -> String {
    t.map(|t| t.value.trim().to_string()).unwrap_or_default()
}

impl Entry {
    /// `rel="alternate"` (the default relation), then any link, then the id.
    fn page_link(&self) -> String {
        self.links
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate") && !l.href.is_empty())
            .or_else(|| self.links.iter().find(|l| !l.href.is_empty()))
            .map(|l| l.href.clone())
            .or_else(|| self.id.as_ref().map(|t| t.value.trim().to_string()))
            .unwrap_or_default()
    }

    fn into_feed_entry(self) -> FeedEntry {
        let link = self.page_link();
        let summary = text(self.summary);
        let description = if summary.is_empty() {
            text(self.content)
        } else {
            summary
        };
        let published = text(self.published);
        let mut updated = text(self.updated);
        if updated.is_empty() {
            updated = published.clone();
        }
        FeedEntry {
            title: text(self.title),
            link,
            description,
            published,
            updated,
        }
    }
}

pub fn parse_atom(xml: &str) -> Result<Vec<FeedEntry>, CurateError> {
    let feed: Feed = from_str(xml).map_err(|e| CurateError::FeedParse(format!("atom: {e}")))?;
    Ok(feed
        .entries
        .into_iter()
        .map(Entry::into_feed_entry)
        .collect())
}
