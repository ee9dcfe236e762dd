// src/publish.rs
//! RSS 2.0 serialization of the curated channel.

use anyhow::{Context, Result};
use chrono::DateTime;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::path::{Path, PathBuf};

use crate::curate::{CuratedItem, OutputChannel};

type XmlWriter = Writer<Vec<u8>>;

fn open(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn close(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(w: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    open(w, name)?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    close(w, name)
}

/// `]]>` cannot appear inside a CDATA section; split it across two sections.
fn cdata_chunks(value: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while let Some(pos) = rest.find("]]>") {
        chunks.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    chunks.push(rest);
    chunks
}

fn cdata_element(w: &mut XmlWriter, name: &str, value: &str) -> Result<()> {
    open(w, name)?;
    for chunk in cdata_chunks(value) {
        w.write_event(Event::CData(BytesCData::new(chunk)))?;
    }
    close(w, name)
}

/// RFC 3339 item dates are rewritten as RFC 2822; anything else is kept verbatim.
fn item_pub_date(published: &str) -> String {
    DateTime::parse_from_rfc3339(published.trim())
        .map(|dt| dt.to_rfc2822())
        .unwrap_or_else(|_| published.to_string())
}

fn write_item(w: &mut XmlWriter, item: &CuratedItem) -> Result<()> {
    open(w, "item")?;
    text_element(w, "title", &item.title)?;
    text_element(w, "link", &item.link)?;
    cdata_element(w, "description", &item.description_html)?;
    text_element(w, "pubDate", &item_pub_date(&item.published))?;
    close(w, "item")
}

/// Render the full document: XML declaration, `<rss version="2.0">`, channel.
pub fn render_rss(channel: &OutputChannel) -> Result<String> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0")]),
    ))?;
    open(&mut w, "channel")?;
    text_element(&mut w, "title", &channel.title)?;
    text_element(&mut w, "link", &channel.link)?;
    text_element(&mut w, "description", &channel.description)?;
    text_element(&mut w, "pubDate", &channel.generated_at.to_rfc2822())?;

    open(&mut w, "image")?;
    text_element(&mut w, "title", &channel.image.title)?;
    text_element(&mut w, "url", &channel.image.url)?;
    text_element(&mut w, "link", &channel.image.link)?;
    close(&mut w, "image")?;

    for item in &channel.items {
        write_item(&mut w, item)?;
    }

    close(&mut w, "channel")?;
    close(&mut w, "rss")?;

    String::from_utf8(w.into_inner()).context("rss output is not UTF-8")
}

/// Writes the rendered feed to a fixed path, replacing the previous run's file.
pub struct FeedPublisher {
    output_path: PathBuf,
}

impl FeedPublisher {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write via a sibling temp file and rename, so readers never see a partial feed.
    pub async fn publish(&self, channel: &OutputChannel) -> Result<&Path> {
        let xml = render_rss(channel)?;
        if let Some(parent) = self.output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let tmp_path = self.output_path.with_extension("xml.tmp");
        tokio::fs::write(&tmp_path, xml.as_bytes())
            .await
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &self.output_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e).with_context(|| format!("replacing {}", self.output_path.display()));
        }

        tracing::info!(
            path = %self.output_path.display(),
            items = channel.items.len(),
            "feed published"
        );
        Ok(&self.output_path)
    }
}
