// tests/window_fallback.rs
use arxiv_curator::artifacts::mock::{MockDocumentFetcher, MockPageRenderer};
use arxiv_curator::artifacts::{ArtifactCache, CacheOptions};
use arxiv_curator::config::{CuratorConfig, WindowConfig};
use arxiv_curator::curate::{CurationSettings, Curator};
use arxiv_curator::curate_with_fallback;
use arxiv_curator::feed::source::ArxivFeedSource;
use arxiv_curator::feed::types::{FeedEntry, FeedSource};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn curator(root: &Path) -> Curator {
    let mut cfg = CuratorConfig::default();
    cfg.artifact_root = root.to_path_buf();
    cfg.site_url = "https://feeds.example.test".into();
    let cache = ArtifactCache::new(
        Arc::new(MockDocumentFetcher::new()),
        Arc::new(MockPageRenderer::new(2)),
        CacheOptions {
            max_pages: 5,
            require_completion_marker: false,
        },
    );
    Curator::new(cache, CurationSettings::from_config(&cfg))
}

async fn fixture_entries() -> Vec<FeedEntry> {
    ArxivFeedSource::from_fixture_str(include_str!("fixtures/arxiv_atom.xml"))
        .fetch_entries()
        .await
        .unwrap()
}

fn terms() -> Vec<String> {
    vec!["pose".into(), "diffusion".into()]
}

#[tokio::test]
async fn narrow_window_is_used_when_it_has_items() {
    let root = tempfile::tempdir().unwrap();
    let c = curator(root.path());
    let entries = fixture_entries().await;

    let run = curate_with_fallback(
        &c,
        &entries,
        &terms(),
        at("2023-01-23T12:00:00Z"),
        &WindowConfig::default(),
    )
    .await
    .unwrap();

    assert!(!run.widened);
    assert_eq!(run.cutoff, at("2023-01-22T12:00:00Z"));
    let links: Vec<&str> = run.channel.items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, vec!["http://arxiv.org/abs/2301.00001v1"]);
}

#[tokio::test]
async fn empty_narrow_window_widens_to_wide_window() {
    let root = tempfile::tempdir().unwrap();
    let c = curator(root.path());
    let entries = fixture_entries().await;

    // a quiet day: newest entry is 25h old
    let run = curate_with_fallback(
        &c,
        &entries,
        &terms(),
        at("2023-01-24T09:00:00Z"),
        &WindowConfig::default(),
    )
    .await
    .unwrap();

    assert!(run.widened);
    assert_eq!(run.cutoff, at("2023-01-21T09:00:00Z"));
    let titles: Vec<&str> = run.channel.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Monocular 3D Human Pose Estimation in the Wild",
            "Latent Diffusion for Garment Transfer",
        ]
    );
    // item date comes from `published`, filtering from `updated`
    assert_eq!(run.channel.items[1].published, "2023-01-03T10:00:00Z");
}

#[tokio::test]
async fn both_windows_empty_yields_empty_channel() {
    let root = tempfile::tempdir().unwrap();
    let c = curator(root.path());
    let entries = fixture_entries().await;

    let run = curate_with_fallback(
        &c,
        &entries,
        &terms(),
        at("2023-02-15T00:00:00Z"),
        &WindowConfig::default(),
    )
    .await
    .unwrap();

    assert!(run.widened);
    assert!(run.channel.items.is_empty());
    assert!(!root.path().join("papers").exists());
}

#[tokio::test]
async fn aligned_windows_start_at_utc_midnight() {
    let root = tempfile::tempdir().unwrap();
    let c = curator(root.path());
    let entries = fixture_entries().await;
    let window = WindowConfig {
        align_to_utc_day: true,
        ..WindowConfig::default()
    };

    // narrow cutoff is 2023-01-24T00:00Z, wide is 2023-01-22T00:00Z
    let run = curate_with_fallback(&c, &entries, &terms(), at("2023-01-25T01:00:00Z"), &window)
        .await
        .unwrap();

    assert!(run.widened);
    assert_eq!(run.cutoff, at("2023-01-22T00:00:00Z"));
    let links: Vec<&str> = run.channel.items.iter().map(|i| i.link.as_str()).collect();
    assert_eq!(links, vec!["http://arxiv.org/abs/2301.00001v1"]);
}
