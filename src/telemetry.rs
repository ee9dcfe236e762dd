// src/telemetry.rs
//! Logging setup and run metrics.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("arxiv_curator=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

/// One-time metrics registration (so series carry descriptions).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_entries_total", "Entries parsed from the upstream feed.");
        describe_histogram!("feed_fetch_ms", "Upstream feed download time in milliseconds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("curate_entries_total", "Entries examined by curation passes.");
        describe_counter!("curate_kept_total", "Entries published by curation passes.");
        describe_counter!(
            "curate_skipped_stale_total",
            "Entries older than the pass cutoff."
        );
        describe_counter!(
            "curate_skipped_unmatched_total",
            "Entries matching no watch term."
        );
        describe_counter!(
            "curate_entry_errors_total",
            "Entry failures by stage (timestamp, link, download, render, filesystem)."
        );
        describe_counter!(
            "curate_window_widened_total",
            "Runs that fell back to the wide window."
        );
        describe_counter!(
            "artifacts_materialized_total",
            "Documents downloaded and rendered."
        );
        describe_counter!(
            "artifacts_cached_total",
            "Documents skipped because previews already exist."
        );
        describe_counter!(
            "artifacts_pages_rendered_total",
            "Preview pages written."
        );
        describe_gauge!("publish_items", "Items in the last published feed.");
        describe_gauge!(
            "publish_last_run_ts",
            "Unix ts when the feed was last published."
        );
    });
}

/// Prometheus recorder whose snapshot is dumped to a textfile after the run.
pub struct MetricsExport {
    handle: PrometheusHandle,
}

impl MetricsExport {
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the exposition text for node_exporter's textfile collector.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())
            .with_context(|| format!("writing metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("replacing metrics file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::counter;

    #[test]
    fn textfile_holds_snapshot_and_no_temp_remains() {
        // local recorder keeps the process-global one untouched
        let recorder = PrometheusBuilder::new().build_recorder();
        let export = MetricsExport {
            handle: recorder.handle(),
        };
        metrics::with_local_recorder(&recorder, || {
            counter!("artifacts_cached_total").increment(3);
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arxiv_curator.prom");
        export.write_textfile(&path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("artifacts_cached_total 3"), "got: {body}");
        assert!(!path.with_extension("prom.tmp").exists());

        // second write replaces the file in place
        export.write_textfile(&path).unwrap();
        assert!(!path.with_extension("prom.tmp").exists());
    }
}
