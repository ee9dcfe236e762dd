//! arxiv-curator binary entrypoint.
//! Loads config and watch terms, runs one curation pass and publishes the feed.
//! Meant to be scheduled (cron/systemd timer); every fatal error exits non-zero.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use arxiv_curator::config::{CuratorConfig, EntryErrorPolicy};
use arxiv_curator::feed::source::{build_http_client, ArxivFeedSource};
use arxiv_curator::keywords::load_watch_terms_from;
use arxiv_curator::pipeline::{build_curator, run_once};
use arxiv_curator::publish::{render_rss, FeedPublisher};
use arxiv_curator::telemetry::{self, MetricsExport};

#[derive(Debug, Parser)]
#[command(name = "arxiv-curator", version, about)]
struct Cli {
    /// Config file (TOML or JSON). Defaults to $CURATOR_CONFIG_PATH, then config/curator.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit JSON log lines instead of compact text.
    #[arg(long)]
    json_logs: bool,

    /// Drop entries that fail instead of aborting the run.
    #[arg(long)]
    skip_failed_entries: bool,

    /// Curate and print the feed to stdout without writing it.
    #[arg(long)]
    dry_run: bool,
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = CuratorConfig::load(cli.config.as_deref())?;
    if cli.skip_failed_entries {
        cfg.on_entry_error = EntryErrorPolicy::Skip;
    }
    if cfg.on_entry_error == EntryErrorPolicy::Skip {
        tracing::warn!("entry errors will be skipped; the feed may omit failing entries");
    }

    let metrics = match &cfg.metrics_textfile {
        Some(_) => Some(MetricsExport::install()?),
        None => {
            telemetry::ensure_metrics_described();
            None
        }
    };

    tokio::fs::create_dir_all(cfg.papers_root())
        .await
        .with_context(|| format!("creating {}", cfg.papers_root().display()))?;

    let terms = load_watch_terms_from(&cfg.keywords_path)?;

    let client = build_http_client(&cfg.http)?;
    let source = ArxivFeedSource::from_url(cfg.feed_url.clone(), client.clone());
    let curator = build_curator(&cfg, client);
    let publisher = FeedPublisher::new(cfg.output_path());

    let summary = run_once(
        &source,
        &curator,
        &terms,
        &cfg.window,
        (!cli.dry_run).then_some(&publisher),
        Utc::now(),
    )
    .await?;

    if cli.dry_run {
        println!("{}", render_rss(&summary.run.channel)?);
    }

    tracing::info!(
        items = summary.run.channel.items.len(),
        widened = summary.run.widened,
        cutoff = %summary.run.cutoff,
        output = ?summary.published_to,
        "run complete"
    );

    if let (Some(m), Some(path)) = (metrics, cfg.metrics_textfile.as_deref()) {
        m.write_textfile(path)?;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    telemetry::init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
