// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod artifacts;
pub mod config;
pub mod curate;
pub mod error;
pub mod feed;
pub mod keywords;
pub mod pipeline;
pub mod publish;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::{CuratorConfig, EntryErrorPolicy};
pub use crate::curate::{CuratedItem, Curator, OutputChannel};
pub use crate::error::CurateError;
pub use crate::feed::types::{FeedEntry, FeedSource};
pub use crate::pipeline::{curate_with_fallback, run_once};
