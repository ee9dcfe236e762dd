// src/keywords.rs
//! Watch-term list: loading from CSV and case-insensitive matching.

use anyhow::{bail, Context, Result};
use std::path::Path;

/// Load watch terms from a CSV file: the first field of every row is one term.
///
/// Order is preserved and duplicates are kept. Blank terms are dropped because
/// an empty needle would match every entry. A file yielding no terms is an error.
pub fn load_watch_terms_from(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening keywords file {}", path.display()))?;

    let mut terms = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("parsing {} as CSV (row {})", path.display(), row + 1))?;
        if let Some(first) = record.get(0) {
            let term = first.trim();
            if !term.is_empty() {
                terms.push(term.to_string());
            }
        }
    }

    if terms.is_empty() {
        bail!("keywords file {} contains no watch terms", path.display());
    }
    tracing::info!(count = terms.len(), path = %path.display(), "loaded watch terms");
    Ok(terms)
}

/// Terms contained in `text`, ignoring case, in watch-list order.
pub fn match_terms(text: &str, terms: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    terms
        .iter()
        .filter(|t| haystack.contains(&t.to_lowercase()))
        .cloned()
        .collect()
}
