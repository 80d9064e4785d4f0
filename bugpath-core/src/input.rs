//! Loading already-fetched report bundles from disk
//!
//! A bundle file holds either a single `ReportBundle` object or an array of
//! them. Directories are walked for `*.json` files in sorted order.

use crate::config::ResolvedConfig;
use crate::model::ReportBundle;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

#[derive(Deserialize)]
#[serde(untagged)]
enum BundleDocument {
    Many(Vec<ReportBundle>),
    One(Box<ReportBundle>),
}

/// Parse a bundle document (object or array of objects)
pub fn parse_bundles(content: &str) -> Result<Vec<ReportBundle>> {
    let document: BundleDocument =
        serde_json::from_str(content).context("expected a report bundle or an array of bundles")?;
    Ok(match document {
        BundleDocument::Many(bundles) => bundles,
        BundleDocument::One(bundle) => vec![*bundle],
    })
}

/// Read and parse a bundle file
pub fn load_bundles(path: &Path) -> Result<Vec<ReportBundle>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report file: {}", path.display()))?;
    parse_bundles(&content).with_context(|| format!("failed to parse report file: {}", path.display()))
}

/// Returns true for directory names that should not be traversed
fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.') || name == "node_modules" || name == "target")
            .unwrap_or(false)
}

fn is_json_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Collect bundle files from a path (file or directory)
///
/// An explicit file is always returned. Files found by walking a directory
/// are filtered to `*.json` and by the config's exclude patterns.
pub fn collect_input_files(path: &Path, config: Option<&ResolvedConfig>) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry =
            entry.with_context(|| format!("Failed to read directory: {}", path.display()))?;
        if !entry.file_type().is_file() || !is_json_file(entry.path()) {
            continue;
        }
        if let Some(config) = config {
            if !config.should_include(entry.path()) {
                continue;
            }
        }
        files.push(entry.into_path());
    }

    // Sort files for deterministic order
    files.sort();
    Ok(files)
}
