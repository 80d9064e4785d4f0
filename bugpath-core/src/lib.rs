//! bugpath core library - annotates static-analysis bug paths for tree display

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Annotation is strictly per-report
// - No global mutable state
// - No randomness, clocks, threads, or async
// - Exactly one step node per input path event, in input order
// - Identical input yields byte-for-byte identical output

pub mod annotate;
pub mod config;
pub mod highlight;
pub mod input;
pub mod model;
pub mod render;
pub mod step;

pub use annotate::{
    annotate, format_report_details, AnnotateOptions, AnnotatedReport, DisplayNode, NodeKind,
    ReportStepIconKind,
};
pub use config::ResolvedConfig;
pub use highlight::{Palette, StackMismatch, StepIcon};
pub use model::{ExtendedDataKind, ExtendedDatum, PathEvent, ReportBundle, ReportDetails, ReportSummary};
pub use render::{render_json, render_jsonl, render_text};

use anyhow::Result;
use std::path::Path;

/// Annotate every bundle found at `path` (file or directory)
///
/// Files are read in sorted order; bundles keep their in-file order.
pub fn annotate_path(path: &Path, config: &ResolvedConfig) -> Result<Vec<AnnotatedReport>> {
    let options = config.annotate_options();
    let mut annotated = Vec::new();

    for file in input::collect_input_files(path, Some(config))? {
        let bundles = input::load_bundles(&file)?;
        log::debug!("{}: {} report(s)", file.display(), bundles.len());
        annotated.extend(
            bundles
                .iter()
                .map(|bundle| annotate(&bundle.report, &bundle.details, &options)),
        );
    }

    Ok(annotated)
}
