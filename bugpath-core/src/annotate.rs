//! Report detail annotation
//!
//! Turns a report and its fetched details into the flat, ordered list of
//! nodes a tree view renders:
//!
//! 1. Macro expansion group and its items (if any)
//! 2. Note group and its items (if any)
//! 3. The bug node
//! 4. One node per path event, in path order
//!
//! Global invariants enforced:
//! - Exactly one step node per input path event, order preserved
//! - The last step node is always the `error` (result) step
//! - Group items are sorted by start line with ties kept in input order

use crate::highlight::{HighlightStack, Palette, StackMismatch, StepIcon};
use crate::model::{ExtendedDataKind, ExtendedDatum, PathEvent, ReportDetails, ReportSummary};
use serde::{Deserialize, Serialize};

/// Marker analyzers append to steps that carry a fix-it hint
pub const DEFAULT_FIXIT_MARKER: &str = " (fixit)";

/// Kind of a display node; the serialized form doubles as the id segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "bug")]
    Bug,
    #[serde(rename = "macro")]
    MacroExpansion,
    #[serde(rename = "macro_item")]
    MacroExpansionItem,
    #[serde(rename = "note")]
    Note,
    #[serde(rename = "note_item")]
    NoteItem,
    #[serde(rename = "steps")]
    ReportSteps,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Bug => "bug",
            NodeKind::MacroExpansion => "macro",
            NodeKind::MacroExpansionItem => "macro_item",
            NodeKind::Note => "note",
            NodeKind::NoteItem => "note_item",
            NodeKind::ReportSteps => "steps",
        }
    }
}

/// Error marker shown next to a step, independent of its highlight icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStepIconKind {
    Error,
    Fixit,
    Info,
}

impl ReportStepIconKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStepIconKind::Error => "error",
            ReportStepIconKind::Fixit => "fixit",
            ReportStepIconKind::Info => "info",
        }
    }
}

/// Numbered step marker (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStepIcon {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: ReportStepIconKind,
}

/// Per-step payload of a path-step node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAnnotation {
    pub event: PathEvent,
    pub icon: StepIcon,
    pub report_step_icon: ReportStepIcon,
    pub bg_color: String,
    /// Indentation level; may go negative on malformed paths
    pub level: i64,
}

/// One renderable tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ExtendedDatum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepAnnotation>,
}

/// Knobs for one annotation run
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub palette: Palette,
    pub fixit_marker: String,
    pub strict_allocation_returns: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        AnnotateOptions {
            palette: Palette::default(),
            fixit_marker: DEFAULT_FIXIT_MARKER.to_string(),
            strict_allocation_returns: false,
        }
    }
}

/// Annotated nodes for one report plus any stack mismatches seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedReport {
    pub report: ReportSummary,
    pub nodes: Vec<DisplayNode>,
    pub mismatches: Vec<StackMismatch>,
}

/// Counts describing an annotated report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub steps: usize,
    pub max_level: i64,
    pub final_level: i64,
    pub mismatches: usize,
}

impl AnnotatedReport {
    pub fn steps(&self) -> impl Iterator<Item = &StepAnnotation> {
        self.nodes.iter().filter_map(|n| n.step.as_ref())
    }

    pub fn summary(&self) -> AnnotationSummary {
        let levels: Vec<i64> = self.steps().map(|s| s.level).collect();
        AnnotationSummary {
            steps: levels.len(),
            max_level: levels.iter().copied().max().unwrap_or(0),
            final_level: levels.last().copied().unwrap_or(0),
            mismatches: self.mismatches.len(),
        }
    }
}

/// Annotate a report with default options and return just the nodes
pub fn format_report_details(report: &ReportSummary, details: &ReportDetails) -> Vec<DisplayNode> {
    annotate(report, details, &AnnotateOptions::default()).nodes
}

/// Annotate a report's details
pub fn annotate(
    report: &ReportSummary,
    details: &ReportDetails,
    options: &AnnotateOptions,
) -> AnnotatedReport {
    let mut nodes = format_extended_data(report, &details.extended_data);

    nodes.push(DisplayNode {
        id: node_id(report, NodeKind::Bug),
        name: report.checker_msg.clone(),
        kind: NodeKind::Bug,
        data: None,
        step: None,
    });

    let (steps, mismatches) = format_report_events(report, &details.path_events, options);
    nodes.extend(steps);

    let annotated = AnnotatedReport {
        report: report.clone(),
        nodes,
        mismatches,
    };

    let summary = annotated.summary();
    log::debug!(
        "report {}: {} step(s), max level {}, {} stack mismatch(es)",
        report.report_id,
        summary.steps,
        summary.max_level,
        summary.mismatches
    );

    annotated
}

/// Group macro expansions and notes; other kinds are dropped
pub fn format_extended_data(report: &ReportSummary, data: &[ExtendedDatum]) -> Vec<DisplayNode> {
    let mut nodes = Vec::new();
    push_group(
        &mut nodes,
        report,
        data,
        &ExtendedDataKind::Macro,
        (NodeKind::MacroExpansion, NodeKind::MacroExpansionItem),
        "Macro expansions",
    );
    push_group(
        &mut nodes,
        report,
        data,
        &ExtendedDataKind::Note,
        (NodeKind::Note, NodeKind::NoteItem),
        "Notes",
    );
    nodes
}

fn push_group(
    nodes: &mut Vec<DisplayNode>,
    report: &ReportSummary,
    data: &[ExtendedDatum],
    kind: &ExtendedDataKind,
    (group_kind, item_kind): (NodeKind, NodeKind),
    name: &str,
) {
    let mut members: Vec<&ExtendedDatum> = data.iter().filter(|d| &d.kind == kind).collect();
    if members.is_empty() {
        return;
    }

    // Stable: equal start lines keep their input order
    members.sort_by_key(|d| d.start_line);

    let group_id = node_id(report, group_kind);
    nodes.push(DisplayNode {
        id: group_id.clone(),
        name: name.to_string(),
        kind: group_kind,
        data: None,
        step: None,
    });

    for (index, datum) in members.into_iter().enumerate() {
        nodes.push(DisplayNode {
            id: format!("{}_{}", group_id, index),
            name: datum.message.clone(),
            kind: item_kind,
            data: Some(datum.clone()),
            step: None,
        });
    }
}

/// Marker for a step: the last step is the result, fix-its are flagged
pub fn report_step_icon(
    msg: &str,
    index: usize,
    is_result: bool,
    fixit_marker: &str,
) -> ReportStepIcon {
    let kind = if is_result {
        ReportStepIconKind::Error
    } else if msg.contains(fixit_marker) {
        ReportStepIconKind::Fixit
    } else {
        ReportStepIconKind::Info
    };

    ReportStepIcon {
        index: index + 1,
        kind,
    }
}

/// Annotate the path events of a report in order
pub fn format_report_events(
    report: &ReportSummary,
    events: &[PathEvent],
    options: &AnnotateOptions,
) -> (Vec<DisplayNode>, Vec<StackMismatch>) {
    let mut stack = HighlightStack::new(&options.palette)
        .with_strict_allocation_returns(options.strict_allocation_returns);
    let mut nodes = Vec::with_capacity(events.len());
    let mut mismatches = Vec::new();

    // Entering a call indents everything from the entry step on; a return
    // step is already drawn at the caller's level.
    let mut indentation: i64 = 0;

    for (index, event) in events.iter().enumerate() {
        let is_result = index + 1 == events.len();
        let classified = stack.classify(&event.msg);
        let icon = report_step_icon(&event.msg, index, is_result, &options.fixit_marker);

        match classified.highlight.icon {
            StepIcon::EnteredCall => indentation += 1,
            StepIcon::Returning => indentation -= 1,
            _ => {}
        }

        if let Some(mismatch) = classified.mismatch {
            mismatches.push(mismatch);
        }

        nodes.push(DisplayNode {
            id: format!("{}_{}", node_id(report, NodeKind::ReportSteps), index),
            name: report.checker_msg.clone(),
            kind: NodeKind::ReportSteps,
            data: None,
            step: Some(StepAnnotation {
                event: event.clone(),
                icon: classified.highlight.icon,
                report_step_icon: icon,
                bg_color: classified.highlight.bg_color,
                level: indentation,
            }),
        });
    }

    (nodes, mismatches)
}

fn node_id(report: &ReportSummary, kind: NodeKind) -> String {
    format!("{}_{}", report.report_id, kind.as_str())
}
