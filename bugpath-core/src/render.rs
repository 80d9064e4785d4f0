//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Nodes are rendered in annotation order
//! - Byte-for-byte identical output across runs

use crate::annotate::{AnnotatedReport, DisplayNode, NodeKind};
use anyhow::{Context, Result};

/// Render annotated reports as an indented text tree
pub fn render_text(reports: &[AnnotatedReport], indent_width: usize) -> String {
    let mut output = String::new();

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "Report {} [{}]\n",
            report.report.report_id,
            if report.report.checker_id.is_empty() {
                "-"
            } else {
                report.report.checker_id.as_str()
            }
        ));
        for node in &report.nodes {
            render_node(&mut output, node, indent_width);
        }
        for mismatch in &report.mismatches {
            output.push_str(&format!("  warning: {}\n", mismatch));
        }
    }

    output
}

fn render_node(output: &mut String, node: &DisplayNode, indent_width: usize) {
    match node.kind {
        NodeKind::Bug | NodeKind::MacroExpansion | NodeKind::Note => {
            output.push_str(&format!("  {}\n", node.name));
        }
        NodeKind::MacroExpansionItem | NodeKind::NoteItem => {
            let line = node.data.as_ref().map(|d| d.start_line).unwrap_or(0);
            output.push_str(&format!("    L{:<5} {}\n", line, node.name));
        }
        NodeKind::ReportSteps => {
            if let Some(ref step) = node.step {
                // Malformed paths can drive the level below zero
                let indent = " ".repeat(indent_width * step.level.max(0) as usize);
                output.push_str(&format!(
                    "    {:>3} {:<5} {:<18} {} {}{}\n",
                    step.report_step_icon.index,
                    step.report_step_icon.kind.as_str(),
                    step.icon.as_str(),
                    step.bg_color,
                    indent,
                    step.event.msg
                ));
            }
        }
    }
}

/// Render annotated reports as JSON output
pub fn render_json(reports: &[AnnotatedReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).context("failed to serialize reports as JSON")
}

/// Render annotated reports as JSON Lines (one report per line)
pub fn render_jsonl(reports: &[AnnotatedReport]) -> Result<String> {
    let mut output = String::new();
    for report in reports {
        let line = serde_json::to_string(report).with_context(|| {
            format!(
                "failed to serialize report {} as JSON",
                report.report.report_id
            )
        })?;
        output.push_str(&line);
        output.push('\n');
    }
    Ok(output)
}
