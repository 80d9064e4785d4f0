//! Invariant Tests
//!
//! Exhaustively checks the annotation invariants over every short path
//! built from a fixed alphabet of step messages.

use bugpath_core::highlight::{HighlightStack, Palette};
use bugpath_core::{
    format_report_details, ExtendedDataKind, ExtendedDatum, NodeKind, PathEvent, ReportDetails,
    ReportStepIconKind, ReportSummary,
};

const ALPHABET: &[&str] = &[
    "Calling 'f'",
    "Entered call from 'main'",
    "Returning from 'f'",
    "Returning from 'g'",
    "Returned allocated memory",
    "Assuming 'x' is null",
    "Value stored (fixit)",
    "Plain step",
];

const MAX_LEN: usize = 4;

fn report() -> ReportSummary {
    ReportSummary {
        report_id: 1,
        checker_msg: "checker message".to_string(),
        checker_id: "test.Checker".to_string(),
    }
}

/// Every sequence over ALPHABET of length 0..=MAX_LEN
fn all_paths() -> Vec<Vec<&'static str>> {
    let mut paths: Vec<Vec<&'static str>> = vec![Vec::new()];
    let mut frontier = paths.clone();
    for _ in 0..MAX_LEN {
        let mut next = Vec::new();
        for path in &frontier {
            for msg in ALPHABET {
                let mut extended = path.clone();
                extended.push(*msg);
                next.push(extended);
            }
        }
        paths.extend(next.iter().cloned());
        frontier = next;
    }
    paths
}

fn details(path: &[&str]) -> ReportDetails {
    ReportDetails {
        extended_data: Vec::new(),
        path_events: path.iter().map(|m| PathEvent::new(*m)).collect(),
    }
}

#[test]
fn test_one_node_per_step_in_order() {
    for path in all_paths() {
        let nodes = format_report_details(&report(), &details(&path));
        assert_eq!(nodes.len(), path.len() + 1, "path {:?}", path);
        assert_eq!(nodes[0].kind, NodeKind::Bug);

        let msgs: Vec<&str> = nodes[1..]
            .iter()
            .map(|n| n.step.as_ref().unwrap().event.msg.as_str())
            .collect();
        assert_eq!(msgs, path);
    }
}

#[test]
fn test_last_step_is_error_others_fixit_or_info() {
    for path in all_paths().into_iter().filter(|p| !p.is_empty()) {
        let nodes = format_report_details(&report(), &details(&path));
        let steps: Vec<_> = nodes.iter().filter_map(|n| n.step.as_ref()).collect();

        let (last, rest) = steps.split_last().unwrap();
        assert_eq!(last.report_step_icon.kind, ReportStepIconKind::Error);
        for step in rest {
            let expected = if step.event.msg.contains(" (fixit)") {
                ReportStepIconKind::Fixit
            } else {
                ReportStepIconKind::Info
            };
            assert_eq!(step.report_step_icon.kind, expected, "path {:?}", path);
        }
    }
}

#[test]
fn test_mismatched_return_never_touches_stack() {
    let palette = Palette::default();
    for path in all_paths() {
        let mut stack = HighlightStack::new(&palette);
        for msg in &path {
            let depth = stack.depth();
            let top = stack.top().map(str::to_string);
            let color = stack.bg_color();

            let classified = stack.classify(msg);
            if classified.mismatch.is_some() {
                assert_eq!(stack.depth(), depth);
                assert_eq!(stack.top().map(str::to_string), top);
                assert_eq!(stack.bg_color(), color);
            }
        }
    }
}

#[test]
fn test_matched_pair_restores_state() {
    let palette = Palette::default();
    for prefix in all_paths().into_iter().filter(|p| p.len() <= 3) {
        let mut stack = HighlightStack::new(&palette);
        for msg in &prefix {
            stack.classify(msg);
        }
        let depth = stack.depth();
        let color = stack.bg_color();

        stack.classify("Calling 'pair'");
        let ret = stack.classify("Returning from 'pair'");
        assert!(ret.mismatch.is_none());
        assert_eq!(stack.depth(), depth);
        assert_eq!(stack.bg_color(), color);
    }
}

#[test]
fn test_matched_pair_restores_indentation() {
    for prefix in all_paths().into_iter().filter(|p| p.len() <= 3) {
        let mut path = prefix.clone();
        path.extend([
            "Calling 'pair'",
            "Entered call from 'caller'",
            "Returning from 'pair'",
            "after",
        ]);
        let nodes = format_report_details(&report(), &details(&path));
        let levels: Vec<i64> = nodes
            .iter()
            .filter_map(|n| n.step.as_ref().map(|s| s.level))
            .collect();

        let n = prefix.len();
        let before = if n == 0 { 0 } else { levels[n - 1] };
        assert_eq!(levels[n], before);
        assert_eq!(levels[n + 1], before + 1);
        assert_eq!(levels[n + 2], before);
        assert_eq!(levels[n + 3], before);
    }
}

#[test]
fn test_extended_items_sorted_and_stable() {
    let lines = [5, 2, 5, 1, 2, 9, 5];
    // Rotations give several input orderings with repeated lines
    for shift in 0..lines.len() {
        let data: Vec<ExtendedDatum> = (0..lines.len())
            .map(|i| {
                let j = (i + shift) % lines.len();
                ExtendedDatum::new(ExtendedDataKind::Note, lines[j], format!("n{}", j))
            })
            .collect();
        let input_order: Vec<String> = data.iter().map(|d| d.message.clone()).collect();

        let nodes = format_report_details(
            &report(),
            &ReportDetails {
                extended_data: data,
                path_events: Vec::new(),
            },
        );
        let items: Vec<&ExtendedDatum> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::NoteItem)
            .map(|n| n.data.as_ref().unwrap())
            .collect();
        assert_eq!(items.len(), lines.len());

        for pair in items.windows(2) {
            assert!(pair[0].start_line <= pair[1].start_line);
            if pair[0].start_line == pair[1].start_line {
                let a = input_order.iter().position(|m| *m == pair[0].message);
                let b = input_order.iter().position(|m| *m == pair[1].message);
                assert!(a < b, "equal lines must keep input order");
            }
        }
    }
}
