//! Report data consumed by the annotator
//!
//! These shapes mirror what the report service hands back for a single
//! report: a summary row plus its detail payload. Keys are camelCase on the
//! wire.

use serde::{Deserialize, Serialize};

/// One detected defect, as listed by the report service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub report_id: i64,
    /// Short checker message, used as the bug node's name
    pub checker_msg: String,
    /// Checker name (e.g. `core.NullDereference`)
    #[serde(default)]
    pub checker_id: String,
}

/// Discriminant of an extended datum
///
/// Unknown discriminants are kept as `Other` so that a newer service can
/// send kinds this crate does not group yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExtendedDataKind {
    Macro,
    Note,
    Other(String),
}

impl ExtendedDataKind {
    pub fn as_str(&self) -> &str {
        match self {
            ExtendedDataKind::Macro => "MACRO",
            ExtendedDataKind::Note => "NOTE",
            ExtendedDataKind::Other(s) => s,
        }
    }
}

impl From<String> for ExtendedDataKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "MACRO" => ExtendedDataKind::Macro,
            "NOTE" => ExtendedDataKind::Note,
            _ => ExtendedDataKind::Other(value),
        }
    }
}

impl From<ExtendedDataKind> for String {
    fn from(kind: ExtendedDataKind) -> Self {
        match kind {
            ExtendedDataKind::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Secondary annotation attached to a report (macro expansion, note, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedDatum {
    #[serde(rename = "type")]
    pub kind: ExtendedDataKind,
    pub start_line: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_col: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_col: Option<i64>,
}

impl ExtendedDatum {
    pub fn new(kind: ExtendedDataKind, start_line: i64, message: impl Into<String>) -> Self {
        ExtendedDatum {
            kind,
            start_line,
            message: message.into(),
            file_path: None,
            start_col: None,
            end_line: None,
            end_col: None,
        }
    }
}

/// One step of the reported defect path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEvent {
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_col: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_col: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<i64>,
}

impl PathEvent {
    pub fn new(msg: impl Into<String>) -> Self {
        PathEvent {
            msg: msg.into(),
            start_line: None,
            start_col: None,
            end_line: None,
            end_col: None,
            file_id: None,
        }
    }
}

/// Detail payload fetched for one report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
    #[serde(default)]
    pub extended_data: Vec<ExtendedDatum>,
    #[serde(default)]
    pub path_events: Vec<PathEvent>,
}

/// A report summary together with its fetched details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBundle {
    pub report: ReportSummary,
    #[serde(default)]
    pub details: ReportDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_kind_from_wire() {
        let datum: ExtendedDatum =
            serde_json::from_str(r#"{"type": "NOTE", "startLine": 3, "message": "m"}"#).unwrap();
        assert_eq!(datum.kind, ExtendedDataKind::Note);

        let datum: ExtendedDatum =
            serde_json::from_str(r#"{"type": "MACRO", "startLine": 3, "message": "m"}"#).unwrap();
        assert_eq!(datum.kind, ExtendedDataKind::Macro);
    }

    #[test]
    fn test_extended_kind_is_case_sensitive() {
        let datum: ExtendedDatum =
            serde_json::from_str(r#"{"type": "macro", "startLine": 3, "message": "m"}"#).unwrap();
        assert_eq!(datum.kind, ExtendedDataKind::Other("macro".to_string()));

        let datum: ExtendedDatum =
            serde_json::from_str(r#"{"type": "note", "startLine": 1, "message": "x"}"#).unwrap();
        assert_eq!(datum.kind, ExtendedDataKind::Other("note".to_string()));
    }

    #[test]
    fn test_unknown_extended_kind_is_kept() {
        let datum: ExtendedDatum =
            serde_json::from_str(r#"{"type": "FIXIT", "startLine": 1, "message": "m"}"#).unwrap();
        assert_eq!(datum.kind, ExtendedDataKind::Other("FIXIT".to_string()));

        let json = serde_json::to_value(&datum).unwrap();
        assert_eq!(json["type"], "FIXIT");
    }

    #[test]
    fn test_details_default_to_empty() {
        let bundle: ReportBundle = serde_json::from_str(
            r#"{"report": {"reportId": 7, "checkerMsg": "Null dereference"}}"#,
        )
        .unwrap();
        assert_eq!(bundle.report.report_id, 7);
        assert!(bundle.report.checker_id.is_empty());
        assert!(bundle.details.extended_data.is_empty());
        assert!(bundle.details.path_events.is_empty());
    }

    #[test]
    fn test_path_event_positions_are_optional() {
        let event: PathEvent = serde_json::from_str(
            r#"{"msg": "Calling 'foo'", "startLine": 12, "startCol": 3, "fileId": 4}"#,
        )
        .unwrap();
        assert_eq!(event.start_line, Some(12));
        assert_eq!(event.end_line, None);
        assert_eq!(event.file_id, Some(4));

        let json = serde_json::to_string(&PathEvent::new("x")).unwrap();
        assert_eq!(json, r#"{"msg":"x"}"#);
    }
}
