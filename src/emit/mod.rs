//! Report emission to spreadsheet artifacts.
//!
//! A [`ReconcileReport`] is rendered as one table per group with the columns
//! `Image`, one column per folder, and `Result`. XLSX output puts each group
//! on its own sheet; CSV output adds a leading `Group` column instead.

mod delimited;
mod xlsx;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LabelReconError;
use crate::reconcile::{GroupTable, ReconcileReport, ReconciliationRow};

/// Default file name of the emitted report.
pub const DEFAULT_REPORT_FILE: &str = "comparison_result.xlsx";

/// Sheet name used for a flat (ungrouped) report.
pub const FLAT_SHEET_NAME: &str = "comparison";

/// Header of the key column.
pub const IMAGE_HEADER: &str = "Image";
/// Header of the outcome column.
pub const RESULT_HEADER: &str = "Result";
/// Header of the group column in CSV output.
pub const GROUP_HEADER: &str = "Group";

const MAX_SHEET_NAME_CHARS: usize = 31;
const INVALID_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Which rows end up in the artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    /// Every reconciled row.
    #[default]
    All,
    /// Only rows whose folders disagree.
    ConflictsOnly,
}

impl RowFilter {
    /// Returns true if `row` passes this filter.
    pub fn keeps(&self, row: &ReconciliationRow) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::ConflictsOnly => row.conflict,
        }
    }
}

/// Artifact file format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ReportFormat {
    /// Guesses the format from the destination's extension, defaulting to XLSX.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ReportFormat::Csv,
            _ => ReportFormat::Xlsx,
        }
    }

    /// Parses a user-supplied format name.
    pub fn parse(name: &str) -> Result<Self, LabelReconError> {
        match name {
            "xlsx" | "excel" => Ok(ReportFormat::Xlsx),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(LabelReconError::UnsupportedFormat(format!(
                "'{}' (supported: xlsx, csv)",
                other
            ))),
        }
    }
}

/// Emission options.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmitOptions {
    pub format: ReportFormat,
    pub filter: RowFilter,
}

/// What was written.
#[derive(Clone, Debug, Serialize)]
pub struct EmitSummary {
    /// The artifact path.
    pub path: PathBuf,
    /// Sheets written (always 1 for CSV).
    pub sheets: usize,
    /// Data rows written, excluding headers.
    pub rows: usize,
}

/// Writes `report` to `destination`, creating or overwriting it.
pub fn emit(
    report: &ReconcileReport,
    destination: &Path,
    opts: &EmitOptions,
) -> Result<EmitSummary, LabelReconError> {
    let summary = match opts.format {
        ReportFormat::Xlsx => xlsx::write_xlsx(report, destination, opts.filter)?,
        ReportFormat::Csv => delimited::write_csv(report, destination, opts.filter)?,
    };

    log::info!(
        "wrote {} row(s) in {} sheet(s) to {}",
        summary.rows,
        summary.sheets,
        summary.path.display()
    );
    Ok(summary)
}

/// Rows of `group` that pass `filter`.
pub(crate) fn filtered_rows(
    group: &GroupTable,
    filter: RowFilter,
) -> impl Iterator<Item = &ReconciliationRow> {
    group.rows.iter().filter(move |row| filter.keeps(row))
}

/// Sheet name per group, valid for Excel and unique ignoring case.
pub(crate) fn sheet_names(report: &ReconcileReport) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(report.groups.len());

    for group in &report.groups {
        let base = match &group.name {
            Some(name) => sanitize_sheet_name(name),
            None => FLAT_SHEET_NAME.to_string(),
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while !used.insert(candidate.to_lowercase()) {
            let tail = format!("~{}", suffix);
            let keep = MAX_SHEET_NAME_CHARS - tail.chars().count();
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), tail);
            suffix += 1;
        }
        names.push(candidate);
    }

    names
}

fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches('\'');
    let truncated: String = trimmed.chars().take(MAX_SHEET_NAME_CHARS).collect();
    let truncated = truncated.trim_end_matches('\'');

    if truncated.is_empty() || truncated.eq_ignore_ascii_case("history") {
        format!("group_{}", truncated)
    } else {
        truncated.to_string()
    }
}

pub(crate) fn write_failure(path: &Path, message: impl std::fmt::Display) -> LabelReconError {
    LabelReconError::WriteFailure {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: Option<&str>) -> GroupTable {
        GroupTable {
            name: name.map(str::to_string),
            columns: Vec::new(),
            folders: Vec::new(),
            rows: Vec::new(),
        }
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(ReportFormat::infer(Path::new("out.CSV")), ReportFormat::Csv);
        assert_eq!(ReportFormat::infer(Path::new("out.xlsx")), ReportFormat::Xlsx);
        assert_eq!(ReportFormat::infer(Path::new("out")), ReportFormat::Xlsx);
    }

    #[test]
    fn rejects_unknown_format_name() {
        assert!(matches!(
            ReportFormat::parse("ods"),
            Err(LabelReconError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn sanitizes_invalid_sheet_names() {
        assert_eq!(sanitize_sheet_name("scratch/deep"), "scratch_deep");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name("History"), "group_History");
        assert_eq!(sanitize_sheet_name(""), "group_");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).chars().count(), 31);
    }

    #[test]
    fn sheet_names_are_unique_ignoring_case() {
        let report = ReconcileReport {
            grouped: true,
            groups: vec![
                group(Some("Dent")),
                group(Some("dent")),
                group(Some("a/b")),
                group(Some("a:b")),
            ],
            warnings: Vec::new(),
        };
        assert_eq!(sheet_names(&report), vec!["Dent", "dent~2", "a_b", "a_b~2"]);
    }

    #[test]
    fn flat_report_uses_fixed_sheet_name() {
        let report = ReconcileReport {
            grouped: false,
            groups: vec![group(None)],
            warnings: Vec::new(),
        };
        assert_eq!(sheet_names(&report), vec![FLAT_SHEET_NAME]);
    }
}
