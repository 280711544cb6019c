//! Reconciliation report types and text formatting.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::scan::{ImageKey, LabelStatus};

/// How many conflicting rows per group the text summary lists.
const MAX_LISTED_CONFLICTS: usize = 20;

/// Result cell for a row whose folders disagree.
pub const CONFLICT_LABEL: &str = "Conflict";
/// Result cell for a row whose folders agree.
pub const MATCH_LABEL: &str = "Match";

/// One image key with its status in every participating folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconciliationRow {
    /// The image key.
    pub key: ImageKey,
    /// One status per folder, in folder input order.
    pub statuses: Vec<LabelStatus>,
    /// True when the statuses disagree under the active policy.
    pub conflict: bool,
}

impl ReconciliationRow {
    /// The text written to the `Result` column.
    pub fn result_label(&self) -> &'static str {
        if self.conflict {
            CONFLICT_LABEL
        } else {
            MATCH_LABEL
        }
    }
}

/// The reconciliation table of one group (or of the whole run in flat mode).
#[derive(Clone, Debug, Serialize)]
pub struct GroupTable {
    /// Subfolder name in grouped mode, `None` in flat mode.
    pub name: Option<String>,
    /// Column header per folder, unique within the table.
    pub columns: Vec<String>,
    /// Folder scanned for each column.
    pub folders: Vec<PathBuf>,
    /// Rows sorted by key.
    pub rows: Vec<ReconciliationRow>,
}

impl GroupTable {
    /// Number of rows flagged as conflicts.
    pub fn conflict_count(&self) -> usize {
        self.rows.iter().filter(|row| row.conflict).count()
    }

    /// Rows flagged as conflicts.
    pub fn conflicts(&self) -> impl Iterator<Item = &ReconciliationRow> {
        self.rows.iter().filter(|row| row.conflict)
    }
}

/// The outcome of a reconciliation run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ReconcileReport {
    /// True when tables are scoped per subfolder.
    pub grouped: bool,
    /// One table per processed group.
    pub groups: Vec<GroupTable>,
    /// Non-fatal problems met along the way.
    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileReport {
    /// Total rows across all groups.
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|group| group.rows.len()).sum()
    }

    /// Total conflicting rows across all groups.
    pub fn conflict_count(&self) -> usize {
        self.groups.iter().map(GroupTable::conflict_count).sum()
    }

    /// Records a warning and logs it.
    pub(crate) fn warn(&mut self, warning: ReconcileWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            match &group.name {
                Some(name) => writeln!(f, "Group '{name}':")?,
                None => writeln!(f, "Folders:")?,
            }
            for (column, folder) in group.columns.iter().zip(&group.folders) {
                writeln!(f, "  {column} ({})", folder.display())?;
            }
            writeln!(
                f,
                "  {} image(s), {} conflict(s)",
                group.rows.len(),
                group.conflict_count()
            )?;

            for row in group.conflicts().take(MAX_LISTED_CONFLICTS) {
                let cells: Vec<String> = group
                    .columns
                    .iter()
                    .zip(&row.statuses)
                    .map(|(column, status)| format!("{column}={status}"))
                    .collect();
                writeln!(f, "  - {}: {}", row.key, cells.join(", "))?;
            }
            let hidden = group.conflict_count().saturating_sub(MAX_LISTED_CONFLICTS);
            if hidden > 0 {
                writeln!(f, "  ... and {hidden} more")?;
            }
            writeln!(f)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "{} warning(s):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  {}", warning)?;
            }
            writeln!(f)?;
        }

        writeln!(
            f,
            "Total: {} image(s) in {} group(s), {} conflict(s)",
            self.row_count(),
            self.groups.len(),
            self.conflict_count()
        )
    }
}

/// A non-fatal problem found during reconciliation.
#[derive(Clone, Debug, Serialize)]
pub struct ReconcileWarning {
    /// A stable code for the warning type.
    pub code: WarningCode,
    /// A human-readable description.
    pub message: String,
    /// Where the warning occurred.
    pub context: WarningContext,
}

impl ReconcileWarning {
    /// Creates a new warning.
    pub fn new(code: WarningCode, message: impl Into<String>, context: WarningContext) -> Self {
        Self {
            code,
            message: message.into(),
            context,
        }
    }
}

impl fmt::Display for ReconcileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[WARN ] {:?} in {}: {}", self.code, self.context, self.message)
    }
}

/// A stable code identifying the type of warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WarningCode {
    /// A folder root could not be scanned and was left out.
    FolderSkipped,
    /// A subfolder exists under some roots but not all.
    SubfolderSkipped,
    /// A common subfolder could not be scanned under every root.
    GroupSkipped,
    /// Label files exist with no image of the same key.
    OrphanLabel,
    /// The same image key occurs at several paths in one folder.
    DuplicateImage,
    /// Two folders share a base name; the column was renamed.
    DuplicateColumn,
    /// Entries under a folder could not be read and were left out.
    UnreadableEntry,
}

/// Context about where a warning occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningContext {
    /// A specific folder.
    Folder { path: PathBuf },
    /// A specific subfolder group.
    Group { name: String },
}

impl fmt::Display for WarningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningContext::Folder { path } => write!(f, "folder {}", path.display()),
            WarningContext::Group { name } => write!(f, "group '{}'", name),
        }
    }
}
