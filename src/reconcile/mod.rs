//! Cross-folder reconciliation of labelling status.
//!
//! Every folder root is classified independently; the classifications are
//! then joined on image key so that each key gets one status per folder,
//! with [`LabelStatus::Absent`] where a folder never saw the image. A row is
//! a conflict when its statuses disagree.

mod report;

pub use report::{
    GroupTable, ReconcileReport, ReconcileWarning, ReconciliationRow, WarningCode,
    WarningContext, CONFLICT_LABEL, MATCH_LABEL,
};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LabelReconError;
use crate::scan::{self, FolderClassification, ImageKey, LabelStatus, ScanOptions};

/// How many keys a scan warning names before summarizing.
const MAX_KEYS_IN_WARNING: usize = 5;

/// How folder roots are split into independently reconciled groups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// Each root is compared as a whole.
    #[default]
    Flat,
    /// Each subfolder name common to every root is compared on its own.
    BySubfolder,
}

/// Whether an image missing from a folder disagrees with one that is there.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// `Absent` is a status like any other; a missing image is a conflict.
    #[default]
    Conflict,
    /// `Absent` entries are left out of the comparison.
    Ignore,
}

/// Reconciliation options.
#[derive(Clone, Debug, Default)]
pub struct ReconcileOptions {
    pub grouping: Grouping,
    pub absent_policy: AbsentPolicy,
    pub scan: ScanOptions,
}

/// Returns true when `statuses` hold more than one distinct value under
/// `policy`.
pub fn is_conflict(statuses: &[LabelStatus], policy: AbsentPolicy) -> bool {
    let mut considered = statuses
        .iter()
        .filter(|status| policy == AbsentPolicy::Conflict || **status != LabelStatus::Absent);

    match considered.next() {
        Some(first) => considered.any(|status| status != first),
        None => false,
    }
}

/// Joins already-built classifications into rows sorted by key.
///
/// Column `i` of every row is the status in `classifications[i]`.
pub fn reconcile_classifications(
    classifications: &[FolderClassification],
    policy: AbsentPolicy,
) -> Vec<ReconciliationRow> {
    let keys: BTreeSet<&ImageKey> = classifications
        .iter()
        .flat_map(FolderClassification::keys)
        .collect();

    keys.into_iter()
        .map(|key| {
            let statuses: Vec<LabelStatus> = classifications
                .iter()
                .map(|classification| classification.status(key))
                .collect();
            let conflict = is_conflict(&statuses, policy);
            ReconciliationRow {
                key: key.clone(),
                statuses,
                conflict,
            }
        })
        .collect()
}

/// Reconciles the labelling status of `roots`.
///
/// Folders or groups that cannot be scanned are skipped and recorded as
/// warnings in the report. The run only fails when nothing at all can be
/// reconciled.
pub fn reconcile<P: AsRef<Path>>(
    roots: &[P],
    opts: &ReconcileOptions,
) -> Result<ReconcileReport, LabelReconError> {
    let roots: Vec<PathBuf> = roots.iter().map(|root| root.as_ref().to_path_buf()).collect();

    match opts.grouping {
        Grouping::Flat => reconcile_flat(&roots, opts),
        Grouping::BySubfolder => reconcile_by_subfolder(&roots, opts),
    }
}

fn reconcile_flat(
    roots: &[PathBuf],
    opts: &ReconcileOptions,
) -> Result<ReconcileReport, LabelReconError> {
    let mut report = ReconcileReport::default();
    let mut classifications = Vec::new();

    for root in roots {
        match scan::classify(root, &opts.scan) {
            Ok(classification) => {
                record_scan_warnings(&classification, &mut report);
                classifications.push(classification);
            }
            Err(err) => report.warn(ReconcileWarning::new(
                WarningCode::FolderSkipped,
                err.to_string(),
                WarningContext::Folder { path: root.clone() },
            )),
        }
    }

    if classifications.is_empty() {
        return Err(LabelReconError::NoUsableFolders {
            roots: roots.to_vec(),
        });
    }

    let folders: Vec<PathBuf> = classifications
        .iter()
        .map(|classification| classification.root().to_path_buf())
        .collect();
    let columns = column_names(&folders, &mut report);
    let rows = reconcile_classifications(&classifications, opts.absent_policy);

    report.groups.push(GroupTable {
        name: None,
        columns,
        folders,
        rows,
    });
    Ok(report)
}

fn reconcile_by_subfolder(
    roots: &[PathBuf],
    opts: &ReconcileOptions,
) -> Result<ReconcileReport, LabelReconError> {
    let mut report = ReconcileReport {
        grouped: true,
        ..Default::default()
    };

    let mut usable: Vec<PathBuf> = Vec::new();
    let mut subfolders: Vec<BTreeSet<String>> = Vec::new();
    for root in roots {
        match scan::list_subfolders(root) {
            Ok(names) => {
                usable.push(root.clone());
                subfolders.push(names.into_iter().collect());
            }
            Err(err) => report.warn(ReconcileWarning::new(
                WarningCode::FolderSkipped,
                err.to_string(),
                WarningContext::Folder { path: root.clone() },
            )),
        }
    }

    if usable.is_empty() {
        return Err(LabelReconError::NoUsableFolders {
            roots: roots.to_vec(),
        });
    }

    let columns = column_names(&usable, &mut report);

    // Name -> indices of the roots that contain it.
    let mut presence: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, names) in subfolders.iter().enumerate() {
        for name in names {
            presence.entry(name.as_str()).or_default().push(idx);
        }
    }

    let mut common = Vec::new();
    for (name, present_in) in &presence {
        if present_in.len() == usable.len() {
            common.push(name.to_string());
        } else {
            let found: Vec<&str> = present_in.iter().map(|idx| columns[*idx].as_str()).collect();
            report.warn(ReconcileWarning::new(
                WarningCode::SubfolderSkipped,
                format!(
                    "present in {} of {} folder(s) ({})",
                    present_in.len(),
                    usable.len(),
                    found.join(", ")
                ),
                WarningContext::Group {
                    name: name.to_string(),
                },
            ));
        }
    }

    for name in common {
        let folders: Vec<PathBuf> = usable.iter().map(|root| root.join(&name)).collect();

        match classify_group(&folders, &opts.scan) {
            Ok(classifications) => {
                for classification in &classifications {
                    record_scan_warnings(classification, &mut report);
                }
                let rows = reconcile_classifications(&classifications, opts.absent_policy);
                report.groups.push(GroupTable {
                    name: Some(name),
                    columns: columns.clone(),
                    folders,
                    rows,
                });
            }
            Err(err) => report.warn(ReconcileWarning::new(
                WarningCode::GroupSkipped,
                err.to_string(),
                WarningContext::Group { name },
            )),
        }
    }

    if report.groups.is_empty() {
        return Err(LabelReconError::NoCommonGroup { roots: usable });
    }

    Ok(report)
}

fn classify_group(
    folders: &[PathBuf],
    opts: &ScanOptions,
) -> Result<Vec<FolderClassification>, LabelReconError> {
    folders
        .iter()
        .map(|folder| scan::classify(folder, opts))
        .collect()
}

fn record_scan_warnings(classification: &FolderClassification, report: &mut ReconcileReport) {
    let context = || WarningContext::Folder {
        path: classification.root().to_path_buf(),
    };

    let orphans = classification.orphan_labels();
    if !orphans.is_empty() {
        report.warn(ReconcileWarning::new(
            WarningCode::OrphanLabel,
            format!(
                "{} label file(s) without an image: {}",
                orphans.len(),
                sample_keys(orphans)
            ),
            context(),
        ));
    }

    let duplicates = classification.duplicate_images();
    if !duplicates.is_empty() {
        report.warn(ReconcileWarning::new(
            WarningCode::DuplicateImage,
            format!(
                "{} image name(s) found at more than one path: {}",
                duplicates.len(),
                sample_keys(duplicates)
            ),
            context(),
        ));
    }

    let unreadable = classification.unreadable_entries();
    if !unreadable.is_empty() {
        let shown: Vec<String> = unreadable
            .iter()
            .take(MAX_KEYS_IN_WARNING)
            .map(|path| path.display().to_string())
            .collect();
        report.warn(ReconcileWarning::new(
            WarningCode::UnreadableEntry,
            format!(
                "{} entry(ies) could not be read and were skipped: {}",
                unreadable.len(),
                shown.join(", ")
            ),
            context(),
        ));
    }
}

fn sample_keys(keys: &[ImageKey]) -> String {
    let shown: Vec<&str> = keys
        .iter()
        .take(MAX_KEYS_IN_WARNING)
        .map(ImageKey::as_str)
        .collect();
    let mut text = shown.join(", ");
    if keys.len() > MAX_KEYS_IN_WARNING {
        text.push_str(&format!(", ... ({} more)", keys.len() - MAX_KEYS_IN_WARNING));
    }
    text
}

/// Column header per folder: the base directory name, made unique.
fn column_names(folders: &[PathBuf], report: &mut ReconcileReport) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(folders.len());

    for folder in folders {
        let base = folder_display_name(folder);
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;

        if *count == 1 {
            columns.push(base);
        } else {
            let renamed = format!("{}_{}", base, count);
            report.warn(ReconcileWarning::new(
                WarningCode::DuplicateColumn,
                format!("folder name '{}' already used; column renamed to '{}'", base, renamed),
                WarningContext::Folder {
                    path: folder.clone(),
                },
            ));
            columns.push(renamed);
        }
    }

    columns
}

fn folder_display_name(folder: &Path) -> String {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| folder.display().to_string())
}
