//! Per-folder label presence classification.
//!
//! A folder root is walked recursively; every image file is classified as
//! labelled when a label file with the same key exists anywhere under the
//! same root, and unlabelled otherwise.

mod key;

pub use key::ImageKey;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::LabelReconError;

/// Default image extension.
pub const DEFAULT_IMAGE_EXTENSION: &str = "bmp";
/// Default label extension.
pub const DEFAULT_LABEL_EXTENSION: &str = "json";

/// Labelling status of one image key in one folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStatus {
    /// The image exists and a matching label file exists.
    Labelled,
    /// The image exists but no matching label file does.
    Unlabelled,
    /// The image was not observed in this folder at all.
    Absent,
}

impl LabelStatus {
    /// Returns the display name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelStatus::Labelled => "Labelled",
            LabelStatus::Unlabelled => "Unlabelled",
            LabelStatus::Absent => "Absent",
        }
    }
}

impl fmt::Display for LabelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options controlling which files count as images and labels.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Image file extensions, matched case-insensitively without the dot.
    pub image_extensions: Vec<String>,
    /// Label file extensions, matched case-insensitively without the dot.
    pub label_extensions: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            image_extensions: vec![DEFAULT_IMAGE_EXTENSION.to_string()],
            label_extensions: vec![DEFAULT_LABEL_EXTENSION.to_string()],
        }
    }
}

/// The classification of every image key found under one folder root.
///
/// Built once from a directory listing and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderClassification {
    root: PathBuf,
    statuses: BTreeMap<ImageKey, LabelStatus>,
    orphan_labels: Vec<ImageKey>,
    duplicate_images: Vec<ImageKey>,
    unreadable_entries: Vec<PathBuf>,
}

impl FolderClassification {
    /// Classifies already-listed image and label paths.
    ///
    /// Paths without a file name are ignored. Label keys without a matching
    /// image are kept as orphans; image keys seen more than once are
    /// recorded as duplicates and classified once.
    pub fn from_files<I, L, P, Q>(root: impl Into<PathBuf>, images: I, labels: L) -> Self
    where
        I: IntoIterator<Item = P>,
        L: IntoIterator<Item = Q>,
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let label_keys: BTreeSet<ImageKey> = labels
            .into_iter()
            .filter_map(|path| ImageKey::from_path(path.as_ref()))
            .collect();

        let mut statuses = BTreeMap::new();
        let mut duplicates = BTreeSet::new();

        for path in images {
            let Some(key) = ImageKey::from_path(path.as_ref()) else {
                continue;
            };
            if statuses.contains_key(&key) {
                duplicates.insert(key);
                continue;
            }
            let status = if label_keys.contains(&key) {
                LabelStatus::Labelled
            } else {
                LabelStatus::Unlabelled
            };
            statuses.insert(key, status);
        }

        let orphan_labels = label_keys
            .into_iter()
            .filter(|key| !statuses.contains_key(key))
            .collect();

        Self {
            root: root.into(),
            statuses,
            orphan_labels,
            duplicate_images: duplicates.into_iter().collect(),
            unreadable_entries: Vec::new(),
        }
    }

    /// The folder root this classification was built from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Status of `key` in this folder; `Absent` when the key was not seen.
    pub fn status(&self, key: &ImageKey) -> LabelStatus {
        self.statuses
            .get(key)
            .copied()
            .unwrap_or(LabelStatus::Absent)
    }

    /// All observed image keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &ImageKey> {
        self.statuses.keys()
    }

    /// Keys with a matching label file.
    pub fn labelled(&self) -> impl Iterator<Item = &ImageKey> {
        self.with_status(LabelStatus::Labelled)
    }

    /// Keys without a matching label file.
    pub fn unlabelled(&self) -> impl Iterator<Item = &ImageKey> {
        self.with_status(LabelStatus::Unlabelled)
    }

    fn with_status(&self, wanted: LabelStatus) -> impl Iterator<Item = &ImageKey> {
        self.statuses
            .iter()
            .filter(move |(_, status)| **status == wanted)
            .map(|(key, _)| key)
    }

    /// Number of distinct image keys.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Returns true if no image was found.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Label keys with no image of the same key.
    pub fn orphan_labels(&self) -> &[ImageKey] {
        &self.orphan_labels
    }

    /// Image keys that occurred at more than one path.
    pub fn duplicate_images(&self) -> &[ImageKey] {
        &self.duplicate_images
    }

    /// Entries below the root that could not be read, such as dangling
    /// symlinks. They were left out of the classification.
    pub fn unreadable_entries(&self) -> &[PathBuf] {
        &self.unreadable_entries
    }
}

/// Classifies every image under `root`.
///
/// Fails with [`LabelReconError::DirectoryNotFound`] when `root` is missing
/// or is not a directory. Missing or unreadable entries below the root are
/// skipped and listed in [`FolderClassification::unreadable_entries`];
/// any other traversal error fails with [`LabelReconError::DirectoryWalk`].
pub fn classify(root: &Path, opts: &ScanOptions) -> Result<FolderClassification, LabelReconError> {
    if !root.is_dir() {
        return Err(LabelReconError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut images = Vec::new();
    let mut labels = Vec::new();
    let mut unreadable = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_skippable(&err) => {
                log::debug!("skipping unreadable entry under {}: {}", root.display(), err);
                unreadable.push(err.path().unwrap_or(root).to_path_buf());
                continue;
            }
            Err(source) => {
                return Err(LabelReconError::DirectoryWalk {
                    path: root.to_path_buf(),
                    source,
                })
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if has_extension(path, &opts.image_extensions) {
            images.push(path.to_path_buf());
        } else if has_extension(path, &opts.label_extensions) {
            labels.push(path.to_path_buf());
        }
    }

    let mut classification = FolderClassification::from_files(root, &images, &labels);
    classification.unreadable_entries = unreadable;
    log::debug!(
        "scanned {}: {} image file(s), {} label file(s), {} labelled",
        root.display(),
        images.len(),
        labels.len(),
        classification.labelled().count()
    );

    Ok(classification)
}

/// A missing or forbidden entry below the root. Symlink loops and failures
/// at the root itself stay fatal.
fn is_skippable(err: &walkdir::Error) -> bool {
    if err.depth() == 0 || err.loop_ancestor().is_some() {
        return false;
    }
    matches!(
        err.io_error().map(io::Error::kind),
        Some(io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
    )
}

/// Lists the names of the immediate subdirectories of `root`, sorted.
pub fn list_subfolders(root: &Path) -> Result<Vec<String>, LabelReconError> {
    if !root.is_dir() {
        return Err(LabelReconError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

pub(crate) fn has_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext.trim_start_matches('.')))
}
