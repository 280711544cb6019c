//! YAML configuration for the `compare` command.
//!
//! Every field is optional; command-line flags take precedence over values
//! read from the file. Relative folder and output paths are resolved against
//! the directory containing the config file.
//!
//! ```yaml
//! folders:
//!   - Labelled_A
//!   - Labelled_B
//! group_by_subfolder: true
//! conflicts_only: true
//! absent_policy: conflict
//! image_extensions: [bmp]
//! label_extensions: [json]
//! out: comparison_result.xlsx
//! format: xlsx
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::emit::ReportFormat;
use crate::error::LabelReconError;
use crate::reconcile::AbsentPolicy;

/// Settings read from a config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompareConfig {
    pub folders: Vec<PathBuf>,
    pub group_by_subfolder: bool,
    pub conflicts_only: bool,
    pub absent_policy: Option<AbsentPolicy>,
    pub image_extensions: Vec<String>,
    pub label_extensions: Vec<String>,
    pub out: Option<PathBuf>,
    pub format: Option<ReportFormat>,
}

/// Loads a config file and resolves its relative paths.
pub fn load_config(path: &Path) -> Result<CompareConfig, LabelReconError> {
    let text = fs::read_to_string(path).map_err(|source| LabelReconError::ConfigRead {
        path: path.to_path_buf(),
        message: source.to_string(),
    })?;

    let mut config: CompareConfig =
        serde_yaml::from_str(&text).map_err(|source| LabelReconError::ConfigRead {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    if let Some(base) = path.parent() {
        config.folders = config
            .folders
            .into_iter()
            .map(|folder| resolve(base, folder))
            .collect();
        config.out = config.out.map(|out| resolve(base, out));
    }

    Ok(config)
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_resolves_relative_paths() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("compare.yaml");
        fs::write(
            &path,
            "folders: [a, /abs/b]\ngroup_by_subfolder: true\nabsent_policy: ignore\nout: report.csv\nformat: csv\n",
        )
        .expect("write config");

        let config = load_config(&path).expect("load");
        assert_eq!(config.folders, vec![temp.path().join("a"), PathBuf::from("/abs/b")]);
        assert!(config.group_by_subfolder);
        assert!(!config.conflicts_only);
        assert_eq!(config.absent_policy, Some(AbsentPolicy::Ignore));
        assert_eq!(config.out, Some(temp.path().join("report.csv")));
        assert_eq!(config.format, Some(ReportFormat::Csv));
    }

    #[test]
    fn rejects_unknown_keys() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("compare.yaml");
        fs::write(&path, "folderz: [a]\n").expect("write config");

        assert!(matches!(
            load_config(&path),
            Err(LabelReconError::ConfigRead { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            load_config(&temp.path().join("absent.yaml")),
            Err(LabelReconError::ConfigRead { .. })
        ));
    }
}
