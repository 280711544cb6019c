#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

/// Writes a black BMP of the given size, creating parent directories.
pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::new(width, height).save(path).expect("write bmp file");
}

/// Writes a label file with one square polygon.
pub fn write_label(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let json = r#"{"shapes": [{"label": "defect", "points": [[1, 1], [6, 1], [6, 6], [1, 6]]}]}"#;
    fs::write(path, json).expect("write label file");
}

/// A dataset folder under construction.
pub struct Folder {
    pub root: PathBuf,
}

impl Folder {
    pub fn new(root: PathBuf) -> Self {
        fs::create_dir_all(&root).expect("create folder root");
        Self { root }
    }

    /// Adds `<name>.bmp`.
    pub fn image(&self, name: &str) -> &Self {
        write_bmp(&self.root.join(format!("{name}.bmp")), 8, 8);
        self
    }

    /// Adds `<name>.bmp` and `<name>.json`.
    pub fn labelled(&self, name: &str) -> &Self {
        self.image(name);
        write_label(&self.root.join(format!("{name}.json")));
        self
    }

    /// Adds a label file with no image.
    pub fn orphan_label(&self, name: &str) -> &Self {
        write_label(&self.root.join(format!("{name}.json")));
        self
    }
}
