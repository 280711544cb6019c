//! Polygon label files.
//!
//! Only the fields needed for drawing are read: a top-level `shapes` array
//! whose entries carry a `points` list of `[x, y]` pairs. Other fields are
//! ignored.

use std::fs;
use std::path::Path;

use imageproc::point::Point;
use serde::Deserialize;

use crate::error::LabelReconError;

/// A parsed label file.
#[derive(Clone, Debug, Deserialize)]
pub struct LabelFile {
    pub shapes: Vec<Shape>,
}

/// One labelled region.
#[derive(Clone, Debug, Deserialize)]
pub struct Shape {
    /// Class name, if present.
    #[serde(default)]
    pub label: Option<String>,
    /// Contour vertices in pixel coordinates.
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub shape_type: Option<String>,
}

impl Shape {
    /// The contour as integer pixel points, truncated toward zero.
    pub fn polygon(&self) -> Vec<Point<i32>> {
        self.points
            .iter()
            .map(|[x, y]| Point::new(*x as i32, *y as i32))
            .collect()
    }
}

/// Reads and parses a label file.
pub fn read_label_file(path: &Path) -> Result<LabelFile, LabelReconError> {
    let bytes = fs::read(path)?;
    from_label_slice(&bytes).map_err(|source| LabelReconError::MalformedLabelFile {
        path: path.to_path_buf(),
        message: source.to_string(),
    })
}

/// Parses label JSON from bytes.
pub fn from_label_slice(bytes: &[u8]) -> Result<LabelFile, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Parses label JSON from a string.
pub fn from_label_str(json: &str) -> Result<LabelFile, serde_json::Error> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labelme_style_shapes() {
        let json = r#"{
            "version": "5.0.1",
            "shapes": [
                {"label": "scratch", "points": [[1, 2], [10.9, 2], [10, 8.5]], "shape_type": "polygon"}
            ],
            "imagePath": "img1.bmp"
        }"#;
        let labels = from_label_str(json).expect("parse");
        assert_eq!(labels.shapes.len(), 1);
        assert_eq!(labels.shapes[0].label.as_deref(), Some("scratch"));
        assert_eq!(
            labels.shapes[0].polygon(),
            vec![Point::new(1, 2), Point::new(10, 2), Point::new(10, 8)]
        );
    }

    #[test]
    fn rejects_missing_shapes() {
        let err = from_label_str(r#"{"imagePath": "img1.bmp"}"#).expect_err("missing shapes");
        assert!(err.to_string().contains("shapes"));
    }

    #[test]
    fn rejects_shape_without_points() {
        assert!(from_label_str(r#"{"shapes": [{"label": "dent"}]}"#).is_err());
    }

    #[test]
    fn read_maps_parse_errors_to_malformed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.json");
        fs::write(&path, "{ not json").expect("write");

        match read_label_file(&path) {
            Err(LabelReconError::MalformedLabelFile { path: reported, .. }) => {
                assert_eq!(reported, path)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
