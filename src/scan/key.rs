//! Identifier newtype used to correlate images across folders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The identifier of a logical image: its file name without directory or
/// extension.
///
/// Two files with the same key in different folders are treated as the same
/// image, and an image and a label file with the same key belong together.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageKey(String);

impl ImageKey {
    /// Creates a new key from an already-stripped name.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derives the key of a file path, or `None` if the path has no file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .map(|stem| Self(stem.to_string_lossy().into_owned()))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageKey({:?})", self.0)
    }
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directory_and_extension() {
        let key = ImageKey::from_path(Path::new("scratch/line_a/img_001.bmp"));
        assert_eq!(key, Some(ImageKey::new("img_001")));
    }

    #[test]
    fn keeps_inner_dots() {
        let key = ImageKey::from_path(Path::new("cam.left.0001.json"));
        assert_eq!(key.as_ref().map(ImageKey::as_str), Some("cam.left.0001"));
    }

    #[test]
    fn orders_lexicographically() {
        assert!(ImageKey::from("img10") < ImageKey::from("img2"));
        assert!(ImageKey::from("a") < ImageKey::from("b"));
    }
}
