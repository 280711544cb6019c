#![allow(dead_code)]

use std::collections::BTreeMap;

use labelrecon::scan::FolderClassification;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// The listing of one folder: image key -> has a label file.
pub type Listing = BTreeMap<String, bool>;

pub fn arb_key() -> impl Strategy<Value = String> {
    "[a-z]{1,3}[0-9]{0,2}"
}

pub fn arb_listing(max_images: usize) -> impl Strategy<Value = Listing> {
    prop::collection::btree_map(arb_key(), any::<bool>(), 0..=max_images)
}

pub fn arb_listings(max_folders: usize, max_images: usize) -> impl Strategy<Value = Vec<Listing>> {
    prop::collection::vec(arb_listing(max_images), 1..=max_folders)
}

/// Builds a classification as if the listing had been found on disk.
pub fn classification(root: &str, listing: &Listing) -> FolderClassification {
    classification_ordered(root, listing.iter().collect())
}

/// Like [`classification`], but lists files in the given order.
pub fn classification_ordered(root: &str, entries: Vec<(&String, &bool)>) -> FolderClassification {
    let images: Vec<String> = entries
        .iter()
        .map(|(key, _)| format!("{root}/img/{key}.bmp"))
        .collect();
    let labels: Vec<String> = entries
        .iter()
        .filter(|(_, labelled)| **labelled)
        .map(|(key, _)| format!("{root}/ann/{key}.json"))
        .collect();
    FolderClassification::from_files(root, &images, &labels)
}
