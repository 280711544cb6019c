use std::collections::BTreeSet;

use labelrecon::emit::RowFilter;
use labelrecon::reconcile::{reconcile_classifications, AbsentPolicy, GroupTable};
use labelrecon::scan::{FolderClassification, ImageKey, LabelStatus};
use proptest::prelude::*;

mod proptest_helpers;
use proptest_helpers::{arb_listing, arb_listings, classification, classification_ordered};

fn classify_all(listings: &[proptest_helpers::Listing]) -> Vec<FolderClassification> {
    listings
        .iter()
        .enumerate()
        .map(|(idx, listing)| classification(&format!("f{idx}"), listing))
        .collect()
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn folder_copies_never_conflict(listing in arb_listing(12), copies in 1usize..5) {
        let folders: Vec<_> = (0..copies)
            .map(|idx| classification(&format!("copy{idx}"), &listing))
            .collect();

        let rows = reconcile_classifications(&folders, AbsentPolicy::Conflict);
        prop_assert_eq!(rows.len(), listing.len());
        prop_assert!(rows.iter().all(|row| !row.conflict));
    }

    #[test]
    fn every_key_appears_exactly_once(listings in arb_listings(4, 10)) {
        let folders = classify_all(&listings);
        let rows = reconcile_classifications(&folders, AbsentPolicy::Conflict);

        let expected: BTreeSet<&str> = listings
            .iter()
            .flat_map(|listing| listing.keys().map(String::as_str))
            .collect();
        let keys: Vec<&str> = rows.iter().map(|row| row.key.as_str()).collect();
        prop_assert_eq!(keys, expected.into_iter().collect::<Vec<_>>());

        for row in &rows {
            prop_assert_eq!(row.statuses.len(), folders.len());
        }
    }

    #[test]
    fn key_in_only_one_folder_is_a_conflict(
        listings in arb_listings(4, 8).prop_filter("need two folders", |l| l.len() >= 2),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut listings = listings;
        let target = pick.index(listings.len());
        listings[target].insert("only_here".to_string(), false);

        let folders = classify_all(&listings);
        let rows = reconcile_classifications(&folders, AbsentPolicy::Conflict);
        let row = rows
            .iter()
            .find(|row| row.key == ImageKey::from("only_here"))
            .expect("row present");

        prop_assert!(row.conflict);
        prop_assert_eq!(row.statuses[target], LabelStatus::Unlabelled);
    }

    #[test]
    fn conflict_flag_ignores_listing_order(listings in arb_listings(3, 10)) {
        let forward = classify_all(&listings);
        let reversed: Vec<FolderClassification> = listings
            .iter()
            .enumerate()
            .map(|(idx, listing)| {
                classification_ordered(&format!("f{idx}"), listing.iter().rev().collect())
            })
            .collect();

        prop_assert_eq!(
            reconcile_classifications(&forward, AbsentPolicy::Conflict),
            reconcile_classifications(&reversed, AbsentPolicy::Conflict)
        );
    }

    #[test]
    fn conflicts_only_is_exactly_the_flagged_rows(listings in arb_listings(4, 10)) {
        let folders = classify_all(&listings);
        let table = GroupTable {
            name: None,
            columns: (0..folders.len()).map(|idx| format!("f{idx}")).collect(),
            folders: folders.iter().map(|f| f.root().to_path_buf()).collect(),
            rows: reconcile_classifications(&folders, AbsentPolicy::Conflict),
        };

        let all: Vec<_> = table.rows.iter().filter(|row| RowFilter::All.keeps(row)).collect();
        let conflicts: Vec<_> = table
            .rows
            .iter()
            .filter(|row| RowFilter::ConflictsOnly.keeps(row))
            .collect();

        prop_assert_eq!(all.len(), table.rows.len());
        prop_assert_eq!(conflicts.len(), table.conflict_count());
        prop_assert!(conflicts.iter().all(|row| row.conflict && all.contains(row)));
    }

    #[test]
    fn ignore_policy_never_adds_conflicts(listings in arb_listings(4, 10)) {
        let folders = classify_all(&listings);
        let strict = reconcile_classifications(&folders, AbsentPolicy::Conflict);
        let lenient = reconcile_classifications(&folders, AbsentPolicy::Ignore);

        for (s, l) in strict.iter().zip(&lenient) {
            prop_assert!(s.conflict || !l.conflict);
        }
    }
}
