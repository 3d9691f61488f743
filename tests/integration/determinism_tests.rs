use std::path::Path;

use filetime::{set_file_mtime, FileTime};
use tempfile::tempdir;
use tunedupe::duplicates::{DetectMode, FinderConfig, ScanOutcome, ScanSummary};
use tunedupe::retention::{RetentionPlan, RetentionPlanner};
use tunedupe::scanner::FileEntry;

use super::support::{finder, finder_with, write_file};

fn library(root: &Path) {
    write_file(root, "a/x-song-100000.flac", &[1u8; 3000]);
    write_file(root, "b/x-song-100800.mp3", &[2u8; 900]);
    write_file(root, "c/x-song-100800.mp3", &[2u8; 900]);
    write_file(root, "d/y-other-50000.ogg", &[3u8; 500]);
    write_file(root, "e/y-other-53000.ogg", &[4u8; 500]);
    write_file(root, "f/untagged.wav", &[5u8; 700]);
}

fn plan_for(outcome: &ScanOutcome) -> RetentionPlan {
    RetentionPlanner::new(&outcome.records)
        .plan(&outcome.all_groups())
        .unwrap()
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = tempdir().unwrap();
    library(dir.path());

    let first = finder(DetectMode::Both).run(dir.path()).unwrap();
    let second = finder(DetectMode::Both).run(dir.path()).unwrap();

    assert_eq!(first.exact_groups, second.exact_groups);
    assert_eq!(first.fuzzy_groups, second.fuzzy_groups);
    assert_eq!(first.records, second.records);
    assert_eq!(first.summary.issues, second.summary.issues);
    assert_eq!(plan_for(&first), plan_for(&second));
}

#[test]
fn test_thread_count_does_not_change_result() {
    let dir = tempdir().unwrap();
    library(dir.path());

    let single = finder_with(FinderConfig::default().with_mode(DetectMode::Both))
        .run(dir.path())
        .unwrap();
    let many = tunedupe::duplicates::DuplicateFinder::new(
        FinderConfig::default()
            .with_mode(DetectMode::Both)
            .with_io_threads(8),
        std::sync::Arc::new(super::support::NameExtractor),
    )
    .unwrap()
    .run(dir.path())
    .unwrap();

    assert_eq!(single.all_groups(), many.all_groups());
    assert_eq!(plan_for(&single), plan_for(&many));
}

#[test]
fn test_modification_times_do_not_affect_keeper() {
    let dir = tempdir().unwrap();
    library(dir.path());
    let before = plan_for(&finder(DetectMode::Both).run(dir.path()).unwrap());

    // Make the copy that lost on path order the newest and the winner the oldest.
    set_file_mtime(
        dir.path().join("b/x-song-100800.mp3"),
        FileTime::from_unix_time(1_000_000, 0),
    )
    .unwrap();
    set_file_mtime(
        dir.path().join("c/x-song-100800.mp3"),
        FileTime::from_unix_time(2_000_000_000, 0),
    )
    .unwrap();
    let after = plan_for(&finder(DetectMode::Both).run(dir.path()).unwrap());

    assert_eq!(before, after);
}

#[test]
fn test_input_order_does_not_matter() {
    let dir = tempdir().unwrap();
    library(dir.path());
    let finder = finder(DetectMode::Both);

    let mut summary = ScanSummary::default();
    let mut files: Vec<FileEntry> = finder
        .collect_candidates(dir.path(), &mut summary)
        .unwrap();
    let forward = finder.run_on_files(files.clone(), ScanSummary::default()).unwrap();
    files.reverse();
    let backward = finder.run_on_files(files, ScanSummary::default()).unwrap();

    assert_eq!(forward.all_groups(), backward.all_groups());
    assert_eq!(forward.records, backward.records);
    assert_eq!(plan_for(&forward), plan_for(&backward));
}

#[test]
fn test_library_plan_shape() {
    let dir = tempdir().unwrap();
    library(dir.path());

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();
    let plan = plan_for(&outcome);

    // Exact: the two mp3 copies. Fuzzy: flac + both mp3s (high); the two
    // oggs are 3 s apart and do not match. The fuzzy group is left with the
    // flac and the exact keeper, which is protected, so it adds no deletions.
    assert_eq!(outcome.exact_groups.len(), 1);
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(outcome.fuzzy_groups[0].len(), 3);
    assert_eq!(plan.decisions.len(), 1);
    assert_eq!(plan.decisions[0].keeper.path, dir.path().join("b/x-song-100800.mp3"));
    assert_eq!(
        plan.decisions[0].deletion_paths().cloned().collect::<Vec<_>>(),
        vec![dir.path().join("c/x-song-100800.mp3")]
    );
    assert_eq!(plan.reclaimable(), 900);
}
