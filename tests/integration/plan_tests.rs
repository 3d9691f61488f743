use std::fs;

use tempfile::tempdir;
use tunedupe::actions::{execute_plan, ExecutionConfig, ExecutionMode};
use tunedupe::duplicates::{DetectMode, ScanOutcome};
use tunedupe::retention::{DecidingCriterion, RetentionPlan, RetentionPlanner};
use tunedupe::{exit_code_for, error::ExitCode};

use super::support::{file_names, finder, write_file};

fn plan(outcome: &ScanOutcome) -> RetentionPlan {
    RetentionPlanner::new(&outcome.records)
        .plan(&outcome.all_groups())
        .unwrap()
}

#[test]
fn test_fuzzy_plan_keeps_lossless_copy() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "band-song-200000.mp3", &[1u8; 4000]);
    write_file(dir.path(), "band-song-200400.flac", &[2u8; 1000]);

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();
    let plan = plan(&outcome);

    assert_eq!(plan.decisions.len(), 1);
    let decision = &plan.decisions[0];
    assert_eq!(file_names([decision.keeper.path.clone()]), vec!["band-song-200400.flac"]);
    assert_eq!(decision.criterion, DecidingCriterion::FormatTier);
    assert_eq!(plan.deletion_count(), 1);
    // The smaller lossless file wins; its larger lossy twin is reclaimed.
    assert_eq!(plan.reclaimable(), 4000);
}

#[test]
fn test_exact_plan_keeps_first_path() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "b.mp3", b"copy");
    write_file(dir.path(), "a.mp3", b"copy");
    write_file(dir.path(), "c.mp3", b"copy");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();
    let plan = plan(&outcome);

    let decision = &plan.decisions[0];
    assert_eq!(decision.keeper.path, dir.path().join("a.mp3"));
    assert_eq!(decision.criterion, DecidingCriterion::PathOrder);
    assert_eq!(
        file_names(decision.deletion_paths().cloned()),
        vec!["b.mp3", "c.mp3"]
    );
}

#[test]
fn test_simulation_leaves_files_in_place() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.mp3", b"duplicate");
    let b = write_file(dir.path(), "b.mp3", b"duplicate");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();
    let plan = plan(&outcome);
    let report = execute_plan(&plan, &ExecutionConfig::simulate()).unwrap();

    assert_eq!(report.mode, ExecutionMode::Simulate);
    assert_eq!(report.simulated, vec![b.clone()]);
    assert!(report.deleted.is_empty());
    assert_eq!(report.bytes_freed, 9);
    assert!(a.exists());
    assert!(b.exists());
    assert_eq!(exit_code_for(&outcome, &plan, &report), ExitCode::Success);
}

#[test]
fn test_execution_deletes_only_planned_files() {
    let dir = tempdir().unwrap();
    let keep = write_file(dir.path(), "x-tune-1000.flac", b"lossless copy");
    let lossy = write_file(dir.path(), "x-tune-1000.mp3", b"lossy");
    let unrelated = write_file(dir.path(), "y-other-1000.mp3", b"other");

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();
    let plan = plan(&outcome);
    let report = execute_plan(&plan, &ExecutionConfig::execute(true)).unwrap();

    assert!(report.all_succeeded());
    assert_eq!(report.deleted, vec![lossy.clone()]);
    assert!(keep.exists());
    assert!(!lossy.exists());
    assert!(unrelated.exists());
}

#[test]
fn test_low_confidence_groups_are_never_deleted() {
    let dir = tempdir().unwrap();
    let files = [
        write_file(dir.path(), "x-drift-100000.mp3", b"1"),
        write_file(dir.path(), "x-drift-101500.flac", b"22"),
        write_file(dir.path(), "x-drift-103000.ogg", b"333"),
    ];

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();
    let plan = plan(&outcome);

    assert!(plan.decisions.is_empty());
    assert_eq!(plan.review.len(), 1);

    let report = execute_plan(&plan, &ExecutionConfig::execute(true)).unwrap();
    assert_eq!(report.success_count(), 0);
    assert!(files.iter().all(|f| f.exists()));
}

#[test]
fn test_exact_keeper_survives_fuzzy_group() {
    let dir = tempdir().unwrap();
    let copy = write_file(dir.path(), "copy/x-song-1000.mp3", b"mp3 bytes");
    let original = write_file(dir.path(), "x-song-1000.mp3", b"mp3 bytes");
    let flac = write_file(dir.path(), "x-song-1500.flac", b"flac bytes, longer");

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();
    let plan = plan(&outcome);

    // The exact group removes one mp3. The fuzzy group then holds the flac
    // and the exact keeper, which is protected, so nothing more is deleted.
    assert_eq!(plan.decisions.len(), 1);
    assert_eq!(plan.decisions[0].keeper.path, copy);
    let deletions: Vec<_> = plan.decisions[0].deletion_paths().cloned().collect();
    assert_eq!(deletions, vec![original]);
    assert!(!deletions.contains(&flac));
    plan.validate().unwrap();
}

#[test]
fn test_lossless_copy_and_transcode_scenario() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a/band-song-200000.flac", &[7u8; 1000]);
    let b = write_file(dir.path(), "b/band-song-200900.mp3", &[3u8; 300]);
    let c = write_file(dir.path(), "c/band-song-200000.flac", &[7u8; 1000]);

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();
    assert_eq!(outcome.exact_groups.len(), 1);
    assert_eq!(outcome.exact_groups[0].paths(), vec![a.clone(), c.clone()]);

    let plan = plan(&outcome);
    plan.validate().unwrap();
    let keepers: Vec<_> = plan.decisions.iter().map(|d| d.keeper.path.clone()).collect();
    assert!(keepers.iter().all(|k| *k == a));
    let mut deletions: Vec<_> = plan
        .decisions
        .iter()
        .flat_map(|d| d.deletion_paths().cloned())
        .collect();
    deletions.sort();
    assert_eq!(deletions, vec![b, c]);
}

#[test]
fn test_modified_file_is_not_deleted() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.mp3", b"duplicate");
    let b = write_file(dir.path(), "b.mp3", b"duplicate");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();
    let plan = plan(&outcome);
    fs::write(&b, b"rewritten since the scan").unwrap();

    let report = execute_plan(&plan, &ExecutionConfig::execute(true)).unwrap();

    assert_eq!(report.failure_count(), 1);
    assert!(b.exists());
    assert_eq!(exit_code_for(&outcome, &plan, &report), ExitCode::PartialSuccess);
}

#[test]
fn test_missing_keeper_blocks_deletion() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.mp3", b"duplicate");
    let b = write_file(dir.path(), "b.mp3", b"duplicate");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();
    let plan = plan(&outcome);
    fs::remove_file(&a).unwrap();

    let report = execute_plan(&plan, &ExecutionConfig::execute(true)).unwrap();

    assert_eq!(report.failure_count(), 1);
    assert!(report.failures[0].reason.contains("a.mp3"));
    assert!(b.exists());
}

#[test]
fn test_no_duplicates_exit_code() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.mp3", b"one");
    write_file(dir.path(), "b.mp3", b"four");

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();
    let plan = plan(&outcome);
    let report = execute_plan(&plan, &ExecutionConfig::simulate()).unwrap();

    assert!(plan.is_empty());
    assert_eq!(exit_code_for(&outcome, &plan, &report), ExitCode::NoDuplicates);
}
