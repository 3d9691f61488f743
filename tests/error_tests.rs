use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tempfile::tempdir;
use tunedupe::actions::{execute_plan, ExecutionConfig};
use tunedupe::duplicates::{
    DetectMode, DuplicateFinder, DuplicateGroup, FinderConfig, FinderError, GroupMember, IssueKind,
    ScanSummary,
};
use tunedupe::error::{ExitCode, StructuredError};
use tunedupe::metadata::{ExtractError, Extraction, MetadataExtractor, MetadataRecord};
use tunedupe::retention::{PlanError, RetentionPlanner};

/// Tags every file as the same song, with failures chosen by file stem.
///
/// - `broken*`: unreadable container
/// - `slow*`: probe timed out, record still produced without duration
struct ScriptedExtractor;

impl MetadataExtractor for ScriptedExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let size = fs::metadata(path)
            .map_err(|e| ExtractError::io(path, e))?
            .len();
        let stem = path.file_stem().unwrap().to_string_lossy().to_string();
        if stem.starts_with("broken") {
            return Err(ExtractError::Unsupported {
                path: path.to_path_buf(),
                reason: "no audio frames".to_string(),
            });
        }
        let mut record = MetadataRecord::new(path, size)
            .with_artist("Band")
            .with_title("Song");
        if stem.starts_with("slow") {
            return Ok(Extraction {
                record,
                warnings: vec![ExtractError::Timeout {
                    path: path.to_path_buf(),
                    timeout: Duration::from_secs(10),
                }],
            });
        }
        record = record.with_duration_ms(180_000);
        Ok(Extraction::clean(record))
    }
}

fn finder(mode: DetectMode) -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default().with_mode(mode).with_io_threads(2),
        Arc::new(ScriptedExtractor),
    )
    .unwrap()
}

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_scan_non_existent_path() {
    let result = finder(DetectMode::Exact).run(Path::new("/non/existent/path/12345"));

    match result {
        Err(FinderError::PathNotFound(path)) => {
            assert!(path.to_string_lossy().contains("non/existent/path/12345"));
        }
        other => panic!("Expected PathNotFound error, got {other:?}"),
    }
}

#[test]
fn test_vanished_file_is_reported_and_batch_continues() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mp3", b"identical");
    write(dir.path(), "b.mp3", b"identical");
    let c = write(dir.path(), "c.mp3", b"identical");

    let finder = finder(DetectMode::Exact);
    let mut summary = ScanSummary::default();
    let files = finder.collect_candidates(dir.path(), &mut summary).unwrap();
    fs::remove_file(&c).unwrap();
    let outcome = finder.run_on_files(files, summary).unwrap();

    assert_eq!(outcome.exact_groups.len(), 1);
    assert_eq!(outcome.exact_groups[0].len(), 2);
    assert_eq!(outcome.summary.issues.len(), 1);
    assert_eq!(outcome.summary.issues[0].path, c);
    assert_eq!(outcome.summary.issues[0].kind, IssueKind::Io);
    assert!(outcome.summary.has_skipped_files());
}

#[test]
fn test_unreadable_file_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    write(dir.path(), "good.flac", b"one");
    write(dir.path(), "good.mp3", b"two!");
    let broken = write(dir.path(), "broken.ogg", b"three");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(outcome.fuzzy_groups[0].len(), 2);
    let issue = &outcome.summary.issues[0];
    assert_eq!(issue.path, broken);
    assert_eq!(issue.kind, IssueKind::Unreadable);
    assert!(issue.reason.contains("no audio frames"));
}

#[test]
fn test_probe_timeout_keeps_record_as_low_confidence() {
    let dir = tempdir().unwrap();
    write(dir.path(), "good.flac", b"one");
    let slow = write(dir.path(), "slow.mp3", b"two!");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.summary.issue_count(IssueKind::ExtractionTimeout), 1);
    assert!(outcome.summary.issues.iter().any(|i| i.path == slow));
    // The missing duration makes the match reviewable only.
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert!(!outcome.fuzzy_groups[0].is_high_confidence());
}

#[test]
fn test_interrupt_maps_to_exit_code() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mp3", b"same");
    write(dir.path(), "b.mp3", b"same");

    let finder = DuplicateFinder::new(
        FinderConfig::default().with_shutdown_flag(Arc::new(AtomicBool::new(true))),
        Arc::new(ScriptedExtractor),
    )
    .unwrap();
    let err = finder
        .run(dir.path())
        .context("Failed to scan")
        .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    let structured = StructuredError::new(&err, ExitCode::for_error(&err));
    assert_eq!(structured.code, "TD130");
    assert_eq!(structured.exit_code, 130);
    assert!(structured.interrupted);
    assert!(structured.message.starts_with("Failed to scan"));
}

#[test]
fn test_execution_continues_after_failure() {
    let dir = tempdir().unwrap();
    let a1 = write(dir.path(), "a1.mp3", b"first pair");
    let a2 = write(dir.path(), "a2.mp3", b"first pair");
    let b1 = write(dir.path(), "b1.mp3", b"second pair!");
    let b2 = write(dir.path(), "b2.mp3", b"second pair!");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();
    let plan = RetentionPlanner::new(&outcome.records)
        .plan(&outcome.all_groups())
        .unwrap();
    assert_eq!(plan.deletion_count(), 2);

    // First deletion target vanishes before execution.
    fs::remove_file(&a2).unwrap();
    let report = execute_plan(&plan, &ExecutionConfig::execute(true)).unwrap();

    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failures[0].path, a2);
    assert_eq!(report.deleted, vec![b2.clone()]);
    assert!(a1.exists());
    assert!(b1.exists());
    assert!(!b2.exists());
}

#[test]
fn test_unsafe_plan_is_rejected_before_any_deletion() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.mp3", b"copy");
    let b = write(dir.path(), "b.mp3", b"copy");

    let records = vec![MetadataRecord::new(&a, 4), MetadataRecord::new(&b, 4)];
    let group = DuplicateGroup::exact(
        [9; 32],
        vec![GroupMember::new(&a, 4), GroupMember::new(&b, 4)],
    );
    let mut plan = RetentionPlanner::new(&records).plan(&[group]).unwrap();
    // Corrupt the plan: schedule the keeper for deletion too.
    let keeper = plan.decisions[0].keeper.clone();
    plan.decisions[0].deletions.push(keeper);

    let err = execute_plan(&plan, &ExecutionConfig::execute(true)).unwrap_err();

    assert!(matches!(err, PlanError::InvariantViolation(_)));
    assert!(a.exists());
    assert!(b.exists());
}
