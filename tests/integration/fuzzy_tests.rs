use tempfile::tempdir;
use tunedupe::duplicates::{
    Confidence, DetectMode, FinderConfig, FuzzyConfig, IssueKind, MatchStrategy,
};

use super::support::{file_names, finder, finder_with, write_file};

#[test]
fn test_fuzzy_matches_across_formats_and_spelling() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "Beyoncé-Halo-261000.flac", b"lossless bytes");
    write_file(dir.path(), "BEYONCE-halo-260500.mp3", b"lossy");
    write_file(dir.path(), "Beyonce-Halo (Live)-262000.ogg", b"different song");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert_eq!(outcome.fuzzy_groups.len(), 1);
    let group = &outcome.fuzzy_groups[0];
    assert_eq!(group.strategy, MatchStrategy::Fuzzy);
    assert_eq!(group.confidence, Confidence::High);
    assert!(group.digest.is_none());
    assert_eq!(
        file_names(group.paths()),
        vec!["BEYONCE-halo-260500.mp3", "Beyoncé-Halo-261000.flac"]
    );
}

#[test]
fn test_fuzzy_tolerance_is_inclusive() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a-song-100000.mp3", b"1");
    write_file(dir.path(), "a-song-102000.flac", b"22");
    write_file(dir.path(), "b-song-100000.mp3", b"333");
    write_file(dir.path(), "b-song-102001.flac", b"4444");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(
        file_names(outcome.fuzzy_groups[0].paths()),
        vec!["a-song-100000.mp3", "a-song-102000.flac"]
    );
}

#[test]
fn test_fuzzy_custom_tolerance() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a-song-100000.mp3", b"1");
    write_file(dir.path(), "a-song-104000.flac", b"22");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();
    assert!(outcome.fuzzy_groups.is_empty());

    let config = FinderConfig::default()
        .with_mode(DetectMode::Fuzzy)
        .with_fuzzy_config(FuzzyConfig::default().with_tolerance_ms(5_000));
    let outcome = finder_with(config).run(dir.path()).unwrap();
    assert_eq!(outcome.fuzzy_groups.len(), 1);
}

#[test]
fn test_fuzzy_chain_drift_is_low_confidence() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x-drift-100000.mp3", b"1");
    write_file(dir.path(), "x-drift-101500.mp3", b"22");
    write_file(dir.path(), "x-drift-103000.mp3", b"333");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(outcome.fuzzy_groups[0].len(), 3);
    assert_eq!(outcome.fuzzy_groups[0].confidence, Confidence::Low);
    assert_eq!(outcome.summary.low_confidence_groups, 1);
    assert_eq!(outcome.summary.issue_count(IssueKind::NeedsReview), 3);
}

#[test]
fn test_fuzzy_untagged_files_are_unmatchable() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "track01.mp3", b"1");
    write_file(dir.path(), "track01.flac", b"22");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert!(outcome.fuzzy_groups.is_empty());
    assert_eq!(outcome.summary.issue_count(IssueKind::Unmatchable), 2);
    // Unmatchable files are reported, not skipped.
    assert!(!outcome.summary.has_skipped_files());
}

#[test]
fn test_fuzzy_mode_skips_hashing() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.mp3", b"same");
    write_file(dir.path(), "b.mp3", b"same");

    let outcome = finder(DetectMode::Fuzzy).run(dir.path()).unwrap();

    assert!(outcome.exact_groups.is_empty());
    assert_eq!(outcome.summary.fully_hashed, 0);
    assert_eq!(outcome.summary.records_extracted, 2);
}

#[test]
fn test_both_mode_reports_each_strategy() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x-song-1000.mp3", b"mp3 bytes");
    write_file(dir.path(), "copy/x-song-1000.mp3", b"mp3 bytes");
    write_file(dir.path(), "x-song-1500.flac", b"flac bytes, longer");

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();

    assert_eq!(outcome.exact_groups.len(), 1);
    assert_eq!(outcome.exact_groups[0].len(), 2);
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(outcome.fuzzy_groups[0].len(), 3);

    let all = outcome.all_groups();
    assert_eq!(all[0].strategy, MatchStrategy::Exact);
    assert_eq!(all[1].strategy, MatchStrategy::Fuzzy);
}

#[test]
fn test_merge_exact_groups_links_whole_group() {
    let dir = tempdir().unwrap();
    // The copy carries no usable tags, so only the merge links it.
    write_file(dir.path(), "x-song-1000.mp3", b"mp3 bytes");
    write_file(dir.path(), "renamed copy.mp3", b"mp3 bytes");
    write_file(dir.path(), "x-song-1200.flac", b"flac bytes, longer");

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(outcome.fuzzy_groups[0].len(), 2);

    let config = FinderConfig::default()
        .with_mode(DetectMode::Both)
        .with_fuzzy_config(FuzzyConfig::default().with_merge_exact_groups(true));
    let outcome = finder_with(config).run(dir.path()).unwrap();
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(
        file_names(outcome.fuzzy_groups[0].paths()),
        vec!["renamed copy.mp3", "x-song-1000.mp3", "x-song-1200.flac"]
    );
    assert_eq!(outcome.summary.issue_count(IssueKind::Unmatchable), 0);
}

#[test]
fn test_merge_exact_groups_in_fuzzy_mode() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x-song-1000.mp3", b"mp3 bytes");
    write_file(dir.path(), "renamed copy.mp3", b"mp3 bytes");
    write_file(dir.path(), "x-song-1200.flac", b"flac bytes, longer");

    let config = FinderConfig::default()
        .with_mode(DetectMode::Fuzzy)
        .with_fuzzy_config(FuzzyConfig::default().with_merge_exact_groups(true));
    let outcome = finder_with(config).run(dir.path()).unwrap();

    // The byte copy is linked, but exact groups are not reported on their own.
    assert!(outcome.exact_groups.is_empty());
    assert_eq!(outcome.summary.exact_groups, 0);
    assert_eq!(outcome.fuzzy_groups.len(), 1);
    assert_eq!(
        file_names(outcome.fuzzy_groups[0].paths()),
        vec!["renamed copy.mp3", "x-song-1000.mp3", "x-song-1200.flac"]
    );
    assert_eq!(outcome.summary.issue_count(IssueKind::Unmatchable), 0);
}
