use tempfile::tempdir;
use tunedupe::duplicates::{DetectMode, FinderConfig, FinderError, MatchStrategy};
use tunedupe::scanner::WalkerConfig;

use super::support::{file_names, finder, finder_with, write_file};

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let outcome = finder(DetectMode::Both).run(dir.path()).unwrap();

    assert!(outcome.all_groups().is_empty());
    assert_eq!(outcome.summary.total_files, 0);
    assert!(outcome.summary.issues.is_empty());
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.mp3", b"content a");
    write_file(dir.path(), "b.mp3", b"content bb");
    write_file(dir.path(), "c.flac", b"content ccc");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    assert!(outcome.exact_groups.is_empty());
    assert_eq!(outcome.summary.total_files, 3);
    assert_eq!(outcome.summary.eliminated_by_size, 3);
}

#[test]
fn test_scan_exact_duplicates_nested() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "album/01.flac", b"identical audio");
    write_file(dir.path(), "backup/album/01.flac", b"identical audio");
    write_file(dir.path(), "album/02.flac", b"something else!");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    assert_eq!(outcome.exact_groups.len(), 1);
    let group = &outcome.exact_groups[0];
    assert_eq!(group.strategy, MatchStrategy::Exact);
    assert!(group.is_high_confidence());
    assert!(group.digest.is_some());
    assert_eq!(
        group.paths(),
        vec![
            dir.path().join("album/01.flac"),
            dir.path().join("backup/album/01.flac"),
        ]
    );
}

#[test]
fn test_scan_non_recursive() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.mp3", b"same bytes");
    write_file(dir.path(), "sub/b.mp3", b"same bytes");

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_recursive(false));
    let outcome = finder_with(config).run(dir.path()).unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert!(outcome.exact_groups.is_empty());
}

#[test]
fn test_scan_ignores_non_audio_files() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "song.mp3", b"same bytes");
    write_file(dir.path(), "notes.txt", b"same bytes");
    write_file(dir.path(), "cover.jpg", b"same bytes");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert!(outcome.exact_groups.is_empty());
}

#[test]
fn test_scan_extension_case_insensitive() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.MP3", b"same bytes");
    write_file(dir.path(), "b.Flac", b"same bytes");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    assert_eq!(outcome.summary.total_files, 2);
    assert_eq!(outcome.exact_groups.len(), 1);
}

#[test]
fn test_scan_min_size_filter() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "small1.mp3", b"tiny");
    write_file(dir.path(), "small2.mp3", b"tiny");
    write_file(dir.path(), "big1.mp3", &[7u8; 2048]);
    write_file(dir.path(), "big2.mp3", &[7u8; 2048]);

    let config = FinderConfig::default()
        .with_walker_config(WalkerConfig::default().with_min_size(Some(1024)));
    let outcome = finder_with(config).run(dir.path()).unwrap();

    assert_eq!(outcome.summary.total_files, 2);
    assert_eq!(outcome.exact_groups.len(), 1);
    assert_eq!(
        file_names(outcome.exact_groups[0].paths()),
        vec!["big1.mp3", "big2.mp3"]
    );
}

#[test]
fn test_scan_empty_files_never_grouped() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.mp3", b"");
    write_file(dir.path(), "b.mp3", b"");

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    assert!(outcome.exact_groups.is_empty());
    assert_eq!(outcome.summary.empty_files, 2);
}

#[test]
fn test_scan_large_files_differing_in_middle() {
    let dir = tempdir().unwrap();
    let mut content = vec![0u8; 256 * 1024];
    write_file(dir.path(), "a.wav", &content);
    content[128 * 1024] = 0xff;
    write_file(dir.path(), "b.wav", &content);

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    // Quick hash collides, full hash tells them apart.
    assert!(outcome.exact_groups.is_empty());
    assert_eq!(outcome.summary.eliminated_by_quickhash, 0);
    assert_eq!(outcome.summary.fully_hashed, 2);
}

#[test]
fn test_scan_single_file_root() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "only.mp3", b"alone");

    let outcome = finder(DetectMode::Both).run(&file).unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert!(outcome.all_groups().is_empty());
}

#[test]
fn test_scan_missing_root() {
    let dir = tempdir().unwrap();
    let result = finder(DetectMode::Exact).run(&dir.path().join("nope"));
    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_exact_group_for_three_copies() {
    let dir = tempdir().unwrap();
    for name in ["c.mp3", "a.mp3", "b.mp3"] {
        write_file(dir.path(), name, b"three copies");
    }

    let outcome = finder(DetectMode::Exact).run(dir.path()).unwrap();

    assert_eq!(outcome.exact_groups.len(), 1);
    assert_eq!(
        file_names(outcome.exact_groups[0].paths()),
        vec!["a.mp3", "b.mp3", "c.mp3"]
    );
}
