use std::fs;
use std::path::Path;

use tempfile::tempdir;

use tidyplex_core::{Error, OrganizeConfig, OrganizeMode, Organizer, SilentReporter};

const MB: usize = 1024 * 1024;

fn write_file(path: &Path, len: usize) {
    fs::write(path, vec![0u8; len]).unwrap();
}

/// Downloads landing zone used by most tests, with the minimum movie
/// size scaled down to 1 MB:
///   root/
///     Movie.A.mkv        (2 MB, qualifies)
///     Movie.A.srt        (small companion)
///     Show.S01E02.mkv    (2 MB, episodic name)
///     Sample.mkv         (64 KB, below minimum)
///     notes.txt          (not a video)
fn create_downloads_tree(root: &Path) {
    fs::create_dir_all(root).unwrap();
    write_file(&root.join("Movie.A.mkv"), 2 * MB);
    write_file(&root.join("Movie.A.srt"), 1234);
    write_file(&root.join("Show.S01E02.mkv"), 2 * MB);
    write_file(&root.join("Sample.mkv"), 64 * 1024);
    write_file(&root.join("notes.txt"), 10);
}

fn downloads_config(root: &Path) -> OrganizeConfig {
    OrganizeConfig {
        source_dir: Some(root.to_path_buf()),
        mode: OrganizeMode::Downloads,
        min_movie_size_mb: 1,
        ..OrganizeConfig::default()
    }
}

#[test]
fn test_qualifying_movie_moves_with_companion() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    create_downloads_tree(&root);

    let summary = Organizer::new(downloads_config(&root))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(summary.examined, 3, "three videos at the top level");
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.siblings_moved, 1);
    assert_eq!(summary.skipped_episodic, 1);
    assert_eq!(summary.skipped_small, 1);
    assert_eq!(summary.warnings, 0);

    // the movie and its subtitle landed in the per-title folder
    assert!(root.join("Movie.A").join("Movie.A.mkv").is_file());
    assert!(root.join("Movie.A").join("Movie.A.srt").is_file());
    assert!(!root.join("Movie.A.mkv").exists());
    assert!(!root.join("Movie.A.srt").exists());

    // everything else stayed put
    assert!(root.join("Show.S01E02.mkv").is_file());
    assert!(root.join("Sample.mkv").is_file());
    assert!(root.join("notes.txt").is_file());
}

#[test]
fn test_second_run_is_idempotent() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    create_downloads_tree(&root);

    let config = downloads_config(&root);
    Organizer::new(config.clone()).run(&SilentReporter).unwrap();
    let second = Organizer::new(config).run(&SilentReporter).unwrap();

    assert_eq!(second.moved, 0, "second run must not move anything");
    assert_eq!(second.siblings_moved, 0);
    assert_eq!(second.skipped_existing, 0);
    assert_eq!(second.warnings, 0);

    assert!(root.join("Movie.A").join("Movie.A.mkv").is_file());
    assert!(root.join("Show.S01E02.mkv").is_file());
    assert!(root.join("Sample.mkv").is_file());
}

#[test]
fn test_library_mode_folders_everything() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("movies");
    create_downloads_tree(&root);

    let config = OrganizeConfig {
        source_dir: Some(root.to_path_buf()),
        mode: OrganizeMode::Library,
        ..OrganizeConfig::default()
    };
    let summary = Organizer::new(config).run(&SilentReporter).unwrap();

    // no episodic or size filtering in library mode
    assert_eq!(summary.moved, 3);
    assert!(root.join("Movie.A").join("Movie.A.mkv").is_file());
    assert!(root.join("Show.S01E02").join("Show.S01E02.mkv").is_file());
    assert!(root.join("Sample").join("Sample.mkv").is_file());
    assert!(root.join("notes.txt").is_file(), "non-videos never move");
}

#[test]
fn test_movie_without_companions_moves_alone() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    fs::create_dir_all(&root).unwrap();
    write_file(&root.join("Movie.B.mkv"), 2 * MB);

    let summary = Organizer::new(downloads_config(&root))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(summary.moved, 1);
    assert_eq!(summary.siblings_moved, 0);
    assert!(root.join("Movie.B").join("Movie.B.mkv").is_file());
}

#[test]
fn test_companion_prefix_must_match_full_stem() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    fs::create_dir_all(&root).unwrap();
    write_file(&root.join("Movie.C.mkv"), 2 * MB);
    write_file(&root.join("Movie.C.en.srt"), 100);
    write_file(&root.join("Movie.C.nfo"), 100);
    // shares a prefix character-wise but not stem-wise
    write_file(&root.join("Movie.CC.mkv"), 64 * 1024);

    let summary = Organizer::new(downloads_config(&root))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(summary.moved, 1);
    assert_eq!(summary.siblings_moved, 2);
    assert!(root.join("Movie.C").join("Movie.C.en.srt").is_file());
    assert!(root.join("Movie.C").join("Movie.C.nfo").is_file());
    assert!(
        root.join("Movie.CC.mkv").is_file(),
        "Movie.CC is not a companion of Movie.C"
    );
}

#[test]
fn test_two_videos_sharing_a_stem_land_together() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    fs::create_dir_all(&root).unwrap();
    write_file(&root.join("Movie.D.mkv"), 2 * MB);
    write_file(&root.join("Movie.D.mp4"), 2 * MB);

    let summary = Organizer::new(downloads_config(&root))
        .run(&SilentReporter)
        .unwrap();

    // the second qualifies on its own but travels as a companion
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.siblings_moved, 1);
    assert!(root.join("Movie.D").join("Movie.D.mkv").is_file());
    assert!(root.join("Movie.D").join("Movie.D.mp4").is_file());
}

#[test]
fn test_occupied_destination_is_skipped_with_warning() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    fs::create_dir_all(root.join("Movie.A")).unwrap();
    write_file(&root.join("Movie.A").join("Movie.A.mkv"), 10);
    write_file(&root.join("Movie.A.mkv"), 2 * MB);

    let summary = Organizer::new(downloads_config(&root))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(summary.moved, 0);
    assert_eq!(summary.skipped_existing, 1);
    assert!(summary.has_warnings());

    // neither file was touched
    assert!(root.join("Movie.A.mkv").is_file());
    assert_eq!(
        fs::metadata(root.join("Movie.A").join("Movie.A.mkv"))
            .unwrap()
            .len(),
        10
    );
}

#[test]
fn test_extra_episode_pattern_extends_filter() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    fs::create_dir_all(&root).unwrap();
    write_file(&root.join("Some.Anime.OVA.2.mkv"), 2 * MB);

    let config = OrganizeConfig {
        extra_episode_patterns: vec![r"(?i)\bOVA\b".to_string()],
        ..downloads_config(&root)
    };
    let summary = Organizer::new(config).run(&SilentReporter).unwrap();

    assert_eq!(summary.skipped_episodic, 1);
    assert!(root.join("Some.Anime.OVA.2.mkv").is_file());
}

#[test]
fn test_missing_source_dir_is_fatal() {
    let config = OrganizeConfig::default();
    let result = Organizer::new(config).run(&SilentReporter);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_source_pointing_at_file_is_fatal() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("not_a_dir");
    fs::write(&file, b"x").unwrap();

    let config = OrganizeConfig {
        source_dir: Some(file),
        ..OrganizeConfig::default()
    };
    let result = Organizer::new(config).run(&SilentReporter);
    assert!(matches!(result, Err(Error::InvalidPath { .. })));
}

#[test]
fn test_bad_extra_pattern_is_fatal_before_any_move() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("downloads");
    fs::create_dir_all(&root).unwrap();
    write_file(&root.join("Movie.E.mkv"), 2 * MB);

    let config = OrganizeConfig {
        extra_episode_patterns: vec!["[unclosed".to_string()],
        ..downloads_config(&root)
    };
    let result = Organizer::new(config).run(&SilentReporter);

    assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    assert!(root.join("Movie.E.mkv").is_file(), "nothing may move");
}
