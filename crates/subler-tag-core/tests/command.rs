use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use subler_tag_core::{Atoms, MediaKind, Subler, SublerError, Tag};
use tempfile::{tempdir, TempDir};

fn write_source(name: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, b"not really a movie").unwrap();
    (dir, path)
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> &'a str {
    let idx = args.iter().position(|arg| arg == flag).unwrap();
    &args[idx + 1]
}

fn plain(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

#[test]
fn assembles_arguments_in_wire_order() {
    let (dir, source) = write_source("movie.mp4");
    let dest = dir.path().join("tagged.mp4");

    let command = Subler::new(&source, Atoms::new().cast("John Doe"))
        .dest(&dest)
        .executable("/opt/SublerCLI")
        .build_command()
        .unwrap();

    assert_eq!(command.executable, PathBuf::from("/opt/SublerCLI"));
    assert_eq!(
        command.args,
        vec![
            "-source".to_string(),
            plain(&source),
            "-dest".to_string(),
            plain(&dest),
            "-metadata".to_string(),
            "{'Cast':'John Doe'}{'Media Kind':'Movie'}".to_string(),
            "-chapterspreview".to_string(),
            "-optimize".to_string(),
            "-organizegroups".to_string(),
            "-64bitchunk".to_string(),
        ]
    );
}

#[test]
fn empty_metadata_emits_no_metadata_flag() {
    let (_dir, source) = write_source("movie.mp4");

    let command = Subler::new(&source, Atoms::new())
        .clear_media_kind()
        .build_command()
        .unwrap();

    assert!(!command.args.iter().any(|arg| arg == "-metadata"));
}

#[test]
fn escapes_apostrophes_in_metadata() {
    let (_dir, source) = write_source("movie.mp4");

    let command = Subler::new(&source, Atoms::new().add(Tag::Cast, "John's Doe"))
        .clear_media_kind()
        .build_command()
        .unwrap();

    assert_eq!(arg_after(&command.args, "-metadata"), r"{'Cast':'John\'s Doe'}");
}

#[test]
fn escapes_destination_specials() {
    let (dir, source) = write_source("movie.mp4");

    let command = Subler::new(&source, Atoms::new())
        .dest(dir.path().join("dest & path"))
        .build_command()
        .unwrap();
    assert!(arg_after(&command.args, "-dest").ends_with(r"/dest\ \&\ path"));

    let command = Subler::new(&source, Atoms::new())
        .dest(dir.path().join("dest's path"))
        .build_command()
        .unwrap();
    assert!(arg_after(&command.args, "-dest").ends_with(r"/dest\'s\ path"));
}

#[test]
fn escapes_source_path() {
    let (_dir, source) = write_source("my movie.mp4");

    let command = Subler::new(&source, Atoms::new()).build_command().unwrap();

    assert!(arg_after(&command.args, "-source").ends_with(r"/my\ movie.mp4"));
    assert!(arg_after(&command.args, "-dest").ends_with(r"/my\ movie.0.mp4"));
}

#[test]
fn disabled_flags_are_omitted() {
    let (_dir, source) = write_source("movie.mp4");

    let command = Subler::new(&source, Atoms::new())
        .optimize(false)
        .chunk_64bit(false)
        .build_command()
        .unwrap();

    let switches: Vec<&str> = command.args[6..].iter().map(String::as_str).collect();
    assert_eq!(switches, vec!["-chapterspreview", "-organizegroups"]);
}

#[test]
fn media_kind_is_rendered_last() {
    let (_dir, source) = write_source("episode.m4v");

    let command = Subler::new(&source, Atoms::new().tv_show("Show").tv_season("2"))
        .media_kind(MediaKind::TvShow)
        .build_command()
        .unwrap();

    assert_eq!(
        arg_after(&command.args, "-metadata"),
        "{'TV Show':'Show'}{'TV Season':'2'}{'Media Kind':'TV Show'}"
    );
}

#[test]
fn repeated_builds_are_stable_until_destination_appears() {
    let (dir, source) = write_source("movie.mp4");
    let subler = Subler::new(&source, Atoms::new().artist("A"));

    let first = subler.build_command().unwrap();
    let second = subler.build_command().unwrap();
    assert_eq!(first, second);
    assert_eq!(arg_after(&first.args, "-dest"), plain(&dir.path().join("movie.0.mp4")));

    fs::write(dir.path().join("movie.0.mp4"), b"tagged").unwrap();
    let third = subler.build_command().unwrap();
    assert_eq!(arg_after(&third.args, "-dest"), plain(&dir.path().join("movie.1.mp4")));
    assert_eq!(subler.atoms().len(), 1);
}

#[test]
fn existing_explicit_destination_is_numbered() {
    let (dir, source) = write_source("movie.mp4");
    let dest = dir.path().join("out.mp4");
    fs::write(&dest, b"older output").unwrap();

    let command = Subler::new(&source, Atoms::new())
        .dest(&dest)
        .build_command()
        .unwrap();

    assert_eq!(arg_after(&command.args, "-dest"), plain(&dir.path().join("out.0.mp4")));
}

#[test]
fn missing_source_is_reported_first() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("missing.mp4");

    let err = Subler::new(&source, Atoms::new())
        .dest("/")
        .build_command()
        .unwrap_err();

    match err {
        SublerError::SourceNotFound(path) => assert_eq!(path, source),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn directory_source_is_not_a_file() {
    let dir = tempdir().unwrap();

    let err = Subler::new(dir.path(), Atoms::new())
        .build_command()
        .unwrap_err();

    assert!(matches!(err, SublerError::SourceNotFound(_)));
}

#[test]
fn destination_without_file_name_is_not_found() {
    let (_dir, source) = write_source("movie.mp4");

    let err = Subler::new(&source, Atoms::new())
        .dest("/")
        .build_command()
        .unwrap_err();

    match err {
        SublerError::DestinationNotFound(path) => assert_eq!(path, PathBuf::from("/")),
        other => panic!("unexpected error: {other}"),
    }
}
