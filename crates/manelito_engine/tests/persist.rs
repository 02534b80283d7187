use std::fs;
use std::path::PathBuf;

use manelito_engine::{
    ensure_output_dir, write_as, write_temp, AtomicFileWriter, PersistError, PersistSettings,
    ScrapeError, TempScope, TEMP_FILE_NAME,
};
use manelito_core::ErrorKind;
use tempfile::TempDir;

fn settings_in(dir: PathBuf) -> PersistSettings {
    PersistSettings {
        temp_dir: dir,
        ..PersistSettings::default()
    }
}

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("out");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("doc.html", "hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "doc.html");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("doc.html", "world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("doc.html", "data");
    assert!(matches!(result, Err(PersistError::NotADirectory(_))));
    assert!(!file_path.with_file_name("doc.html").exists());
}

#[test]
fn temp_file_is_created_under_fixed_name() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("Temp");
    let settings = settings_in(dir.clone());

    let path = write_temp(&settings, "<p>1</p>", TempScope::Shared).unwrap();
    assert!(path.is_absolute());
    assert_eq!(path, dir.join(TEMP_FILE_NAME));
    assert_eq!(fs::read_to_string(&path).unwrap(), "<p>1</p>");
}

#[test]
fn second_temp_write_fully_replaces_the_first() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(temp.path().to_path_buf());

    let long = "<p>".to_string() + &"x".repeat(4096) + "</p>";
    let first = write_temp(&settings, &long, TempScope::Shared).unwrap();
    let second = write_temp(&settings, "<p>short</p>", TempScope::Shared).unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "<p>short</p>");
}

#[test]
fn session_scoped_temp_files_do_not_collide() {
    let temp = TempDir::new().unwrap();
    let settings = settings_in(temp.path().to_path_buf());

    let a = write_temp(&settings, "a", TempScope::Session(1)).unwrap();
    let b = write_temp(&settings, "b", TempScope::Session(2)).unwrap();

    assert_ne!(a, b);
    assert_eq!(fs::read_to_string(a).unwrap(), "a");
    assert_eq!(fs::read_to_string(b).unwrap(), "b");
}

#[test]
fn write_as_overwrites_and_adds_missing_extension() {
    let temp = TempDir::new().unwrap();

    let explicit = write_as("<p>one</p>", &temp.path().join("out.html")).unwrap();
    let again = write_as("<p>two</p>", &temp.path().join("out.html")).unwrap();
    assert_eq!(explicit, again);
    assert_eq!(fs::read_to_string(&again).unwrap(), "<p>two</p>");

    let bare = write_as("<p>three</p>", &temp.path().join("Document")).unwrap();
    assert_eq!(bare, temp.path().join("Document.html"));
}

#[test]
fn write_as_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("a").join("b").join("page.html");

    let path = write_as("<p>x</p>", &nested).unwrap();
    assert_eq!(path, nested);
    assert!(nested.exists());
}

#[test]
fn write_as_reports_io_cause() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("file");
    fs::write(&blocker, "x").unwrap();

    let err = write_as("<p>x</p>", &blocker.join("out.html")).unwrap_err();
    assert!(matches!(err, PersistError::NotADirectory(_)));
    assert!(err.to_string().contains("not a directory"));

    let err = ScrapeError::from(err);
    assert_eq!(err.kind(), ErrorKind::PersistenceError);
}
