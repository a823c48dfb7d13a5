use std::fs;

use importer_core::{DocumentIndex, FileKind};
use importer_engine::{read_companion_documents, scan_export_dir, SourceError};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn scan_classifies_and_reports_relative_paths() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Tasks/Sub")).unwrap();
    fs::write(dir.path().join("Tasks.csv"), "ID,Title\n").unwrap();
    fs::write(dir.path().join("Tasks/Login abc.md"), "# Login").unwrap();
    fs::write(dir.path().join("Tasks/Sub/Notes.MARKDOWN"), "text").unwrap();
    fs::write(dir.path().join("Tasks/image.png"), [0u8, 1, 2]).unwrap();

    let files = scan_export_dir(dir.path()).unwrap();

    assert_eq!(files.csv.len(), 1);
    assert_eq!(files.csv[0].path, "Tasks.csv");
    let markdown: Vec<_> = files.markdown.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(markdown, ["Tasks/Login abc.md", "Tasks/Sub/Notes.MARKDOWN"]);
    assert_eq!(files.other[0].kind, FileKind::Other);
    assert_eq!(files.other[0].name, "image.png");
}

#[test]
fn main_csv_prefers_the_named_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.csv"), "x\n").unwrap();
    fs::write(dir.path().join("b.csv"), "y\n").unwrap();
    let files = scan_export_dir(dir.path()).unwrap();

    assert_eq!(files.main_csv(None).unwrap().name, "a.csv");
    assert_eq!(files.main_csv(Some("b.csv")).unwrap().name, "b.csv");
    assert!(matches!(
        files.main_csv(Some("c.csv")),
        Err(SourceError::CsvNotFound(_))
    ));
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempdir().unwrap();
    let err = scan_export_dir(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, SourceError::MissingDir(_)));
}

#[test]
fn documents_are_decoded_and_indexed() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("Login 0123456789abcdef0123456789abcdef.md"),
        "\u{feff}# Login\nStatus: Open\n\nBody text",
    )
    .unwrap();
    // Windows-1252 body with a labeled identifier.
    fs::write(
        dir.path().join("legacy.md"),
        b"Task-ID: WEB-7\n\nF\xFCr M\xFCller: Gr\xF6\xDFe der \xC4nderungen pr\xFCfen und \
          \xFCbernehmen.",
    )
    .unwrap();

    let files = scan_export_dir(dir.path()).unwrap();
    let documents = read_companion_documents(&files.markdown);
    assert_eq!(documents.len(), 2);

    let index = DocumentIndex::build(documents, None);
    let login = index
        .lookup("0123456789ABCDEF0123456789ABCDEF")
        .expect("hex id match");
    assert_eq!(login.extracted_section, "Body text");
    let legacy = index.lookup("web-7").expect("token match");
    assert!(legacy.raw_content.contains("Für Müller"));
}

#[test]
fn unreadable_document_is_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("ok.md"), "fine").unwrap();
    let files = scan_export_dir(dir.path()).unwrap();
    let mut listed = files.markdown.clone();
    let mut ghost = listed[0].clone();
    ghost.abs_path = dir.path().join("deleted.md");
    ghost.path = "deleted.md".to_string();
    listed.push(ghost);

    let documents = read_companion_documents(&listed);
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].path, "ok.md");
}
