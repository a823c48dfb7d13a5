use importer_core::{extract_section, CompanionDocument, DocumentIndex};
use pretty_assertions::assert_eq;

fn doc(path: &str, content: &str) -> CompanionDocument {
    let name = path.rsplit('/').next().unwrap_or(path);
    CompanionDocument {
        name: name.to_string(),
        path: path.to_string(),
        content: content.to_string(),
    }
}

#[test]
fn hex_id_in_path_matches_any_case() {
    let index = DocumentIndex::build(
        [doc(
            "export/Tasks/Fix login a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4.md",
            "# Fix login\n\nBody",
        )],
        None,
    );
    for id in [
        "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4",
        "A1B2C3D4E5F6A1B2C3D4E5F6A1B2C3D4",
    ] {
        let found = index.lookup(id).expect("document by hex id");
        assert_eq!(found.extracted_section, "Body");
    }
}

#[test]
fn uuid_in_path_is_indexed_without_hyphens() {
    let index = DocumentIndex::build(
        [doc("pages/123e4567-e89b-12d3-a456-426614174000.md", "text")],
        None,
    );
    assert!(index.lookup("123e4567-e89b-12d3-a456-426614174000").is_some());
    assert!(index.lookup("123E4567E89B12D3A456426614174000").is_some());
}

#[test]
fn file_name_token_matches_lowercase_identifier() {
    let index = DocumentIndex::build([doc("notes/TASK-123 Write docs.md", "body")], None);
    let found = index.lookup("task-123").expect("document by token");
    assert_eq!(found.source_path, "notes/TASK-123 Write docs.md");
}

#[test]
fn labeled_token_in_content_is_indexed() {
    let index = DocumentIndex::build(
        [
            doc("a.md", "# A\nAufgaben-ID: auf-557\n\nBody A"),
            doc("b.md", "# B\nIssue-ID:   ops-9\n\nBody B"),
        ],
        None,
    );
    assert_eq!(index.lookup("AUF-557").unwrap().source_path, "a.md");
    assert_eq!(index.lookup("ops-9").unwrap().source_path, "b.md");
}

#[test]
fn one_document_is_reachable_under_several_keys() {
    let index = DocumentIndex::build(
        [doc(
            "TASK-7 Plan a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4.md",
            "Task-ID: TASK-7\nbody",
        )],
        None,
    );
    assert_eq!(index.key_count(), 2);
    let by_hex = index.lookup("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4").unwrap();
    let by_token = index.lookup("TASK-7").unwrap();
    assert!(std::ptr::eq(by_hex, by_token));
}

#[test]
fn later_document_wins_a_shared_key() {
    let index = DocumentIndex::build(
        [
            doc("first/TASK-1.md", "first"),
            doc("second/TASK-1 copy.md", "second"),
        ],
        None,
    );
    assert_eq!(index.lookup("TASK-1").unwrap().raw_content, "second");
}

#[test]
fn unknown_identifier_is_not_found() {
    let index = DocumentIndex::build([doc("TASK-1.md", "x")], None);
    assert!(index.lookup("TASK-2").is_none());
    assert!(DocumentIndex::default().is_empty());
}

#[test]
fn section_between_headings() {
    let content = "## Description\nBody text\n## Other\nMore";
    assert_eq!(extract_section(content, Some("Description")), "Body text");
    assert_eq!(extract_section(content, Some("## description")), "Body text");
}

#[test]
fn section_runs_to_end_without_next_heading() {
    let content = "# Title\n\n### Details\n\nline one\nline two\n";
    assert_eq!(extract_section(content, Some("Details")), "line one\nline two");
}

#[test]
fn missing_heading_returns_whole_document() {
    let content = "# Title\nSome text\n";
    assert_eq!(extract_section(content, Some("Description")), content);
}

#[test]
fn heading_must_match_whole_line() {
    let content = "## Description of work\nA\n## Description\nB";
    assert_eq!(extract_section(content, Some("Description")), "B");
}

#[test]
fn front_matter_is_skipped_without_heading() {
    let content = "# My Task\nStatus: Open\nZuständig: Jörg\n\nFirst paragraph\nKey: not metadata anymore\n";
    assert_eq!(
        extract_section(content, None),
        "First paragraph\nKey: not metadata anymore"
    );
}

#[test]
fn title_only_skipped_on_first_line() {
    let content = "Intro line\n# Heading later\nrest";
    assert_eq!(extract_section(content, None), content.trim());
}

#[test]
fn section_is_extracted_at_index_time() {
    let index = DocumentIndex::build(
        [doc(
            "TASK-3.md",
            "# T\n## Description\nDo the thing\n## Notes\nignored",
        )],
        Some("Description"),
    );
    let found = index.lookup("TASK-3").unwrap();
    assert_eq!(found.extracted_section, "Do the thing");
    assert!(found.raw_content.contains("ignored"));
}
