use importer_core::{
    apply_filters, parse_csv, validate_rows, CompanionDocument, DocumentIndex, FilterOperator,
    FilterRule, IssueMapping, Project, ProjectCatalog, RecordEdit, RecordError, RepositoryRef,
    ValidatedRecord, ValidationContext,
};
use pretty_assertions::assert_eq;

fn project(id: u64, full: &str) -> Project {
    let short = full.rsplit('/').next().unwrap_or(full);
    Project {
        id,
        path_with_namespace: full.to_string(),
        name: short.replace('-', " "),
        path: short.to_string(),
        web_url: format!("https://git.example.com/{full}"),
    }
}

fn catalog() -> ProjectCatalog {
    ProjectCatalog::new(vec![
        project(1, "team/web-app"),
        project(2, "team/api"),
        project(3, "ops/infra"),
    ])
}

fn mapping() -> IssueMapping {
    IssueMapping {
        title_column: Some("Title".to_string()),
        repository_column: Some("Repo".to_string()),
        default_repository: None,
        use_document_description: true,
        section_heading: None,
        label_columns: vec!["Tags".to_string(), "Area".to_string()],
        static_labels: vec![" imported ".to_string(), "".to_string()],
    }
}

const CSV: &str = "ID,Title,Repo,Tags,Area\n\
    TASK-1,Fix login,team/web-app,\"bug, ui\",frontend\n\
    TASK-2,,team/api,,\n\
    TASK-3,Plan infra,unknown/repo,,\n\
    TASK-4,Write docs,,\"docs,,bug\",bug\n";

fn validate(mapping: &IssueMapping, documents: &DocumentIndex) -> Vec<ValidatedRecord> {
    let table = parse_csv(CSV);
    let catalog = catalog();
    let context = ValidationContext {
        catalog: &catalog,
        documents,
        identifier_column: Some("ID"),
        mapping,
    };
    validate_rows(table.headers(), table.rows(), &context)
}

#[test]
fn records_get_ids_titles_and_repositories() {
    let records = validate(&mapping(), &DocumentIndex::default());
    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["row-0", "row-1", "row-2", "row-3"]);

    assert!(records[0].is_valid);
    assert_eq!(
        records[0].repository,
        Some(RepositoryRef {
            path: "team/web-app".to_string(),
            project_id: 1
        })
    );

    assert_eq!(records[1].errors, [RecordError::EmptyTitle]);
    assert_eq!(records[1].error_messages(), ["Title is empty"]);
    assert!(!records[1].is_valid);

    assert_eq!(
        records[2].error_messages(),
        ["Repository \"unknown/repo\" not found in your projects"]
    );
    assert_eq!(records[2].repository, None);

    assert_eq!(records[3].errors, [RecordError::RepositoryEmpty]);
    assert!(records.iter().all(|r| !r.is_excluded));
}

#[test]
fn repository_resolves_by_name_or_short_path_case_insensitively() {
    let table = parse_csv("ID,Title,Repo\n1,A,WEB APP\n2,B, Infra \n");
    let catalog = catalog();
    let context = ValidationContext {
        catalog: &catalog,
        documents: &DocumentIndex::default(),
        identifier_column: Some("ID"),
        mapping: &mapping(),
    };
    let records = validate_rows(table.headers(), table.rows(), &context);
    assert_eq!(records[0].repository.as_ref().unwrap().project_id, 1);
    assert_eq!(records[1].repository.as_ref().unwrap().project_id, 3);
}

#[test]
fn catalog_collisions_resolve_to_last_inserted() {
    let mut clash = project(9, "other/api");
    clash.name = "team/api".to_string();
    let catalog = ProjectCatalog::new(vec![project(2, "team/api"), clash]);
    assert_eq!(catalog.resolve("team/api").unwrap().id, 9);
    assert_eq!(catalog.resolve("TEAM/API").unwrap().id, 9);
}

#[test]
fn default_repository_fills_empty_cells() {
    let mut with_default = mapping();
    with_default.default_repository = Some("OPS/INFRA".to_string());
    let records = validate(&with_default, &DocumentIndex::default());
    assert_eq!(records[3].repository.as_ref().unwrap().path, "ops/infra");
    assert!(records[3].is_valid);

    with_default.default_repository = Some("nowhere".to_string());
    let records = validate(&with_default, &DocumentIndex::default());
    assert_eq!(
        records[3].errors,
        [RecordError::DefaultRepositoryNotFound("nowhere".to_string())]
    );
}

#[test]
fn labels_keep_static_first_and_duplicates() {
    let records = validate(&mapping(), &DocumentIndex::default());
    assert_eq!(records[0].labels, ["imported", "bug", "ui", "frontend"]);
    assert_eq!(records[1].labels, ["imported"]);
    assert_eq!(records[3].labels, ["imported", "docs", "bug", "bug"]);
}

#[test]
fn descriptions_come_from_matched_documents() {
    let documents = DocumentIndex::build(
        [CompanionDocument {
            name: "TASK-1 Fix login.md".to_string(),
            path: "Tasks/TASK-1 Fix login.md".to_string(),
            content: "# Fix login\nStatus: Open\n\nUsers cannot log in.".to_string(),
        }],
        None,
    );
    let records = validate(&mapping(), &documents);
    assert_eq!(
        records[0].matched_document.as_deref(),
        Some("Tasks/TASK-1 Fix login.md")
    );
    assert_eq!(records[0].description.as_deref(), Some("Users cannot log in."));
    // No match is not an error.
    assert_eq!(records[2].description, None);
    assert_eq!(records[2].errors.len(), 1);

    let mut disabled = mapping();
    disabled.use_document_description = false;
    let records = validate(&disabled, &documents);
    assert_eq!(records[0].description, None);
    assert_eq!(records[0].matched_document, None);
}

#[test]
fn source_fields_exclude_title_column() {
    let records = validate(&mapping(), &DocumentIndex::default());
    let columns: Vec<_> = records[0].source_fields.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(columns, ["ID", "Repo", "Tags", "Area"]);
}

#[test]
fn ids_follow_the_filtered_set() {
    let table = parse_csv(CSV);
    let rows = apply_filters(
        table.rows(),
        &[FilterRule::new(1, "ID", FilterOperator::NotEquals).with_value("task-1")],
    );
    let catalog = catalog();
    let context = ValidationContext {
        catalog: &catalog,
        documents: &DocumentIndex::default(),
        identifier_column: Some("ID"),
        mapping: &mapping(),
    };
    let records = validate_rows(table.headers(), &rows, &context);
    assert_eq!(records[0].id, "row-0");
    assert_eq!(records[0].external_id, "TASK-2");
}

#[test]
fn repository_edit_replaces_only_repository_errors() {
    let catalog = catalog();
    let mut records = validate(&mapping(), &DocumentIndex::default());

    let mut untitled = records.remove(1);
    untitled.apply_edit(RecordEdit::Repository("nope".to_string()), &catalog);
    assert_eq!(
        untitled.errors,
        [
            RecordError::EmptyTitle,
            RecordError::RepositoryNotFound("nope".to_string())
        ]
    );
    untitled.apply_edit(RecordEdit::Repository("ops/infra".to_string()), &catalog);
    assert_eq!(untitled.errors, [RecordError::EmptyTitle]);
    assert!(!untitled.is_valid);

    let mut unresolved = records.remove(1);
    assert!(!unresolved.is_valid);
    unresolved.apply_edit(RecordEdit::Repository("api".to_string()), &catalog);
    assert!(unresolved.is_valid);
    assert!(unresolved.errors.is_empty());
    assert_eq!(unresolved.repository.as_ref().unwrap().project_id, 2);

    unresolved.apply_edit(RecordEdit::Repository("  ".to_string()), &catalog);
    assert_eq!(unresolved.errors, [RecordError::RepositoryEmpty]);
    assert!(!unresolved.is_valid);
}

#[test]
fn description_and_label_edits_leave_validity_alone() {
    let catalog = catalog();
    let mut record = validate(&mapping(), &DocumentIndex::default()).remove(2);
    let errors_before = record.errors.clone();

    record.apply_edit(RecordEdit::Description("Manual text".to_string()), &catalog);
    record.apply_edit(RecordEdit::Labels(" a, ,b,a ".to_string()), &catalog);

    assert_eq!(record.description.as_deref(), Some("Manual text"));
    assert_eq!(record.labels, ["a", "b", "a"]);
    assert_eq!(record.errors, errors_before);
    assert!(!record.is_valid);
}
