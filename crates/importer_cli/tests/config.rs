use std::path::PathBuf;
use std::time::Duration;

use importer_cli::config::{ConfigError, JobConfig};
use importer_core::{FilterOperator, IssueMapping};
use pretty_assertions::assert_eq;

const FULL: &str = r#"(
    tracker: (
        domain: "gitlab.example.com",
        token: Some("from-file"),
        request_timeout_secs: 5,
    ),
    export_dir: "export/Tasks",
    csv_file: Some("Tasks.csv"),
    filters: [
        (column: "Status", operator: "equals", value: "Open"),
        (column: "Owner", operator: "is_empty", enabled: false),
    ],
    mapping: (
        title_column: Some("Name"),
        default_repository: Some("team/api"),
        label_columns: ["Tags"],
        static_labels: ["imported"],
    ),
    excluded_ids: ["TASK-9"],
    interval_ms: 250,
)"#;

#[test]
fn full_config_parses_with_defaults_filled_in() {
    let config = JobConfig::parse(FULL).expect("config");

    assert_eq!(config.export_dir, PathBuf::from("export/Tasks"));
    assert_eq!(config.output_dir, PathBuf::from("output"));
    assert_eq!(config.interval(), Duration::from_millis(250));
    assert_eq!(config.filters[0].operator().unwrap(), FilterOperator::Equals);
    assert_eq!(config.filters[1].operator().unwrap(), FilterOperator::IsEmpty);
    assert!(!config.filters[1].enabled);
    assert!(config.filters[0].enabled);

    let settings = config.tracker_settings();
    assert_eq!(settings.request_timeout, Duration::from_secs(5));
    assert_eq!(settings.connect_timeout, Duration::from_secs(10));
    assert_eq!(config.catalog_settings().max_pages, 50);

    let mapping: IssueMapping = config.mapping.clone().into();
    assert_eq!(mapping.title_column.as_deref(), Some("Name"));
    assert!(mapping.use_document_description);
    assert_eq!(mapping.static_labels, ["imported"]);
}

#[test]
fn minimal_config_uses_defaults() {
    let config =
        JobConfig::parse(r#"(tracker: (domain: "git.local"), export_dir: "x")"#).expect("config");
    assert_eq!(config.interval(), Duration::from_secs(1));
    assert!(config.filters.is_empty());
    assert_eq!(IssueMapping::from(config.mapping), IssueMapping::default());
}

#[test]
fn unknown_operator_is_rejected_at_load() {
    let err = JobConfig::parse(
        r#"(
            tracker: (domain: "git.local"),
            export_dir: "x",
            filters: [(column: "Status", operator: "starts_with", value: "A")],
        )"#,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::UnknownOperator { ref operator, .. } if operator == "starts_with"
    ));
}

#[test]
fn empty_domain_is_rejected() {
    let err = JobConfig::parse(r#"(tracker: (domain: " "), export_dir: "x")"#).unwrap_err();
    assert!(matches!(err, ConfigError::MissingDomain));
}

#[test]
fn malformed_ron_is_a_parse_error() {
    let err = JobConfig::parse("(tracker: ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn token_override_wins_and_blank_is_missing() {
    let config = JobConfig::parse(FULL).expect("config");
    assert_eq!(config.token(None).unwrap(), "from-file");
    assert_eq!(config.token(Some("from-env")).unwrap(), "from-env");

    let bare =
        JobConfig::parse(r#"(tracker: (domain: "git.local"), export_dir: "x")"#).expect("config");
    assert!(matches!(bare.token(Some("  ")), Err(ConfigError::MissingToken)));
    assert!(matches!(bare.token(None), Err(ConfigError::MissingToken)));
}
