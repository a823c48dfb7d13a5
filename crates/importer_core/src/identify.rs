use std::sync::LazyLock;

use regex::Regex;

use crate::csv::Row;

static UUID_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("uuid pattern")
});
static HEX32_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[0-9a-f]{32}$").expect("hex id pattern"));

type DetectionPass = fn(&[String], &Row) -> Option<String>;

/// Passes tried in order; the first one that yields a header wins.
const DETECTION_PASSES: &[DetectionPass] = &[by_header_name_and_shape, by_shape_only];

/// Guess which column holds a stable external identifier, using the first
/// row as the sample. Returns `None` when there is no sample or no match.
pub fn detect_identifier_column(headers: &[String], rows: &[Row]) -> Option<String> {
    let sample = rows.first()?;
    DETECTION_PASSES
        .iter()
        .find_map(|pass| pass(headers, sample))
}

/// True for a hyphenated UUID or a 32-character hex id.
fn looks_like_identifier(value: &str) -> bool {
    UUID_SHAPE.is_match(value) || HEX32_SHAPE.is_match(value)
}

fn is_identifier_header(header: &str) -> bool {
    let lower = header.to_lowercase();
    lower.contains("notion") || lower.contains("id") || lower == "key" || lower == "uid"
}

fn sample_matches(header: &str, sample: &Row) -> bool {
    sample
        .get(header)
        .is_some_and(|value| !value.is_empty() && looks_like_identifier(value))
}

fn by_header_name_and_shape(headers: &[String], sample: &Row) -> Option<String> {
    headers
        .iter()
        .find(|header| is_identifier_header(header) && sample_matches(header, sample))
        .cloned()
}

fn by_shape_only(headers: &[String], sample: &Row) -> Option<String> {
    headers
        .iter()
        .find(|header| sample_matches(header, sample))
        .cloned()
}
