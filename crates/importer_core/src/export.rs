use chrono::{NaiveDate, SecondsFormat};

use crate::submission::SubmissionOutcome;

const RESULT_HEADERS: [&str; 6] = ["Identifier", "Title", "Status", "URL", "Error", "Timestamp"];

/// Serialize outcomes as CSV with a fixed header row, one line per outcome.
pub fn export_outcomes_csv(outcomes: &[SubmissionOutcome]) -> String {
    let mut lines = Vec::with_capacity(outcomes.len() + 1);
    lines.push(join_fields(RESULT_HEADERS.iter().copied()));
    for outcome in outcomes {
        let timestamp = outcome
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        lines.push(join_fields([
            outcome.external_id.as_str(),
            outcome.title.as_str(),
            outcome.status.as_str(),
            outcome.remote_url.as_deref().unwrap_or(""),
            outcome.error.as_deref().unwrap_or(""),
            timestamp.as_str(),
        ]));
    }
    lines.join("\n")
}

/// `export-results-YYYY-MM-DD.csv`
pub fn results_file_name(date: NaiveDate) -> String {
    format!("export-results-{}.csv", date.format("%Y-%m-%d"))
}

fn join_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",")
}

/// Quote a field when it contains a comma, double quote or newline.
pub fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_are_verbatim() {
        assert_eq!(escape_field("hello world"), "hello world");
    }

    #[test]
    fn special_fields_are_quoted() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn file_name_embeds_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(results_file_name(date), "export-results-2024-05-01.csv");
    }
}
