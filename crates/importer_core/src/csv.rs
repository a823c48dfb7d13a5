use std::collections::HashMap;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// A parsed CSV export: ordered headers plus one string map per data row.
///
/// Every row carries an entry for every header; absent cells are `""`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTable {
    headers: Vec<String>,
    rows: Vec<Row>,
}

pub type Row = HashMap<String, String>;

impl ParsedTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Parse raw CSV text. Never fails: empty or blank input is an empty table
/// and ragged rows are mapped onto the headers positionally.
pub fn parse_csv(content: &str) -> ParsedTable {
    let content = content.strip_prefix(BYTE_ORDER_MARK).unwrap_or(content);
    let mut records = split_records(content).into_iter();

    let Some(headers) = records.next() else {
        return ParsedTable::default();
    };

    let rows = records
        .map(|values| {
            let mut values = values.into_iter();
            headers
                .iter()
                .map(|header| (header.clone(), values.next().unwrap_or_default()))
                .collect::<Row>()
        })
        .collect();

    ParsedTable { headers, rows }
}

/// Quote-aware split into records of trimmed fields. `\n` and `\r\n` end a
/// record only outside quotes; inside quotes they belong to the field.
/// Records with nothing but whitespace are dropped.
fn split_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = RecordBuilder::default();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    record.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => record.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                record.blank = false;
            }
            ',' => record.end_field(),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => records.extend(std::mem::take(&mut record).finish()),
            _ => record.push(c),
        }
    }
    records.extend(record.finish());
    records
}

struct RecordBuilder {
    fields: Vec<String>,
    current: String,
    blank: bool,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            current: String::new(),
            blank: true,
        }
    }
}

impl RecordBuilder {
    fn push(&mut self, c: char) {
        self.blank = self.blank && c.is_whitespace();
        self.current.push(c);
    }

    fn end_field(&mut self) {
        self.fields.push(self.current.trim().to_string());
        self.current.clear();
        self.blank = false;
    }

    fn finish(mut self) -> Option<Vec<String>> {
        if self.blank {
            return None;
        }
        self.end_field();
        Some(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(line: &str) -> Vec<String> {
        split_records(line).remove(0)
    }

    #[test]
    fn unquoted_whitespace_is_trimmed() {
        assert_eq!(fields(" a , b,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn trailing_comma_yields_empty_field() {
        assert_eq!(fields("a,"), vec!["a", ""]);
    }

    #[test]
    fn crlf_inside_quotes_is_kept() {
        assert_eq!(
            split_records("\"a\r\nb\",c\r\nd,e\r\n"),
            vec![vec!["a\r\nb", "c"], vec!["d", "e"]]
        );
    }

    #[test]
    fn whitespace_only_lines_are_not_records() {
        assert_eq!(split_records("a\n  \t\n\nb"), vec![vec!["a"], vec!["b"]]);
    }
}
