use std::sync::LazyLock;

use regex::Regex;

static METADATA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-zÄÖÜäöü-]+:\s*.+$").expect("metadata pattern"));
static ANY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mR)^#{1,6}\s").expect("heading pattern"));
static HEADING_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s*").expect("heading marker pattern"));

/// Extract the part of a markdown document used as an issue description.
///
/// Without a heading the leading title and `Label: value` metadata block are
/// skipped and the rest is returned. With a heading, the text between that
/// heading and the next heading of any level is returned; if the heading is
/// absent the whole document comes back unchanged.
pub fn extract_section(content: &str, heading: Option<&str>) -> String {
    let cleaned = heading.map(clean_heading).filter(|h| !h.is_empty());
    match cleaned {
        None => body_after_front_matter(content),
        Some(heading) => {
            section_under_heading(content, &heading).unwrap_or_else(|| content.to_string())
        }
    }
}

fn clean_heading(heading: &str) -> String {
    HEADING_MARKERS.replace(heading, "").trim().to_string()
}

fn body_after_front_matter(content: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut start = 0;
    for (index, line) in lines.iter().enumerate() {
        let line = line.trim();
        let is_title = index == 0 && line.starts_with("# ");
        let is_metadata = line.is_empty() || METADATA_LINE.is_match(line);
        if !(is_title || is_metadata) {
            break;
        }
        start = index + 1;
    }
    lines
        .get(start..)
        .map(|rest| rest.join("\n"))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn section_under_heading(content: &str, heading: &str) -> Option<String> {
    let pattern = format!(r"(?imR)^#{{1,6}}\s*{}\s*$", regex::escape(heading));
    let heading_line = Regex::new(&pattern).ok()?;
    let found = heading_line.find(content)?;
    let remaining = &content[found.end()..];
    let section = match ANY_HEADING.find(remaining) {
        Some(next) => &remaining[..next.start()],
        None => remaining,
    };
    Some(section.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_markers_are_stripped_from_target() {
        assert_eq!(clean_heading("## Description "), "Description");
        assert_eq!(clean_heading("Description"), "Description");
    }

    #[test]
    fn marker_only_heading_falls_back_to_front_matter_mode() {
        let doc = "# Title\nStatus: Open\n\nBody";
        assert_eq!(extract_section(doc, Some("##")), "Body");
    }
}
