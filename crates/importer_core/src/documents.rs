use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use importer_logging::importer_debug;
use regex::Regex;

use crate::section::extract_section;

static HEX32_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[0-9a-f]{32}").expect("hex run pattern"));
static UUID_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("uuid run pattern")
});
static TOKEN_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[A-Z]+-\d+").expect("token pattern"));
static LABELED_TOKENS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["Aufgaben-ID", "Task-ID", "Issue-ID", "ID"]
        .iter()
        .map(|label| {
            Regex::new(&format!(r"(?i){label}:\s*([A-Z]+-\d+)")).expect("labeled id pattern")
        })
        .collect()
});

/// How a file in an export directory is treated, decided by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Markdown,
    Other,
}

impl FileKind {
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") {
            FileKind::Csv
        } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
            FileKind::Markdown
        } else {
            FileKind::Other
        }
    }
}

/// A markdown file that has already been read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionDocument {
    pub name: String,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMatch {
    pub source_path: String,
    pub raw_content: String,
    pub extracted_section: String,
}

type KeyDerivation = fn(&CompanionDocument) -> Vec<String>;

/// Every derivation that yields keys registers the document under them.
const KEY_DERIVATIONS: &[KeyDerivation] = &[
    hex_id_in_path,
    uuid_in_path,
    token_in_file_name,
    labeled_tokens_in_content,
];

/// Identifier key → document. A document may be reachable under several
/// keys. When two documents derive the same key the later one wins.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    entries: HashMap<String, Arc<DocumentMatch>>,
}

impl DocumentIndex {
    pub fn build(
        documents: impl IntoIterator<Item = CompanionDocument>,
        heading: Option<&str>,
    ) -> Self {
        let mut index = Self::default();
        for document in documents {
            index.insert(document, heading);
        }
        index
    }

    pub fn insert(&mut self, document: CompanionDocument, heading: Option<&str>) {
        let keys: Vec<String> = KEY_DERIVATIONS
            .iter()
            .flat_map(|derive| derive(&document))
            .collect();
        let entry = Arc::new(DocumentMatch {
            extracted_section: extract_section(&document.content, heading),
            source_path: document.path,
            raw_content: document.content,
        });
        for key in keys {
            if let Some(previous) = self.entries.insert(key.clone(), entry.clone()) {
                if previous.source_path != entry.source_path {
                    importer_debug!(
                        "document key {} moved from {} to {}",
                        key,
                        previous.source_path,
                        entry.source_path
                    );
                }
            }
        }
    }

    /// Probe uppercase, then hyphen-stripped lowercase, then lowercase.
    pub fn lookup(&self, identifier: &str) -> Option<&DocumentMatch> {
        [
            identifier.to_uppercase(),
            identifier.replace('-', "").to_lowercase(),
            identifier.to_lowercase(),
        ]
        .iter()
        .find_map(|key| self.entries.get(key))
        .map(Arc::as_ref)
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn hex_id_in_path(document: &CompanionDocument) -> Vec<String> {
    HEX32_RUN
        .find(&document.path)
        .map(|m| m.as_str().to_lowercase())
        .into_iter()
        .collect()
}

fn uuid_in_path(document: &CompanionDocument) -> Vec<String> {
    UUID_RUN
        .find(&document.path)
        .map(|m| m.as_str().replace('-', "").to_lowercase())
        .into_iter()
        .collect()
}

fn token_in_file_name(document: &CompanionDocument) -> Vec<String> {
    TOKEN_RUN
        .find(&document.name)
        .map(|m| m.as_str().to_uppercase())
        .into_iter()
        .collect()
}

fn labeled_tokens_in_content(document: &CompanionDocument) -> Vec<String> {
    LABELED_TOKENS
        .iter()
        .filter_map(|pattern| pattern.captures(&document.content))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
        .collect()
}
