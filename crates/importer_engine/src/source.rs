use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use importer_core::{CompanionDocument, FileKind};
use importer_logging::{importer_debug, importer_warn};
use thiserror::Error;
use walkdir::WalkDir;

use crate::decode::{decode_text, DecodeError};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("export directory {0} does not exist")]
    MissingDir(PathBuf),
    #[error("failed to walk export directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: DecodeError,
    },
    #[error("no CSV file named {0} in the export directory")]
    CsvNotFound(String),
    #[error("export directory holds no CSV file")]
    NoCsv,
}

/// One file found under an export directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    /// Relative to the export root, `/`-separated.
    pub path: String,
    pub abs_path: PathBuf,
    pub kind: FileKind,
}

impl SourceFile {
    pub fn read_text(&self) -> Result<String, SourceError> {
        let bytes = fs::read(&self.abs_path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;
        let decoded = decode_text(&bytes).map_err(|source| SourceError::Decode {
            path: self.path.clone(),
            source,
        })?;
        if decoded.encoding_label != "UTF-8" {
            importer_debug!("{} decoded as {}", self.path, decoded.encoding_label);
        }
        Ok(decoded.text)
    }
}

/// Files of an export directory, grouped by kind, each group sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFiles {
    pub csv: Vec<SourceFile>,
    pub markdown: Vec<SourceFile>,
    pub other: Vec<SourceFile>,
}

impl ExportFiles {
    /// The CSV named `preferred` (matched on file name or relative path), or
    /// the first one found when no preference is given.
    pub fn main_csv(&self, preferred: Option<&str>) -> Result<&SourceFile, SourceError> {
        match preferred {
            Some(wanted) => self
                .csv
                .iter()
                .find(|file| file.name == wanted || file.path == wanted)
                .ok_or_else(|| SourceError::CsvNotFound(wanted.to_string())),
            None => self.csv.first().ok_or(SourceError::NoCsv),
        }
    }
}

pub fn scan_export_dir(root: &Path) -> Result<ExportFiles, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::MissingDir(root.to_path_buf()));
    }

    let mut files = ExportFiles::default();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = relative_path(root, entry.path());
        let kind = FileKind::classify(&name);
        let file = SourceFile {
            name,
            path,
            abs_path: entry.path().to_path_buf(),
            kind,
        };
        match kind {
            FileKind::Csv => files.csv.push(file),
            FileKind::Markdown => files.markdown.push(file),
            FileKind::Other => files.other.push(file),
        }
    }
    importer_debug!(
        "scanned {}: {} csv, {} markdown, {} other",
        root.display(),
        files.csv.len(),
        files.markdown.len(),
        files.other.len()
    );
    Ok(files)
}

/// Reads every file; one that cannot be read or decoded is logged and left out.
pub fn read_companion_documents(files: &[SourceFile]) -> Vec<CompanionDocument> {
    files
        .iter()
        .filter_map(|file| match file.read_text() {
            Ok(content) => Some(CompanionDocument {
                name: file.name.clone(),
                path: file.path.clone(),
                content,
            }),
            Err(err) => {
                importer_warn!("skipping document: {err}");
                None
            }
        })
        .collect()
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
