//! Exported artifact bundles
//!
//! Bundles are ZIP files named `{kind}_*.zip` sitting in one directory.

use crate::error::Result;
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Importable content type, in referential dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ArtifactKind {
    Database,
    Dataset,
    Chart,
    Dashboard,
}

impl ArtifactKind {
    /// Databases before the datasets that use them, and so on up
    pub const IMPORT_ORDER: [ArtifactKind; 4] = [
        ArtifactKind::Database,
        ArtifactKind::Dataset,
        ArtifactKind::Chart,
        ArtifactKind::Dashboard,
    ];

    /// Resource segment of the import endpoint
    pub fn resource(self) -> &'static str {
        match self {
            ArtifactKind::Database => "database",
            ArtifactKind::Dataset => "dataset",
            ArtifactKind::Chart => "chart",
            ArtifactKind::Dashboard => "dashboard",
        }
    }

    /// Glob-style pattern, for log messages
    pub fn pattern(self) -> String {
        format!("{}_*.zip", self.resource())
    }

    pub fn matches_file_name(self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.resource())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|rest| rest.ends_with(".zip"))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource())
    }
}

/// One bundle on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub file_name: String,
}

/// Bundles of `kind` directly inside `dir`, sorted by file name
///
/// Subdirectories are not searched.
pub fn discover(dir: &Path, kind: ArtifactKind) -> Result<Vec<ArtifactFile>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };

        if kind.matches_file_name(file_name) {
            files.push(ArtifactFile {
                kind,
                file_name: file_name.to_string(),
                path: entry.path().to_path_buf(),
            });
        }
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}
