//! Artifact bundle import
//!
//! Kinds are imported in dependency order; within a kind files go in file
//! name order. A failed upload is final for this run and does not stop the
//! remaining files.

use crate::api::Session;
use crate::artifact::{self, ArtifactKind};
use crate::config::{ArtifactFilter, RunMode};
use std::path::Path;
use tracing::{error, info, warn};

/// Counts for one artifact kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindReport {
    pub kind: ArtifactKind,
    pub uploaded: usize,
    pub failed: usize,
    /// Left out by the production exclusion list
    pub excluded: usize,
}

impl KindReport {
    fn new(kind: ArtifactKind) -> Self {
        Self {
            kind,
            uploaded: 0,
            failed: 0,
            excluded: 0,
        }
    }
}

/// Import counts, one entry per kind in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub kinds: Vec<KindReport>,
}

impl ImportReport {
    pub fn uploaded(&self) -> usize {
        self.kinds.iter().map(|k| k.uploaded).sum()
    }

    pub fn failed(&self) -> usize {
        self.kinds.iter().map(|k| k.failed).sum()
    }

    pub fn excluded(&self) -> usize {
        self.kinds.iter().map(|k| k.excluded).sum()
    }

    pub fn processed(&self) -> usize {
        self.uploaded() + self.failed()
    }
}

/// What the importer needs to know about the run
#[derive(Debug, Clone, Copy)]
pub struct ImportOptions<'a> {
    pub dir: &'a Path,
    pub kinds: &'a [ArtifactKind],
    pub mode: RunMode,
    pub filter: &'a ArtifactFilter,
    pub overwrite: bool,
}

/// Upload every bundle found in `options.dir`
///
/// `kinds` is expected in [`ArtifactKind::IMPORT_ORDER`]. A directory that
/// cannot be listed counts as no files for that kind.
pub async fn import_artifacts(session: &Session, options: ImportOptions<'_>) -> ImportReport {
    let mut report = ImportReport::default();

    for &kind in options.kinds {
        let mut kind_report = KindReport::new(kind);
        info!(kind = %kind, dir = %options.dir.display(), "Processing artifact files");

        let files = match artifact::discover(options.dir, kind) {
            Ok(files) => files,
            Err(e) => {
                error!(kind = %kind, error = %e, "Cannot list artifact directory");
                Vec::new()
            },
        };

        let (excluded, files): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|file| options.filter.is_excluded(options.mode, kind, &file.file_name));
        for file in &excluded {
            warn!(file = %file.file_name, "Skipping excluded artifact in production");
        }
        kind_report.excluded = excluded.len();

        if files.is_empty() {
            warn!(kind = %kind, pattern = %kind.pattern(), "No files found for kind");
            report.kinds.push(kind_report);
            continue;
        }

        info!(kind = %kind, count = files.len(), "Found artifact files");

        for file in &files {
            info!(file = %file.file_name, kind = %kind, "Uploading");
            match session.import_artifact(file, options.overwrite).await {
                Ok(()) => {
                    info!(file = %file.file_name, "Uploaded");
                    kind_report.uploaded += 1;
                },
                Err(e) => {
                    error!(file = %file.file_name, error = %e, "Upload failed");
                    kind_report.failed += 1;
                },
            }
        }

        report.kinds.push(kind_report);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_report_totals() {
        let report = ImportReport {
            kinds: vec![
                KindReport {
                    kind: ArtifactKind::Database,
                    uploaded: 1,
                    failed: 0,
                    excluded: 1,
                },
                KindReport {
                    kind: ArtifactKind::Dataset,
                    uploaded: 2,
                    failed: 1,
                    excluded: 0,
                },
            ],
        };

        assert_eq!(report.uploaded(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.excluded(), 1);
        assert_eq!(report.processed(), 4);
    }
}
