//! Run orchestration
//!
//! Discovers `impl/phaseN-impl.md` documents in a plan directory, splits each
//! one, deletes the monolithic source once its split is on disk, and finally
//! rewrites the manifest for every document that was split.
//!
//! Each document moves through:
//!
//! ```text
//! Discovered -> Segmented -> Written -> SourceDeleted
//! ```
//!
//! A document stops early when it has no `## Tasks` heading (skipped) or an
//! I/O operation fails (failed). Neither stops the remaining documents.
//!
//! Single writer only: concurrent runs against the same plan directory are
//! not guarded against.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Result, SplitError};
use crate::manifest::{ReferenceUpdate, rewrite_manifest};
use crate::segment::segment;
use crate::writer::{SplitReport, SplitWriter};

/// A monolithic phase document found during discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseDocument {
    /// Path to `phaseN-impl.<ext>`
    pub path: PathBuf,
    /// `phaseN`, used as the output directory name
    pub phase: String,
}

impl PhaseDocument {
    /// Output directory next to the source document
    pub fn target_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.join(&self.phase))
            .unwrap_or_else(|| PathBuf::from(&self.phase))
    }

    /// Ordering key: phase digits compared numerically without parsing
    /// (leading zeros ignored, then shorter first, then lexically)
    pub fn order_key(&self) -> (usize, &str) {
        let digits = self.phase.trim_start_matches("phase").trim_start_matches('0');
        (digits.len(), digits)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// How far a document got
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Discovered,
    Segmented,
    Written,
    SourceDeleted,
}

impl std::fmt::Display for DocumentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovered => write!(f, "discovered"),
            Self::Segmented => write!(f, "segmented"),
            Self::Written => write!(f, "written"),
            Self::SourceDeleted => write!(f, "source-deleted"),
        }
    }
}

/// Final result for one document
#[derive(Debug)]
pub enum DocumentOutcome {
    /// Split output written; `state` is Written when the source was kept
    Split { state: DocumentState, report: SplitReport },
    /// No `## Tasks` heading; nothing written or deleted
    Skipped { reason: SplitError },
    /// An I/O fault stopped this document at `state`
    Failed { state: DocumentState, error: SplitError },
}

#[derive(Debug)]
pub struct DocumentResult {
    pub document: PhaseDocument,
    pub outcome: DocumentOutcome,
}

/// What happened to the manifest
#[derive(Debug)]
pub enum ManifestOutcome {
    /// No document was split
    NotNeeded,
    /// Manifest file does not exist
    Missing,
    /// References rewritten (or already current)
    Rewritten,
    /// Dry run: references would be rewritten
    Planned,
    Failed(SplitError),
}

/// Summary of a whole run
#[derive(Debug)]
pub struct RunSummary {
    pub documents: Vec<DocumentResult>,
    pub manifest_path: PathBuf,
    pub updates: Vec<ReferenceUpdate>,
    pub manifest: ManifestOutcome,
    pub dry_run: bool,
}

impl RunSummary {
    /// Number of documents split
    pub fn split_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Split { .. }))
            .count()
    }

    /// Number of documents that hit an I/O fault
    pub fn failed_count(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Failed { .. }))
            .count()
    }

    /// True when any document or the manifest update failed
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0 || matches!(self.manifest, ManifestOutcome::Failed(_))
    }
}

/// Switches that change what a run is allowed to touch
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Plan and report only
    pub dry_run: bool,
    /// Leave the monolithic document in place after splitting
    pub keep_source: bool,
}

/// Parse `phase<digits>-impl.<ext>` into `phase<digits>`
pub fn parse_phase_name(file_name: &str, extension: &str) -> Option<String> {
    let stem = file_name.strip_suffix(&format!("-impl.{}", extension))?;
    let digits = stem.strip_prefix("phase")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(stem.to_string())
}

/// Find monolithic phase documents in `impl_dir`, ordered by phase number
pub fn discover(impl_dir: &Path, extension: &str) -> Result<Vec<PhaseDocument>> {
    if !impl_dir.is_dir() {
        return Err(SplitError::MissingInput {
            path: impl_dir.to_path_buf(),
        });
    }

    let pattern = format!(
        "{}/phase*-impl.{}",
        glob::Pattern::escape(&impl_dir.to_string_lossy()),
        glob::Pattern::escape(extension)
    );
    debug!(%pattern, "discover: globbing");

    let mut documents = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %e.path().display(), error = %e.error(), "discover: unreadable entry, skipping");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        let file_name = path.file_name().map(|n| n.to_string_lossy().to_string());
        if let Some(phase) = file_name.and_then(|n| parse_phase_name(&n, extension)) {
            documents.push(PhaseDocument { path, phase });
        }
    }

    documents.sort_by(|a, b| a.order_key().cmp(&b.order_key()).then_with(|| a.path.cmp(&b.path)));
    info!(count = documents.len(), dir = %impl_dir.display(), "discover: found phase documents");
    Ok(documents)
}

/// Drives discovery, splitting, source deletion and the manifest rewrite
pub struct Orchestrator {
    config: Config,
    writer: SplitWriter,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(config: Config, options: RunOptions) -> Self {
        let writer = SplitWriter::new(&config).dry_run(options.dry_run);
        Self {
            config,
            writer,
            options,
        }
    }

    /// Use a custom writer (for example one with extra identifier strategies)
    pub fn with_writer(mut self, writer: SplitWriter) -> Self {
        self.writer = writer.dry_run(self.options.dry_run);
        self
    }

    /// Split every phase document under `plan_dir`.
    ///
    /// Only a missing discovery directory is an error; per-document problems
    /// are recorded in the summary.
    pub fn run(&self, plan_dir: &Path) -> Result<RunSummary> {
        let impl_dir = self.config.impl_path(plan_dir);
        let documents = discover(&impl_dir, &self.config.extension)?;

        let mut results = Vec::with_capacity(documents.len());
        let mut updates = Vec::new();

        for document in documents {
            info!(path = %document.path.display(), phase = %document.phase, "run: splitting");
            let outcome = self.process(&document);

            if let DocumentOutcome::Split { .. } = outcome {
                updates.push(ReferenceUpdate::new(
                    format!("{}/{}", self.config.impl_dir, document.file_name()),
                    format!("{}/{}/", self.config.impl_dir, document.phase),
                ));
            }
            results.push(DocumentResult { document, outcome });
        }

        let manifest_path = self.config.manifest_path(plan_dir);
        let manifest = if updates.is_empty() {
            ManifestOutcome::NotNeeded
        } else if self.options.dry_run {
            if manifest_path.exists() {
                ManifestOutcome::Planned
            } else {
                ManifestOutcome::Missing
            }
        } else {
            match rewrite_manifest(&manifest_path, &updates) {
                Ok(true) => ManifestOutcome::Rewritten,
                Ok(false) => ManifestOutcome::Missing,
                Err(e) => {
                    error!(error = %e, "run: manifest rewrite failed");
                    ManifestOutcome::Failed(e)
                }
            }
        };

        Ok(RunSummary {
            documents: results,
            manifest_path,
            updates,
            manifest,
            dry_run: self.options.dry_run,
        })
    }

    fn process(&self, document: &PhaseDocument) -> DocumentOutcome {
        let mut state = DocumentState::Discovered;

        let content = match fs::read_to_string(&document.path) {
            Ok(content) => content,
            Err(e) => return self.fail(document, state, SplitError::storage(&document.path, e)),
        };

        let Some(seg) = segment(&content) else {
            warn!(path = %document.path.display(), "process: no tasks heading, skipping");
            return DocumentOutcome::Skipped {
                reason: SplitError::StructuralMismatch {
                    path: document.path.clone(),
                },
            };
        };
        state = DocumentState::Segmented;

        let report = match self.writer.write(&document.target_dir(), &seg) {
            Ok(report) => report,
            Err(e) => return self.fail(document, state, e),
        };
        state = DocumentState::Written;

        if report.files.is_empty() || self.options.keep_source || self.options.dry_run {
            return DocumentOutcome::Split { state, report };
        }

        if let Err(e) = fs::remove_file(&document.path) {
            return self.fail(document, state, SplitError::storage(&document.path, e));
        }
        info!(path = %document.path.display(), "process: deleted source");

        DocumentOutcome::Split {
            state: DocumentState::SourceDeleted,
            report,
        }
    }

    fn fail(&self, document: &PhaseDocument, state: DocumentState, error: SplitError) -> DocumentOutcome {
        error!(path = %document.path.display(), %state, error = %error, "process: failed");
        DocumentOutcome::Failed { state, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PHASE1: &str = "\
# Phase 1

Preamble text.

## Tasks

### Task 1: Model

**ID:** `phase1-task1`

Build the model.

### Task 2: Routes

Wire routes.
";

    fn plan_with(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        let impl_dir = temp.path().join("impl");
        fs::create_dir_all(&impl_dir).unwrap();
        for (name, content) in files {
            fs::write(impl_dir.join(name), content).unwrap();
        }
        temp
    }

    #[test]
    fn test_parse_phase_name() {
        assert_eq!(parse_phase_name("phase1-impl.md", "md"), Some("phase1".to_string()));
        assert_eq!(parse_phase_name("phase12-impl.md", "md"), Some("phase12".to_string()));
        assert_eq!(
            parse_phase_name("phase99999999999999999999-impl.md", "md"),
            Some("phase99999999999999999999".to_string())
        );
        assert_eq!(parse_phase_name("phasex-impl.md", "md"), None);
        assert_eq!(parse_phase_name("phase-impl.md", "md"), None);
        assert_eq!(parse_phase_name("phase1-impl.txt", "md"), None);
        assert_eq!(parse_phase_name("phase1-plan.md", "md"), None);
    }

    #[test]
    fn test_discover_orders_by_phase_number() {
        let plan = plan_with(&[
            ("phase10-impl.md", PHASE1),
            ("phase2-impl.md", PHASE1),
            ("phaseA-impl.md", PHASE1),
            ("notes.md", "x"),
        ]);

        let docs = discover(&plan.path().join("impl"), "md").unwrap();
        let phases: Vec<&str> = docs.iter().map(|d| d.phase.as_str()).collect();
        assert_eq!(phases, vec!["phase2", "phase10"]);
    }

    #[test]
    fn test_discover_orders_long_phase_numbers() {
        let plan = plan_with(&[
            ("phase99999999999999999999-impl.md", PHASE1),
            ("phase010-impl.md", PHASE1),
            ("phase9-impl.md", PHASE1),
        ]);

        let docs = discover(&plan.path().join("impl"), "md").unwrap();
        let phases: Vec<&str> = docs.iter().map(|d| d.phase.as_str()).collect();
        assert_eq!(phases, vec!["phase9", "phase010", "phase99999999999999999999"]);
    }

    #[test]
    fn test_discover_missing_dir_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = discover(&temp.path().join("impl"), "md").unwrap_err();
        assert!(matches!(err, SplitError::MissingInput { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_run_splits_deletes_and_rewrites() {
        let plan = plan_with(&[("phase1-impl.md", PHASE1)]);
        fs::write(plan.path().join("state.yaml"), "artifacts:\n  impl_plans:\n    - impl/phase1-impl.md\n").unwrap();

        let summary = Orchestrator::new(Config::default(), RunOptions::default())
            .run(plan.path())
            .unwrap();

        assert_eq!(summary.split_count(), 1);
        assert!(!summary.has_failures());
        assert!(matches!(summary.manifest, ManifestOutcome::Rewritten));
        assert!(matches!(
            summary.documents[0].outcome,
            DocumentOutcome::Split {
                state: DocumentState::SourceDeleted,
                ..
            }
        ));

        let out = plan.path().join("impl").join("phase1");
        assert_eq!(fs::read_to_string(out.join("context.md")).unwrap(), "# Phase 1\n\nPreamble text.\n");
        assert!(out.join("task1.md").exists());
        assert!(out.join("task2.md").exists());
        assert!(!plan.path().join("impl").join("phase1-impl.md").exists());
        assert_eq!(
            fs::read_to_string(plan.path().join("state.yaml")).unwrap(),
            "artifacts:\n  impl_plans:\n    - impl/phase1/\n"
        );
    }

    #[test]
    fn test_run_skips_document_without_tasks() {
        let plan = plan_with(&[("phase1-impl.md", PHASE1), ("phase2-impl.md", "# Phase 2\n\nNo tasks.\n")]);

        let summary = Orchestrator::new(Config::default(), RunOptions::default())
            .run(plan.path())
            .unwrap();

        assert_eq!(summary.split_count(), 1);
        assert!(!summary.has_failures());
        assert!(matches!(summary.documents[1].outcome, DocumentOutcome::Skipped { .. }));
        assert!(plan.path().join("impl").join("phase2-impl.md").exists());
        assert!(!plan.path().join("impl").join("phase2").exists());
        assert_eq!(summary.updates.len(), 1);
        assert!(matches!(summary.manifest, ManifestOutcome::Missing));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let plan = plan_with(&[("phase1-impl.md", PHASE1)]);
        fs::write(plan.path().join("state.yaml"), "- impl/phase1-impl.md\n").unwrap();

        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let summary = Orchestrator::new(Config::default(), options).run(plan.path()).unwrap();

        assert_eq!(summary.split_count(), 1);
        assert!(matches!(summary.manifest, ManifestOutcome::Planned));
        assert!(plan.path().join("impl").join("phase1-impl.md").exists());
        assert!(!plan.path().join("impl").join("phase1").exists());
        assert_eq!(
            fs::read_to_string(plan.path().join("state.yaml")).unwrap(),
            "- impl/phase1-impl.md\n"
        );
    }

    #[test]
    fn test_keep_source() {
        let plan = plan_with(&[("phase1-impl.md", PHASE1)]);
        let options = RunOptions {
            keep_source: true,
            ..Default::default()
        };

        let summary = Orchestrator::new(Config::default(), options).run(plan.path()).unwrap();

        assert!(matches!(
            summary.documents[0].outcome,
            DocumentOutcome::Split {
                state: DocumentState::Written,
                ..
            }
        ));
        assert!(plan.path().join("impl").join("phase1-impl.md").exists());
        assert!(plan.path().join("impl").join("phase1").join("task1.md").exists());
    }

    #[test]
    fn test_with_writer_keeps_dry_run() {
        let plan = plan_with(&[("phase1-impl.md", PHASE1)]);
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };
        let config = Config {
            task_prefix: "step".to_string(),
            ..Default::default()
        };

        let summary = Orchestrator::new(Config::default(), options)
            .with_writer(SplitWriter::new(&config))
            .run(plan.path())
            .unwrap();

        let DocumentOutcome::Split { report, .. } = &summary.documents[0].outcome else {
            panic!("Expected split outcome");
        };
        assert!(report.path_of("step1").is_some());
        assert!(!plan.path().join("impl").join("phase1").exists());
    }

    #[test]
    fn test_storage_fault_stops_only_its_document() {
        let plan = plan_with(&[("phase1-impl.md", PHASE1), ("phase2-impl.md", PHASE1)]);
        let impl_dir = plan.path().join("impl");
        fs::write(impl_dir.join("phase1"), "not a directory").unwrap();
        fs::write(
            plan.path().join("state.yaml"),
            "- impl/phase1-impl.md\n- impl/phase2-impl.md\n",
        )
        .unwrap();

        let summary = Orchestrator::new(Config::default(), RunOptions::default())
            .run(plan.path())
            .unwrap();

        assert_eq!(summary.split_count(), 1);
        assert_eq!(summary.failed_count(), 1);
        assert!(summary.has_failures());
        assert!(matches!(
            summary.documents[0].outcome,
            DocumentOutcome::Failed {
                state: DocumentState::Segmented,
                error: SplitError::Storage { .. },
            }
        ));
        assert!(matches!(summary.manifest, ManifestOutcome::Rewritten));

        assert!(impl_dir.join("phase1-impl.md").exists());
        assert!(!impl_dir.join("phase2-impl.md").exists());
        assert!(impl_dir.join("phase2").join("task1.md").exists());
        assert_eq!(
            fs::read_to_string(plan.path().join("state.yaml")).unwrap(),
            "- impl/phase1-impl.md\n- impl/phase2/\n"
        );
    }

    #[test]
    fn test_empty_impl_dir_is_nothing_to_do() {
        let plan = plan_with(&[]);
        let summary = Orchestrator::new(Config::default(), RunOptions::default())
            .run(plan.path())
            .unwrap();

        assert!(summary.documents.is_empty());
        assert!(matches!(summary.manifest, ManifestOutcome::NotNeeded));
    }
}
