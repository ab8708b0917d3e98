//! Materializes a [`Segmentation`] as a directory of documents
//!
//! ```text
//! impl/phase1/
//! ├── context.md   # preamble + postamble
//! ├── task1.md
//! ├── task2.md
//! └── task3b.md
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SplitError};
use crate::identifier::IdentifierExtractor;
use crate::segment::Segmentation;

/// A document the writer will produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Logical name, e.g. `context` or `task3b`
    pub name: String,
    /// File name inside the target directory
    pub file_name: String,
    /// Full file content, always ending in a single newline
    pub content: String,
}

/// A task section that produced no file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSection {
    /// One-based line number of the section heading in the source document
    pub line: usize,
    /// The heading line, for reporting
    pub heading: String,
}

/// A file written (or, in dry-run mode, that would be written)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub name: String,
    pub path: PathBuf,
}

/// Outcome of writing one document's split
#[derive(Debug, Clone, Default)]
pub struct SplitReport {
    /// Files in write order: context first, then tasks in document order
    pub files: Vec<WrittenFile>,
    /// Sections skipped for lack of an identifier
    pub skipped: Vec<SkippedSection>,
    /// Identifiers that more than one section resolved to
    pub duplicates: Vec<String>,
}

impl SplitReport {
    /// Look up the path written for a logical name
    pub fn path_of(&self, name: &str) -> Option<&Path> {
        self.files.iter().find(|f| f.name == name).map(|f| f.path.as_path())
    }
}

/// Plan of every file derived from one segmentation
#[derive(Debug, Clone, Default)]
pub struct SplitPlan {
    pub files: Vec<PlannedFile>,
    pub skipped: Vec<SkippedSection>,
    pub duplicates: Vec<String>,
}

/// Writes context and task documents for a segmented plan
pub struct SplitWriter {
    extractor: IdentifierExtractor,
    context_name: String,
    task_prefix: String,
    extension: String,
    dry_run: bool,
}

impl SplitWriter {
    /// Create a writer using the naming rules from config
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: IdentifierExtractor::default(),
            context_name: config.context_name.clone(),
            task_prefix: config.task_prefix.clone(),
            extension: config.extension.clone(),
            dry_run: false,
        }
    }

    /// Plan files but never touch the filesystem
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace the identifier strategy chain
    pub fn with_extractor(mut self, extractor: IdentifierExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension)
    }

    /// Work out every file to write without doing any I/O
    pub fn plan(&self, seg: &Segmentation) -> SplitPlan {
        let mut plan = SplitPlan::default();

        plan.files.push(PlannedFile {
            name: self.context_name.clone(),
            file_name: self.file_name(&self.context_name),
            content: context_document(&seg.preamble, &seg.postamble),
        });

        let mut seen = HashSet::new();
        for section in &seg.sections {
            let Some(id) = self.extractor.extract(&section.text) else {
                let heading = section.trimmed().lines().next().unwrap_or_default().to_string();
                warn!(line = section.start_line + 1, %heading, "plan: could not extract task id");
                plan.skipped.push(SkippedSection {
                    line: section.start_line + 1,
                    heading,
                });
                continue;
            };

            let name = format!("{}{}", self.task_prefix, id);
            if !seen.insert(name.clone()) {
                warn!(%name, line = section.start_line + 1, "plan: duplicate task id, later section wins");
                plan.duplicates.push(name.clone());
                plan.files.retain(|f| f.name != name);
            }

            plan.files.push(PlannedFile {
                file_name: self.file_name(&name),
                name,
                content: format!("{}\n", section.trimmed()),
            });
        }

        plan
    }

    /// Write the split of `seg` into `target_dir`, creating it if needed
    pub fn write(&self, target_dir: &Path, seg: &Segmentation) -> Result<SplitReport> {
        let plan = self.plan(seg);

        if !self.dry_run {
            fs::create_dir_all(target_dir).map_err(|e| SplitError::storage(target_dir, e))?;
        }

        let mut report = SplitReport {
            skipped: plan.skipped,
            duplicates: plan.duplicates,
            ..Default::default()
        };

        for file in plan.files {
            let path = target_dir.join(&file.file_name);
            if self.dry_run {
                debug!(path = %path.display(), bytes = file.content.len(), "write: dry run");
            } else {
                fs::write(&path, &file.content).map_err(|e| SplitError::storage(&path, e))?;
                info!(path = %path.display(), bytes = file.content.len(), "write: created");
            }
            report.files.push(WrittenFile { name: file.name, path });
        }

        Ok(report)
    }
}

/// Join preamble and postamble with a blank line, trimmed, ending in one newline
pub fn context_document(preamble: &str, postamble: &str) -> String {
    let mut content = preamble.to_string();
    if !postamble.is_empty() {
        content.push_str("\n\n");
        content.push_str(postamble);
    }
    format!("{}\n", content.trim())
}
