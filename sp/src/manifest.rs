//! Manifest reference rewriting
//!
//! The plan's `state.yaml` lists its artifacts as dash-prefixed entries.
//! After a split, entries pointing at `impl/phaseN-impl.md` must point at the
//! `impl/phaseN/` directory instead. Replacement is literal text substitution,
//! so an identical `- <old>` run of text anywhere in the file is rewritten too.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Result, SplitError};

/// One old-path to new-path substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceUpdate {
    pub old: String,
    pub new: String,
}

impl ReferenceUpdate {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Apply every update to the manifest text: bare, single- and double-quoted entries
pub fn rewrite_references(content: &str, updates: &[ReferenceUpdate]) -> String {
    let mut content = content.to_string();
    for update in updates {
        for quote in ["", "'", "\""] {
            let from = format!("- {quote}{}{quote}", update.old);
            let to = format!("- {quote}{}{quote}", update.new);
            content = content.replace(&from, &to);
        }
    }
    content
}

/// Rewrite references in the manifest at `path`.
///
/// Returns false without touching anything when the manifest does not exist
/// or there are no updates. The file is only rewritten when its text changes.
pub fn rewrite_manifest(path: &Path, updates: &[ReferenceUpdate]) -> Result<bool> {
    if !path.exists() {
        debug!(path = %path.display(), "rewrite_manifest: no manifest");
        return Ok(false);
    }
    if updates.is_empty() {
        return Ok(false);
    }

    let content = fs::read_to_string(path).map_err(|e| SplitError::storage(path, e))?;
    let rewritten = rewrite_references(&content, updates);

    if rewritten != content {
        fs::write(path, &rewritten).map_err(|e| SplitError::storage(path, e))?;
        info!(path = %path.display(), updates = updates.len(), "rewrite_manifest: updated");
    } else {
        debug!(path = %path.display(), "rewrite_manifest: already up to date");
    }

    Ok(true)
}
