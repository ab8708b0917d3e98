//! Task identifier extraction
//!
//! A task section is named by a short identifier taken from its own text.
//! Strategies are tried in order until one produces a value:
//!
//! 1. [`AnnotationMatcher`] - an explicit `**ID:** `phase2-task4b`` annotation (yields `4b`)
//! 2. [`HeadingMatcher`] - the `### Task 1.3:` heading label (yields `3`)
//!
//! No match is a normal outcome; callers decide what to do with an
//! unidentifiable section.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{Result, SplitError};

static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*ID:\*\*\s*`\w+-task([^`]+)`").expect("annotation regex"));

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^###\s+Task\s+(\S+?):").expect("heading regex"));

/// A file-name-safe task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(String);

impl TaskId {
    /// Validate a raw identifier
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let unsafe_char = |c: char| c == '/' || c == '\\' || c.is_whitespace() || c.is_control();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(unsafe_char) {
            return Err(SplitError::InvalidIdentifier { identifier: raw });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One strategy for pulling an identifier out of a task section
pub trait IdMatcher: Send + Sync {
    /// Short name used in diagnostics
    fn name(&self) -> &'static str;

    /// Return the raw identifier candidate, if this strategy recognizes one
    fn find(&self, section: &str) -> Option<String>;
}

/// Matches `**ID:** `<phase>-task<suffix>`` and returns the suffix verbatim
#[derive(Debug, Default)]
pub struct AnnotationMatcher;

impl IdMatcher for AnnotationMatcher {
    fn name(&self) -> &'static str {
        "annotation"
    }

    fn find(&self, section: &str) -> Option<String> {
        ANNOTATION_RE.captures(section).map(|caps| caps[1].to_string())
    }
}

/// Matches the `### Task <label>:` heading; compound labels keep the part after the last dot
#[derive(Debug, Default)]
pub struct HeadingMatcher;

impl IdMatcher for HeadingMatcher {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn find(&self, section: &str) -> Option<String> {
        let caps = HEADING_RE.captures(section)?;
        let label = &caps[1];
        let suffix = label.rsplit('.').next().unwrap_or(label);
        Some(suffix.to_string())
    }
}

/// Ordered chain of [`IdMatcher`] strategies
pub struct IdentifierExtractor {
    matchers: Vec<Box<dyn IdMatcher>>,
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self::new(vec![Box::new(AnnotationMatcher), Box::new(HeadingMatcher)])
    }
}

impl IdentifierExtractor {
    /// Build an extractor from an explicit strategy order
    pub fn new(matchers: Vec<Box<dyn IdMatcher>>) -> Self {
        Self { matchers }
    }

    /// Append a lower-priority fallback strategy
    pub fn with_fallback(mut self, matcher: impl IdMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Derive the identifier for a section, or None when no strategy applies.
    ///
    /// A candidate that is not file-name safe is discarded and the next
    /// strategy is tried.
    pub fn extract(&self, section: &str) -> Option<TaskId> {
        for matcher in &self.matchers {
            let Some(raw) = matcher.find(section) else {
                continue;
            };
            match TaskId::new(raw) {
                Ok(id) => {
                    debug!(matcher = matcher.name(), %id, "extract: resolved task id");
                    return Some(id);
                }
                Err(e) => {
                    warn!(matcher = matcher.name(), error = %e, "extract: rejected task id");
                }
            }
        }
        None
    }
}
