//! Document segmentation
//!
//! Splits a phase implementation document at its `## Tasks` heading into:
//!
//! ```text
//! # Phase 1                 ┐
//! ...                       ┘ preamble
//! ## Tasks                    (boundary, consumed)
//! ### Task 1: ...           ┐
//! ...                       ┘ section 1
//! ### Task 2: ...           ┐
//! ...                       ┘ section 2
//! ## Validation             ┐
//! ...                       ┘ postamble
//! ```
//!
//! The scan is a two-state machine (outside a task, inside a task) driven by
//! task headings, shallower headings and end of input. Lines inside fenced
//! code blocks are never treated as headings.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##\s+Tasks\s*$").expect("boundary regex"));

static TASK_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^###\s+Task\s+\S+:").expect("task heading regex"));

static SHALLOW_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,2}\s+").expect("heading regex"));

/// One `### Task ...:` section of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSection {
    /// Zero-based index of the task heading line
    pub start_line: usize,
    /// Zero-based index one past the last line of the section
    pub end_line: usize,
    /// Raw section text, lines joined with `\n`
    pub text: String,
}

impl TaskSection {
    /// Section text without surrounding whitespace
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Result of segmenting one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    /// Zero-based index of the `## Tasks` line
    pub boundary_line: usize,
    /// Everything before the boundary, plus any intro text before the first task
    pub preamble: String,
    /// Task sections in document order
    pub sections: Vec<TaskSection>,
    /// Text from the first shallower heading after the tasks to the end, or empty
    pub postamble: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Boundary,
    TaskHeading,
    ShallowHeading,
    Text,
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Outside,
    InTask { start: usize },
}

/// Tracks fenced code blocks so their contents are classified as text.
///
/// A fence closes only on a run of the same character at least as long as
/// the opening run, with nothing but whitespace after it.
#[derive(Debug, Default)]
struct FenceTracker {
    open: Option<(char, usize)>,
}

/// Fence character and run length at the start of a line, if it opens or closes a fence
fn fence_run(line: &str) -> Option<(char, usize, &str)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    Some((marker, len, &trimmed[len..]))
}

impl FenceTracker {
    /// Returns true if the line is inside (or delimits) a fenced block
    fn observe(&mut self, line: &str) -> bool {
        let run = fence_run(line);

        match (self.open, run) {
            (None, Some((marker, len, _))) => {
                self.open = Some((marker, len));
                true
            }
            (Some((open, open_len)), Some((marker, len, rest)))
                if open == marker && len >= open_len && rest.trim().is_empty() =>
            {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        }
    }
}

fn classify(lines: &[&str]) -> Vec<LineKind> {
    let mut fence = FenceTracker::default();
    lines
        .iter()
        .map(|raw| {
            let line = raw.trim_end_matches('\r');
            if fence.observe(line) {
                LineKind::Text
            } else if BOUNDARY_RE.is_match(line) {
                LineKind::Boundary
            } else if TASK_HEADING_RE.is_match(line) {
                LineKind::TaskHeading
            } else if SHALLOW_HEADING_RE.is_match(line) {
                LineKind::ShallowHeading
            } else {
                LineKind::Text
            }
        })
        .collect()
}

/// Segment a document, or return None when it has no `## Tasks` heading
pub fn segment(content: &str) -> Option<Segmentation> {
    let lines: Vec<&str> = content.split('\n').collect();
    let kinds = classify(&lines);

    let boundary = kinds.iter().position(|k| *k == LineKind::Boundary)?;
    debug!(boundary_line = boundary, line_count = lines.len(), "segment: found tasks boundary");

    let mut state = ScanState::Outside;
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut first_task: Option<usize> = None;
    let mut postamble_start: Option<usize> = None;

    for (i, kind) in kinds.iter().enumerate().skip(boundary + 1) {
        state = match (state, kind) {
            (ScanState::Outside, LineKind::TaskHeading) => {
                first_task = Some(i);
                ScanState::InTask { start: i }
            }
            (ScanState::InTask { start }, LineKind::TaskHeading) => {
                spans.push((start, i));
                ScanState::InTask { start: i }
            }
            (ScanState::InTask { start }, LineKind::ShallowHeading | LineKind::Boundary) => {
                spans.push((start, i));
                postamble_start = Some(i);
                ScanState::Outside
            }
            (state, _) => state,
        };
        if postamble_start.is_some() {
            break;
        }
    }

    if let ScanState::InTask { start } = state {
        spans.push((start, lines.len()));
    }

    let join = |from: usize, to: usize| lines[from..to].join("\n");

    let intro_end = first_task.unwrap_or(lines.len());
    let mut preamble = join(0, boundary).trim_end().to_string();
    let intro = join(boundary + 1, intro_end);
    if !intro.trim().is_empty() {
        if !preamble.is_empty() {
            preamble.push_str("\n\n");
        }
        preamble.push_str(intro.trim());
    }

    let postamble = postamble_start
        .map(|start| join(start, lines.len()).trim_end().to_string())
        .unwrap_or_default();

    let sections: Vec<TaskSection> = spans
        .into_iter()
        .map(|(start, end)| TaskSection {
            start_line: start,
            end_line: end,
            text: join(start, end),
        })
        .collect();

    debug!(
        sections = sections.len(),
        has_postamble = !postamble.is_empty(),
        "segment: complete"
    );

    Some(Segmentation {
        boundary_line: boundary,
        preamble,
        sections,
        postamble,
    })
}
