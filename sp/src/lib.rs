//! split-impl - phase implementation plan splitter
//!
//! Turns each monolithic `impl/phaseN-impl.md` of a plan directory into a
//! directory of small documents, one per task, so an agent can load a single
//! task without the rest of the phase.
//!
//! # Layout
//!
//! ```text
//! plan/
//! ├── state.yaml            # manifest: `- impl/phase1-impl.md` -> `- impl/phase1/`
//! └── impl/
//!     └── phase1/
//!         ├── context.md    # everything outside the task list
//!         ├── task1.md
//!         └── task2.md
//! ```
//!
//! # Example
//!
//! ```ignore
//! use splitimpl::{Config, Orchestrator, RunOptions};
//!
//! let summary = Orchestrator::new(Config::default(), RunOptions::default()).run("plans/auth".as_ref())?;
//! println!("Split {} file(s)", summary.split_count());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod identifier;
pub mod manifest;
pub mod orchestrator;
pub mod segment;
pub mod writer;

pub use config::Config;
pub use error::{Result, SplitError};
pub use identifier::{AnnotationMatcher, HeadingMatcher, IdMatcher, IdentifierExtractor, TaskId};
pub use manifest::{ReferenceUpdate, rewrite_manifest, rewrite_references};
pub use orchestrator::{
    DocumentOutcome, DocumentResult, DocumentState, ManifestOutcome, Orchestrator, PhaseDocument, RunOptions,
    RunSummary, discover,
};
pub use segment::{Segmentation, TaskSection, segment};
pub use writer::{SkippedSection, SplitReport, SplitWriter, WrittenFile, context_document};
