//! Heuristic extraction engine
//!
//! Populates a [`StateMachine`] from the three companion artifacts the
//! eta-hsm convention generates per machine. Extraction is four sequential
//! single-scan passes over line text, not a grammar-based parse; this is
//! acceptable only because the input comes from one fixed, narrow
//! code-generation convention.
//!
//! Pass order is load-bearing: the initial-state and transition passes look
//! up states created by the tree pass. The entry/exit pass is independent
//! but runs last by convention. A `MalformedInput` error aborts the current
//! pass and leaves earlier passes' results intact — partial extraction is a
//! valid, inspectable state.

mod actions;
mod initial;
mod transitions;
mod tree;

pub use actions::EntryExitPass;
pub use initial::InitialStatePass;
pub use transitions::TransitionPass;
pub use tree::TreePass;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, span, Level};
use walkdir::WalkDir;

use crate::core::Result;
use crate::model::StateMachine;

/// One extraction pass: a single forward scan of one artifact's text
pub trait ScanPass {
    /// Pass name for diagnostics
    fn name(&self) -> &'static str;

    /// Scan `input` top to bottom, mutating the machine
    fn scan(&self, input: &str, machine: &mut StateMachine) -> Result<()>;
}

/// The three text artifacts the convention generates per machine
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    /// `<basename>.hpp` — state class hierarchy declarations
    pub declaration: String,
    /// `<basename>-hsm.hpp` — init functions and event-dispatch blocks
    pub behavior: String,
    /// `<basename>-inl.hpp` — entry/exit action bodies
    pub implementation: String,
}

impl ArtifactSet {
    pub const DECLARATION_SUFFIX: &'static str = ".hpp";
    pub const BEHAVIOR_SUFFIX: &'static str = "-hsm.hpp";
    pub const IMPLEMENTATION_SUFFIX: &'static str = "-inl.hpp";

    /// Build an artifact set from in-memory sources
    pub fn from_sources(
        declaration: impl Into<String>,
        behavior: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Self {
        Self {
            declaration: declaration.into(),
            behavior: behavior.into(),
            implementation: implementation.into(),
        }
    }

    /// Locate and read the three artifacts for `basename` anywhere under
    /// `dir`. A missing artifact is an ordinary I/O error.
    pub fn locate(dir: impl AsRef<Path>, basename: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let declaration = read_named(dir, &format!("{}{}", basename, Self::DECLARATION_SUFFIX))?;
        let behavior = read_named(dir, &format!("{}{}", basename, Self::BEHAVIOR_SUFFIX))?;
        let implementation =
            read_named(dir, &format!("{}{}", basename, Self::IMPLEMENTATION_SUFFIX))?;
        Ok(Self {
            declaration,
            behavior,
            implementation,
        })
    }
}

/// Find a file by exact name under `dir` and read it fully into memory
fn read_named(dir: &Path, file_name: &str) -> Result<String> {
    let path = find_file(dir, file_name).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found under {}", file_name, dir.display()),
        )
    })?;
    debug!(path = %path.display(), "reading artifact");
    Ok(fs::read_to_string(path)?)
}

fn find_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
}

/// Run all four extraction passes in their required order
pub fn extract_all(machine: &mut StateMachine, artifacts: &ArtifactSet) -> Result<()> {
    run_pass(&TreePass, &artifacts.declaration, machine)?;
    run_pass(&InitialStatePass, &artifacts.behavior, machine)?;
    run_pass(&TransitionPass, &artifacts.behavior, machine)?;
    run_pass(&EntryExitPass, &artifacts.implementation, machine)?;
    info!(
        basename = machine.basename(),
        states = machine.states().len(),
        "extraction complete"
    );
    Ok(())
}

fn run_pass(pass: &dyn ScanPass, input: &str, machine: &mut StateMachine) -> Result<()> {
    let pass_span = span!(Level::DEBUG, "scan", pass = pass.name());
    let _enter = pass_span.enter();
    pass.scan(input, machine)
}
