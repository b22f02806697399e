//! Stateroom - scrape eta-hsm generated C++ into PlantUML state diagrams
//!
//! The eta-hsm convention generates three companion text artifacts per
//! hierarchical state machine. Stateroom scans them heuristically,
//! reconstructs the machine (states, nesting, initial states, event-driven
//! transitions, entry/exit actions), and renders scoped, depth-limited
//! PlantUML state diagrams from the model.
//!
//! # Quick Start
//!
//! ```rust
//! use stateroom::{ArtifactSet, DiagramOptions};
//!
//! let artifacts = ArtifactSet::from_sources(
//!     "using Top = eta_hsm::TopState<Traits<State::eTop>>;\n\
//!      using Idle = eta_hsm::LeafState<Traits<State::eIdle>, Top>;\n",
//!     "",
//!     "",
//! );
//! let machine = stateroom::extract("Machine", "machine", &artifacts).unwrap();
//! let diagram = stateroom::diagram(&machine, DiagramOptions::default()).unwrap();
//! assert!(diagram.starts_with("@startuml"));
//! assert!(diagram.contains("state Idle {"));
//! ```
//!
//! # Advanced Usage
//!
//! For more control, use the individual components:
//!
//! ```rust
//! use stateroom::prelude::*;
//!
//! let mut machine = StateMachine::new("Machine", "machine");
//! machine.add_state(State::root(TOP_STATE)).unwrap();
//! machine.add_state(State::new("Idle", TOP_STATE)).unwrap();
//!
//! let renderer = PlantUmlRenderer::with_options(DiagramOptions::new().scoped("Idle"));
//! let diagram = renderer.render(&machine).unwrap();
//! assert!(diagram.contains("state Idle {"));
//! ```

pub mod core;
pub mod diagram;
pub mod extract;
pub mod model;

pub use crate::core::{HsmError, Result};
pub use crate::diagram::{DiagramOptions, PlantUmlRenderer, OUT_OF_SCOPE};
pub use crate::extract::{extract_all, ArtifactSet};
pub use crate::model::{State, StateMachine, Transition, TOP_STATE};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{HsmError, Result};
    pub use crate::diagram::{DiagramOptions, PlantUmlRenderer, OUT_OF_SCOPE};
    pub use crate::extract::{
        extract_all, ArtifactSet, EntryExitPass, InitialStatePass, ScanPass, TransitionPass,
        TreePass,
    };
    pub use crate::model::{State, StateMachine, Transition, TOP_STATE};
}

/// Extract a complete state machine from an artifact set.
///
/// Runs the four extraction passes in their required order against a fresh
/// machine. `basename` names the artifact set; `namespace` is the C++
/// namespace qualifying the machine's dispatch functions.
pub fn extract(basename: &str, namespace: &str, artifacts: &ArtifactSet) -> Result<StateMachine> {
    let mut machine = StateMachine::new(basename, namespace);
    extract_all(&mut machine, artifacts)?;
    Ok(machine)
}

/// Extract a machine by locating its artifacts under `dir` by basename
pub fn extract_from_dir(
    dir: impl AsRef<std::path::Path>,
    basename: &str,
    namespace: &str,
) -> Result<StateMachine> {
    let artifacts = ArtifactSet::locate(dir, basename)?;
    extract(basename, namespace, &artifacts)
}

/// Render one PlantUML document from a fully extracted machine
pub fn diagram(machine: &StateMachine, options: DiagramOptions) -> Result<String> {
    PlantUmlRenderer::with_options(options).render(machine)
}
