//! The state-machine arena and its ancestry queries

use std::collections::BTreeSet;

use tracing::debug;

use super::state::{State, Transition};
use crate::core::{HsmError, Result};

/// Name of the distinguished root state every machine is assumed to have
pub const TOP_STATE: &str = "Top";

/// A collection of states makes a state machine.
///
/// States live in an insertion-ordered arena keyed by name; parent, child,
/// and initial-state relations are name references resolved through the
/// arena. Structural data is append-only during extraction and read-only
/// afterwards, so a fully extracted machine can be shared freely between
/// diagram renders.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    basename: String,
    namespace: String,
    states: Vec<State>,
}

impl StateMachine {
    /// Create an empty machine for the artifact set named by `basename`,
    /// whose dispatch functions live in C++ namespace `namespace_`
    pub fn new(basename: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            namespace: namespace.into(),
            states: Vec::new(),
        }
    }

    /// Basename shared by the machine's source artifacts
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// C++ namespace qualifying the machine's dispatch functions
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// All states in extraction order
    pub fn states(&self) -> &[State] {
        &self.states
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|s| s.name() == name)
    }

    /// Look up a state by name
    pub fn state(&self, name: &str) -> Result<&State> {
        self.states
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| HsmError::unknown_state(name))
    }

    fn state_mut(&mut self, name: &str) -> Result<&mut State> {
        self.states
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| HsmError::unknown_state(name))
    }

    /// Register a new state and link it into its parent's child list.
    ///
    /// The parent must already be registered; re-registering a name fails
    /// with [`HsmError::DuplicateState`].
    pub fn add_state(&mut self, state: State) -> Result<()> {
        if self.index(state.name()).is_some() {
            return Err(HsmError::duplicate_state(state.name()));
        }
        if let Some(parent) = state.parent().map(str::to_string) {
            self.state_mut(&parent)?.register_child(state.name());
        }
        debug!(state = state.name(), parent = ?state.parent(), "registered state");
        self.states.push(state);
        Ok(())
    }

    /// Record the initial substate of a composite state
    pub fn set_initial(&mut self, superstate: &str, child: &str) -> Result<()> {
        self.state(child)?;
        self.state_mut(superstate)?.set_initial(child)
    }

    /// Attach a transition to its source state
    pub fn add_transition(&mut self, transition: Transition) -> Result<()> {
        let source = transition.source.clone();
        self.state_mut(&source)?.add_transition(transition)
    }

    /// Append an entry-action statement to a state
    pub fn add_entry(&mut self, state: &str, statement: &str) -> Result<()> {
        self.state_mut(state)?.add_entry(statement);
        Ok(())
    }

    /// Append an exit-action statement to a state
    pub fn add_exit(&mut self, state: &str, statement: &str) -> Result<()> {
        self.state_mut(state)?.add_exit(statement);
        Ok(())
    }

    /// Is `name` nested (at any depth) inside `ancestor`?
    ///
    /// Walks the parent chain; the chain always terminates at [`TOP_STATE`],
    /// which itself is a substate of nothing.
    pub fn is_substate_of(&self, name: &str, ancestor: &str) -> Result<bool> {
        let mut current = self.state(name)?;
        loop {
            let parent = match current.parent() {
                Some(parent) => parent,
                None => return Ok(false),
            };
            if parent == ancestor {
                return Ok(true);
            }
            if parent == TOP_STATE {
                return Ok(false);
            }
            current = self.state(parent)?;
        }
    }

    /// How many nesting levels below `ancestor` does `name` sit?
    ///
    /// Returns `Some(0)` both when `name` equals `ancestor` and when `name`
    /// is the absolute root; callers rely on the zero in both cases.
    /// Returns `None` when the walk reaches [`TOP_STATE`] without finding
    /// `ancestor`.
    pub fn nesting_depth_below(&self, name: &str, ancestor: &str) -> Result<Option<usize>> {
        let mut current = self.state(name)?;
        let mut depth = 0usize;
        loop {
            if current.name() == TOP_STATE || current.name() == ancestor {
                return Ok(Some(depth));
            }
            let parent = match current.parent() {
                Some(parent) => parent,
                None => return Ok(None),
            };
            if parent == ancestor {
                return Ok(Some(depth + 1));
            }
            if parent == TOP_STATE {
                return Ok(None);
            }
            current = self.state(parent)?;
            depth += 1;
        }
    }

    /// Closest ancestor of `name` (possibly `name` itself) nested at most
    /// `max_depth` levels below `ancestor`.
    ///
    /// Requires `name` to be a substate of `ancestor` (or equal to it);
    /// anything else is a programming error surfaced as
    /// [`HsmError::InvariantViolation`]. Depth along the parent chain only
    /// shrinks walking upward, so the first state within the bound is the
    /// closest one.
    pub fn ancestor_at_most_n_levels_below(
        &self,
        name: &str,
        ancestor: &str,
        max_depth: usize,
    ) -> Result<&State> {
        if name != ancestor && !self.is_substate_of(name, ancestor)? {
            return Err(HsmError::invariant(format!(
                "{} is not a substate of {}",
                name, ancestor
            )));
        }
        let mut current = self.state(name)?;
        loop {
            match self.nesting_depth_below(current.name(), ancestor)? {
                Some(depth) if depth <= max_depth => return Ok(current),
                _ => {
                    let parent = current.parent().ok_or_else(|| {
                        HsmError::invariant(format!(
                            "ancestor walk from {} escaped the hierarchy",
                            name
                        ))
                    })?;
                    current = self.state(parent)?;
                }
            }
        }
    }

    /// The set of all events USED by the machine's transitions.
    ///
    /// Conceptually distinct from the events DEFINED by the source event
    /// enumeration; comparing the two is left to the caller.
    pub fn event_set(&self) -> BTreeSet<String> {
        let mut events = BTreeSet::new();
        for state in &self.states {
            for transition in state.transitions() {
                events.extend(transition.events.iter().cloned());
            }
        }
        events
    }

    /// Indented dump of the state tree, one line per state, with
    /// `( --> Child)` marking initial substates
    pub fn hierarchy_lines(&self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        self.hierarchy_lines_for(TOP_STATE, 0, &mut lines)?;
        Ok(lines)
    }

    fn hierarchy_lines_for(
        &self,
        name: &str,
        indentation: usize,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        let state = self.state(name)?;
        let mut line = format!("{}{}", " ".repeat(indentation), state.name());
        if let Some(initial) = state.initial() {
            line.push_str(&format!(" ( --> {})", initial));
        }
        lines.push(line);
        for child in state.children() {
            self.hierarchy_lines_for(child, indentation + 4, lines)?;
        }
        Ok(())
    }

    /// Indented eUML dump of every transition, grouped by owning state
    pub fn table_lines(&self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        self.table_lines_for(TOP_STATE, 0, &mut lines)?;
        Ok(lines)
    }

    fn table_lines_for(
        &self,
        name: &str,
        indentation: usize,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        let state = self.state(name)?;
        for transition in state.transitions() {
            lines.push(format!(
                "{}{}",
                " ".repeat(indentation),
                transition.euml_string()
            ));
        }
        for child in state.children() {
            self.table_lines_for(child, indentation + 4, lines)?;
        }
        Ok(())
    }
}
