//! State and transition records
//!
//! Plain data extracted from the generated sources. Parent, children, and
//! initial-state relations are stored as state *names*; the
//! [`StateMachine`](super::StateMachine) arena is the single owner of every
//! `State` and resolves names on demand, so the tree carries no ownership
//! cycles.

use crate::core::{HsmError, Result};

/// An event-driven transition out of one source state.
///
/// Several fallthrough `case` labels that share one transition body are kept
/// as a single transition with multiple events, not as duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub source: String,
    pub events: Vec<String>,
    pub guard: Option<String>,
    pub action: Option<String>,
    pub target: String,
}

impl Transition {
    pub fn new(
        source: impl Into<String>,
        events: Vec<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            events,
            guard: None,
            action: None,
            target: target.into(),
        }
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Render the event list as a single diagram label.
    ///
    /// A lone event is used verbatim. Several events are parenthesized and
    /// pipe-separated; once the count exceeds `wrap`, separators become
    /// `\n| ` so the rendering tool breaks the label across lines.
    pub fn events_label(&self, wrap: Option<usize>) -> String {
        if self.events.len() == 1 {
            return self.events[0].clone();
        }
        let separator = match wrap {
            Some(wrap) if self.events.len() > wrap => "\\n| ",
            _ => " | ",
        };
        format!("({})", self.events.join(separator))
    }

    /// Describe the transition in eUML syntax for the transition-table dump
    pub fn euml_string(&self) -> String {
        format!(
            "{} + {} [{}] / {} == {}",
            self.source,
            self.events_label(None),
            self.guard.as_deref().unwrap_or(""),
            self.action.as_deref().unwrap_or(""),
            self.target,
        )
    }
}

/// One state in the hierarchy
#[derive(Debug, Clone, Default)]
pub struct State {
    name: String,
    parent: Option<String>,
    children: Vec<String>,
    initial: Option<String>,
    transitions: Vec<Transition>,
    entry: Vec<String>,
    exit: Vec<String>,
}

impl State {
    /// Create the root state (no parent; by convention named `Top`)
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Create a state nested under `parent`
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Child names in discovery order
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Name of the initial substate, if this is a composite state
    pub fn initial(&self) -> Option<&str> {
        self.initial.as_deref()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn entry_actions(&self) -> &[String] {
        &self.entry
    }

    pub fn exit_actions(&self) -> &[String] {
        &self.exit
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn register_child(&mut self, child: &str) {
        self.children.push(child.to_string());
    }

    /// Record the initial substate; `child` must already be registered
    pub(crate) fn set_initial(&mut self, child: &str) -> Result<()> {
        if !self.children.iter().any(|c| c == child) {
            return Err(HsmError::invariant(format!(
                "initial state {} is not a child of {}",
                child, self.name
            )));
        }
        self.initial = Some(child.to_string());
        Ok(())
    }

    /// Append a transition; its source must be this state
    pub fn add_transition(&mut self, transition: Transition) -> Result<()> {
        if transition.source != self.name {
            return Err(HsmError::invariant(format!(
                "transition from {} attached to {}",
                transition.source, self.name
            )));
        }
        self.transitions.push(transition);
        Ok(())
    }

    /// Append an entry-action statement; comment-only and blank lines are
    /// discarded, not stored
    pub fn add_entry(&mut self, statement: &str) {
        if let Some(statement) = filter_statement(statement) {
            self.entry.push(statement);
        }
    }

    /// Append an exit-action statement, with the same filtering as entry
    pub fn add_exit(&mut self, statement: &str) {
        if let Some(statement) = filter_statement(statement) {
            self.exit.push(statement);
        }
    }
}

fn filter_statement(statement: &str) -> Option<String> {
    let stripped = statement.trim();
    if stripped.is_empty() || stripped.starts_with("//") {
        return None;
    }
    Some(stripped.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event_label_is_verbatim() {
        let t = Transition::new("Drunk", vec!["call911".into()], "Dead");
        assert_eq!(t.events_label(Some(3)), "call911");
    }

    #[test]
    fn test_multiple_events_are_pipe_separated() {
        let t = Transition::new(
            "Sober",
            vec!["eDrinkBeer".into(), "eDrinkWiskey".into()],
            "Drunk",
        );
        assert_eq!(t.events_label(Some(3)), "(eDrinkBeer | eDrinkWiskey)");
    }

    #[test]
    fn test_event_label_wraps_past_threshold() {
        let t = Transition::new(
            "Sober",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            "Drunk",
        );
        assert_eq!(t.events_label(Some(3)), "(a\\n| b\\n| c\\n| d)");
        // No wrap threshold: stay on one line no matter the count
        assert_eq!(t.events_label(None), "(a | b | c | d)");
    }

    #[test]
    fn test_euml_string() {
        let t = Transition::new("Drunk", vec!["call911".into()], "Dead").with_guard("bac>0.3");
        assert_eq!(t.euml_string(), "Drunk + call911 [bac>0.3] /  == Dead");
    }

    #[test]
    fn test_entry_filtering_drops_comments_and_blanks() {
        let mut state = State::new("Alive", "Top");
        state.add_entry("  mAlive = true;  ");
        state.add_entry("// ignored");
        state.add_entry("   ");
        assert_eq!(state.entry_actions(), ["mAlive = true;"]);
    }

    #[test]
    fn test_set_initial_requires_registered_child() {
        let mut state = State::root("Top");
        state.register_child("Alive");
        assert!(state.set_initial("Alive").is_ok());
        assert!(state.set_initial("Dead").is_err());
        assert_eq!(state.initial(), Some("Alive"));
    }

    #[test]
    fn test_add_transition_checks_source() {
        let mut state = State::new("Sober", "Alive");
        let good = Transition::new("Sober", vec!["eLookAtWatch".into()], "Bored");
        let bad = Transition::new("Drunk", vec!["eLookAtWatch".into()], "Bored");
        assert!(state.add_transition(good).is_ok());
        assert!(state.add_transition(bad).is_err());
        assert_eq!(state.transitions().len(), 1);
    }
}
