//! Scoped PlantUML diagram generation

mod plantuml;

pub use plantuml::{PlantUmlRenderer, OUT_OF_SCOPE};

use crate::model::TOP_STATE;

/// Options controlling one diagram's scope and level of detail
#[derive(Debug, Clone)]
pub struct DiagramOptions {
    /// State defining the visible boundary of this diagram; defaults to the
    /// machine's root
    pub scope_root: Option<String>,
    /// Bound on how many nesting levels below the scope root are expanded;
    /// `None` expands everything
    pub max_depth: Option<usize>,
    /// States whose subtrees render collapsed regardless of depth
    pub do_not_expand: Vec<String>,
    /// Show entry/exit annotations and transition actions
    pub include_actions: bool,
    /// Show guard expressions verbatim instead of the omission placeholder
    pub include_guards: bool,
    /// Event count past which multi-event labels wrap onto sub-lines
    pub event_wrap: Option<usize>,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            scope_root: None,
            max_depth: None,
            do_not_expand: Vec::new(),
            include_actions: true,
            include_guards: true,
            event_wrap: Some(3),
        }
    }
}

impl DiagramOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagram only the subtree rooted at `scope_root`
    pub fn scoped(mut self, scope_root: impl Into<String>) -> Self {
        self.scope_root = Some(scope_root.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Render `state` collapsed (children hidden)
    pub fn hide(mut self, state: impl Into<String>) -> Self {
        self.do_not_expand.push(state.into());
        self
    }

    pub fn without_actions(mut self) -> Self {
        self.include_actions = false;
        self
    }

    pub fn without_guards(mut self) -> Self {
        self.include_guards = false;
        self
    }

    /// Name of the state at the top of this diagram
    pub fn scope_root(&self) -> &str {
        self.scope_root.as_deref().unwrap_or(TOP_STATE)
    }

    pub(crate) fn hides(&self, state: &str) -> bool {
        self.do_not_expand.iter().any(|s| s == state)
    }
}
