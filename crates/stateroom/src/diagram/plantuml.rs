//! Recursive scoped PlantUML renderer
//!
//! Walks the state tree depth-first from the scope root and emits nested
//! `state` blocks. Transition targets outside the scope are redirected to a
//! single shared `OutOfScope` pseudo-state; targets hidden by the depth
//! limit or the collapse list are redirected to their nearest visible
//! ancestor with a dotted arrow and a legend note.
//!
//! All per-render bookkeeping (legend entries, the out-of-scope flag) lives
//! in a [`RenderContext`] constructed fresh for each call and threaded
//! through the recursion, so a shared machine can be rendered repeatedly or
//! concurrently.

use std::fmt::Write as _;

use tracing::info;

use super::DiagramOptions;
use crate::core::Result;
use crate::model::{State, StateMachine, Transition};

/// The synthetic state all out-of-scope transition targets point to.
///
/// A per-source "final state" icon bloats diagrams with many exits; one
/// shared pseudo-state at top level keeps them readable.
pub const OUT_OF_SCOPE: &str = "OutOfScope";

const SOLID_ARROW: &str = "-->";
const DOTTED_ARROW: &str = "-[dotted]->";

const LEGEND_HIDDEN_SUBSTATE: &str = "dotted arrow = transition to hidden substate";
const LEGEND_GUARD_OMITTED: &str = "[*] = guard condition omitted";
const LEGEND_ACTION_OMITTED: &str = "/* = transition action omitted";

/// Bookkeeping for one render call
#[derive(Debug, Default)]
struct RenderContext {
    legend: Vec<String>,
    out_of_scope_used: bool,
}

impl RenderContext {
    /// Record a legend note; each distinct note appears at most once
    fn add_legend(&mut self, entry: &str) {
        if !self.legend.iter().any(|e| e == entry) {
            self.legend.push(entry.to_string());
        }
    }
}

/// Renders one diagram per call from an immutable, fully extracted machine
#[derive(Debug, Default)]
pub struct PlantUmlRenderer {
    options: DiagramOptions,
}

impl PlantUmlRenderer {
    pub fn new() -> Self {
        Self {
            options: DiagramOptions::default(),
        }
    }

    pub fn with_options(options: DiagramOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiagramOptions {
        &self.options
    }

    /// Produce the PlantUML document for the configured scope.
    ///
    /// Fails on an unknown scope root or a transition target that was never
    /// declared; the machine itself is never modified, so a failed render
    /// leaves nothing to clean up.
    pub fn render(&self, machine: &StateMachine) -> Result<String> {
        let scope_root = self.options.scope_root();
        let root = machine.state(scope_root)?;

        let mut ctx = RenderContext::default();
        let mut out = String::new();

        out.push_str("@startuml\n");
        self.render_state(machine, root, scope_root, 0, &mut ctx, &mut out)?;

        if ctx.out_of_scope_used {
            out.push_str("state OutOfScope {\n}\n");
        }
        if !ctx.legend.is_empty() {
            out.push_str("legend\n");
            for entry in &ctx.legend {
                let _ = writeln!(out, "  {}", entry);
            }
            out.push_str("end legend\n");
        }
        out.push_str("@enduml\n");

        info!(
            scope_root,
            bytes = out.len(),
            legend_entries = ctx.legend.len(),
            "rendered diagram"
        );
        Ok(out)
    }

    /// Should this state's initial transition and children be rendered?
    fn expands(
        &self,
        machine: &StateMachine,
        state: &State,
        scope_root: &str,
    ) -> Result<bool> {
        if self.options.hides(state.name()) {
            return Ok(false);
        }
        match self.options.max_depth {
            None => Ok(true),
            Some(max_depth) => Ok(machine
                .nesting_depth_below(state.name(), scope_root)?
                .is_some_and(|depth| depth < max_depth)),
        }
    }

    fn render_state(
        &self,
        machine: &StateMachine,
        state: &State,
        scope_root: &str,
        indentation: usize,
        ctx: &mut RenderContext,
        out: &mut String,
    ) -> Result<()> {
        let initial_indent = " ".repeat(indentation);
        let internal_indent = " ".repeat(indentation + 2);

        let _ = writeln!(out, "{}state {} {{", initial_indent, state.name());

        let expands = self.expands(machine, state, scope_root)?;
        if expands {
            if let Some(initial) = state.initial() {
                let _ = writeln!(out, "{}[*] --> {}", internal_indent, initial);
            }
        }

        // entry/exit annotations render even at max depth
        if self.options.include_actions {
            for entry in state.entry_actions() {
                let _ = writeln!(out, "{}{} : entry / {}", internal_indent, state.name(), entry);
            }
            for exit in state.exit_actions() {
                let _ = writeln!(out, "{}{} : exit / {}", internal_indent, state.name(), exit);
            }
        }

        self.render_transitions(machine, state, scope_root, &internal_indent, ctx, out)?;

        if expands {
            for child in state.children() {
                self.render_state(
                    machine,
                    machine.state(child)?,
                    scope_root,
                    indentation + 2,
                    ctx,
                    out,
                )?;
            }
        }

        let _ = writeln!(out, "{}}}", initial_indent);
        Ok(())
    }

    fn render_transitions(
        &self,
        machine: &StateMachine,
        state: &State,
        scope_root: &str,
        internal_indent: &str,
        ctx: &mut RenderContext,
        out: &mut String,
    ) -> Result<()> {
        let depth = machine.nesting_depth_below(state.name(), scope_root)?;

        for transition in state.transitions() {
            let mut arrow = SOLID_ARROW;

            // is the target hidden behind a collapsed state?
            let mut hiding_ancestor: Option<&str> = None;
            for name in &self.options.do_not_expand {
                if machine.is_substate_of(&transition.target, name)? {
                    hiding_ancestor = Some(name.as_str());
                }
            }

            let diagram_target: String;
            if !machine.is_substate_of(&transition.target, scope_root)? {
                diagram_target = OUT_OF_SCOPE.to_string();
                ctx.out_of_scope_used = true;
            } else if self.options.max_depth.is_some()
                && depth == self.options.max_depth
                && machine.is_substate_of(&transition.target, state.name())?
            {
                // At the depth limit, a transition into our own hidden
                // substates is dropped rather than redirected to ourselves,
                // and every later transition of this state goes with it.
                break;
            } else if self.options.hides(state.name()) {
                // Collapsed states likewise drop substate transitions so
                // the hidden children are not drawn implicitly.
                break;
            } else if let Some(redirect) = self.depth_limited_target(machine, transition, scope_root)? {
                diagram_target = redirect;
                arrow = DOTTED_ARROW;
                ctx.add_legend(LEGEND_HIDDEN_SUBSTATE);
            } else if let Some(hiding) = hiding_ancestor {
                diagram_target = hiding.to_string();
                arrow = DOTTED_ARROW;
                ctx.add_legend(LEGEND_HIDDEN_SUBSTATE);
            } else {
                diagram_target = transition.target.clone();
            }

            let mut line = format!(
                "{} {} {} : {}",
                transition.source,
                arrow,
                diagram_target,
                transition.events_label(self.options.event_wrap),
            );
            if let Some(guard) = &transition.guard {
                if self.options.include_guards {
                    let _ = write!(line, " [{}]", guard);
                } else {
                    line.push_str(" [*]");
                    ctx.add_legend(LEGEND_GUARD_OMITTED);
                }
            }
            if let Some(action) = &transition.action {
                if self.options.include_actions {
                    let _ = write!(line, " / {}", action);
                } else {
                    line.push_str(" /*");
                    ctx.add_legend(LEGEND_ACTION_OMITTED);
                }
            }
            let _ = writeln!(out, "{}{}", internal_indent, line);
        }
        Ok(())
    }

    /// If the depth limit hides the transition's true target, the closest
    /// visible ancestor to redirect to
    fn depth_limited_target(
        &self,
        machine: &StateMachine,
        transition: &Transition,
        scope_root: &str,
    ) -> Result<Option<String>> {
        let max_depth = match self.options.max_depth {
            Some(max_depth) => max_depth,
            None => return Ok(None),
        };
        let target_depth = machine.nesting_depth_below(&transition.target, scope_root)?;
        match target_depth {
            Some(depth) if depth > max_depth => {
                let ancestor = machine.ancestor_at_most_n_levels_below(
                    &transition.target,
                    scope_root,
                    max_depth,
                )?;
                Ok(Some(ancestor.name().to_string()))
            }
            _ => Ok(None),
        }
    }
}
