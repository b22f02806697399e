//! Tree pass: state declarations
//!
//! Scans the declaration artifact for the root/leaf/composite state markers
//! and builds the state hierarchy. The convention declares states in
//! parent-before-child order, and this pass relies on it: a parent is looked
//! up in the table built by earlier lines of the same scan.

use tracing::trace;

use super::ScanPass;
use crate::core::{syntax, HsmError, Result};
use crate::model::{State, StateMachine};

/// Recognizes both the template convention
/// (`using Sober = eta_hsm::LeafState<Traits<...>, Awake>;`) and the macro
/// convention (`ETA_HSM_LEAF_STATE(Machine, Sober, Awake);`).
pub struct TreePass;

impl ScanPass for TreePass {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn scan(&self, input: &str, machine: &mut StateMachine) -> Result<()> {
        for (idx, line) in input.lines().enumerate() {
            let lineno = idx + 1;
            if syntax::is_comment(line) {
                continue;
            }
            let tokens = syntax::tokenize(line);

            if line.contains("TopState<") {
                let name = declared_name(&tokens, lineno)?;
                trace!(state = %name, "root declaration");
                machine.add_state(State::root(name))?;
            } else if has_token(&tokens, "ETA_HSM_TOP_STATE") {
                let name = macro_argument(&tokens, 1, lineno)?;
                trace!(state = %name, "root declaration (macro)");
                machine.add_state(State::root(name))?;
            } else if line.contains("CompState<") || line.contains("LeafState<") {
                let name = declared_name(&tokens, lineno)?;
                if name == "CompState" || name == "LeafState" {
                    // `using` aliases of the library templates look like
                    // state declarations; they are not states
                    continue;
                }
                let parent = tokens.last().cloned().ok_or_else(|| {
                    HsmError::malformed("state declaration without a parent", lineno)
                })?;
                trace!(state = %name, parent = %parent, "state declaration");
                machine.add_state(State::new(name, parent))?;
            } else if has_token(&tokens, "ETA_HSM_COMP_STATE")
                || has_token(&tokens, "ETA_HSM_LEAF_STATE")
            {
                let name = macro_argument(&tokens, 1, lineno)?;
                let parent = macro_argument(&tokens, 2, lineno)?;
                trace!(state = %name, parent = %parent, "state declaration (macro)");
                machine.add_state(State::new(name, parent))?;
            }
        }
        Ok(())
    }
}

fn has_token(tokens: &[String], token: &str) -> bool {
    tokens.iter().any(|t| t == token)
}

/// The declared name of a `using Name = ...State<...>` line
fn declared_name(tokens: &[String], lineno: usize) -> Result<String> {
    tokens
        .iter()
        .position(|t| t == "using")
        .and_then(|pos| tokens.get(pos + 1))
        .cloned()
        .ok_or_else(|| HsmError::malformed("state declaration without a name", lineno))
}

/// The `n`-th argument of an `ETA_HSM_*_STATE(Machine, Name, Parent)` macro
/// invocation (argument 0 is the machine)
fn macro_argument(tokens: &[String], n: usize, lineno: usize) -> Result<String> {
    tokens
        .get(n + 1)
        .cloned()
        .ok_or_else(|| HsmError::malformed("truncated state declaration macro", lineno))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TOP_STATE;

    const TEMPLATE_DECLS: &str = r#"
/// Declare the states that exist in this example Hsm here
using Top = eta_hsm::TopState<ExampleTraits<ExampleState::eTop>>;
using Alive = eta_hsm::CompState<ExampleTraits<ExampleState::eAlive>, Top>;
using Sober = eta_hsm::LeafState<ExampleTraits<ExampleState::eSober>, Alive>;
using Drunk = eta_hsm::LeafState<ExampleTraits<ExampleState::eDrunk>, Alive>;
using Dead = eta_hsm::LeafState<ExampleTraits<ExampleState::eDead>, Top>;
"#;

    #[test]
    fn test_template_declarations_build_the_tree() {
        let mut machine = StateMachine::new("ExampleControl", "example_control");
        TreePass.scan(TEMPLATE_DECLS, &mut machine).unwrap();

        assert_eq!(machine.states().len(), 5);
        assert_eq!(machine.state(TOP_STATE).unwrap().children(), ["Alive", "Dead"]);
        assert_eq!(machine.state("Alive").unwrap().children(), ["Sober", "Drunk"]);
        assert!(machine.state("Sober").unwrap().is_leaf());
    }

    #[test]
    fn test_macro_declarations_build_the_tree() {
        let input = r#"
ETA_HSM_TOP_STATE(UpdateControlHsm, Top);
ETA_HSM_LEAF_STATE(UpdateControlHsm, Off, Top);
ETA_HSM_COMP_STATE(UpdateControlHsm, On, Top);
ETA_HSM_LEAF_STATE(UpdateControlHsm, Warming, On);
"#;
        let mut machine = StateMachine::new("UpdateControlHsm", "update_control");
        TreePass.scan(input, &mut machine).unwrap();

        assert_eq!(machine.states().len(), 4);
        assert_eq!(machine.state("On").unwrap().children(), ["Warming"]);
        assert_eq!(machine.state("Off").unwrap().parent(), Some(TOP_STATE));
    }

    #[test]
    fn test_library_aliases_are_not_states() {
        let input = r#"
using Top = eta_hsm::TopState<Traits<State::eTop>>;
using LeafState = eta_hsm::LeafState<SomeDefault, Top>;
"#;
        let mut machine = StateMachine::new("X", "x");
        TreePass.scan(input, &mut machine).unwrap();
        assert_eq!(machine.states().len(), 1);
    }

    #[test]
    fn test_child_before_parent_fails() {
        let input = r#"
using Sober = eta_hsm::LeafState<Traits<State::eSober>, Alive>;
using Alive = eta_hsm::CompState<Traits<State::eAlive>, Top>;
"#;
        let mut machine = StateMachine::new("X", "x");
        let err = TreePass.scan(input, &mut machine).unwrap_err();
        assert!(matches!(err, HsmError::UnknownState { .. }));
        // Fail-fast: nothing from the bad line onward was registered
        assert!(machine.states().is_empty());
    }

    #[test]
    fn test_commented_declarations_are_skipped() {
        let input = r#"
using Top = eta_hsm::TopState<Traits<State::eTop>>;
// using Ghost = eta_hsm::LeafState<Traits<State::eGhost>, Top>;
"#;
        let mut machine = StateMachine::new("X", "x");
        TreePass.scan(input, &mut machine).unwrap();
        assert_eq!(machine.states().len(), 1);
    }
}
