//! Transition pass: event-driven transitions
//!
//! Scans the behavior artifact's event-dispatch blocks. Four pieces of
//! context are carried across lines: the current source state, the list of
//! "active" events, and the current guard expression. Several `case` labels
//! may fall through into one transition body; that group becomes a single
//! multi-event transition, and a `return`/`break` ends the group.

use tracing::trace;

use super::ScanPass;
use crate::core::{syntax, HsmError, Result};
use crate::model::{StateMachine, Transition};

pub struct TransitionPass;

impl ScanPass for TransitionPass {
    fn name(&self) -> &'static str {
        "transitions"
    }

    fn scan(&self, input: &str, machine: &mut StateMachine) -> Result<()> {
        // Dispatch functions are qualified by the machine's namespace;
        // requiring it in the marker keeps us out of unrelated switches.
        let dispatch_marker = format!("::handleEvent({}::", machine.namespace());

        let mut source: Option<String> = None;
        let mut events: Vec<String> = Vec::new();
        let mut guard: Option<String> = None;

        for (idx, line) in input.lines().enumerate() {
            let lineno = idx + 1;
            if syntax::is_comment(line) {
                continue;
            }

            if line.contains(&dispatch_marker) {
                let state = dispatch_source(line, lineno)?;
                trace!(source = %state, "dispatch function");
                source = Some(state);
                events.clear();
            } else if line.contains("case") && line.contains("::") {
                if source.is_none() {
                    return Err(HsmError::malformed(
                        "case label before any dispatch function",
                        lineno,
                    ));
                }
                let event = syntax::tokenize(line).last().cloned().ok_or_else(|| {
                    HsmError::malformed("case label without an event", lineno)
                })?;
                trace!(event = %event, "case label");
                events.push(event);
                // a new case resets any guard captured for the previous one
                guard = None;
            } else if line.contains("return") || line.contains("break") {
                // past the end of a case block (which may have fallen
                // through from prior labels)
                events.clear();
            } else if line.contains("if(") || line.contains("if (") {
                guard = Some(syntax::guard_expression(line));
            } else if line.contains("Transition<Current") {
                let source = source.clone().ok_or_else(|| {
                    HsmError::malformed("transition before any dispatch function", lineno)
                })?;
                if events.is_empty() {
                    return Err(HsmError::malformed(
                        "transition with no active events",
                        lineno,
                    ));
                }
                let target = transition_target(line, lineno)?;
                trace!(source = %source, target = %target, events = events.len(), "transition");
                let mut transition = Transition::new(source, events.clone(), target);
                if let Some(guard) = guard.as_deref().filter(|g| !g.is_empty()) {
                    transition = transition.with_guard(guard);
                }
                machine.add_transition(transition)?;
            }
        }
        Ok(())
    }
}

/// Source state named by a dispatch signature, skipping a `detail` segment
fn dispatch_source(line: &str, lineno: usize) -> Result<String> {
    let segment = syntax::scope_segment(line, 1)
        .ok_or_else(|| HsmError::malformed("unqualified dispatch signature", lineno))?;
    if segment == "detail" {
        return syntax::scope_segment(line, 2)
            .map(str::to_string)
            .ok_or_else(|| HsmError::malformed("truncated dispatch signature", lineno));
    }
    Ok(segment.to_string())
}

/// Target state of a `Transition<Current, ThisState, ns::Target>` statement:
/// the last `::` segment before the closing angle bracket, with anything
/// after a comma (internal-transition qualifiers) dropped
fn transition_target(line: &str, lineno: usize) -> Result<String> {
    let start = line
        .find("Transition<Current")
        .ok_or_else(|| HsmError::malformed("missing transition statement", lineno))?;
    let up_to_close = line[start..]
        .split('>')
        .next()
        .unwrap_or_default();
    let target = up_to_close
        .rsplit_once("::")
        .map(|(_, tail)| tail)
        .and_then(|tail| tail.split(',').next())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HsmError::malformed("transition without a qualified target", lineno))?;
    Ok(target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{State, TOP_STATE};

    fn tree() -> StateMachine {
        let mut machine = StateMachine::new("ExampleControl", "example_control");
        machine.add_state(State::root(TOP_STATE)).unwrap();
        machine.add_state(State::new("Alive", TOP_STATE)).unwrap();
        machine.add_state(State::new("Sober", "Alive")).unwrap();
        machine.add_state(State::new("Drunk", "Alive")).unwrap();
        machine.add_state(State::new("Dead", TOP_STATE)).unwrap();
        machine
    }

    const DISPATCH: &str = r#"
template<>
template<typename Current>
inline void example_control::Sober::handleEvent(example_control::ExampleControl& stateMachine, const Current& currentState, Event event) const
{
    switch (event)
    {
        case example_control::ExampleEvent::eDrinkBeer:
        {
            stateMachine.increaseBac(0.025);
            if(stateMachine.getBac() >= 0.08)
            {
                Transition<Current, ThisState, example_control::Drunk> t(stateMachine);
            }
            return;
        }
        case example_control::ExampleEvent::eLookAtWatch:
        {
            Transition<Current, ThisState, example_control::Dead> t(stateMachine);
            return;
        }
        default:
            break;
    }
    return ParentState::handleEvent(stateMachine, currentState, event);
}
"#;

    #[test]
    fn test_guarded_transition_extraction() {
        let mut machine = tree();
        TransitionPass.scan(DISPATCH, &mut machine).unwrap();

        let transitions = machine.state("Sober").unwrap().transitions();
        assert_eq!(transitions.len(), 2);

        assert_eq!(transitions[0].events, ["eDrinkBeer"]);
        assert_eq!(transitions[0].target, "Drunk");
        assert_eq!(
            transitions[0].guard.as_deref(),
            Some("stateMachine.getBac() >= 0.08")
        );

        // Guard was reset by the second case label
        assert_eq!(transitions[1].events, ["eLookAtWatch"]);
        assert_eq!(transitions[1].guard, None);
    }

    #[test]
    fn test_fallthrough_cases_become_one_multi_event_transition() {
        let input = r#"
inline void example_control::Drunk::handleEvent(example_control::ExampleControl& sm, const Current& c, Event event) const
{
    switch (event)
    {
        case example_control::ExampleEvent::eDrinkBeer:
        case example_control::ExampleEvent::eDrinkWiskey:
        {
            Transition<Current, ThisState, example_control::Dead> t(sm);
            return;
        }
    }
}
"#;
        let mut machine = tree();
        TransitionPass.scan(input, &mut machine).unwrap();

        let transitions = machine.state("Drunk").unwrap().transitions();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].events, ["eDrinkBeer", "eDrinkWiskey"]);
    }

    #[test]
    fn test_return_ends_a_fallthrough_group() {
        let input = r#"
inline void example_control::Drunk::handleEvent(example_control::ExampleControl& sm, const Current& c, Event event) const
{
    switch (event)
    {
        case example_control::ExampleEvent::ePassOut:
        {
            return;
        }
        case example_control::ExampleEvent::eDie:
        {
            Transition<Current, ThisState, example_control::Dead> t(sm);
            return;
        }
    }
}
"#;
        let mut machine = tree();
        TransitionPass.scan(input, &mut machine).unwrap();

        let transitions = machine.state("Drunk").unwrap().transitions();
        assert_eq!(transitions.len(), 1);
        // ePassOut's group was closed by its return
        assert_eq!(transitions[0].events, ["eDie"]);
    }

    #[test]
    fn test_detail_qualified_target() {
        let input = r#"
inline void example_control::Drunk::handleEvent(example_control::ExampleControl& sm, const Current& c, Event event) const
{
        case example_control::ExampleEvent::eDie:
            Transition<Current, ThisState, example_control::detail::Dead> t(sm);
}
"#;
        let mut machine = tree();
        TransitionPass.scan(input, &mut machine).unwrap();
        assert_eq!(machine.state("Drunk").unwrap().transitions()[0].target, "Dead");
    }

    #[test]
    fn test_transition_without_active_events_is_fatal() {
        let input = r#"
inline void example_control::Drunk::handleEvent(example_control::ExampleControl& sm, const Current& c, Event event) const
{
            Transition<Current, ThisState, example_control::Dead> t(sm);
}
"#;
        let mut machine = tree();
        let err = TransitionPass.scan(input, &mut machine).unwrap_err();
        assert!(matches!(err, HsmError::MalformedInput { .. }));
    }

    #[test]
    fn test_case_label_before_dispatch_is_malformed() {
        let input = "    case example_control::ExampleEvent::eDie:\n";
        let mut machine = tree();
        let err = TransitionPass.scan(input, &mut machine).unwrap_err();
        assert!(matches!(err, HsmError::MalformedInput { line: 1, .. }));
    }

    #[test]
    fn test_foreign_namespace_dispatch_is_ignored() {
        let input = r#"
inline void other_ns::Sober::handleEvent(other_ns::OtherControl& sm, const Current& c, Event event) const
"#;
        let mut machine = tree();
        // No marker for our namespace: nothing establishes a source state
        TransitionPass.scan(input, &mut machine).unwrap();
        assert!(machine.state("Sober").unwrap().transitions().is_empty());
    }
}
