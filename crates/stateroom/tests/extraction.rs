//! Full-pipeline extraction from a realistic artifact set on disk

use std::fs;

use stateroom::prelude::*;
use tempfile::tempdir;

const DECLARATION: &str = r#"
#pragma once

namespace example_control {

/// Declare the states that exist in this example Hsm here
using Top = eta_hsm::TopState<ExampleTraits<ExampleState::eTop>>;
using Alive = eta_hsm::CompState<ExampleTraits<ExampleState::eAlive>, Top>;
using Sober = eta_hsm::LeafState<ExampleTraits<ExampleState::eSober>, Alive>;
using Drunk = eta_hsm::LeafState<ExampleTraits<ExampleState::eDrunk>, Alive>;
using Dead = eta_hsm::LeafState<ExampleTraits<ExampleState::eDead>, Top>;

}  // namespace example_control
"#;

const BEHAVIOR: &str = r#"
#pragma once

namespace example_control {

template<> inline void example_control::Top::init(example_control::ExampleControl& stateMachine)
{
    Init<example_control::Alive> i(stateMachine);
}

template<> inline void example_control::Alive::init(example_control::ExampleControl& stateMachine)
{
    Init<example_control::Sober> i(stateMachine);
}

template<>
template<typename Current>
inline void example_control::Sober::handleEvent(example_control::ExampleControl& stateMachine, const Current& currentState, Event event) const
{
    switch (event)
    {
        case example_control::ExampleEvent::eDrinkBeer:
        case example_control::ExampleEvent::eDrinkWiskey:
        {
            stateMachine.increaseBac(0.025);
            if(stateMachine.getBac() >= 0.08)
            {
                Transition<Current, ThisState, example_control::Drunk> t(stateMachine);
            }
            return;
        }
        default:
            break;
    }
    return ParentState::handleEvent(stateMachine, currentState, event);
}

template<>
template<typename Current>
inline void example_control::Drunk::handleEvent(example_control::ExampleControl& stateMachine, const Current& currentState, Event event) const
{
    switch (event)
    {
        case example_control::ExampleEvent::eCall911:
        {
            Transition<Current, ThisState, example_control::Dead> t(stateMachine);
            return;
        }
        default:
            break;
    }
    return ParentState::handleEvent(stateMachine, currentState, event);
}

}  // namespace example_control
"#;

const IMPLEMENTATION: &str = r#"
#pragma once

namespace example_control {

template<>
inline void ExampleControl::entry<ExampleState::eAlive>()
{
    mAlive = true;
}

template<>
inline void ExampleControl::exit<ExampleState::eAlive>()
{
    mAlive = false;
}

template<>
inline void ExampleControl::entry<ExampleState::eDead>()
{
    // the one state you never leave
    mAlive = false;
}

}  // namespace example_control
"#;

fn write_artifacts(dir: &std::path::Path) {
    fs::write(dir.join("exampleHsm.hpp"), DECLARATION).unwrap();
    fs::write(dir.join("exampleHsm-hsm.hpp"), BEHAVIOR).unwrap();
    fs::write(dir.join("exampleHsm-inl.hpp"), IMPLEMENTATION).unwrap();
}

#[test]
fn extracts_the_full_machine_from_disk() {
    let dir = tempdir().unwrap();
    write_artifacts(dir.path());

    let machine =
        stateroom::extract_from_dir(dir.path(), "exampleHsm", "example_control").unwrap();

    assert_eq!(machine.states().len(), 5);
    assert_eq!(machine.state(TOP_STATE).unwrap().children(), ["Alive", "Dead"]);
    assert_eq!(machine.state("Alive").unwrap().children(), ["Sober", "Drunk"]);

    assert_eq!(machine.state(TOP_STATE).unwrap().initial(), Some("Alive"));
    assert_eq!(machine.state("Alive").unwrap().initial(), Some("Sober"));

    let sober = machine.state("Sober").unwrap().transitions();
    assert_eq!(sober.len(), 1);
    assert_eq!(sober[0].events, ["eDrinkBeer", "eDrinkWiskey"]);
    assert_eq!(sober[0].target, "Drunk");
    assert_eq!(sober[0].guard.as_deref(), Some("stateMachine.getBac() >= 0.08"));

    let drunk = machine.state("Drunk").unwrap().transitions();
    assert_eq!(drunk.len(), 1);
    assert_eq!(drunk[0].events, ["eCall911"]);
    assert_eq!(drunk[0].target, "Dead");
    assert_eq!(drunk[0].guard, None);

    assert_eq!(machine.state("Alive").unwrap().entry_actions(), ["mAlive = true;"]);
    assert_eq!(machine.state("Alive").unwrap().exit_actions(), ["mAlive = false;"]);
    // Comment line inside the body was filtered out
    assert_eq!(machine.state("Dead").unwrap().entry_actions(), ["mAlive = false;"]);

    let events: Vec<_> = machine.event_set().into_iter().collect();
    assert_eq!(events, ["eCall911", "eDrinkBeer", "eDrinkWiskey"]);
}

#[test]
fn extracted_machine_renders_a_complete_diagram() {
    let dir = tempdir().unwrap();
    write_artifacts(dir.path());

    let machine =
        stateroom::extract_from_dir(dir.path(), "exampleHsm", "example_control").unwrap();
    let doc = stateroom::diagram(&machine, DiagramOptions::default()).unwrap();

    assert!(doc.starts_with("@startuml\n"));
    assert!(doc.ends_with("@enduml\n"));
    assert!(doc.contains("[*] --> Alive"));
    assert!(doc.contains("[*] --> Sober"));
    assert!(doc.contains("Sober --> Drunk : (eDrinkBeer | eDrinkWiskey) [stateMachine.getBac() >= 0.08]"));
    assert!(doc.contains("Drunk --> Dead : eCall911"));
    assert!(doc.contains("Alive : entry / mAlive = true;"));
    // Everything stayed in scope
    assert!(!doc.contains(OUT_OF_SCOPE));
}

#[test]
fn console_dumps_reflect_the_extracted_structure() {
    let dir = tempdir().unwrap();
    write_artifacts(dir.path());

    let machine =
        stateroom::extract_from_dir(dir.path(), "exampleHsm", "example_control").unwrap();

    let hierarchy = machine.hierarchy_lines().unwrap();
    assert_eq!(
        hierarchy,
        [
            "Top ( --> Alive)",
            "    Alive ( --> Sober)",
            "        Sober",
            "        Drunk",
            "    Dead",
        ]
    );

    let table = machine.table_lines().unwrap();
    assert_eq!(
        table,
        [
            "        Sober + (eDrinkBeer | eDrinkWiskey) [stateMachine.getBac() >= 0.08] /  == Drunk",
            "        Drunk + eCall911 [] /  == Dead",
        ]
    );
}

#[test]
fn missing_behavior_artifact_aborts_extraction() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("exampleHsm.hpp"), DECLARATION).unwrap();
    fs::write(dir.path().join("exampleHsm-inl.hpp"), IMPLEMENTATION).unwrap();

    let err = stateroom::extract_from_dir(dir.path(), "exampleHsm", "example_control").unwrap_err();
    assert!(matches!(err, HsmError::Io { .. }));
}
