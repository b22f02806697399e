//! Hierarchical state-machine data model

mod machine;
mod state;

pub use machine::{StateMachine, TOP_STATE};
pub use state::{State, Transition};
