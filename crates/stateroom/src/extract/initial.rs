//! Initial-state pass: the dots on the diagram
//!
//! Scans the behavior artifact for `init` function specializations. The
//! function signature establishes the current superstate; the `Init<...>`
//! line inside it names the substate defaulted into. The superstate context
//! is stateful across lines and persists until the next signature.

use tracing::trace;

use super::ScanPass;
use crate::core::{syntax, HsmError, Result};
use crate::model::StateMachine;

pub struct InitialStatePass;

impl ScanPass for InitialStatePass {
    fn name(&self) -> &'static str {
        "initial-states"
    }

    fn scan(&self, input: &str, machine: &mut StateMachine) -> Result<()> {
        let mut superstate: Option<String> = None;

        for (idx, line) in input.lines().enumerate() {
            let lineno = idx + 1;
            if syntax::is_comment(line) {
                continue;
            }

            if line.contains("::init(") {
                superstate = Some(owning_state(line, lineno)?);
            } else if line.contains("Init<") {
                let target = init_target(line, lineno)?;
                let superstate = superstate.as_deref().ok_or_else(|| {
                    HsmError::malformed("Init marker before any init function signature", lineno)
                })?;
                trace!(superstate = %superstate, target = %target, "initial state");
                machine.set_initial(superstate, &target)?;
            }
        }
        Ok(())
    }
}

/// Superstate named by an `init` signature: the namespace-qualified segment
/// right after the first `::`, skipping an interposed `detail` namespace
fn owning_state(line: &str, lineno: usize) -> Result<String> {
    let segment = syntax::scope_segment(line, 1)
        .ok_or_else(|| HsmError::malformed("unqualified init signature", lineno))?;
    if segment == "detail" {
        return syntax::scope_segment(line, 2)
            .map(str::to_string)
            .ok_or_else(|| HsmError::malformed("truncated init signature", lineno));
    }
    Ok(segment.to_string())
}

/// Target state of an `Init<ns::Target>` marker: the last token of the
/// marker word
fn init_target(line: &str, lineno: usize) -> Result<String> {
    syntax::first_word(line)
        .map(syntax::tokenize)
        .and_then(|tokens| tokens.last().cloned())
        .ok_or_else(|| HsmError::malformed("Init marker without a target", lineno))
}
