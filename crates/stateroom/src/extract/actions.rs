//! Entry/exit pass: action bodies
//!
//! Scans the implementation artifact for `entry`/`exit` (or
//! `hsmEntry`/`hsmExit`) specializations and captures the statements between
//! the function's braces verbatim. The scanner is a three-mode state
//! machine; the owning state comes from the signature's enumerator token
//! (`eAlive` names the state `Alive`).

use tracing::trace;

use super::ScanPass;
use crate::core::{syntax, HsmError, Result};
use crate::model::StateMachine;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanMode {
    Idle,
    EntryBlock { state: String },
    ExitBlock { state: String },
}

pub struct EntryExitPass;

impl ScanPass for EntryExitPass {
    fn name(&self) -> &'static str {
        "entry-exit"
    }

    fn scan(&self, input: &str, machine: &mut StateMachine) -> Result<()> {
        let mut mode = ScanMode::Idle;

        for (idx, line) in input.lines().enumerate() {
            let lineno = idx + 1;
            if syntax::is_comment(line) {
                continue;
            }
            let trimmed = line.trim();

            if is_entry_signature(line) {
                let state = owning_state(line, lineno)?;
                trace!(state = %state, "entry function");
                mode = ScanMode::EntryBlock { state };
            } else if is_exit_signature(line) {
                let state = owning_state(line, lineno)?;
                trace!(state = %state, "exit function");
                mode = ScanMode::ExitBlock { state };
            } else if trimmed == "{" {
                // block opener belongs to the signature we just saw
            } else if trimmed == "}" && mode != ScanMode::Idle {
                mode = ScanMode::Idle;
            } else {
                match &mode {
                    ScanMode::Idle => {}
                    ScanMode::EntryBlock { state } => machine.add_entry(state, line)?,
                    ScanMode::ExitBlock { state } => machine.add_exit(state, line)?,
                }
            }
        }
        Ok(())
    }
}

fn is_entry_signature(line: &str) -> bool {
    (line.contains("::entry") || line.contains("::hsmEntry")) && line.contains("inline")
}

fn is_exit_signature(line: &str) -> bool {
    (line.contains("::exit") || line.contains("::hsmExit")) && line.contains("inline")
}

/// State owning an action body: the signature's last token is the state
/// enumerator (`...entry<ExampleState::eAlive>()` ends in `eAlive`)
fn owning_state(line: &str, lineno: usize) -> Result<String> {
    syntax::tokenize(line)
        .last()
        .map(|token| syntax::strip_enum_prefix(token).to_string())
        .filter(|state| !state.is_empty())
        .ok_or_else(|| HsmError::malformed("action signature without a state", lineno))
}
