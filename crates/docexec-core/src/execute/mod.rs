//! Snippet execution.
//!
//! Snippets run in a persistent interpreter process ([`Environment`]) that
//! holds one global namespace for the whole build. Each call captures the
//! text written to stdout and stderr, returns it in that order, and leaves
//! the namespace populated for the next call.
//!
//! When a call is given an [`InputProvider`], `input()` inside the snippet
//! is answered from it and the prompt and answer are echoed into the
//! captured output like a terminal session would show them.

mod capture;
mod environment;
mod input;
pub mod protocol;

pub use capture::{CallOutcome, Capture, FailurePolicy};
pub use environment::{Environment, INTERPRETER_ENV, InterpreterConfig, LazyEnvironment};
pub use input::{InputProvider, ScriptedInputs};

use crate::error::Result;

/// Something that can run snippets in a shared namespace.
pub trait Executor {
    /// Run `source` and return its captured stdout followed by its stderr.
    ///
    /// `inputs`, when given, answers `input()` for the duration of this call
    /// only. Type-mismatch errors raised by the snippet are swallowed; any
    /// other failure is returned as an error.
    fn execute(&mut self, source: &str, inputs: Option<&mut dyn InputProvider>) -> Result<String>;
}

impl<E: Executor + ?Sized> Executor for &mut E {
    fn execute(&mut self, source: &str, inputs: Option<&mut dyn InputProvider>) -> Result<String> {
        (**self).execute(source, inputs)
    }
}

/// Execute a snippet, answering `input()` from `scripted_inputs`.
///
/// An absent or empty answer list leaves `input()` untouched.
pub fn execute<E: Executor + ?Sized>(
    executor: &mut E,
    source: &str,
    scripted_inputs: Option<&[String]>,
) -> Result<String> {
    match scripted_inputs {
        Some(answers) if !answers.is_empty() => {
            let mut provider = ScriptedInputs::new(answers.iter().cloned());
            executor.execute(source, Some(&mut provider))
        }
        _ => executor.execute(source, None),
    }
}
