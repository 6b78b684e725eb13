//! Answers for interactive input requests made by snippets.

use std::collections::VecDeque;

/// Supplies answers to `input()` calls made by a running snippet.
///
/// The provider is handed to the executor for a single call. Returning
/// `None` means no answer is left, which fails the call with
/// [`Error::InputsExhausted`](crate::Error::InputsExhausted).
pub trait InputProvider {
    /// Produce the answer for `prompt`, or `None` when exhausted.
    fn next_answer(&mut self, prompt: &str) -> Option<String>;
}

impl<F> InputProvider for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn next_answer(&mut self, prompt: &str) -> Option<String> {
        self(prompt)
    }
}

/// A fixed, ordered list of answers, each consumed exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptedInputs {
    answers: VecDeque<String>,
}

impl ScriptedInputs {
    /// Create from an ordered list of answers.
    pub fn new(answers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Whether every answer has been consumed.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl InputProvider for ScriptedInputs {
    fn next_answer(&mut self, _prompt: &str) -> Option<String> {
        self.answers.pop_front()
    }
}

impl<S: Into<String>> FromIterator<S> for ScriptedInputs {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
