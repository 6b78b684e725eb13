//! Captured output of a snippet call and the rules for settling it.

use tracing::debug;

use crate::error::{Error, Result};

use super::protocol::Failure;

/// Text a snippet wrote while it ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl Capture {
    /// Stdout followed by stderr, the form rendered into documents.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }
}

/// Raw outcome of one call, before the failure policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Output captured up to the point the snippet finished or raised.
    pub capture: Capture,
    /// Exception raised by the snippet, if any.
    pub failure: Option<Failure>,
    /// Number of scripted answers handed to the snippet.
    pub answered: usize,
    /// Whether the snippet asked for an answer after the provider ran dry.
    pub exhausted: bool,
}

/// Which snippet failures are tolerated.
///
/// Type-mismatch errors (`TypeError` and its subclasses) are dropped and the
/// output captured so far is kept. This is a compatibility shim for
/// documents written against the extension's historical behavior; every
/// other exception class fails the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailurePolicy;

impl FailurePolicy {
    /// Whether `failure` is swallowed.
    pub fn swallows(&self, failure: &Failure) -> bool {
        failure.type_error
    }

    /// Turn a call outcome into the captured text or an error.
    pub fn settle(&self, outcome: CallOutcome) -> Result<String> {
        let CallOutcome {
            capture,
            failure,
            answered,
            exhausted,
        } = outcome;

        match failure {
            None => Ok(capture.combined()),
            Some(_) if exhausted => Err(Error::InputsExhausted { supplied: answered }),
            Some(failure) if self.swallows(&failure) => {
                debug!(kind = %failure.kind, "ignoring type mismatch raised by snippet");
                Ok(capture.combined())
            }
            Some(failure) => Err(Error::Execution {
                kind: failure.kind,
                message: failure.message,
                traceback: failure.traceback,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(kind: &str, type_error: bool) -> Failure {
        Failure {
            kind: kind.to_string(),
            message: "boom".to_string(),
            traceback: format!("Traceback (most recent call last):\n{}: boom\n", kind),
            type_error,
        }
    }

    fn outcome(failure: Option<Failure>) -> CallOutcome {
        CallOutcome {
            capture: Capture {
                stdout: "out\n".to_string(),
                stderr: "err\n".to_string(),
            },
            failure,
            answered: 0,
            exhausted: false,
        }
    }

    #[test]
    fn test_combined_is_stdout_then_stderr() {
        let capture = Capture {
            stdout: "one\n".to_string(),
            stderr: "two\n".to_string(),
        };
        assert_eq!(capture.combined(), "one\ntwo\n");
        assert_eq!(Capture::default().combined(), "");
    }

    #[test]
    fn test_clean_run() {
        assert_eq!(FailurePolicy.settle(outcome(None)).unwrap(), "out\nerr\n");
    }

    #[test]
    fn test_type_errors_are_swallowed() {
        let text = FailurePolicy
            .settle(outcome(Some(failure("TypeError", true))))
            .unwrap();
        assert_eq!(text, "out\nerr\n");
    }

    #[test]
    fn test_type_error_subclass_is_swallowed() {
        let text = FailurePolicy
            .settle(outcome(Some(failure("MyTypeError", true))))
            .unwrap();
        assert_eq!(text, "out\nerr\n");
    }

    #[test]
    fn test_other_errors_propagate() {
        let err = FailurePolicy
            .settle(outcome(Some(failure("ValueError", false))))
            .unwrap_err();

        match err {
            Error::Execution { kind, message, .. } => {
                assert_eq!(kind, "ValueError");
                assert_eq!(message, "boom");
            }
            other => panic!("Wrong error: {:?}", other),
        }
    }

    #[test]
    fn test_exhaustion_wins_over_raised_class() {
        let mut exhausted = outcome(Some(failure("StopIteration", false)));
        exhausted.exhausted = true;
        exhausted.answered = 1;

        let err = FailurePolicy.settle(exhausted).unwrap_err();
        assert!(matches!(err, Error::InputsExhausted { supplied: 1 }));
    }
}
