//! Error types for docexec-core.

use thiserror::Error;

/// Result type for docexec-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while executing snippets.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable interpreter could be found or started.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// IPC communication error with the worker process.
    #[error("IPC error: {0}")]
    Ipc(String),

    /// The worker sent something the protocol does not allow at this point.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The snippet raised an error that is not swallowed.
    #[error("snippet raised {kind}: {message}\n{traceback}")]
    Execution {
        /// Exception class name reported by the interpreter.
        kind: String,
        /// Exception message.
        message: String,
        /// Formatted traceback, as the interpreter prints it.
        traceback: String,
    },

    /// The snippet asked for more input than was scripted.
    #[error("scripted inputs exhausted: snippet requested more than {supplied} answer(s)")]
    InputsExhausted {
        /// Number of answers that were available.
        supplied: usize,
    },

    /// The environment was torn down after an interrupted call and its
    /// namespace is gone.
    #[error("execution environment lost: {0}")]
    EnvironmentLost(String),
}

impl Error {
    /// A suggestion for fixing the problem, when there is an obvious one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Interpreter(_) => Some(
                "set DOCEXEC_PYTHON or `interpreter` under [preprocessor.docexec] to a Python 3 binary",
            ),
            Error::InputsExhausted { .. } => {
                Some("add the missing answers to the block's :input: option")
            }
            Error::EnvironmentLost(_) => {
                Some("an earlier failure left the interpreter unusable; fix it and rebuild")
            }
            _ => None,
        }
    }
}
