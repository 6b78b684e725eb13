//! IPC protocol messages for the interpreter worker.
//!
//! One JSON object per line over the worker's stdin/stdout. Every message
//! carries a `type` tag so the worker side can dispatch without a schema.

use std::io::{BufRead, Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for a single protocol line (64 MiB).
pub const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

/// Command sent from the parent to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerCommand {
    /// Liveness check.
    Ping,

    /// Execute a snippet in the shared namespace.
    Execute {
        /// Source text of the snippet.
        source: String,
        /// Whether `input()` is answered by the parent for this call.
        scripted: bool,
    },

    /// Answer to the pending [`WorkerResponse::InputRequest`].
    Answer {
        /// The text the stand-in returns to the snippet.
        value: String,
    },

    /// No answer is left for the pending input request.
    Exhausted,

    /// Exit the worker loop.
    Shutdown,
}

/// Response sent from the worker to the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerResponse {
    /// Reply to [`WorkerCommand::Ping`].
    Pong,

    /// The snippet called `input()` while running a scripted call.
    InputRequest {
        /// Prompt argument passed to `input()`.
        prompt: String,
    },

    /// The snippet ran to completion or stopped with an exception.
    Finished {
        /// Everything written to stdout during the call.
        stdout: String,
        /// Everything written to stderr during the call.
        stderr: String,
        /// Set when the snippet raised.
        #[serde(default)]
        failure: Option<Failure>,
    },

    /// The worker could not make sense of a command.
    Error {
        /// Description of the problem.
        message: String,
    },

    /// Acknowledgement of [`WorkerCommand::Shutdown`].
    ShuttingDown,
}

/// An exception raised by a snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Exception class name, e.g. `ValueError`.
    pub kind: String,
    /// `str()` of the exception.
    pub message: String,
    /// Formatted traceback.
    pub traceback: String,
    /// Whether the exception is a `TypeError` (or a subclass of it).
    #[serde(default)]
    pub type_error: bool,
}

/// Write a message as a single JSON line and flush.
pub fn write_message<W: Write>(writer: &mut W, message: &impl Serialize) -> Result<()> {
    let mut line = serde_json::to_vec(message)
        .map_err(|e| Error::Protocol(format!("Failed to encode IPC message: {}", e)))?;
    line.push(b'\n');

    writer
        .write_all(&line)
        .map_err(|e| Error::Ipc(format!("Failed to write IPC message: {}", e)))?;
    writer
        .flush()
        .map_err(|e| Error::Ipc(format!("Failed to flush IPC stream: {}", e)))?;

    Ok(())
}

/// Read one JSON line and decode it.
pub fn read_message<R: BufRead, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut line = String::new();
    let read = reader
        .by_ref()
        .take(MAX_MESSAGE_LEN as u64 + 1)
        .read_line(&mut line)
        .map_err(|e| Error::Ipc(format!("Failed to read IPC message: {}", e)))?;

    if read == 0 {
        return Err(Error::Ipc("worker closed the channel".to_string()));
    }
    if line.len() > MAX_MESSAGE_LEN {
        return Err(Error::Ipc(format!(
            "IPC message too large: more than {} bytes",
            MAX_MESSAGE_LEN
        )));
    }

    serde_json::from_str(line.trim_end())
        .map_err(|e| Error::Protocol(format!("Failed to decode IPC message: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_command_wire_shape() {
        let mut buf = Vec::new();
        write_message(
            &mut buf,
            &WorkerCommand::Execute {
                source: "print('hi')".to_string(),
                scripted: true,
            },
        )
        .unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["type"], "execute");
        assert_eq!(value["source"], "print('hi')");
        assert_eq!(value["scripted"], true);
    }

    #[test]
    fn test_unit_commands_are_tagged() {
        let mut buf = Vec::new();
        write_message(&mut buf, &WorkerCommand::Exhausted).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "{\"type\":\"exhausted\"}\n");
    }

    #[test]
    fn test_finished_without_failure() {
        // The worker sends `null` for a clean run.
        let line = r#"{"type": "finished", "stdout": "a\n", "stderr": "", "failure": null}"#;
        let mut cursor = Cursor::new(format!("{}\n", line));
        let decoded: WorkerResponse = read_message(&mut cursor).unwrap();

        assert_eq!(
            decoded,
            WorkerResponse::Finished {
                stdout: "a\n".to_string(),
                stderr: String::new(),
                failure: None,
            }
        );
    }

    #[test]
    fn test_finished_with_failure() {
        let line = r#"{"type": "finished", "stdout": "", "stderr": "", "failure": {"kind": "TypeError", "message": "bad operand", "traceback": "Traceback ...", "type_error": true}}"#;
        let mut cursor = Cursor::new(format!("{}\n", line));

        match read_message::<_, WorkerResponse>(&mut cursor).unwrap() {
            WorkerResponse::Finished {
                failure: Some(failure),
                ..
            } => {
                assert_eq!(failure.kind, "TypeError");
                assert!(failure.type_error);
            }
            other => panic!("Wrong response type: {:?}", other),
        }
    }

    #[test]
    fn test_messages_are_read_in_order() {
        let mut cursor = Cursor::new(
            "{\"type\":\"input_request\",\"prompt\":\"Name: \"}\n{\"type\":\"pong\"}\n",
        );

        let first: WorkerResponse = read_message(&mut cursor).unwrap();
        let second: WorkerResponse = read_message(&mut cursor).unwrap();

        assert_eq!(
            first,
            WorkerResponse::InputRequest {
                prompt: "Name: ".to_string()
            }
        );
        assert_eq!(second, WorkerResponse::Pong);
    }

    #[test]
    fn test_closed_channel() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let err = read_message::<_, WorkerResponse>(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::Ipc(_)));
    }

    #[test]
    fn test_garbage_is_a_protocol_error() {
        let mut cursor = Cursor::new("Traceback (most recent call last):\n");
        let err = read_message::<_, WorkerResponse>(&mut cursor).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }
}
