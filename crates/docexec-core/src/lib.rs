//! Core engine for docexec.
//!
//! This crate provides:
//! - A persistent interpreter worker holding the shared snippet namespace
//! - Per-call capture of stdout and stderr
//! - Scripted answers for `input()` with a terminal-like transcript

pub mod error;
pub mod execute;

pub use error::{Error, Result};
pub use execute::{
    CallOutcome, Capture, Environment, Executor, FailurePolicy, INTERPRETER_ENV, InputProvider,
    InterpreterConfig, LazyEnvironment, ScriptedInputs, execute,
};
