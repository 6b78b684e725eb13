//! Execution environments backed by an interpreter worker process.
//!
//! An [`Environment`] owns one interpreter process and, with it, the global
//! namespace every snippet of a build runs in. The orchestrator creates it
//! once and passes it to each call, so later snippets see the definitions
//! of earlier ones.

use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::capture::{CallOutcome, Capture, FailurePolicy};
use super::input::InputProvider;
use super::protocol::{WorkerCommand, WorkerResponse, read_message, write_message};
use super::Executor;

/// Environment variable that overrides interpreter discovery.
pub const INTERPRETER_ENV: &str = "DOCEXEC_PYTHON";

/// Worker loop run inside the interpreter.
const WORKER_SOURCE: &str = include_str!("worker.py");

/// Interpreter names tried on `PATH`, in order.
const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

/// How to find and start the interpreter.
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// Explicit interpreter path. Takes precedence over everything else.
    pub interpreter: Option<PathBuf>,
}

impl InterpreterConfig {
    /// Use a specific interpreter binary.
    pub fn with_interpreter(path: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: Some(path.into()),
        }
    }

    /// Resolve the interpreter path.
    ///
    /// Looks in the following order:
    /// 1. The configured `interpreter`
    /// 2. `DOCEXEC_PYTHON` environment variable
    /// 3. `python3`, then `python` on the system PATH
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.interpreter {
            return Ok(path.clone());
        }

        if let Ok(path) = std::env::var(INTERPRETER_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        for name in INTERPRETER_CANDIDATES {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        Err(Error::Interpreter(format!(
            "Could not find a Python interpreter. Set {} or install python3.",
            INTERPRETER_ENV
        )))
    }
}

/// A live interpreter process holding the shared snippet namespace.
pub struct Environment {
    /// The interpreter process.
    child: Child,
    /// Buffered protocol writer (worker stdin).
    stdin: BufWriter<ChildStdin>,
    /// Buffered protocol reader (worker stdout).
    stdout: BufReader<ChildStdout>,
    /// Set once the worker was torn down after an interrupted call.
    lost: Option<String>,
    /// Number of snippets executed so far.
    executions: usize,
    /// Which snippet failures are tolerated.
    policy: FailurePolicy,
}

impl Environment {
    /// Start an interpreter worker and verify it answers.
    pub fn spawn(config: &InterpreterConfig) -> Result<Self> {
        let interpreter = config.resolve()?;

        let mut child = Command::new(&interpreter)
            .arg("-u")
            .arg("-c")
            .arg(WORKER_SOURCE)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::Interpreter(format!(
                    "Failed to start interpreter '{}': {}",
                    interpreter.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Ipc("Failed to get worker stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Ipc("Failed to get worker stdout".to_string()))?;

        let mut env = Self {
            child,
            stdin: BufWriter::new(stdin),
            stdout: BufReader::new(stdout),
            lost: None,
            executions: 0,
            policy: FailurePolicy,
        };

        env.send(&WorkerCommand::Ping)?;
        match env.recv()? {
            WorkerResponse::Pong => {
                debug!(
                    pid = env.pid(),
                    interpreter = %interpreter.display(),
                    "execution environment ready"
                );
                Ok(env)
            }
            other => Err(Error::Protocol(format!(
                "Unexpected response from worker: {:?}",
                other
            ))),
        }
    }

    /// Run a snippet and report what happened without applying the
    /// failure policy.
    ///
    /// When `inputs` is `Some`, `input()` inside the snippet is answered by
    /// the provider for the duration of this call.
    pub fn run(
        &mut self,
        source: &str,
        mut inputs: Option<&mut dyn InputProvider>,
    ) -> Result<CallOutcome> {
        if let Some(reason) = &self.lost {
            return Err(Error::EnvironmentLost(reason.clone()));
        }

        let mut call = CallGuard::new(self);
        call.env.send(&WorkerCommand::Execute {
            source: source.to_string(),
            scripted: inputs.is_some(),
        })?;

        let mut answered = 0;
        let mut exhausted = false;

        loop {
            match call.env.recv()? {
                WorkerResponse::InputRequest { prompt } => {
                    let answer = inputs.as_mut().and_then(|p| p.next_answer(&prompt));
                    match answer {
                        Some(value) => {
                            answered += 1;
                            call.env.send(&WorkerCommand::Answer { value })?;
                        }
                        None => {
                            exhausted = true;
                            call.env.send(&WorkerCommand::Exhausted)?;
                        }
                    }
                }
                WorkerResponse::Finished {
                    stdout,
                    stderr,
                    failure,
                } => {
                    call.complete();
                    call.env.executions += 1;
                    return Ok(CallOutcome {
                        capture: Capture { stdout, stderr },
                        failure,
                        answered,
                        exhausted,
                    });
                }
                WorkerResponse::Error { message } => {
                    return Err(Error::Protocol(format!("worker rejected command: {}", message)));
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "Unexpected response while executing: {:?}",
                        other
                    )));
                }
            }
        }
    }

    /// Number of snippets executed in this environment.
    pub fn executions(&self) -> usize {
        self.executions
    }

    /// Process ID of the interpreter.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Whether the interpreter is still running and usable.
    pub fn is_alive(&mut self) -> bool {
        self.lost.is_none() && matches!(self.child.try_wait(), Ok(None))
    }

    /// Ask the interpreter to exit and wait for it.
    pub fn shutdown(mut self) -> Result<()> {
        if self.lost.is_some() {
            return Ok(());
        }

        self.send(&WorkerCommand::Shutdown)?;
        match self.recv()? {
            WorkerResponse::ShuttingDown => {}
            other => warn!("Unexpected response to shutdown: {:?}", other),
        }

        let status = self
            .child
            .wait()
            .map_err(|e| Error::Ipc(format!("Failed to wait for worker: {}", e)))?;
        // Nothing left to kill on drop.
        self.lost = Some("shut down".to_string());

        if status.success() {
            Ok(())
        } else {
            Err(Error::Ipc(format!("Worker exited with status: {}", status)))
        }
    }

    fn send(&mut self, cmd: &WorkerCommand) -> Result<()> {
        write_message(&mut self.stdin, cmd)
    }

    fn recv(&mut self) -> Result<WorkerResponse> {
        read_message(&mut self.stdout)
    }

    /// Tear the worker down; its namespace cannot be trusted any more.
    fn abandon(&mut self, reason: &str) {
        if self.lost.is_some() {
            return;
        }
        warn!(pid = self.pid(), "discarding execution environment: {}", reason);
        self.lost = Some(reason.to_string());
        self.terminate();
    }

    fn terminate(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        if let Err(e) = self.child.kill() {
            debug!("Failed to kill worker: {}", e);
        }
        let _ = self.child.wait();
    }
}

impl Executor for Environment {
    fn execute(&mut self, source: &str, inputs: Option<&mut dyn InputProvider>) -> Result<String> {
        let outcome = self.run(source, inputs)?;
        self.policy.settle(outcome)
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        if self.lost.is_none() {
            self.terminate();
        }
    }
}

/// Scope of one `Execute` exchange.
///
/// If the exchange ends any way other than a `Finished` response (a
/// transport error, a protocol violation, a panic in an input provider) the
/// worker may still be mid-snippet with its streams redirected, so the
/// environment is torn down instead of being handed back half-used.
struct CallGuard<'a> {
    env: &'a mut Environment,
    completed: bool,
}

impl<'a> CallGuard<'a> {
    fn new(env: &'a mut Environment) -> Self {
        Self {
            env,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.env.abandon("call interrupted before the snippet finished");
        }
    }
}

/// An environment that starts its interpreter on first use.
///
/// Documents without executable blocks never pay for an interpreter.
pub struct LazyEnvironment {
    config: InterpreterConfig,
    env: Option<Environment>,
}

impl LazyEnvironment {
    /// Create without starting anything.
    pub fn new(config: InterpreterConfig) -> Self {
        Self { config, env: None }
    }

    /// Whether the interpreter has been started.
    pub fn is_started(&self) -> bool {
        self.env.is_some()
    }

    /// The running environment, starting it if necessary.
    pub fn get(&mut self) -> Result<&mut Environment> {
        if self.env.is_none() {
            self.env = Some(Environment::spawn(&self.config)?);
        }
        self.env
            .as_mut()
            .ok_or_else(|| Error::Interpreter("environment failed to start".to_string()))
    }

    /// Shut the interpreter down if it was started.
    pub fn shutdown(self) -> Result<()> {
        match self.env {
            Some(env) => env.shutdown(),
            None => Ok(()),
        }
    }
}

impl Executor for LazyEnvironment {
    fn execute(&mut self, source: &str, inputs: Option<&mut dyn InputProvider>) -> Result<String> {
        self.get()?.execute(source, inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_interpreter_wins() {
        let config = InterpreterConfig::with_interpreter("/opt/python/bin/python3.12");
        assert_eq!(
            config.resolve().unwrap(),
            PathBuf::from("/opt/python/bin/python3.12")
        );
    }

    #[test]
    fn test_spawn_reports_missing_interpreter() {
        let config = InterpreterConfig::with_interpreter("/nonexistent/docexec/python");
        let err = Environment::spawn(&config).err().expect("spawn should fail");
        assert!(matches!(err, Error::Interpreter(_)));
    }

    #[test]
    fn test_lazy_environment_starts_nothing() {
        let lazy = LazyEnvironment::new(InterpreterConfig::default());
        assert!(!lazy.is_started());
        lazy.shutdown().unwrap();
    }
}
