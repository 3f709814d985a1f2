//! The blocking shell executor.
//!
//! One executor runs one command at a time: `execute_command` blocks the
//! calling thread until the child exits or the session is cancelled, while
//! relay threads stream output to the delegate as it arrives. `cancel` and
//! `send_input` are safe to call from other threads through a shared
//! session slot.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::command::Command;
use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::transport::{self, OutputSink, Session, StreamKind, TransportKind};
use crate::utils::lock;

/// Sentinel status for sessions that never spawned a process.
pub const FAILED_STATUS: i32 = -1;
/// Sentinel status for sessions torn down by [`ShellExecutor::cancel`].
pub const CANCELLED_STATUS: i32 = -2;

/// Streaming observer for child output. Every method defaults to a no-op,
/// so implementers override only what they need.
///
/// Callbacks fire zero or more times while a session is running, in the
/// order bytes are received, on whichever thread the transport uses for
/// relaying. Implementations must not assume the calling context.
pub trait ShellDelegate: Send + Sync {
    /// Raw stdout bytes as they arrive (the whole terminal stream in PTY mode).
    fn log_output_data(&self, _data: &[u8]) {}
    /// Lossy UTF-8 decoding of the same chunk.
    fn log_output_string(&self, _text: &str) {}
    /// Raw stderr bytes as they arrive (pipe mode only).
    fn log_error_data(&self, _data: &[u8]) {}
    /// Lossy UTF-8 decoding of the same chunk.
    fn log_error_string(&self, _text: &str) {}
}

/// Lifecycle of an executor across one `execute_command` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutorState {
    /// No command has run yet, or the executor is ready for the next one.
    Idle,
    /// A session is in flight.
    Running,
    /// The last session's process exited on its own.
    Completed,
    /// The last session was torn down by `cancel`.
    Cancelled,
    /// The last session never spawned a process.
    Failed,
}

/// Captured output of a finished session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Everything the child wrote to stdout (or to the terminal in PTY mode).
    pub output: Vec<u8>,
    /// Everything the child wrote to stderr; empty in PTY mode.
    pub error: Vec<u8>,
    /// Exit code, `-(signal)` for unix signal death, or a sentinel.
    pub status: i32,
}

impl ExecutionResult {
    /// Lossy UTF-8 view of the captured output.
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Lossy UTF-8 view of the captured error stream.
    pub fn error_string(&self) -> String {
        String::from_utf8_lossy(&self.error).into_owned()
    }
}

/// The cross-thread face of a running session.
struct LiveSession {
    killer: crate::process::ProcessKiller,
    input_tx: Option<mpsc::Sender<Vec<u8>>>,
}

/// Executes shell commands over a pipe or PTY transport.
///
/// All methods take `&self`; share the executor behind an [`Arc`] to call
/// [`cancel`](Self::cancel) or [`send_input`](Self::send_input) from
/// another thread while [`execute_command`](Self::execute_command) blocks.
/// Overlapping `execute_command` calls on one executor are rejected;
/// concurrent commands need separate executors.
pub struct ShellExecutor {
    config: ShellConfig,
    transport: TransportKind,
    delegate: Option<Arc<dyn ShellDelegate>>,
    live: Mutex<Option<LiveSession>>,
    cancelled: Arc<AtomicBool>,
    state: Mutex<ExecutorState>,
    result: Mutex<ExecutionResult>,
}

impl ShellExecutor {
    /// Executor with the default configuration and the given transport.
    pub fn new(transport: TransportKind) -> Self {
        Self::with_config(transport, ShellConfig::default())
    }

    /// Executor with an explicit configuration.
    pub fn with_config(transport: TransportKind, config: ShellConfig) -> Self {
        Self {
            config,
            transport,
            delegate: None,
            live: Mutex::new(None),
            cancelled: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(ExecutorState::Idle),
            result: Mutex::new(ExecutionResult::default()),
        }
    }

    /// Attach a streaming delegate. Applies to subsequently started sessions.
    pub fn with_delegate(mut self, delegate: Arc<dyn ShellDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ExecutorState {
        *lock(&self.state)
    }

    /// Termination status of the last session. Valid after
    /// `execute_command` returns.
    pub fn termination_status(&self) -> i32 {
        lock(&self.result).status
    }

    /// Captured stdout bytes of the last session.
    pub fn output_data(&self) -> Vec<u8> {
        lock(&self.result).output.clone()
    }

    /// Lossy UTF-8 view of the captured stdout.
    pub fn output_string(&self) -> String {
        lock(&self.result).output_string()
    }

    /// Captured stderr bytes of the last session (empty in PTY mode).
    pub fn error_data(&self) -> Vec<u8> {
        lock(&self.result).error.clone()
    }

    /// Lossy UTF-8 view of the captured stderr.
    pub fn error_string(&self) -> String {
        lock(&self.result).error_string()
    }

    /// Clone of the last session's full result.
    pub fn result(&self) -> ExecutionResult {
        lock(&self.result).clone()
    }

    /// Run a command line in the inherited working directory.
    ///
    /// Blocks until the child exits or the session is cancelled and returns
    /// the termination status. A command that exits non-zero is a successful
    /// invocation with a non-zero status; only spawn failures produce the
    /// [`FAILED_STATUS`] sentinel, and they do so without running a process
    /// or invoking any delegate callback.
    pub fn execute_command(&self, line: &str) -> i32 {
        self.execute(Command::new(line, &self.config))
    }

    /// Run a command line in a specific working directory.
    pub fn execute_command_in(&self, line: &str, working_dir: impl AsRef<Path>) -> i32 {
        self.execute(Command::new(line, &self.config).in_working_dir(working_dir.as_ref()))
    }

    /// Run a command line with a working directory and extra environment.
    pub fn execute_command_with_env(
        &self,
        line: &str,
        working_dir: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> i32 {
        let mut command = Command::new(line, &self.config).with_env(env);
        if let Some(dir) = working_dir {
            command = command.in_working_dir(dir);
        }
        self.execute(command)
    }

    /// Forcefully terminate the running session.
    ///
    /// Safe to call from any thread and idempotent: with no live session
    /// this is a no-op, and a second call finds nothing left to kill. The
    /// child is signalled as a process group, so forked descendants die
    /// with it, and the blocked `execute_command` call returns
    /// [`CANCELLED_STATUS`] with whatever output had accumulated.
    ///
    /// Delegate dispatch is muted before the kill signal fires, so no new
    /// callback starts once `cancel` has run; a callback already executing
    /// on a relay thread may still finish concurrently with `cancel`
    /// returning. A relay thread kept open by a descendant that survived
    /// the kill is detached rather than joined and drains silently.
    pub fn cancel(&self) {
        let live = lock(&self.live).take();
        match live {
            Some(mut live) => {
                self.cancelled.store(true, Ordering::Release);
                live.killer.kill();
                debug!("session cancelled");
                // Dropping `live` releases the input sender, which winds
                // down the writer thread.
            }
            None => debug!("cancel with no live session; ignoring"),
        }
    }

    /// Queue bytes for the child's stdin (pipe mode) or the terminal's
    /// input side (PTY mode). Only valid while a session is running.
    ///
    /// Blocks when the input queue is full. Inside a tokio runtime,
    /// where blocking would panic, the send is non-blocking instead and
    /// a full queue surfaces as an error.
    pub fn send_input(&self, bytes: &[u8]) -> Result<()> {
        let sender = {
            let guard = lock(&self.live);
            let live = guard
                .as_ref()
                .ok_or(ShellError::InvalidState("no running session"))?;
            live.input_tx
                .as_ref()
                .ok_or(ShellError::InvalidState("input already closed"))?
                .clone()
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            sender
                .try_send(bytes.to_vec())
                .map_err(|_| ShellError::InvalidState("input queue full or session ended"))
        } else {
            sender
                .blocking_send(bytes.to_vec())
                .map_err(|_| ShellError::InvalidState("session ended"))
        }
    }

    /// Close the child's input side, delivering end-of-file. A no-op when
    /// nothing is running or the input is already closed.
    pub fn close_input(&self) {
        if let Some(live) = lock(&self.live).as_mut() {
            live.input_tx = None;
        }
    }

    fn execute(&self, command: Command) -> i32 {
        {
            let mut state = lock(&self.state);
            if *state == ExecutorState::Running {
                error!("execute_command while a session is already running");
                return FAILED_STATUS;
            }
            *state = ExecutorState::Running;
        }
        self.cancelled.store(false, Ordering::Release);
        *lock(&self.result) = ExecutionResult::default();

        if command.is_empty() {
            warn!("refusing to spawn an empty command line");
            return self.finish(ExecutorState::Failed, FAILED_STATUS);
        }

        let output_sink = Arc::new(OutputSink::new(
            StreamKind::Output,
            self.delegate.clone(),
            self.cancelled.clone(),
        ));
        let error_sink = Arc::new(OutputSink::new(
            StreamKind::Error,
            self.delegate.clone(),
            self.cancelled.clone(),
        ));

        let spawned = match self.transport {
            TransportKind::Pipe => {
                transport::pipe::spawn(&command, output_sink.clone(), error_sink.clone())
            }
            TransportKind::Pty => transport::pty::spawn(&command, output_sink.clone()),
        };
        let session = match spawned {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, line = %command.line, "failed to spawn command");
                return self.finish(ExecutorState::Failed, FAILED_STATUS);
            }
        };

        let Session {
            handle,
            killer,
            input_tx,
            relay_threads,
            master,
        } = session;
        *lock(&self.live) = Some(LiveSession {
            killer,
            input_tx: Some(input_tx),
        });

        // Blocks until the child exits, either on its own or because
        // `cancel` signalled it from another thread.
        let wait_status = match handle.wait() {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "wait on child failed");
                FAILED_STATUS
            }
        };

        // Teardown order matters: clearing the live slot drops the input
        // sender so the writer thread exits, then the readers drain to end
        // of stream before the buffers are finalized.
        drop(lock(&self.live).take());
        drop(master);
        let cancelled = self.cancelled.load(Ordering::Acquire);
        for thread in relay_threads {
            if cancelled {
                // A descendant that survived the group kill can keep the
                // pipe or slave open indefinitely; the muted readers are
                // detached and drain to end of stream on their own.
                drop(thread);
            } else if thread.join().is_err() {
                error!("relay thread panicked");
            }
        }

        let status = if cancelled { CANCELLED_STATUS } else { wait_status };
        {
            let mut result = lock(&self.result);
            result.output = output_sink.take();
            result.error = error_sink.take();
        }
        let state = if cancelled {
            ExecutorState::Cancelled
        } else {
            ExecutorState::Completed
        };
        debug!(status, ?state, "session finished");
        self.finish(state, status)
    }

    fn finish(&self, state: ExecutorState, status: i32) -> i32 {
        lock(&self.result).status = status;
        *lock(&self.state) = state;
        status
    }
}
