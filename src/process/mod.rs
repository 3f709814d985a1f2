//! OS process lifecycle, independent of the I/O strategy.
//!
//! A [`ProcessHandle`] wraps either a std child (pipe mode) or a
//! portable-pty child (PTY mode). Waiting consumes the handle, so a
//! process can be reaped exactly once; the owner must always wait or the
//! child is left as a zombie.

use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Stdio};

use tracing::debug;

use crate::command::Command;
use crate::error::{Result, ShellError};

/// Handle to a spawned child process.
#[derive(Debug)]
pub(crate) enum ProcessHandle {
    Piped(Child),
    Pty(Box<dyn portable_pty::Child + Send + Sync>),
}

/// The parent-side pipe ends of a piped child.
#[derive(Debug)]
pub(crate) struct PipeEnds {
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

impl ProcessHandle {
    /// Spawn `command` with stdin/stdout/stderr connected to pipes.
    pub fn spawn_piped(command: &Command) -> Result<(Self, PipeEnds)> {
        let mut cmd = std::process::Command::new(&command.shell);
        cmd.args(command.shell_args())
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        // Own process group, so cancellation can signal the shell together
        // with anything it forked.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| ShellError::Spawn {
            shell: command.shell.clone(),
            reason: e.to_string(),
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(ShellError::InvalidState("child stdin not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(ShellError::InvalidState("child stdout not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(ShellError::InvalidState("child stderr not piped"))?;

        Ok((ProcessHandle::Piped(child), PipeEnds { stdin, stdout, stderr }))
    }

    /// OS process identifier, when the platform exposes one.
    pub fn pid(&self) -> Option<u32> {
        match self {
            ProcessHandle::Piped(child) => Some(child.id()),
            ProcessHandle::Pty(child) => child.process_id(),
        }
    }

    /// A killer usable from any thread while this handle is being waited on.
    pub fn killer(&self) -> ProcessKiller {
        match self {
            ProcessHandle::Piped(child) => ProcessKiller::Pid(child.id()),
            ProcessHandle::Pty(child) => ProcessKiller::Pty {
                killer: child.clone_killer(),
                pid: child.process_id(),
            },
        }
    }

    /// Block until the child exits.
    ///
    /// Returns the exit code, or `-(signal)` when a unix child was killed
    /// by a signal.
    pub fn wait(self) -> Result<i32> {
        match self {
            ProcessHandle::Piped(mut child) => {
                let status = child.wait().map_err(ShellError::Io)?;
                Ok(exit_code_of(status))
            }
            ProcessHandle::Pty(mut child) => {
                let status = child.wait().map_err(ShellError::Io)?;
                Ok(status.exit_code() as i32)
            }
        }
    }
}

#[cfg(unix)]
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Forceful terminator for a running child.
///
/// Detached from [`ProcessHandle`] so cancellation can fire from another
/// thread while the owner is blocked in [`ProcessHandle::wait`].
pub(crate) enum ProcessKiller {
    Pid(u32),
    Pty {
        killer: Box<dyn portable_pty::ChildKiller + Send + Sync>,
        pid: Option<u32>,
    },
}

impl ProcessKiller {
    /// Signal the child's process group to terminate immediately.
    ///
    /// Killing a process that has already exited is a no-op.
    pub fn kill(&mut self) {
        match self {
            ProcessKiller::Pid(pid) => kill_group(*pid),
            ProcessKiller::Pty { killer, pid } => {
                // portable-pty's killer signals only the direct child;
                // reach the whole group first so forked descendants
                // release the slave side too.
                if let Some(pid) = pid {
                    kill_group(*pid);
                }
                if let Err(e) = killer.kill() {
                    debug!(error = %e, "pty kill: process already gone");
                }
            }
        }
    }
}

/// SIGKILL a child's process group, falling back to the bare pid.
///
/// Piped children are spawned as group leaders and PTY children lead
/// their own session, so the negative-pid form also reaches forked
/// descendants that would otherwise keep the pipe or slave open and
/// stall the relay threads.
#[cfg(unix)]
fn kill_group(pid: u32) {
    let pid = pid as libc::pid_t;
    let rc = unsafe { libc::kill(-pid, libc::SIGKILL) };
    if rc != 0 {
        let rc = unsafe { libc::kill(pid, libc::SIGKILL) };
        if rc != 0 {
            debug!(pid, "kill: process already gone");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(pid: u32) {
    debug!(pid, "kill is not supported on this platform");
}
