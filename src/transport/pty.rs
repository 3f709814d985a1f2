//! PTY transport: run the child under a pseudo-terminal.
//!
//! The terminal driver sits between the child and us. Everything the child
//! writes to its stdout or stderr shows up on the master's read side, and
//! bytes we write to the master are delivered as the child's stdin, so
//! programs that require an interactive TTY (password prompts, colorized
//! CLIs) behave as they would in a real terminal. The two output streams
//! are not separable through one terminal; this transport routes the whole
//! stream through the output sink and leaves the error sink empty.

use std::sync::Arc;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use tracing::debug;

use super::{spawn_reader, spawn_writer, OutputSink, Session};
use crate::command::Command;
use crate::error::{Result, ShellError};
use crate::process::ProcessHandle;

/// Spawn `command` on a fresh pseudo-terminal and start its relay threads.
pub(crate) fn spawn(command: &Command, output: Arc<OutputSink>) -> Result<Session> {
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(ShellError::PtyAlloc)?;

    let mut builder = CommandBuilder::new(&command.shell);
    for arg in command.shell_args() {
        builder.arg(arg);
    }
    builder.env("TERM", "xterm-256color");
    for (key, value) in &command.env {
        builder.env(key, value);
    }
    match &command.working_dir {
        Some(dir) => builder.cwd(dir),
        // CommandBuilder does not inherit the cwd on every platform; pin it.
        None => {
            if let Ok(cwd) = std::env::current_dir() {
                builder.cwd(cwd);
            }
        }
    }

    let child = pair
        .slave
        .spawn_command(builder)
        .map_err(|e| ShellError::Spawn {
            shell: command.shell.clone(),
            reason: e.to_string(),
        })?;
    // Only the child holds the slave from here on; when it exits, the
    // master's read side reaches end of stream.
    drop(pair.slave);

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(ShellError::PtyAlloc)?;
    let writer = pair.master.take_writer().map_err(ShellError::PtyAlloc)?;

    let handle = ProcessHandle::Pty(child);
    debug!(pid = handle.pid(), line = %command.line, "spawned pty child");

    let killer = handle.killer();
    let (input_tx, input_rx) = super::input_channel();
    let relay_threads = vec![
        spawn_reader("pty", reader, output),
        spawn_writer(writer, input_rx),
    ];

    Ok(Session {
        handle,
        killer,
        input_tx,
        relay_threads,
        master: Some(pair.master),
    })
}
