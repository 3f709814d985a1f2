//! Pipe transport: anonymous pipes on stdin/stdout/stderr.
//!
//! The child's output is not a TTY, so programs that check `isatty()` stay
//! in non-interactive mode. stdout and stderr are captured separately.

use std::sync::Arc;

use tracing::debug;

use super::{spawn_reader, spawn_writer, OutputSink, Session};
use crate::command::Command;
use crate::error::Result;
use crate::process::ProcessHandle;

/// Spawn `command` wired to pipes and start its relay threads.
pub(crate) fn spawn(
    command: &Command,
    output: Arc<OutputSink>,
    error: Arc<OutputSink>,
) -> Result<Session> {
    let (handle, ends) = ProcessHandle::spawn_piped(command)?;
    debug!(pid = handle.pid(), line = %command.line, "spawned piped child");

    let killer = handle.killer();
    let (input_tx, input_rx) = super::input_channel();
    let relay_threads = vec![
        spawn_reader("stdout", Box::new(ends.stdout), output),
        spawn_reader("stderr", Box::new(ends.stderr), error),
        spawn_writer(Box::new(ends.stdin), input_rx),
    ];

    Ok(Session {
        handle,
        killer,
        input_tx,
        relay_threads,
        master: None,
    })
}
