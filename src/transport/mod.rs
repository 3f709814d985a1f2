//! I/O transports wiring a child process to the controlling process.
//!
//! Both transports share the same shape: spawn the child, then relay its
//! output on dedicated reader threads and feed its input from a channel on
//! a writer thread. Pipe mode keeps stdout and stderr separate; PTY mode
//! routes everything the terminal delivers through the output stream.

pub(crate) mod pipe;
pub(crate) mod pty;

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::executor::ShellDelegate;
use crate::process::{ProcessHandle, ProcessKiller};
use crate::utils::lock;

/// Bytes per read from the child; matches a pipe's typical capacity.
const READ_BUFFER: usize = 16384;
/// Queued input chunks before `send_input` blocks.
const INPUT_BUFFER: usize = 128;

/// Which I/O strategy a session uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportKind {
    /// Anonymous pipes on stdin/stdout/stderr. The child sees no TTY, so
    /// interactive programs will not enable terminal behavior.
    Pipe,
    /// A pseudo-terminal. The child sees a real interactive terminal, and
    /// its stdout/stderr arrive interleaved on a single stream.
    Pty,
}

/// Which delegate callbacks a sink dispatches to.
#[derive(Clone, Copy, Debug)]
pub(crate) enum StreamKind {
    Output,
    Error,
}

/// Destination for relayed child output, shared between the relay threads
/// and the executor.
pub(crate) struct OutputSink {
    kind: StreamKind,
    buffer: Mutex<Vec<u8>>,
    delegate: Option<Arc<dyn ShellDelegate>>,
    muted: Arc<AtomicBool>,
}

impl OutputSink {
    pub fn new(
        kind: StreamKind,
        delegate: Option<Arc<dyn ShellDelegate>>,
        muted: Arc<AtomicBool>,
    ) -> Self {
        Self {
            kind,
            buffer: Mutex::new(Vec::new()),
            delegate,
            muted,
        }
    }

    /// Append a chunk and forward it to the delegate in receive order.
    ///
    /// Cancellation mutes delegate dispatch but keeps accumulating, so
    /// partial output stays readable after a cancelled run. The mute flag
    /// is checked per chunk: a dispatch that passed the check just before
    /// cancellation completes concurrently with it, and no dispatch
    /// starts afterwards.
    pub fn push(&self, chunk: &[u8]) {
        lock(&self.buffer).extend_from_slice(chunk);

        if self.muted.load(Ordering::Acquire) {
            return;
        }
        if let Some(delegate) = &self.delegate {
            let text = String::from_utf8_lossy(chunk);
            match self.kind {
                StreamKind::Output => {
                    delegate.log_output_data(chunk);
                    delegate.log_output_string(&text);
                }
                StreamKind::Error => {
                    delegate.log_error_data(chunk);
                    delegate.log_error_string(&text);
                }
            }
        }
    }

    /// Take the accumulated bytes. Called once per session, after the
    /// relay threads have been joined or detached.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *lock(&self.buffer))
    }
}

/// Everything the executor needs to drive one spawned command.
pub(crate) struct Session {
    pub handle: ProcessHandle,
    pub killer: ProcessKiller,
    pub input_tx: mpsc::Sender<Vec<u8>>,
    pub relay_threads: Vec<JoinHandle<()>>,
    /// Keeps the PTY master alive until the session is torn down.
    pub master: Option<Box<dyn portable_pty::MasterPty + Send>>,
}

/// Drain `reader` until end of stream, pushing each chunk into `sink`.
///
/// A zero-length read ends the loop. `Interrupted` reads are retried; any
/// other read error is treated as end of stream (a PTY master reports EIO
/// once the last slave descriptor closes), never as an execution failure.
pub(crate) fn spawn_reader(
    label: &'static str,
    mut reader: Box<dyn Read + Send>,
    sink: Arc<OutputSink>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buf = [0u8; READ_BUFFER];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => {
                    debug!(label, "relay reached end of stream");
                    break;
                }
                Ok(n) => sink.push(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(label, error = %e, "relay read failed; treating as end of stream");
                    break;
                }
            }
        }
    })
}

/// Relay queued input chunks into `writer` until the channel closes.
///
/// Dropping every sender ends the loop, which drops the writer and closes
/// the child's input side.
pub(crate) fn spawn_writer(
    mut writer: Box<dyn Write + Send>,
    mut input_rx: mpsc::Receiver<Vec<u8>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while let Some(bytes) = input_rx.blocking_recv() {
            if let Err(e) = writer.write_all(&bytes).and_then(|()| writer.flush()) {
                error!(error = %e, "failed to write input to child");
                break;
            }
        }
    })
}

pub(crate) fn input_channel() -> (mpsc::Sender<Vec<u8>>, mpsc::Receiver<Vec<u8>>) {
    mpsc::channel(INPUT_BUFFER)
}
