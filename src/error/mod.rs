//! Error taxonomy for shell execution.
//!
//! Spawn-time failures never cross the `execute_command` boundary as errors;
//! the executor folds them into its sentinel termination status and callers
//! keep a uniform "one integer status" contract. The typed variants here
//! surface on the internal seams and on operations like `send_input` that
//! can be misused.

use std::io;

use thiserror::Error;

/// Errors produced while spawning and driving shell commands.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The shell binary or working directory could not be used to spawn.
    #[error("failed to spawn `{shell}`: {reason}")]
    Spawn {
        /// The shell binary that was asked to interpret the command.
        shell: String,
        /// The underlying OS error text.
        reason: String,
    },

    /// The OS could not allocate a pseudo-terminal pair.
    ///
    /// Carries portable-pty's error, which is an [`anyhow::Error`].
    #[error("failed to allocate a pseudo-terminal: {0}")]
    PtyAlloc(anyhow::Error),

    /// An operation was invoked in a state that does not permit it.
    #[error("invalid executor state: {0}")]
    InvalidState(&'static str),

    /// Transport wiring failed.
    #[error("transport I/O error")]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ShellError>;
