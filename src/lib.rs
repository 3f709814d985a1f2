//! rusty-shell - shell command execution over pipes or a pseudo-terminal.
//!
//! This library runs shell command lines from an application process with
//! two interchangeable I/O strategies:
//! - [`TransportKind::Pipe`] captures stdout/stderr through anonymous
//!   pipes; adequate for non-interactive, scriptable commands.
//! - [`TransportKind::Pty`] runs the child under a pseudo-terminal, so
//!   commands that require an interactive TTY (password prompts,
//!   colorized CLIs) behave correctly; stdout and stderr share the one
//!   terminal stream.
//!
//! [`ShellExecutor::execute_command`] blocks the caller until the child
//! exits and returns its termination status, while relay threads stream
//! output to an optional [`ShellDelegate`] as it arrives. `cancel` and
//! `send_input` may be called from other threads.
//!
//! # Example
//!
//! ```no_run
//! use rusty_shell::{ShellExecutor, TransportKind};
//!
//! let executor = ShellExecutor::new(TransportKind::Pipe);
//! let status = executor.execute_command("echo hello");
//! assert_eq!(status, 0);
//! assert_eq!(executor.output_string(), "hello\n");
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
mod process;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use command::{
    command_with_administrator, is_sudo_environment, script_for_name, script_in_dir, Command,
};
pub use config::{default_shell, ShellConfig};
pub use error::ShellError;
pub use executor::{
    ExecutionResult, ExecutorState, ShellDelegate, ShellExecutor, CANCELLED_STATUS, FAILED_STATUS,
};
pub use transport::TransportKind;
