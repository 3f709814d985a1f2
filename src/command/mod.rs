//! Command construction and the thin helpers around it.
//!
//! A [`Command`] is one executable line of text plus the context it runs
//! in: the interpreting shell, an optional working directory, and an
//! environment overlay. The submodules hold the glue that produces command
//! lines: named-script lookup and administrator rewriting.

mod admin;
mod script;

pub use admin::{command_with_administrator, is_sudo_environment};
pub use script::{script_for_name, script_in_dir};

use std::collections::HashMap;
use std::path::PathBuf;

use crate::config::ShellConfig;

/// A fully specified shell invocation.
#[derive(Clone, Debug)]
pub struct Command {
    /// Shell binary that interprets `line`.
    pub shell: String,
    /// The command line handed to the shell.
    pub line: String,
    /// Working directory; `None` inherits the parent's.
    pub working_dir: Option<PathBuf>,
    /// Environment overlay applied on top of the inherited environment.
    pub env: HashMap<String, String>,
    /// Use the CMD dialect (`/C`) instead of `-c`.
    pub cmd_dialect: bool,
}

impl Command {
    /// Build a command from a line and the executor configuration.
    pub fn new(line: impl Into<String>, config: &ShellConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            line: line.into(),
            working_dir: None,
            env: config.environment.clone(),
            cmd_dialect: config.cmd_dialect,
        }
    }

    /// Run the command in `dir` instead of the inherited working directory.
    pub fn in_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Extend the environment overlay with additional variables.
    pub fn with_env(mut self, env: &HashMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Argument vector handed to the shell binary.
    pub fn shell_args(&self) -> Vec<String> {
        let flag = if self.cmd_dialect { "/C" } else { "-c" };
        vec![flag.to_string(), self.line.clone()]
    }

    /// True when the line contains nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.line.trim().is_empty()
    }
}
