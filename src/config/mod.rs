//! Executor configuration.
//!
//! The configuration is an explicit value handed to each executor at
//! construction time; there is no process-wide mutable state. A session
//! reads its configuration exactly once, at spawn time, so mutating a
//! config after building an executor affects nothing already running.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration read by each new session at spawn time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Path to the shell binary used to interpret command lines.
    pub shell: String,
    /// Environment overlay applied on top of the inherited environment.
    #[serde(default)]
    pub environment: HashMap<String, String>,
    /// Interpret command lines with the Windows CMD dialect (`cmd.exe /C`
    /// instead of `sh -c`).
    #[serde(default)]
    pub cmd_dialect: bool,
}

impl ShellConfig {
    /// Configuration using a specific shell binary and otherwise defaults.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            ..Self::default()
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            environment: HashMap::new(),
            cmd_dialect: cfg!(windows),
        }
    }
}

/// Resolve the default shell from `$SHELL`, with a platform fallback.
pub fn default_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| {
        if cfg!(windows) {
            "cmd.exe".to_string()
        } else if cfg!(target_os = "macos") {
            "/bin/zsh".to_string()
        } else {
            "/bin/bash".to_string()
        }
    })
}
