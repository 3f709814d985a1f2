//! Administrator rewriting and sudo-environment inspection.
//!
//! These are pure string/environment helpers; actually acquiring elevated
//! privileges (password prompts, polkit, UAC) is out of scope and left to
//! the rewritten command itself.

/// Rewrite a command line to request elevated execution.
///
/// POSIX dialect prefixes the line with `sudo`; the CMD dialect uses
/// `runas`. No quoting or escaping is performed on the line.
pub fn command_with_administrator(line: &str, cmd_dialect: bool) -> String {
    if cmd_dialect {
        format!("runas /user:Administrator \"{line}\"")
    } else {
        format!("sudo {line}")
    }
}

/// True when the current process already runs under sudo.
///
/// Pure environment inspection: checks the `SUDO_USER`/`SUDO_UID` markers
/// sudo leaves behind, plus a plain root login.
pub fn is_sudo_environment() -> bool {
    if std::env::var_os("SUDO_USER").is_some() || std::env::var_os("SUDO_UID").is_some() {
        return true;
    }
    std::env::var("USER").map(|user| user == "root").unwrap_or(false)
}
