//! Shared helpers for building editor spawn commands.

use std::process::Stdio;

use tokio::process::Command;

/// Environment variable telling a spawned editor where to listen.
pub const LISTEN_ADDRESS_ENV: &str = "NVIM_LISTEN_ADDRESS";

/// Build the command for listen mode.
///
/// The bind address is set on this command only. Standard streams go to the
/// null device so the editor runs detached from the launcher's terminal.
pub fn build_listen_command(program: &str, args: &[String], address: &str) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    command.env(LISTEN_ADDRESS_ENV, address);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());
    command
}

/// Build the command for embed mode; stdin/stdout become the control channel.
pub fn build_embed_command(program: &str, args: &[String]) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::null());
    command
}
