//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::warn;

use super::{
    build_argv, build_launch_args, build_wait_policy, resolve_target, LaunchProfile,
    ProfileChoice,
};
use crate::session::ConnectionMode;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Attach a UI front-end to a Neovim instance",
    long_about = None,
    after_help = "Arguments after the options are forwarded to the spawned editor, e.g. `nvim-ui -- -u NONE file.txt`."
)]
pub struct LaunchArgs {
    /// Command used to spawn the editor (default: `nvim --headless` with --listen, `nvim --embed` otherwise).
    #[arg(long, value_name = "COMMAND")]
    pub prog: Option<String>,
    /// Print `attached` on stdout once the UI has received its first update.
    #[arg(short = 'n', long, default_value_t = false)]
    pub notify: bool,
    /// Spawn a detached editor listening on ADDRESS and attach to it.
    #[arg(short = 'l', long, value_name = "ADDRESS", conflicts_with = "connect")]
    pub listen: Option<String>,
    /// Attach to an editor already listening on ADDRESS.
    #[arg(short = 'c', long, value_name = "ADDRESS")]
    pub connect: Option<String>,
    /// Profile the UI loop and print a report sorted by this column.
    #[arg(long, value_enum, default_value_t = ProfileChoice::Disable)]
    pub profile: ProfileChoice,
    /// UI configuration file (YAML). Must exist.
    #[arg(long = "config", value_name = "PATH", value_parser = existing_path)]
    pub config_path: Option<PathBuf>,
    /// Seconds to wait for a --listen editor to accept connections (0 waits forever).
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub wait_timeout: u64,
    /// Delay between --listen connection attempts.
    #[arg(long, value_name = "MS", default_value_t = 50)]
    pub poll_interval_ms: u64,
    /// Extra arguments forwarded to the spawned editor.
    #[arg(
        value_name = "EXTRA_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub extra_args: Vec<String>,
}

impl LaunchArgs {
    /// Build a `LaunchProfile` from CLI args.
    pub fn build(self) -> Result<LaunchProfile> {
        let connect = resolve_target("connect", self.connect.as_deref())?;
        let listen = resolve_target("listen", self.listen.as_deref())?;
        let mode = ConnectionMode::resolve(connect, listen);

        if matches!(mode, ConnectionMode::Connect(_))
            && (self.prog.is_some() || !self.extra_args.is_empty())
        {
            warn!(
                target: "nvim_ui::cli",
                "--prog and extra arguments are ignored with --connect"
            );
        }

        let argv = build_argv(&mode, self.prog.as_deref(), &self.extra_args)?;
        let launch_args = build_launch_args(
            &mode,
            &argv,
            self.profile,
            self.notify,
            self.config_path.as_ref(),
        );

        Ok(LaunchProfile {
            mode,
            argv,
            profile: self.profile.metric(),
            notify: self.notify,
            config_path: self.config_path,
            wait: build_wait_policy(self.wait_timeout, self.poll_interval_ms),
            launch_args,
        })
    }
}

fn existing_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path `{value}` does not exist"))
    }
}
