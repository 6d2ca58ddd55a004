//! LaunchProfile and command/mode resolution.
use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;

use crate::{
    bridge::SortMetric,
    session::{ConnectionMode, ConnectionTarget, WaitPolicy},
};

/// `--profile` choices; `disable` turns profiling off.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ProfileChoice {
    Ncalls,
    Tottime,
    Percall,
    Cumtime,
    Name,
    Disable,
}

impl ProfileChoice {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProfileChoice::Ncalls => "ncalls",
            ProfileChoice::Tottime => "tottime",
            ProfileChoice::Percall => "percall",
            ProfileChoice::Cumtime => "cumtime",
            ProfileChoice::Name => "name",
            ProfileChoice::Disable => "disable",
        }
    }

    pub const fn metric(&self) -> Option<SortMetric> {
        match self {
            ProfileChoice::Ncalls => Some(SortMetric::Ncalls),
            ProfileChoice::Tottime => Some(SortMetric::Tottime),
            ProfileChoice::Percall => Some(SortMetric::Percall),
            ProfileChoice::Cumtime => Some(SortMetric::Cumtime),
            ProfileChoice::Name => Some(SortMetric::Name),
            ProfileChoice::Disable => None,
        }
    }
}

/// Resolved launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub mode: ConnectionMode,
    /// Spawn command plus extra arguments; empty in connect mode.
    pub argv: Vec<String>,
    pub profile: Option<SortMetric>,
    pub notify: bool,
    pub config_path: Option<PathBuf>,
    pub wait: WaitPolicy,
    pub launch_args: Vec<String>,
}

/// Parse an optional `--connect` / `--listen` address.
pub fn resolve_target(flag: &str, address: Option<&str>) -> Result<Option<ConnectionTarget>> {
    address
        .map(|value| {
            ConnectionTarget::parse(value).with_context(|| format!("invalid --{flag} address"))
        })
        .transpose()
}

/// Split `prog` (or the mode's default) and append the extra arguments.
pub fn build_argv(
    mode: &ConnectionMode,
    prog: Option<&str>,
    extra: &[String],
) -> Result<Vec<String>> {
    let Some(default_prog) = mode.default_prog() else {
        return Ok(Vec::new());
    };
    let command = prog.unwrap_or(default_prog);
    let mut argv = shlex::split(command)
        .ok_or_else(|| anyhow!("--prog `{command}` has unbalanced quotes or escapes"))?;
    if argv.is_empty() {
        bail!("--prog must name a command");
    }
    argv.extend(extra.iter().cloned());
    Ok(argv)
}

/// `0` disables the limit.
pub fn build_wait_policy(timeout_secs: u64, poll_interval_ms: u64) -> WaitPolicy {
    WaitPolicy {
        interval: Duration::from_millis(poll_interval_ms.max(1)),
        timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
    }
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(
    mode: &ConnectionMode,
    argv: &[String],
    profile: ProfileChoice,
    notify: bool,
    config_path: Option<&PathBuf>,
) -> Vec<String> {
    let mut args = vec![format!("--mode={}", mode.as_str())];
    if let Some(target) = mode.target() {
        args.push(format!("--address={target}"));
    }
    if !argv.is_empty() {
        let joined = shlex::try_join(argv.iter().map(String::as_str))
            .unwrap_or_else(|_| argv.join(" "));
        args.push(format!("--argv={joined}"));
    }
    args.push(format!("--profile={}", profile.as_str()));
    if notify {
        args.push("--notify".to_string());
    }
    if let Some(path) = config_path {
        args.push(format!("--config={}", path.display()));
    }
    args
}
