use crate::{cmd::smoke, repo};
use anyhow::{bail, Result};
use std::{
    path::Path,
    process::{Command, Stdio},
};

/// Cargo invocations run in order before the launcher smoke check.
const CARGO_STEPS: &[&[&str]] = &[
    &["fetch"],
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    &["test", "--workspace"],
    &["build", "--release", "--bin", "nvim-ui"],
];

pub fn run() -> Result<()> {
    let root = repo::repo_root()?;
    for args in CARGO_STEPS {
        cargo(&root, args)?;
    }
    smoke::run(None)
}

fn cargo(root: &Path, args: &[&str]) -> Result<()> {
    let label = format!("cargo {}", args.join(" "));
    eprintln!("==> {label}");
    let status = Command::new("cargo")
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .status()?;

    if !status.success() {
        bail!("{label} failed (status {status})");
    }
    Ok(())
}
