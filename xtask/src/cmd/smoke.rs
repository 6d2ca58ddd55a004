use crate::repo;
use anyhow::{bail, Context, Result};
use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

const NOTICE: &str = "attached\n";

pub fn run(binary: Option<PathBuf>) -> Result<()> {
    let root = repo::repo_root()?;
    let binary = binary.unwrap_or_else(|| root.join("target/release/nvim-ui"));
    if !binary.is_file() {
        bail!(
            "launcher binary not found at {} (run `cargo build --release` first)",
            binary.display()
        );
    }

    eprintln!("==> {} --help", binary.display());
    let help = Command::new(&binary)
        .arg("--help")
        .output()
        .with_context(|| format!("failed to run {}", binary.display()))?;
    if !help.status.success() {
        bail!("--help failed (status {})", help.status);
    }

    eprintln!("==> {} --notify (scripted embed)", binary.display());
    let output = Command::new(&binary)
        .args(["--notify", "--prog", "sh -c 'printf redraw'"])
        .current_dir(&root)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("failed to run {}", binary.display()))?;
    if !output.status.success() {
        bail!(
            "scripted embed failed (status {}):\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout != NOTICE {
        bail!("expected {NOTICE:?} on stdout, got {stdout:?}");
    }
    Ok(())
}
