mod cmd;
mod repo;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Repository maintenance tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local quality gate (fmt/clippy/test/release build), then `smoke`.
    Preflight,
    /// Run the release launcher against a scripted embedded editor.
    Smoke {
        /// Launcher binary (defaults to target/release/nvim-ui)
        #[arg(value_name = "BINARY")]
        binary: Option<std::path::PathBuf>,
    },
}

fn main() {
    if let Err(err) = real_main() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Preflight => {
            cmd::preflight::run()?;
        }
        Command::Smoke { binary } => {
            cmd::smoke::run(binary)?;
        }
    }
    Ok(())
}
