//! Entry point for the nvim-ui launcher.
use std::process::ExitCode;

use clap::Parser;
use nvim_ui::{
    cli::LaunchArgs,
    launcher::runtime::{self, RuntimeExit},
    lib::telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(code) => code,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<ExitCode, RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = LaunchArgs::parse();
    let profile = args.build().map_err(RuntimeExit::usage)?;

    let exit = runtime::run_launcher(profile).await?;
    Ok(runtime::exit_code_for(exit))
}
