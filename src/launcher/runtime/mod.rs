//! Launcher startup and exit reporting.
mod startup;

pub use startup::{
    exit_code_for, run_launcher, RuntimeExit, EXIT_CONFIG, EXIT_INTERRUPTED, EXIT_OSERR,
    EXIT_TEMPFAIL, EXIT_UNAVAILABLE, EXIT_USAGE,
};
