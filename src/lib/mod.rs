//! Shared library modules providing error types, path helpers, spawn commands, and telemetry initialization.

pub mod command;
pub mod errors;
pub mod paths;
pub mod telemetry;
