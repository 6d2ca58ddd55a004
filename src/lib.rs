//! Library crate root for the nvim-ui launcher.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod bridge;
pub mod cli;
pub mod launcher;
pub mod session;
