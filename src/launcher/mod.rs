//! Configuration loading and launcher runtime.
pub mod config;
pub mod runtime;
