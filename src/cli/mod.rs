//! CLI entrypoint module structure.
pub mod args;
pub mod profile;

pub use args::LaunchArgs;
pub use profile::{
    build_argv, build_launch_args, build_wait_policy, resolve_target, LaunchProfile,
    ProfileChoice,
};
