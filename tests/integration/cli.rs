use anyhow::Result;

use crate::common::{stderr, stdout, Sandbox};

#[test]
fn help_lists_launch_options() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--help"])?;
    assert!(output.status.success(), "--help should succeed");

    let help = stdout(&output);
    for option in [
        "--prog",
        "--notify",
        "--listen",
        "--connect",
        "--profile",
        "--config",
        "--wait-timeout",
    ] {
        assert!(help.contains(option), "help should mention {option}: {help}");
    }
    Ok(())
}

#[test]
fn missing_config_file_is_rejected_before_connecting() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let missing = sandbox.path().join("missing.yaml");
    let output = sandbox.run(&[
        "--config",
        missing.to_str().expect("utf-8 path"),
        "--connect",
        "/nonexistent/nvim.sock",
    ])?;

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("does not exist"), "stderr: {err}");
    assert!(
        !err.contains("connect_failed"),
        "no connection should be attempted: {err}"
    );
    Ok(())
}

#[test]
fn unknown_profile_metric_is_rejected() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--profile", "fastest"])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("fastest"));
    Ok(())
}

#[test]
fn connect_and_listen_are_mutually_exclusive() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--connect", "/tmp/a.sock", "--listen", "/tmp/b.sock"])?;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("cannot be used with"));
    Ok(())
}

#[test]
fn unbalanced_prog_quotes_exit_with_usage_code() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--prog", "nvim 'oops"])?;
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("invalid_launch"));
    Ok(())
}
