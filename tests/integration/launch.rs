#![cfg(unix)]

use std::{fs, time::Duration};

use anyhow::Result;
use tokio::{io::AsyncWriteExt, net::UnixListener, process::Command};

use crate::common::{fixture, stderr, stdout, Sandbox, BINARY_PATH};

#[test]
fn embedded_child_output_triggers_single_notify() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--notify", "--prog", "sh -c 'printf hello; printf world'"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "attached\n");
    Ok(())
}

#[test]
fn embedded_child_without_notify_prints_nothing() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--prog", "sh -c 'printf hello'"])?;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    Ok(())
}

#[test]
fn profile_report_is_written_to_stderr() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--profile", "ncalls", "--prog", "sh -c 'printf hello'"])?;

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Ordered by: call count"), "stderr: {err}");
    assert!(err.contains("frontend.handle_output"), "stderr: {err}");
    Ok(())
}

#[test]
fn missing_editor_program_reports_spawn_failure() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let output = sandbox.run(&["--prog", "definitely-not-an-editor-4c1d --embed"])?;

    assert_eq!(output.status.code(), Some(71));
    assert!(stderr(&output).contains("spawn_failed"));
    Ok(())
}

#[test]
fn connect_to_missing_socket_fails_without_retry() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let socket = sandbox.path().join("absent.sock");
    let output = sandbox.run(&["--connect", socket.to_str().expect("utf-8 path")])?;

    assert_eq!(output.status.code(), Some(69));
    assert!(stderr(&output).contains("connect_failed"));
    Ok(())
}

#[test]
fn malformed_discovered_config_is_fatal() -> Result<()> {
    let sandbox = Sandbox::new()?;
    fs::copy(
        fixture("tests/fixtures/ui_malformed.yaml"),
        sandbox.path().join(".pynvim.yaml"),
    )?;
    let output = sandbox.run(&["--prog", "sh -c 'printf hello'"])?;

    assert_eq!(output.status.code(), Some(78));
    assert!(stderr(&output).contains("config_invalid"));
    Ok(())
}

#[test]
fn discovered_config_is_logged() -> Result<()> {
    let sandbox = Sandbox::new()?;
    fs::copy(
        fixture("tests/fixtures/ui_valid.yaml"),
        sandbox.path().join(".pynvim.yaml"),
    )?;
    let output = sandbox.run(&["--prog", "sh -c 'printf hello'"])?;

    assert!(output.status.success());
    assert!(stderr(&output).contains("discovered:"));
    Ok(())
}

#[tokio::test]
async fn connect_mode_attaches_to_listening_socket() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let socket = sandbox.path().join("nvim.sock");
    let listener = UnixListener::bind(&socket)?;
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await?;
        stream.write_all(b"redraw").await?;
        stream.shutdown().await
    });

    let output = tokio::time::timeout(
        Duration::from_secs(10),
        Command::from(sandbox.command())
            .args(["--notify", "--connect"])
            .arg(&socket)
            .output(),
    )
    .await??;

    server.await??;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "attached\n");
    Ok(())
}

#[tokio::test]
async fn listen_mode_waits_for_spawned_editor() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let socket = sandbox.path().join("listen.sock");
    let marker = sandbox.path().join("address.txt");

    // Stand-in editor: records the address it was handed, then the test
    // starts listening on it a little later.
    let prog = format!(
        "sh -c 'printf %s \"$NVIM_LISTEN_ADDRESS\" > {}; sleep 5'",
        marker.display()
    );
    let mut launcher = Command::from(sandbox.command());
    launcher
        .args(["--notify", "--wait-timeout", "10", "--listen"])
        .arg(&socket)
        .args(["--prog", &prog]);
    let child = launcher.spawn()?;

    tokio::time::sleep(Duration::from_millis(300)).await;
    let listener = UnixListener::bind(&socket)?;
    let (mut stream, _) = listener.accept().await?;
    stream.write_all(b"redraw").await?;
    stream.shutdown().await?;

    let output = tokio::time::timeout(Duration::from_secs(10), child.wait_with_output()).await??;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "attached\n");
    assert_eq!(fs::read_to_string(&marker)?, socket.display().to_string());
    assert!(
        std::env::var_os("NVIM_LISTEN_ADDRESS").is_none(),
        "launcher must not leak the address into this process"
    );
    Ok(())
}

#[test]
fn listen_mode_times_out_when_editor_never_listens() -> Result<()> {
    let sandbox = Sandbox::new()?;
    let socket = sandbox.path().join("never.sock");
    let output = sandbox.run(&[
        "--wait-timeout",
        "1",
        "--listen",
        socket.to_str().expect("utf-8 path"),
        "--prog",
        "sh -c 'sleep 30'",
    ])?;

    assert_eq!(output.status.code(), Some(75));
    assert!(stderr(&output).contains("attach_timeout"));
    Ok(())
}

#[test]
fn binary_path_points_at_launcher() {
    assert!(BINARY_PATH.ends_with("nvim-ui"));
}
