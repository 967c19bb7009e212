#![cfg(feature = "integration")]
//! End-to-end checks against a real deployment host. Opt in with
//! `cargo test --features integration` and point `REMESSA_TEST_HOST`
//! (and optionally `REMESSA_TEST_USER`) at a reachable target.

use std::time::Duration;

use remessa::ssh::{RemoteExecutor, SshSession};

fn session() -> Option<SshSession> {
    let host = std::env::var("REMESSA_TEST_HOST").ok()?;
    let user = std::env::var("REMESSA_TEST_USER").unwrap_or_else(|_| "deploy".to_string());
    Some(SshSession::new(&host, &user).timeout(Duration::from_secs(30)))
}

#[test]
fn preflight_and_echo_roundtrip() {
    let Some(ssh) = session() else {
        eprintln!("REMESSA_TEST_HOST not set, skipping");
        return;
    };

    ssh.ensure_ready().unwrap();
    assert_eq!(ssh.exec("echo ok").unwrap(), "ok");
}

#[test]
fn remote_file_write_read_roundtrip() {
    let Some(ssh) = session() else {
        eprintln!("REMESSA_TEST_HOST not set, skipping");
        return;
    };

    let path = "/tmp/remessa-integration-test";
    let content = "DOCKER_IMAGE=ns/app:abc123\nA=1\n";

    ssh.write_file(content, path).unwrap();
    assert_eq!(ssh.read_file(path).unwrap(), content);
    ssh.exec(&format!("rm -f {path}")).unwrap();
}
