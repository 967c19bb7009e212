use std::time::Duration;

use crate::cmd;
use crate::error::{PipelineError, PipelineResult};

/// Executes commands and file writes on the deployment host.
///
/// This is the seam between the pipeline's remote mutations and the
/// transport: production code goes through [`SshSession`], tests
/// substitute a recording double.
pub trait RemoteExecutor {
    /// Execute a command on the remote host and capture its output.
    fn exec(&self, command: &str) -> PipelineResult<String>;

    /// Read a remote file, preserving its content byte for byte.
    fn read_file(&self, remote_path: &str) -> PipelineResult<String>;

    /// Write content to a remote file, replacing it.
    fn write_file(&self, content: &str, remote_path: &str) -> PipelineResult<()>;
}

/// SSH session wrapper for executing commands and writing files on
/// a remote host.
///
/// Host identity follows the accept-new policy: the first contact
/// appends to the known-hosts record, every later session must match
/// it. Each command is bounded by the session timeout.
pub struct SshSession {
    host: String,
    user: String,
    key: Option<String>,
    known_hosts: Option<String>,
    timeout: Duration,
}

impl SshSession {
    #[must_use]
    pub fn new(host: &str, user: &str) -> Self {
        Self {
            host: host.to_string(),
            user: user.to_string(),
            key: None,
            known_hosts: None,
            timeout: Duration::from_secs(600),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key_path: &str) -> Self {
        self.key = Some(key_path.to_string());
        self
    }

    #[must_use]
    pub fn known_hosts(mut self, path: &str) -> Self {
        self.known_hosts = Some(path.to_string());
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Verify the host is reachable and its identity accepted.
    ///
    /// The pipeline calls this before any remote mutation, so an
    /// unreachable host or a rejected key aborts with the remote
    /// state untouched.
    pub fn ensure_ready(&self) -> PipelineResult<()> {
        self.exec("echo ok").map(drop).map_err(|e| {
            PipelineError::SshFailed(format!(
                "{}@{} unreachable or rejected: {e}",
                self.user, self.host
            ))
        })
    }

    /// Execute a command on the remote host interactively.
    pub fn exec_interactive(&self, command: &str) -> PipelineResult<()> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_interactive("ssh", &refs)
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn build_ssh_args(&self, command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    fn ssh_base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "ConnectTimeout=10".to_string(),
        ];
        if let Some(path) = &self.known_hosts {
            args.push("-o".to_string());
            args.push(format!("UserKnownHostsFile={path}"));
        }
        if let Some(key) = &self.key {
            args.push("-i".to_string());
            args.push(key.clone());
        }
        args
    }
}

impl RemoteExecutor for SshSession {
    fn exec(&self, command: &str) -> PipelineResult<String> {
        let args = self.build_ssh_args(command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_timeout("ssh", &refs, self.timeout)
    }

    fn read_file(&self, remote_path: &str) -> PipelineResult<String> {
        let args = self.build_ssh_args(&format!("cat {remote_path}"));
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_timeout_raw("ssh", &refs, self.timeout)
    }

    fn write_file(&self, content: &str, remote_path: &str) -> PipelineResult<()> {
        let command = format!("cat > {remote_path}");
        let args = self.build_ssh_args(&command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        cmd::run_with_stdin("ssh", &refs, content.as_bytes())?;
        Ok(())
    }
}
