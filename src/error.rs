use std::process::ExitStatus;
use std::time::Duration;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("command timed out after {timeout:?}: {command}")]
    CommandTimeout { command: String, timeout: Duration },

    #[error("SSH connection failed: {0}")]
    SshFailed(String),

    #[error("registry authentication failed for {0}")]
    RegistryAuth(String),

    #[error("variable '{key}' not found in {path}")]
    EnvKeyMissing { key: String, path: String },

    #[error("environment variable missing: {0}")]
    EnvMissing(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
