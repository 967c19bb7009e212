use std::time::Duration;

use remessa::error::PipelineError;

#[test]
fn display_command_not_found() {
    let err = PipelineError::CommandNotFound("docker".into());
    assert_eq!(err.to_string(), "command not found: docker");
}

#[test]
fn display_command_timeout() {
    let err = PipelineError::CommandTimeout {
        command: "ssh deploy@host true".into(),
        timeout: Duration::from_secs(600),
    };
    assert_eq!(
        err.to_string(),
        "command timed out after 600s: ssh deploy@host true"
    );
}

#[test]
fn display_ssh_failed() {
    let err = PipelineError::SshFailed("timeout".into());
    assert_eq!(err.to_string(), "SSH connection failed: timeout");
}

#[test]
fn display_registry_auth() {
    let err = PipelineError::RegistryAuth("registry.example.com".into());
    assert_eq!(
        err.to_string(),
        "registry authentication failed for registry.example.com"
    );
}

#[test]
fn display_env_key_missing() {
    let err = PipelineError::EnvKeyMissing {
        key: "DOCKER_IMAGE".into(),
        path: "/opt/app/.env".into(),
    };
    assert_eq!(
        err.to_string(),
        "variable 'DOCKER_IMAGE' not found in /opt/app/.env"
    );
}

#[test]
fn display_env_missing() {
    let err = PipelineError::EnvMissing("REGISTRY_PASSWORD".into());
    assert_eq!(
        err.to_string(),
        "environment variable missing: REGISTRY_PASSWORD"
    );
}

#[test]
fn display_file_not_found() {
    let err = PipelineError::FileNotFound("deploy.yml".into());
    assert_eq!(err.to_string(), "file not found: deploy.yml");
}

#[test]
fn display_other() {
    let err = PipelineError::Other("custom error".into());
    assert_eq!(err.to_string(), "custom error");
}

#[test]
fn from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err: PipelineError = io_err.into();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn from_json_error() {
    let json_err = serde_json::from_str::<Vec<u64>>("invalid").unwrap_err();
    let err: PipelineError = json_err.into();
    assert!(matches!(err, PipelineError::Json(_)));
}

#[test]
fn from_yaml_error() {
    let yaml_err = serde_yaml::from_str::<Vec<u64>>(": not yaml").unwrap_err();
    let err: PipelineError = yaml_err.into();
    assert!(matches!(err, PipelineError::Yaml(_)));
}
