//! Release-plan execution against a recording executor double.

use std::cell::RefCell;

use remessa::error::{PipelineError, PipelineResult};
use remessa::ops::{self, RemoteOp};
use remessa::ssh::RemoteExecutor;
use remessa::{DeployConfig, Release};

/// Records every remote interaction; can be told to fail commands
/// matching a substring or to reject file reads entirely.
#[derive(Default)]
struct FakeHost {
    env_content: String,
    fail_matching: Option<String>,
    fail_reads: bool,
    commands: RefCell<Vec<String>>,
    writes: RefCell<Vec<(String, String)>>,
}

impl FakeHost {
    fn with_env(content: &str) -> Self {
        Self {
            env_content: content.to_string(),
            ..Default::default()
        }
    }

    fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    fn position(&self, needle: &str) -> Option<usize> {
        self.commands.borrow().iter().position(|c| c.contains(needle))
    }
}

impl RemoteExecutor for FakeHost {
    fn exec(&self, command: &str) -> PipelineResult<String> {
        self.commands.borrow_mut().push(command.to_string());
        if let Some(pattern) = &self.fail_matching {
            if command.contains(pattern) {
                return Err(PipelineError::Other(format!("simulated failure: {command}")));
            }
        }
        Ok(String::new())
    }

    fn read_file(&self, remote_path: &str) -> PipelineResult<String> {
        self.commands.borrow_mut().push(format!("read {remote_path}"));
        if self.fail_reads {
            return Err(PipelineError::SshFailed("host unreachable".to_string()));
        }
        Ok(self.env_content.clone())
    }

    fn write_file(&self, content: &str, remote_path: &str) -> PipelineResult<()> {
        self.writes
            .borrow_mut()
            .push((remote_path.to_string(), content.to_string()));
        Ok(())
    }
}

fn config() -> DeployConfig {
    DeployConfig::new("backend", "deploy.example.com").namespace("registry.example.com/acme")
}

fn full_plan(cfg: &DeployConfig) -> Vec<RemoteOp> {
    ops::plan(&Release::new("def456", cfg), cfg)
}

const ENV: &str = "POSTGRES_DB=app\nDOCKER_IMAGE=old/tag:abc123\nSECRET_KEY=s3cret\nDEBUG=0\n";

#[test]
fn pull_completes_before_recreate() {
    let cfg = config();
    let host = FakeHost::with_env(ENV);

    ops::execute(&full_plan(&cfg), &host, &cfg).unwrap();

    let pull = host.position("pull").expect("pull was issued");
    let recreate = host.position("up -d").expect("recreate was issued");
    let prune = host.position("prune").expect("prune was issued");
    assert!(pull < recreate);
    assert!(recreate < prune);
}

#[test]
fn rewrite_changes_one_line_and_preserves_the_rest() {
    let cfg = config();
    let host = FakeHost::with_env(ENV);

    ops::execute(&full_plan(&cfg), &host, &cfg).unwrap();

    let writes = host.writes.borrow();
    assert_eq!(writes.len(), 1);
    let (path, content) = &writes[0];
    assert_eq!(path, "/opt/app/.env");
    assert_eq!(
        content,
        "POSTGRES_DB=app\nDOCKER_IMAGE=registry.example.com/acme/backend:def456\nSECRET_KEY=s3cret\nDEBUG=0\n"
    );
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn failed_pull_skips_recreate_and_prune() {
    let cfg = config();
    let mut host = FakeHost::with_env(ENV);
    host.fail_matching = Some("pull".to_string());

    let err = ops::execute(&full_plan(&cfg), &host, &cfg).unwrap_err();

    assert!(matches!(err, PipelineError::Other(_)));
    assert!(host.position("up -d").is_none());
    assert!(host.position("prune").is_none());
}

#[test]
fn failed_recreate_skips_prune() {
    let cfg = config();
    let mut host = FakeHost::with_env(ENV);
    host.fail_matching = Some("up -d".to_string());

    ops::execute(&full_plan(&cfg), &host, &cfg).unwrap_err();

    assert!(host.position("pull").is_some());
    assert!(host.position("prune").is_none());
}

#[test]
fn failed_prune_does_not_fail_the_run() {
    let cfg = config();
    let mut host = FakeHost::with_env(ENV);
    host.fail_matching = Some("prune".to_string());

    ops::execute(&full_plan(&cfg), &host, &cfg).unwrap();

    assert!(host.position("prune").is_some());
}

#[test]
fn missing_image_variable_aborts_before_any_compose_command() {
    let cfg = config();
    let host = FakeHost::with_env("POSTGRES_DB=app\nSECRET_KEY=s3cret\n");

    let err = ops::execute(&full_plan(&cfg), &host, &cfg).unwrap_err();

    assert!(matches!(err, PipelineError::EnvKeyMissing { .. }));
    assert!(host.writes.borrow().is_empty());
    assert!(host.position("pull").is_none());
    assert!(host.position("up -d").is_none());
}

#[test]
fn unreachable_host_leaves_everything_untouched() {
    let cfg = config();
    let mut host = FakeHost::with_env(ENV);
    host.fail_reads = true;

    let err = ops::execute(&full_plan(&cfg), &host, &cfg).unwrap_err();

    assert!(matches!(err, PipelineError::SshFailed(_)));
    assert!(host.writes.borrow().is_empty());
    assert_eq!(host.commands().iter().filter(|c| c.contains("docker")).count(), 0);
}

#[test]
fn redeploying_the_same_release_skips_the_write_back() {
    let cfg = config();
    let already = "DOCKER_IMAGE=registry.example.com/acme/backend:def456\n";
    let host = FakeHost::with_env(already);

    ops::execute(&full_plan(&cfg), &host, &cfg).unwrap();

    // Same tag, nothing to rewrite - but the stack is still
    // reconciled, which compose resolves to a no-op.
    assert!(host.writes.borrow().is_empty());
    assert!(host.position("pull").is_some());
    assert!(host.position("up -d").is_some());
}

#[test]
fn compose_commands_merge_both_layers_in_order() {
    let cfg = config();
    let host = FakeHost::with_env(ENV);

    ops::execute(&full_plan(&cfg), &host, &cfg).unwrap();

    let commands = host.commands();
    let pull = &commands[host.position("pull").unwrap()];
    assert!(pull.contains("cd /opt/app"));
    assert!(pull.contains("-f docker-compose.yml -f docker-compose.proxy.yml"));
}
