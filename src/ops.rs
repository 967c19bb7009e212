//! The ordered remote operation plan for one release.
//!
//! Replaces an opaque remote script with a typed list of operations,
//! each carrying its own success/failure contract, executed in order
//! by a single [`RemoteExecutor`].

use crate::config::DeployConfig;
use crate::envfile::{self, Rewrite};
use crate::error::{PipelineError, PipelineResult};
use crate::release::Release;
use crate::ssh::RemoteExecutor;

/// One remote operation in a release plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    /// Point the image variable in the environment file at the fresh
    /// tag, leaving every other line byte-identical.
    RewriteImageVar { key: String, image: String },
    /// Pull every image referenced by the merged stack. Must complete
    /// before any recreate so a half-pulled image is never started.
    ComposePull,
    /// Recreate services whose configuration or image changed; leave
    /// the rest running.
    ComposeRecreate,
    /// Remove images no running container references.
    PruneImages,
}

impl RemoteOp {
    /// Human-readable description for progress output and dry runs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::RewriteImageVar { key, image } => {
                format!("set {key}={image} in the environment file")
            }
            Self::ComposePull => "pull stack images".to_string(),
            Self::ComposeRecreate => "recreate changed services".to_string(),
            Self::PruneImages => "prune unreferenced images".to_string(),
        }
    }

    /// Whether a failure of this operation aborts the run.
    #[must_use]
    pub const fn fatal(&self) -> bool {
        !matches!(self, Self::PruneImages)
    }

    fn run(&self, exec: &dyn RemoteExecutor, config: &DeployConfig) -> PipelineResult<()> {
        match self {
            Self::RewriteImageVar { key, image } => rewrite_image_var(exec, config, key, image),
            Self::ComposePull => exec
                .exec(&format!(
                    "cd {} && docker compose {} pull",
                    config.remote_dir,
                    config.compose_files()
                ))
                .map(drop),
            Self::ComposeRecreate => exec
                .exec(&format!(
                    "cd {} && docker compose {} up -d --build",
                    config.remote_dir,
                    config.compose_files()
                ))
                .map(drop),
            Self::PruneImages => exec.exec("docker image prune -af").map(drop),
        }
    }
}

/// The ordered plan for one release.
///
/// Deriving the plan is pure: the same release and configuration
/// always produce the same operations.
#[must_use]
pub fn plan(release: &Release, config: &DeployConfig) -> Vec<RemoteOp> {
    vec![
        RemoteOp::RewriteImageVar {
            key: config.image_var.clone(),
            image: release.image.clone(),
        },
        RemoteOp::ComposePull,
        RemoteOp::ComposeRecreate,
        RemoteOp::PruneImages,
    ]
}

/// Execute a plan in order.
///
/// A fatal operation short-circuits everything after it; a non-fatal
/// one logs the failure and lets the run finish.
pub fn execute(
    ops: &[RemoteOp],
    exec: &dyn RemoteExecutor,
    config: &DeployConfig,
) -> PipelineResult<()> {
    for op in ops {
        eprintln!("{}...", op.describe());
        match op.run(exec, config) {
            Ok(()) => {}
            Err(e) if op.fatal() => return Err(e),
            Err(e) => eprintln!("warning: {} failed: {e}", op.describe()),
        }
    }
    Ok(())
}

fn rewrite_image_var(
    exec: &dyn RemoteExecutor,
    config: &DeployConfig,
    key: &str,
    image: &str,
) -> PipelineResult<()> {
    let path = config.env_file_path();
    let current = exec.read_file(&path)?;

    match envfile::rewrite(&current, key, image) {
        Rewrite::Changed(updated) => exec.write_file(&updated, &path),
        Rewrite::Unchanged => {
            eprintln!("{key} already points at {image}");
            Ok(())
        }
        Rewrite::KeyMissing => Err(PipelineError::EnvKeyMissing {
            key: key.to_string(),
            path,
        }),
    }
}
