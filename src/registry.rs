use crate::cmd;
use crate::config::{DeployConfig, RegistryAuth};
use crate::error::{PipelineError, PipelineResult};
use crate::release::Release;

/// Authenticate against the registry.
///
/// The password travels over stdin and never appears in the argument
/// list or the log stream.
pub fn login(config: &DeployConfig, auth: &RegistryAuth) -> PipelineResult<()> {
    eprintln!("Logging in to {}...", config.registry);

    let result = cmd::run_with_stdin(
        "docker",
        &[
            "login",
            &config.registry,
            "-u",
            &auth.username,
            "--password-stdin",
        ],
        auth.password().as_bytes(),
    );

    match result {
        Ok(_) => Ok(()),
        Err(PipelineError::CommandFailed { .. }) => {
            Err(PipelineError::RegistryAuth(config.registry.clone()))
        }
        Err(e) => Err(e),
    }
}

/// Push the release image.
///
/// The registry's own atomicity makes this all-or-nothing: a partial
/// layer upload never yields a pullable tag.
pub fn push(release: &Release) -> PipelineResult<()> {
    eprintln!("Pushing {}...", release.image);
    cmd::run_interactive("docker", &["push", &release.image])?;

    if let Ok(digest) = pushed_digest(release) {
        eprintln!("Pushed {digest}");
    }
    Ok(())
}

/// Repo digest recorded for the image after a successful push.
fn pushed_digest(release: &Release) -> PipelineResult<String> {
    let raw = cmd::run(
        "docker",
        &[
            "image",
            "inspect",
            "--format",
            "{{json .RepoDigests}}",
            &release.image,
        ],
    )?;

    let digests: Vec<String> = serde_json::from_str(&raw)?;
    digests.into_iter().next().ok_or_else(|| {
        PipelineError::Other(format!("no repo digest recorded for {}", release.image))
    })
}
