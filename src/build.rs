use crate::cmd;
use crate::config::DeployConfig;
use crate::error::PipelineResult;
use crate::release::Release;

/// Build the release image from the configured build context.
///
/// Runs locally; a failure here aborts the pipeline before anything
/// has touched the remote host.
pub fn build_image(release: &Release, config: &DeployConfig) -> PipelineResult<()> {
    eprintln!("Building {} for {}...", release.image, config.platform);

    cmd::run_interactive(
        "docker",
        &[
            "build",
            "--platform",
            &config.platform,
            "-f",
            &config.dockerfile,
            "-t",
            &release.image,
            &config.context,
        ],
    )
}
