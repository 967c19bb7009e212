//! Certificate renewal watchdog for the edge proxy.
//!
//! An unbounded periodic loop, fully decoupled from the release
//! pipeline: each tick opens its own session, asks the renewal tool
//! to renew whatever is near expiry, and signals the proxy to reload
//! only when material actually changed. Failures are logged and
//! retried on the next tick; the loop itself never errors.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::DeployConfig;
use crate::error::PipelineResult;
use crate::ssh::RemoteExecutor;

/// Outcome of one renewal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// Certificates were replaced and the proxy was told to reload.
    Renewed,
    /// Nothing was near expiry; nothing was touched.
    NotDue,
}

/// One renewal attempt.
///
/// Implementations must be idempotent: attempting again when nothing
/// is due must change nothing.
pub trait Renewer {
    fn attempt(&self) -> PipelineResult<RenewalOutcome>;
}

/// Renewal daemon options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Fixed delay between attempts.
    pub period: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Runs the renewal tool on the deployment host over a fresh session
/// per tick.
pub struct ComposeRenewer {
    config: DeployConfig,
}

impl ComposeRenewer {
    #[must_use]
    pub const fn new(config: DeployConfig) -> Self {
        Self { config }
    }
}

impl Renewer for ComposeRenewer {
    fn attempt(&self) -> PipelineResult<RenewalOutcome> {
        let session = self.config.session();
        renew_once(&session, &self.config)
    }
}

/// Run one renewal tick through the given executor.
///
/// The reload signal is only sent after the renewal tool reports a
/// replacement, so an idle tick leaves the proxy alone.
pub fn renew_once(
    exec: &dyn RemoteExecutor,
    config: &DeployConfig,
) -> PipelineResult<RenewalOutcome> {
    let output = exec.exec(&format!(
        "cd {} && docker compose {} run --rm certbot renew --webroot -w /var/www/certbot 2>&1",
        config.remote_dir,
        config.compose_files()
    ))?;

    if !renewed_any(&output) {
        return Ok(RenewalOutcome::NotDue);
    }

    exec.exec(&format!(
        "cd {} && docker compose {} exec proxy nginx -s reload",
        config.remote_dir,
        config.compose_files()
    ))?;

    Ok(RenewalOutcome::Renewed)
}

/// Whether the renewal tool reports having replaced any certificate.
/// The tool no-ops when nothing is near expiry.
fn renewed_any(output: &str) -> bool {
    !(output.contains("No renewals were attempted")
        || output.contains("not yet due for renewal"))
}

/// Run the renewal loop until the shutdown future resolves.
///
/// The sleep function is injected so tests can drive the loop without
/// real twelve-hour waits.
pub async fn run<R, S, F>(
    options: &Options,
    renewer: Arc<R>,
    sleep_fn: S,
    mut shutdown: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    R: Renewer + Send + Sync + 'static,
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("certificate renewal daemon starting");

    loop {
        let tick = Arc::clone(&renewer);
        match tokio::task::spawn_blocking(move || tick.attempt()).await {
            Ok(Ok(RenewalOutcome::Renewed)) => info!("certificates renewed, proxy reloaded"),
            Ok(Ok(RenewalOutcome::NotDue)) => info!("certificates not due for renewal"),
            Ok(Err(e)) => warn!("renewal attempt failed: {e}"),
            Err(e) => error!("renewal task panicked: {e}"),
        }

        tokio::select! {
            () = &mut shutdown => {
                info!("certificate renewal daemon shutting down");
                return;
            }
            () = sleep_fn(options.period) => {}
        }
    }
}
