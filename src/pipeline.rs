use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::build;
use crate::compose;
use crate::config::{DeployConfig, RegistryAuth};
use crate::error::PipelineResult;
use crate::nginx;
use crate::ops::{self, RemoteOp};
use crate::registry;
use crate::release::Release;
use crate::renew::{self, ComposeRenewer, Options, RenewalOutcome, Renewer};
use crate::ssh::RemoteExecutor;

/// Release pipeline for one compose-based deployment target.
///
/// Stages run strictly in sequence and fail fast: build, publish,
/// session preflight, then the remote operation plan. No remote state
/// is touched until the host has been reached and its identity
/// accepted.
pub struct Pipeline {
    config: DeployConfig,
    auth: Option<RegistryAuth>,
}

impl Pipeline {
    #[must_use]
    pub const fn new(config: DeployConfig) -> Self {
        Self { config, auth: None }
    }

    /// Inject registry credentials. Without them the push relies on an
    /// existing docker login.
    #[must_use]
    pub fn registry_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Parse CLI arguments and dispatch the appropriate command.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatched command fails.
    pub fn run(&self) -> PipelineResult<()> {
        let cli = Cli::parse();

        match &cli.command {
            Command::Deploy {
                commit,
                skip_build,
                dry_run,
            } => self.cmd_deploy(commit, *skip_build, *dry_run),
            Command::Init { dry_run } => self.cmd_init(*dry_run),
            Command::Status => self.cmd_status(),
            Command::Renew { once } => self.cmd_renew(*once),
        }
    }

    fn cmd_deploy(&self, commit: &str, skip_build: bool, dry_run: bool) -> PipelineResult<()> {
        let release = Release::new(commit, &self.config);
        let plan = ops::plan(&release, &self.config);

        if dry_run {
            Self::print_plan(&release, &plan);
            return Ok(());
        }

        if !skip_build {
            build::build_image(&release, &self.config)?;
        }

        if let Some(auth) = &self.auth {
            registry::login(&self.config, auth)?;
        }
        registry::push(&release)?;

        let ssh = self.config.session();
        ssh.ensure_ready()?;

        ops::execute(&plan, &ssh, &self.config)?;

        eprintln!();
        eprintln!(
            "Release {} deployed to {}",
            release.commit, self.config.host
        );
        Ok(())
    }

    fn print_plan(release: &Release, plan: &[RemoteOp]) {
        eprintln!("=== Dry run: no changes will be made ===");
        eprintln!();
        eprintln!("Release: {} -> {}", release.commit, release.image);
        eprintln!();
        eprintln!("1. Build image {}", release.image);
        eprintln!("2. Push {}", release.image);
        eprintln!("3. Open session and verify host identity");
        for (i, op) in plan.iter().enumerate() {
            let marker = if op.fatal() { "" } else { " (non-fatal)" };
            eprintln!("{}. {}{marker}", i + 4, op.describe());
        }
    }

    fn cmd_init(&self, dry_run: bool) -> PipelineResult<()> {
        let backend = compose::render_backend(&self.config);
        let proxy = compose::render_proxy(&self.config);
        let server_conf = nginx::render(&self.config);

        if dry_run {
            eprintln!("--- {} ---", self.config.backend_manifest());
            println!("{backend}");
            eprintln!("--- {} ---", self.config.proxy_manifest());
            println!("{proxy}");
            eprintln!("--- nginx/conf.d/{}.conf ---", self.config.service);
            println!("{server_conf}");
            return Ok(());
        }

        let ssh = self.config.session();
        ssh.ensure_ready()?;

        let dir = &self.config.remote_dir;
        eprintln!("Installing stack scaffolding in {dir}...");

        ssh.exec(&format!(
            "mkdir -p {dir} && cd {dir} && mkdir -p nginx/conf.d {} {}",
            self.config.cert_dir, self.config.webroot_dir
        ))?;

        ssh.write_file(&backend, &format!("{dir}/{}", self.config.backend_manifest()))?;
        ssh.write_file(&proxy, &format!("{dir}/{}", self.config.proxy_manifest()))?;
        ssh.write_file(
            &server_conf,
            &format!("{dir}/nginx/conf.d/{}.conf", self.config.service),
        )?;

        // Seed the environment file only when absent; a live one is
        // owned by the release pipeline.
        let env_path = self.config.env_file_path();
        let exists = ssh.exec(&format!("test -f {env_path} && echo yes || echo no"))?;
        if exists.trim() == "no" {
            let seed = format!(
                "{}={}/{}:latest\n",
                self.config.image_var, self.config.namespace, self.config.service
            );
            ssh.write_file(&seed, &env_path)?;
            eprintln!("Seeded {env_path}");
        }

        eprintln!("Scaffolding installed. Deploy with: cargo xtask deploy <commit>");
        Ok(())
    }

    fn cmd_status(&self) -> PipelineResult<()> {
        let ssh = self.config.session();
        ssh.exec_interactive(&format!(
            "cd {} && docker compose {} ps",
            self.config.remote_dir,
            self.config.compose_files()
        ))
    }

    fn cmd_renew(&self, once: bool) -> PipelineResult<()> {
        let renewer = ComposeRenewer::new(self.config.clone());

        if once {
            match renewer.attempt()? {
                RenewalOutcome::Renewed => eprintln!("Certificates renewed, proxy reloaded"),
                RenewalOutcome::NotDue => eprintln!("Certificates not due for renewal"),
            }
            return Ok(());
        }

        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();

        let options = Options {
            period: self.config.renew_period(),
        };

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(renew::run(
            &options,
            Arc::new(renewer),
            tokio::time::sleep,
            Box::pin(async {
                let _ = tokio::signal::ctrl_c().await;
            }),
        ));
        Ok(())
    }
}

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Release automation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build, publish, and roll out a release
    Deploy {
        /// Commit identifier for the release
        commit: String,

        /// Skip the image build
        #[arg(long)]
        skip_build: bool,

        /// Print the release plan without executing
        #[arg(long)]
        dry_run: bool,
    },

    /// Install stack scaffolding on the remote host
    Init {
        /// Print generated files without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show container status on the remote host
    Status,

    /// Run the certificate renewal daemon
    Renew {
        /// Run a single renewal tick and exit
        #[arg(long)]
        once: bool,
    },
}
