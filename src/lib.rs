//! Release pipeline for compose-based services.
//!
//! Remessa takes a freshly accepted commit to production in one
//! ordered, failure-aware sequence: build a commit-tagged image,
//! publish it to a registry, flip the image variable in the remote
//! environment file, reconcile the compose stack (pull, then
//! recreate), and prune what nothing references anymore. A separate
//! certificate renewal daemon keeps the edge proxy's TLS material
//! valid.
//!
//! The name is Portuguese for *shipment*: one release, shipped to one
//! host.
//!
//! # Overview
//!
//! A deployment is defined by a [`Pipeline`] wired from:
//!
//! - A [`DeployConfig`] describing the service, the registry
//!   namespace, the deployment host, and the remote stack layout
//! - A [`RegistryAuth`] carrying registry credentials, injected
//!   rather than read ambiently
//!
//! # Architecture
//!
//! The pipeline is strictly sequential: build, publish, session
//! preflight, then an ordered plan of typed remote operations
//! (environment rewrite, compose pull, compose recreate, image
//! prune). Every fatal failure short-circuits the remaining stages;
//! nothing touches the host until its identity is verified. The
//! renewal daemon ([`renew`]) is an independent periodic task with a
//! shutdown signal, sharing nothing with the pipeline but the remote
//! project directory.
//!
//! # Example
//!
//! Create an `xtask/src/main.rs` in your project:
//!
//! ```rust,no_run
//! use remessa::{DeployConfig, Pipeline, RegistryAuth};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = DeployConfig::new("backend", "deploy.example.com")
//!         .namespace("registry.example.com/acme")
//!         .registry("registry.example.com")
//!         .domain("api.example.com")
//!         .port(8000)
//!         .volume("api-data", "/app/data")
//!         .healthcheck("curl -f http://localhost:8000/health");
//!
//!     let pipeline = Pipeline::new(config)
//!         .registry_auth(RegistryAuth::from_env()?);
//!
//!     pipeline.run()?;
//!     Ok(())
//! }
//! ```
//!
//! Then use `cargo xtask` subcommands:
//!
//! ```sh
//! # Install the stack scaffolding on the host (first time only)
//! cargo xtask init
//!
//! # Deploy a release
//! cargo xtask deploy 4f2c9d1
//!
//! # Preview the release plan without executing
//! cargo xtask deploy 4f2c9d1 --dry-run
//!
//! # Run the certificate renewal watchdog
//! cargo xtask renew
//! ```

// Allow noisy pedantic lints that don't add value for a
// deployment tool crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]

pub mod build;
pub mod cmd;
pub mod compose;
pub mod config;
pub mod envfile;
pub mod error;
pub mod nginx;
pub mod ops;
pub mod pipeline;
pub mod registry;
pub mod release;
pub mod renew;
pub mod ssh;

pub use config::DeployConfig;
pub use config::RegistryAuth;
pub use pipeline::Pipeline;
pub use release::Release;
pub use renew::ComposeRenewer;
pub use renew::RenewalOutcome;
pub use renew::Renewer;
pub use ssh::RemoteExecutor;
pub use ssh::SshSession;
