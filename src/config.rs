use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::ssh::SshSession;

/// Deployment target and stack configuration.
///
/// Every knob the pipeline touches lives here and is injected at
/// construction time; nothing is looked up ambiently mid-run. Built
/// with chained setters, or loaded from a YAML file for CI use.
///
/// # Example
///
/// ```
/// use remessa::DeployConfig;
///
/// let config = DeployConfig::new("backend", "deploy.example.com")
///     .namespace("registry.example.com/acme")
///     .registry("registry.example.com")
///     .domain("api.example.com")
///     .port(8000);
///
/// assert_eq!(config.service, "backend");
/// assert_eq!(config.port, 8000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Service name; also the backend compose service name.
    pub service: String,
    /// Registry namespace prefixed to the image name, e.g.
    /// `registry.example.com/acme`.
    pub namespace: String,
    /// Registry host used for authentication.
    pub registry: String,
    /// Local build context path.
    pub context: String,
    pub dockerfile: String,
    pub platform: String,
    /// Deployment host.
    pub host: String,
    /// Login identity on the deployment host.
    pub user: String,
    /// Private key for the remote session.
    pub key_path: Option<String>,
    /// Host-identity record; ssh's default when unset.
    pub known_hosts: Option<String>,
    /// Project directory on the host.
    pub remote_dir: String,
    /// Environment file name inside the project directory.
    pub env_file: String,
    /// Variable rewritten to the fresh image reference on every release.
    pub image_var: String,
    /// Compose manifest layers, merged in order at invocation time.
    pub manifests: Vec<String>,
    /// Bound on each remote command; expiry kills the client process.
    pub command_timeout_secs: u64,
    /// Delay between certificate renewal attempts.
    pub renew_period_secs: u64,
    /// Public domain served by the proxy.
    pub domain: String,
    /// Port the backend listens on.
    pub port: u16,
    /// Named volumes mounted into the backend, as (name, mount) pairs.
    pub volumes: Vec<(String, String)>,
    pub healthcheck: Option<String>,
    /// Certificate directory shared by the proxy and the renewal tool,
    /// relative to the project directory.
    pub cert_dir: String,
    /// Webroot serving HTTP challenges, relative to the project
    /// directory.
    pub webroot_dir: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            namespace: String::new(),
            registry: "docker.io".to_string(),
            context: ".".to_string(),
            dockerfile: "Dockerfile".to_string(),
            platform: "linux/amd64".to_string(),
            host: String::new(),
            user: "deploy".to_string(),
            key_path: None,
            known_hosts: None,
            remote_dir: "/opt/app".to_string(),
            env_file: ".env".to_string(),
            image_var: "DOCKER_IMAGE".to_string(),
            manifests: vec![
                "docker-compose.yml".to_string(),
                "docker-compose.proxy.yml".to_string(),
            ],
            command_timeout_secs: 600,
            renew_period_secs: 12 * 60 * 60,
            domain: String::new(),
            port: 8000,
            volumes: Vec::new(),
            healthcheck: None,
            cert_dir: "./letsencrypt".to_string(),
            webroot_dir: "./certbot-www".to_string(),
        }
    }
}

impl DeployConfig {
    #[must_use]
    pub fn new(service: &str, host: &str) -> Self {
        Self {
            service: service.to_string(),
            host: host.to_string(),
            ..Default::default()
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &str) -> PipelineResult<Self> {
        if !Path::new(path).exists() {
            return Err(PipelineError::FileNotFound(path.to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: &str) -> Self {
        self.registry = registry.to_string();
        self
    }

    #[must_use]
    pub fn context(mut self, path: &str) -> Self {
        self.context = path.to_string();
        self
    }

    #[must_use]
    pub fn dockerfile(mut self, path: &str) -> Self {
        self.dockerfile = path.to_string();
        self
    }

    #[must_use]
    pub fn platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    #[must_use]
    pub fn user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    #[must_use]
    pub fn key_path(mut self, path: &str) -> Self {
        self.key_path = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn known_hosts(mut self, path: &str) -> Self {
        self.known_hosts = Some(path.to_string());
        self
    }

    #[must_use]
    pub fn remote_dir(mut self, dir: &str) -> Self {
        self.remote_dir = dir.to_string();
        self
    }

    #[must_use]
    pub fn env_file(mut self, name: &str) -> Self {
        self.env_file = name.to_string();
        self
    }

    #[must_use]
    pub fn image_var(mut self, name: &str) -> Self {
        self.image_var = name.to_string();
        self
    }

    #[must_use]
    pub fn manifests(mut self, layers: &[&str]) -> Self {
        self.manifests = layers.iter().map(|l| (*l).to_string()).collect();
        self
    }

    #[must_use]
    pub const fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.command_timeout_secs = secs;
        self
    }

    #[must_use]
    pub const fn renew_period_secs(mut self, secs: u64) -> Self {
        self.renew_period_secs = secs;
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = domain.to_string();
        self
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn volume(mut self, name: &str, mount: &str) -> Self {
        self.volumes.push((name.to_string(), mount.to_string()));
        self
    }

    #[must_use]
    pub fn healthcheck(mut self, command: &str) -> Self {
        self.healthcheck = Some(command.to_string());
        self
    }

    #[must_use]
    pub const fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    #[must_use]
    pub const fn renew_period(&self) -> Duration {
        Duration::from_secs(self.renew_period_secs)
    }

    /// Absolute path of the environment file on the host.
    #[must_use]
    pub fn env_file_path(&self) -> String {
        format!("{}/{}", self.remote_dir, self.env_file)
    }

    /// `-f <layer>` arguments merging the manifest layers in order.
    #[must_use]
    pub fn compose_files(&self) -> String {
        self.manifests
            .iter()
            .map(|m| format!("-f {m}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[must_use]
    pub fn backend_manifest(&self) -> &str {
        self.manifests
            .first()
            .map_or("docker-compose.yml", String::as_str)
    }

    #[must_use]
    pub fn proxy_manifest(&self) -> &str {
        self.manifests
            .get(1)
            .map_or("docker-compose.proxy.yml", String::as_str)
    }

    /// Open a session to the deployment host with this configuration's
    /// identity and timeout settings.
    #[must_use]
    pub fn session(&self) -> SshSession {
        let mut ssh = SshSession::new(&self.host, &self.user).timeout(self.command_timeout());
        if let Some(key) = &self.key_path {
            ssh = ssh.with_key(key);
        }
        if let Some(path) = &self.known_hosts {
            ssh = ssh.known_hosts(path);
        }
        ssh
    }
}

/// Registry credentials, injected rather than read ambiently.
///
/// The password never appears in command arguments, log output, or
/// `Debug` formatting.
#[derive(Clone)]
pub struct RegistryAuth {
    pub username: String,
    password: String,
}

impl RegistryAuth {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Read credentials from `REGISTRY_USERNAME` / `REGISTRY_PASSWORD`.
    ///
    /// The single place the process environment is consulted for
    /// secrets.
    pub fn from_env() -> PipelineResult<Self> {
        let username = std::env::var("REGISTRY_USERNAME")
            .map_err(|_| PipelineError::EnvMissing("REGISTRY_USERNAME".into()))?;
        let password = std::env::var("REGISTRY_PASSWORD")
            .map_err(|_| PipelineError::EnvMissing("REGISTRY_PASSWORD".into()))?;
        Ok(Self { username, password })
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
