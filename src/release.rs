use crate::config::DeployConfig;

/// One build-to-deploy attempt, identified by a commit.
///
/// The image reference is derived once, deterministically: the same
/// commit always maps to the same tag, so retries and re-runs
/// converge instead of drifting. A release is never mutated after
/// creation, only superseded by the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub commit: String,
    pub image: String,
}

impl Release {
    #[must_use]
    pub fn new(commit: &str, config: &DeployConfig) -> Self {
        Self {
            commit: commit.to_string(),
            image: image_reference(&config.namespace, &config.service, commit),
        }
    }
}

/// `<namespace>/<service>:<commit>`.
#[must_use]
pub fn image_reference(namespace: &str, service: &str, commit: &str) -> String {
    format!("{namespace}/{service}:{commit}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeployConfig {
        DeployConfig::new("backend", "deploy.example.com").namespace("registry.example.com/acme")
    }

    #[test]
    fn tag_derivation_is_deterministic() {
        let a = Release::new("4f2c9d1", &config());
        let b = Release::new("4f2c9d1", &config());

        assert_eq!(a, b);
        assert_eq!(a.image, "registry.example.com/acme/backend:4f2c9d1");
    }

    #[test]
    fn distinct_commits_yield_distinct_tags() {
        let a = Release::new("abc123", &config());
        let b = Release::new("def456", &config());

        assert_ne!(a.image, b.image);
    }
}
