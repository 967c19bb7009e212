//! Rendering of the two compose manifest layers.
//!
//! The backend layer pins its image to the environment-file variable,
//! so a release only ever touches that file; the proxy layer carries
//! the edge proxy and the renewal tool, sharing the certificate
//! directory and the challenge webroot.

use docker_compose_types::{
    Compose, ComposeNetworks, ComposeVolume, DependsOnOptions, Healthcheck, HealthcheckTest,
    Labels, MapOrEmpty, NetworkSettings, Networks, Ports, Service, Services, StringOrList,
    TopLevelVolumes, Volumes,
};
use indexmap::IndexMap;

use crate::config::DeployConfig;

/// Render the backend manifest layer.
#[must_use]
pub fn render_backend(config: &DeployConfig) -> String {
    let mut services = IndexMap::new();
    services.insert(config.service.clone(), Some(backend_service(config)));

    let compose = Compose {
        services: Services(services),
        volumes: backend_volumes(config),
        networks: network(config),
        ..Default::default()
    };

    serde_yaml::to_string(&compose).expect("failed to serialize compose")
}

/// Render the proxy manifest layer.
#[must_use]
pub fn render_proxy(config: &DeployConfig) -> String {
    let mut services = IndexMap::new();
    services.insert("proxy".to_string(), Some(proxy_service(config)));
    services.insert("certbot".to_string(), Some(certbot_service(config)));

    let compose = Compose {
        services: Services(services),
        networks: network(config),
        ..Default::default()
    };

    serde_yaml::to_string(&compose).expect("failed to serialize compose")
}

fn backend_service(config: &DeployConfig) -> Service {
    let volumes: Vec<Volumes> = config
        .volumes
        .iter()
        .map(|(name, mount)| Volumes::Simple(format!("{name}:{mount}")))
        .collect();

    let healthcheck = config.healthcheck.as_ref().map(|cmd| Healthcheck {
        test: Some(HealthcheckTest::Multiple(vec![
            "CMD".to_string(),
            "sh".to_string(),
            "-c".to_string(),
            cmd.clone(),
        ])),
        interval: Some("30s".to_string()),
        timeout: Some("10s".to_string()),
        retries: 3,
        start_period: Some("10s".to_string()),
        ..Default::default()
    });

    Service {
        image: Some(format!("${{{}}}", config.image_var)),
        container_name: Some(config.service.clone()),
        restart: Some("unless-stopped".to_string()),
        expose: vec![config.port.to_string()],
        env_file: Some(StringOrList::Simple(config.env_file.clone())),
        volumes,
        healthcheck,
        networks: Networks::Simple(vec![network_name(config)]),
        ..Default::default()
    }
}

fn proxy_service(config: &DeployConfig) -> Service {
    Service {
        image: Some("nginx:1.27-alpine".to_string()),
        container_name: Some(format!("{}-proxy", config.service)),
        restart: Some("unless-stopped".to_string()),
        ports: Ports::Short(vec!["80:80".to_string(), "443:443".to_string()]),
        volumes: vec![
            Volumes::Simple("./nginx/conf.d:/etc/nginx/conf.d:ro".to_string()),
            Volumes::Simple(format!("{}:/etc/letsencrypt:ro", config.cert_dir)),
            Volumes::Simple(format!("{}:/var/www/certbot:ro", config.webroot_dir)),
        ],
        depends_on: DependsOnOptions::Simple(vec![config.service.clone()]),
        networks: Networks::Simple(vec![network_name(config)]),
        ..Default::default()
    }
}

/// The renewal tool runs on demand (`docker compose run --rm certbot
/// renew`); it shares the proxy's certificate and webroot mounts with
/// write access.
fn certbot_service(config: &DeployConfig) -> Service {
    Service {
        image: Some("certbot/certbot".to_string()),
        container_name: Some(format!("{}-certbot", config.service)),
        volumes: vec![
            Volumes::Simple(format!("{}:/etc/letsencrypt", config.cert_dir)),
            Volumes::Simple(format!("{}:/var/www/certbot", config.webroot_dir)),
        ],
        ..Default::default()
    }
}

fn local_volume() -> ComposeVolume {
    ComposeVolume {
        driver: Some("local".to_string()),
        driver_opts: IndexMap::new(),
        external: None,
        labels: Labels::default(),
        name: None,
    }
}

fn backend_volumes(config: &DeployConfig) -> TopLevelVolumes {
    let mut vols = IndexMap::new();
    for (name, _) in &config.volumes {
        vols.insert(name.clone(), MapOrEmpty::Map(local_volume()));
    }
    TopLevelVolumes(vols)
}

fn network(config: &DeployConfig) -> ComposeNetworks {
    let mut nets = IndexMap::new();
    nets.insert(
        network_name(config),
        MapOrEmpty::Map(NetworkSettings {
            driver: Some("bridge".to_string()),
            ..Default::default()
        }),
    );
    ComposeNetworks(nets)
}

fn network_name(config: &DeployConfig) -> String {
    format!("{}-network", config.service)
}
