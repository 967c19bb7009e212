//! Rendering of the proxy server configuration.
//!
//! Port 80 serves HTTP challenges from the shared webroot and
//! redirects everything else; port 443 terminates TLS with the
//! certificate material the renewal tool maintains and proxies to the
//! backend service.

use crate::config::DeployConfig;

/// Render the server config for the edge proxy.
#[must_use]
pub fn render(config: &DeployConfig) -> String {
    let domain = &config.domain;
    let service = &config.service;
    let port = config.port;

    format!(
        "server {{
    listen 80;
    server_name {domain};

    location /.well-known/acme-challenge/ {{
        root /var/www/certbot;
    }}

    location / {{
        return 301 https://$host$request_uri;
    }}
}}

server {{
    listen 443 ssl;
    server_name {domain};

    ssl_certificate /etc/letsencrypt/live/{domain}/fullchain.pem;
    ssl_certificate_key /etc/letsencrypt/live/{domain}/privkey.pem;

    location / {{
        proxy_pass http://{service}:{port};
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
    }}
}}
"
    )
}
