use super::DiscoveryStrategy;
use crate::config::ResolverConfig;
use crate::constants::REST_IDENTITY_PATHS;
use crate::model::Credential;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::debug;

static JSON_IDENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"identity"\s*:\s*"([^"]+)""#).expect("pattern is valid"));
static ATTR_IDENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)identity[^>]*[>=]["']([^"'<>]+)["'<]"#).expect("pattern is valid")
});
static ATTR_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)name[^>]*[>=]["']([^"'<>]+)["'<]"#).expect("pattern is valid")
});

/// REST channel: RouterOS v7 exposes the identity at
/// `/rest/system/identity`. Probes a small path list over HTTP, and over
/// HTTPS when an HTTPS port is configured (self-signed certs accepted).
pub struct RestStrategy {
    config: ResolverConfig,
}

impl RestStrategy {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    async fn probe(
        &self,
        client: &reqwest::Client,
        url: &str,
        cred: &Credential,
        window: Duration,
    ) -> Option<String> {
        let response = client
            .get(url)
            .timeout(window)
            .basic_auth(&cred.username, Some(&cred.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            debug!(url, status = %response.status(), "REST endpoint rejected the probe");
            return None;
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if is_json {
            let value: serde_json::Value = response.json().await.ok()?;
            identity_from_json(&value)
        } else {
            let text = response.text().await.ok()?;
            identity_from_text(&text)
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for RestStrategy {
    fn name(&self) -> &'static str {
        "rest-api"
    }

    fn candidate_ports(&self, config: &ResolverConfig) -> Vec<u16> {
        vec![config.http_port]
    }

    async fn resolve(
        &self,
        addr: IpAddr,
        cred: &Credential,
        port: u16,
        window: Duration,
    ) -> Option<String> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .ok()?;

        let mut urls = Vec::new();
        for path in REST_IDENTITY_PATHS {
            urls.push(format!("http://{addr}:{port}{path}"));
            if let Some(https_port) = self.config.https_port {
                urls.push(format!("https://{addr}:{https_port}{path}"));
            }
        }

        let deadline = Instant::now() + window;
        for url in urls {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if let Some(identity) = self.probe(&client, &url, cred, remaining).await {
                debug!(%addr, url, identity, "REST probe succeeded");
                return Some(identity);
            }
        }
        None
    }
}

fn identity_from_json(value: &serde_json::Value) -> Option<String> {
    let record = if let Some(array) = value.as_array() {
        array.first()?
    } else {
        value
    };
    let identity = record
        .get("name")
        .or_else(|| record.get("identity"))
        .or_else(|| record.get("data").and_then(|data| data.get("identity")))
        .and_then(|v| v.as_str())?;
    non_empty(identity)
}

fn identity_from_text(text: &str) -> Option<String> {
    for re in [&*JSON_IDENTITY_RE, &*ATTR_IDENTITY_RE, &*ATTR_NAME_RE] {
        if let Some(identity) = re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| non_empty(m.as_str()))
        {
            return Some(identity);
        }
    }
    None
}

fn non_empty(identity: &str) -> Option<String> {
    let identity = identity.trim();
    if identity.is_empty() {
        None
    } else {
        Some(identity.to_string())
    }
}
