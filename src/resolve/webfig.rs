use super::DiscoveryStrategy;
use crate::config::ResolverConfig;
use crate::constants::{WEBFIG_IDENTITY_PATHS, WEBFIG_USER_AGENT};
use crate::model::Credential;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tracing::debug;

static IDENTITY_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)name="identity"[^>]*value="([^"]+)""#).expect("pattern is valid")
});
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title>([^<]+?)\s*-\s*WebFig").expect("pattern is valid"));
static GENERIC_IDENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)identity[^>]*[>=]["']([^"'<>]+)["'<]"#).expect("pattern is valid")
});

/// WebFig channel: scrapes the device's web configurator. Older builds leak
/// the identity through internal JSON endpoints, the identity form field, or
/// the page title; all three are tried, behind basic auth with a browser-ish
/// User-Agent.
pub struct WebFigStrategy;

impl WebFigStrategy {
    pub fn new(_config: ResolverConfig) -> Self {
        Self
    }

    async fn probe(
        client: &reqwest::Client,
        url: &str,
        cred: &Credential,
        window: Duration,
    ) -> Option<String> {
        let response = client
            .get(url)
            .timeout(window)
            .basic_auth(&cred.username, Some(&cred.password))
            .header(reqwest::header::USER_AGENT, WEBFIG_USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));

        if is_json {
            let value: serde_json::Value = response.json().await.ok()?;
            identity_from_webfig_json(&value)
        } else {
            let html = response.text().await.ok()?;
            identity_from_html(&html)
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for WebFigStrategy {
    fn name(&self) -> &'static str {
        "webfig"
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
        let client = reqwest::Client::builder().build().ok()?;
        let deadline = Instant::now() + window;

        // the landing page first: cheap reachability check, and some builds
        // put the identity straight into its title
        let mut urls = vec![format!("http://{addr}:{port}/webfig/")];
        urls.extend(
            WEBFIG_IDENTITY_PATHS
                .iter()
                .map(|path| format!("http://{addr}:{port}{path}")),
        );

        for url in urls {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            if let Some(identity) = Self::probe(&client, &url, cred, remaining).await {
                debug!(%addr, url, identity, "WebFig probe succeeded");
                return Some(identity);
            }
        }
        None
    }
}

fn identity_from_webfig_json(value: &serde_json::Value) -> Option<String> {
    let record = if let Some(array) = value.as_array() {
        array.first()?
    } else {
        value
    };
    record
        .get("identity")
        .or_else(|| record.get("name"))
        .or_else(|| record.get("system-identity"))
        .or_else(|| record.get("data").and_then(|data| data.get("identity")))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn identity_from_html(html: &str) -> Option<String> {
    for re in [&*IDENTITY_INPUT_RE, &*TITLE_RE, &*GENERIC_IDENTITY_RE] {
        if let Some(identity) = re
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            // single characters are markup noise, not an identity
            .filter(|s| s.len() > 2)
        {
            return Some(identity.to_string());
        }
    }
    None
}
