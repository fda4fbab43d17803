use super::DiscoveryStrategy;
use crate::config::ResolverConfig;
use crate::model::Credential;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

static NAME_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)name:\s*(.+)").expect("pattern is valid"));

/// Remote-shell channel: runs `/system identity print` over SSH and parses
/// the `name:` line of the console output. Last resort; it only helps when
/// the API and web ports are filtered but SSH is not.
pub struct SshStrategy;

impl SshStrategy {
    pub fn new(_config: ResolverConfig) -> Self {
        Self
    }
}

#[async_trait]
impl DiscoveryStrategy for SshStrategy {
    fn name(&self) -> &'static str {
        "ssh"
    }

    fn candidate_ports(&self, config: &ResolverConfig) -> Vec<u16> {
        vec![config.ssh_port]
    }

    async fn resolve(
        &self,
        addr: IpAddr,
        cred: &Credential,
        port: u16,
        window: Duration,
    ) -> Option<String> {
        let username = cred.username.clone();
        let password = cred.password.clone();

        // libssh2 is blocking; its own timeout bounds the worker thread
        // while the outer race merely unblocks this caller
        let worker = tokio::task::spawn_blocking(move || {
            exec_identity_print(addr, port, &username, &password, window)
        });
        match tokio::time::timeout(window, worker).await {
            Ok(Ok(identity)) => identity,
            Ok(Err(err)) => {
                debug!(%addr, port, %err, "SSH worker panicked");
                None
            }
            Err(_) => {
                debug!(%addr, port, "SSH attempt timed out");
                None
            }
        }
    }
}

fn exec_identity_print(
    addr: IpAddr,
    port: u16,
    username: &str,
    password: &str,
    window: Duration,
) -> Option<String> {
    let stream = std::net::TcpStream::connect_timeout(&SocketAddr::new(addr, port), window).ok()?;
    stream.set_read_timeout(Some(window)).ok()?;
    stream.set_write_timeout(Some(window)).ok()?;

    let mut session = ssh2::Session::new().ok()?;
    session.set_tcp_stream(stream);
    session.set_timeout(window.as_millis() as u32);
    session.handshake().ok()?;
    session.userauth_password(username, password).ok()?;

    let mut channel = session.channel_session().ok()?;
    channel.exec("/system identity print").ok()?;
    let mut output = String::new();
    channel.read_to_string(&mut output).ok()?;
    let _ = channel.wait_close();

    parse_identity_output(&output)
}

/// Extract the identity from console output shaped like `  name: gateway`
fn parse_identity_output(output: &str) -> Option<String> {
    NAME_LINE_RE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}
