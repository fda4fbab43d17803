use async_trait::async_trait;
use rosident::proto::codec::{decode_length, encode_sentence};
use rosident::resolve::DiscoveryStrategy;
use rosident::{Credential, ResolverConfig};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Scripted strategy for engine tests: counts its calls, optionally sleeps,
/// then returns a fixed identity
#[allow(dead_code)]
pub struct ScriptedStrategy {
    pub name: &'static str,
    pub ports: Vec<u16>,
    pub delay: Duration,
    pub identity: Option<String>,
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl ScriptedStrategy {
    pub fn returning(name: &'static str, port: u16, identity: Option<&str>) -> Self {
        Self {
            name,
            ports: vec![port],
            delay: Duration::ZERO,
            identity: identity.map(|s| s.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn slow(name: &'static str, port: u16, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::returning(name, port, None)
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl DiscoveryStrategy for ScriptedStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn candidate_ports(&self, _config: &ResolverConfig) -> Vec<u16> {
        self.ports.clone()
    }

    async fn resolve(
        &self,
        _addr: IpAddr,
        _cred: &Credential,
        _port: u16,
        _window: Duration,
    ) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.identity.clone()
    }
}

/// Reads protocol sentences off a socket on the fake-device side of a test,
/// keeping leftover bytes between sentences
#[allow(dead_code)]
pub struct SentenceReader {
    buf: Vec<u8>,
}

#[allow(dead_code)]
impl SentenceReader {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Read words until the zero-length terminator; returns the words
    pub async fn next(&mut self, stream: &mut TcpStream) -> Vec<String> {
        let mut words = Vec::new();
        loop {
            loop {
                if let Some((len, width)) = decode_length(&self.buf) {
                    if self.buf.len() >= width + len as usize {
                        break;
                    }
                }
                let mut chunk = [0u8; 256];
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "peer closed mid-sentence");
                self.buf.extend_from_slice(&chunk[..n]);
            }
            let (len, width) = decode_length(&self.buf).unwrap();
            let end = width + len as usize;
            let word = String::from_utf8(self.buf[width..end].to_vec()).unwrap();
            self.buf.drain(..end);
            if len == 0 {
                return words;
            }
            words.push(word);
        }
    }
}

/// Write one reply sentence to the client under test
#[allow(dead_code)]
pub async fn send_sentence(stream: &mut TcpStream, words: &[&str]) {
    stream.write_all(&encode_sentence(words)).await.unwrap();
}

/// Write raw bytes in tiny chunks so the client sees fragmented frames
#[allow(dead_code)]
pub async fn write_chunked(stream: &mut TcpStream, bytes: &[u8], chunk: usize) {
    for part in bytes.chunks(chunk) {
        stream.write_all(part).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Pull the `.tag=` value out of a received command sentence
#[allow(dead_code)]
pub fn tag_of(words: &[String]) -> String {
    words
        .iter()
        .find_map(|w| w.strip_prefix(".tag="))
        .expect("command sentence carries a tag")
        .to_string()
}
