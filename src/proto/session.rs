use crate::errors::ResolveError;
use crate::model::Credential;
use crate::proto::codec::encode_sentence;
use crate::proto::parser::{ReplyKind, Sentence, SentenceParser};
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Everything one command delivered: the `!re` attribute maps in arrival
/// order, plus the attributes carried on the terminal `!done` sentence
/// (the legacy login challenge arrives there)
#[derive(Debug, Default)]
pub struct CommandResponse {
    pub replies: Vec<Vec<(String, String)>>,
    pub done_attrs: Vec<(String, String)>,
}

impl CommandResponse {
    /// First value for `key` across the replies, then the terminal sentence
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.replies
            .iter()
            .flatten()
            .chain(self.done_attrs.iter())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
struct Pending {
    replies: Vec<Vec<(String, String)>>,
    tx: oneshot::Sender<Result<CommandResponse, ResolveError>>,
}

type PendingTable = Arc<Mutex<HashMap<u32, Pending>>>;

/// One authenticated connection to a RouterOS device.
///
/// `connect` owns the connecting and authenticating phases; a `Session`
/// value you hold is always ready for commands until `disconnect`. Commands
/// are correlated by a per-session monotonic tag, so several may be
/// outstanding at once; inbound sentences for tags nobody is waiting on are
/// dropped. Sessions are created per resolution attempt and never reused.
#[derive(Debug)]
pub struct Session {
    host: IpAddr,
    port: u16,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: PendingTable,
    next_tag: AtomicU32,
    command_timeout: Duration,
    reader: JoinHandle<()>,
    closed: AtomicBool,
}

impl Session {
    /// Open a socket and log in, all within `connect_timeout`.
    ///
    /// Login tries the modern clear-text `/login` first and falls back to
    /// the legacy challenge-response flow only when the device answers the
    /// plain attempt with a trap.
    pub async fn connect(
        host: IpAddr,
        port: u16,
        cred: &Credential,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self, ResolveError> {
        let stream = timeout(connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| {
                ResolveError::ConnectionError(format!("connect to {host}:{port} timed out"))
            })?
            .map_err(|e| {
                ResolveError::ConnectionError(format!("connect to {host}:{port} failed: {e}"))
            })?;

        let (read_half, write_half) = stream.into_split();
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(read_half, Arc::clone(&pending)));

        let session = Self {
            host,
            port,
            writer: tokio::sync::Mutex::new(write_half),
            pending,
            next_tag: AtomicU32::new(0),
            command_timeout,
            reader,
            closed: AtomicBool::new(false),
        };

        match timeout(connect_timeout, session.login(cred)).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(err)) => {
                session.disconnect().await;
                Err(err)
            }
            Err(_) => {
                session.disconnect().await;
                Err(ResolveError::AuthError(format!(
                    "login to {host}:{port} timed out"
                )))
            }
        }
    }

    async fn login(&self, cred: &Credential) -> Result<(), ResolveError> {
        let name_word = format!("=name={}", cred.username);

        // Modern path (v6.43+): credentials in clear on the first /login
        let plain = self
            .send_command(&[
                "/login",
                &name_word,
                &format!("=password={}", cred.password),
            ])
            .await;
        match plain {
            Ok(_) => return Ok(()),
            // a trap here is the one signature that selects the legacy flow
            Err(ResolveError::CommandError(_)) => {}
            Err(err) => return Err(err),
        }

        // Legacy path: bare /login yields a challenge in `ret`
        let opening = self.send_command(&["/login"]).await.map_err(|err| match err {
            ResolveError::CommandError(msg) => ResolveError::AuthError(msg),
            other => other,
        })?;
        let challenge = opening
            .attr("ret")
            .ok_or_else(|| ResolveError::AuthError("no challenge in login reply".to_string()))?;
        let response = challenge_response(&cred.password, challenge)?;

        match self
            .send_command(&["/login", &name_word, &format!("=response={response}")])
            .await
        {
            Ok(_) => Ok(()),
            Err(ResolveError::CommandError(msg)) => Err(ResolveError::AuthError(msg)),
            Err(err) => Err(err),
        }
    }

    /// Issue one command sentence and wait for its terminal reply.
    ///
    /// The command gets the next monotonic tag and its own timeout window,
    /// independent of any other command in flight. On expiry the pending
    /// entry is removed here; the socket is left alone, but the session
    /// should be considered suspect and disconnected by the caller.
    pub async fn send_command(&self, words: &[&str]) -> Result<CommandResponse, ResolveError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ResolveError::ConnectionError("session is closed".to_string()));
        }

        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel();
        {
            let mut table = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            table.insert(
                tag,
                Pending {
                    replies: Vec::new(),
                    tx,
                },
            );
        }

        let mut framed: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        framed.push(format!(".tag={tag}"));
        let encoded = encode_sentence(&framed);

        {
            let mut writer = self.writer.lock().await;
            if let Err(err) = writer.write_all(&encoded).await {
                let mut table = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                table.remove(&tag);
                return Err(ResolveError::ConnectionError(format!("write failed: {err}")));
            }
        }

        match timeout(self.command_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ResolveError::ConnectionError(
                "session closed while waiting for reply".to_string(),
            )),
            Err(_) => {
                let mut table = self.pending.lock().unwrap_or_else(|e| e.into_inner());
                table.remove(&tag);
                Err(ResolveError::CommandTimeout {
                    tag,
                    ms: self.command_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Run `/system/identity/print` and return the reported name
    pub async fn system_identity(&self) -> Result<Option<String>, ResolveError> {
        let response = self.send_command(&["/system/identity/print"]).await?;
        Ok(response
            .attr("name")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()))
    }

    /// Close the socket and reject every still-pending command so no waiter
    /// is left hanging. Safe to call any number of times, from any state.
    pub async fn disconnect(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reader.abort();
        {
            let mut writer = self.writer.lock().await;
            let _ = writer.shutdown().await;
        }
        reject_all(&self.pending, "session closed");
        debug!(host = %self.host, port = self.port, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.reader.abort();
        reject_all(&self.pending, "session dropped");
    }
}

fn reject_all(pending: &PendingTable, reason: &str) {
    let drained: Vec<Pending> = {
        let mut table = pending.lock().unwrap_or_else(|e| e.into_inner());
        table.drain().map(|(_, entry)| entry).collect()
    };
    for entry in drained {
        let _ = entry
            .tx
            .send(Err(ResolveError::ConnectionError(reason.to_string())));
    }
}

async fn read_loop(mut reader: OwnedReadHalf, pending: PendingTable) {
    let mut parser = SentenceParser::new();
    let mut buf = vec![0u8; 4096];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        match parser.feed(&buf[..n]) {
            Ok(sentences) => {
                for sentence in sentences {
                    route(&pending, sentence);
                }
            }
            Err(err) => {
                warn!(%err, "undecodable input, abandoning connection");
                break;
            }
        }
    }
    reject_all(&pending, "connection closed by peer");
}

/// Deliver one sentence to the pending command it is tagged for. Sentences
/// with no tag, or a tag nobody is waiting on, are dropped silently.
fn route(pending: &PendingTable, sentence: Sentence) {
    let Some(tag) = sentence.tag else { return };
    let mut table = pending.lock().unwrap_or_else(|e| e.into_inner());
    match sentence.kind {
        ReplyKind::Done => {
            if let Some(entry) = table.remove(&tag) {
                let _ = entry.tx.send(Ok(CommandResponse {
                    replies: entry.replies,
                    done_attrs: sentence.attrs,
                }));
            }
        }
        ReplyKind::Trap | ReplyKind::Fatal => {
            if let Some(entry) = table.remove(&tag) {
                let message = sentence
                    .attr("message")
                    .unwrap_or("command failed")
                    .to_string();
                let _ = entry.tx.send(Err(ResolveError::CommandError(message)));
            }
        }
        _ => {
            if let Some(entry) = table.get_mut(&tag) {
                entry.replies.push(sentence.attrs);
            }
        }
    }
}

/// Legacy login proof: `"00"` + lowercase hex of
/// `MD5(0x00 || password || hex_decode(challenge))`
pub fn challenge_response(password: &str, challenge_hex: &str) -> Result<String, ResolveError> {
    let challenge = hex::decode(challenge_hex.trim())
        .map_err(|_| ResolveError::AuthError("login challenge is not valid hex".to_string()))?;
    let mut md5 = Md5::new();
    md5.update([0u8]);
    md5.update(password.as_bytes());
    md5.update(&challenge);
    Ok(format!("00{}", hex::encode(md5.finalize())))
}
