use crate::errors::ResolveError;
use crate::proto::codec::decode_length;

/// Reply-type marker opening a sentence from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyKind {
    /// `!re`: one data record for a still-running command
    Re,
    /// `!done`: the command completed
    Done,
    /// `!trap`: the command failed
    Trap,
    /// `!fatal`: the connection is about to die
    Fatal,
    /// Anything else, including sentences with no marker at all
    #[default]
    Other,
}

impl ReplyKind {
    fn from_marker(word: &str) -> Self {
        match word {
            "!re" => Self::Re,
            "!done" => Self::Done,
            "!trap" => Self::Trap,
            "!fatal" => Self::Fatal,
            _ => Self::Other,
        }
    }

    /// Whether this marker ends the command it is tagged with
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Trap | Self::Fatal)
    }
}

/// One assembled protocol message: a marker, an optional correlation tag,
/// and the `=key=value` attributes that arrived with it
#[derive(Debug, Clone, Default)]
pub struct Sentence {
    pub kind: ReplyKind,
    pub tag: Option<u32>,
    pub attrs: Vec<(String, String)>,
}

impl Sentence {
    /// First value recorded for `key`
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Incremental sentence assembler.
///
/// TCP delivers fragments; a sentence may arrive split anywhere, including
/// inside a length prefix. Bytes that do not yet form a complete word are
/// retained across feeds, so a frame split on a read boundary is decoded
/// identically to one delivered whole.
#[derive(Default)]
pub struct SentenceParser {
    buf: Vec<u8>,
    current: Sentence,
}

impl SentenceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of socket data; returns every sentence it completed
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Sentence>, ResolveError> {
        self.buf.extend_from_slice(data);
        let mut emitted = Vec::new();
        let mut pos = 0;
        loop {
            let Some((len, width)) = decode_length(&self.buf[pos..]) else {
                break;
            };
            let len = len as usize;
            if self.buf.len() - pos - width < len {
                break;
            }
            let start = pos + width;
            let word = &self.buf[start..start + len];
            pos = start + len;
            if len == 0 {
                emitted.push(std::mem::take(&mut self.current));
            } else {
                let word = std::str::from_utf8(word)
                    .map_err(|_| {
                        ResolveError::ProtocolError("word is not valid UTF-8".to_string())
                    })?
                    .to_string();
                self.absorb(&word);
            }
        }
        self.buf.drain(..pos);
        Ok(emitted)
    }

    fn absorb(&mut self, word: &str) {
        if word.starts_with('!') {
            self.current.kind = ReplyKind::from_marker(word);
        } else if let Some(tag) = word.strip_prefix(".tag=") {
            self.current.tag = tag.parse().ok();
        } else if let Some(rest) = word.strip_prefix('=') {
            // split on the first '=' after the leading one
            match rest.split_once('=') {
                Some((key, value)) => self
                    .current
                    .attrs
                    .push((key.to_string(), value.to_string())),
                None => self.current.attrs.push((rest.to_string(), String::new())),
            }
        }
        // bare words (command paths) only appear client-to-device; ignored
    }
}
